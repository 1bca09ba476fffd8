//! CLI entry point: prints one compact JSON arrival summary to stdout.
//!
//! Meant to be polled by a Home Assistant `command_line` sensor, so stdout
//! carries nothing but the report and the process exits cleanly even when
//! the feed is down.

use clap::Parser;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use transloc_arrivals::{
    config::{self, FeedConfig},
    fetch::{FileSource, TranslocSource},
    output::{Report, print_pretty, write_report},
    pipeline,
};

#[derive(Parser)]
#[command(name = "transloc_arrivals")]
#[command(about = "Summarize TransLoc stop arrival times as compact JSON", long_about = None)]
struct Cli {
    /// Stop ids to query, comma separated
    #[arg(short, long, env = "TRANSLOC_STOP_IDS", value_delimiter = ',')]
    stops: Vec<String>,

    /// Only keep these route ids, comma separated (empty keeps all)
    #[arg(short, long, env = "TRANSLOC_ROUTES", value_delimiter = ',')]
    routes: Vec<i64>,

    /// TransLoc host, e.g. https://ucf.transloc.com
    #[arg(long, env = "TRANSLOC_HOST", default_value = config::DEFAULT_API_HOST)]
    host: String,

    /// Optional API key, sent as the `apiKey` query parameter
    #[arg(long, env = "TRANSLOC_API_KEY")]
    api_key: Option<String>,

    /// Relay API version
    #[arg(long, env = "TRANSLOC_VERSION", default_value = config::DEFAULT_VERSION)]
    api_version: String,

    /// Request timeout in seconds
    #[arg(short, long, env = "TRANSLOC_TIMEOUT_SECS", default_value_t = config::DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Read a saved payload from this file instead of calling the API
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,
}

impl Cli {
    fn feed_config(&self) -> FeedConfig {
        FeedConfig {
            api_host: self.host.clone(),
            api_key: self.api_key.clone().filter(|k| !k.is_empty()),
            version: self.api_version.clone(),
            timeout: Duration::from_secs(self.timeout),
            ..FeedConfig::default()
        }
        .with_stop_ids(self.stops.iter().cloned())
        .with_routes(self.routes.iter().copied())
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok(); // Load .env file

    // The file guard must outlive the report so buffered lines are flushed.
    let _file_guard = init_logging();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version print as usual
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            emit(&argument_failure(e));
            return;
        }
    };
    let config = cli.feed_config();
    debug!(
        stop_ids = %config.stop_ids_param(),
        routes = ?config.route_filter,
        host = %config.api_host,
        "Configuration loaded"
    );

    let report = match &cli.input {
        Some(path) => {
            let source = FileSource::new(path);
            pipeline::run(&source, &config).await
        }
        None => match TranslocSource::from_config(&config) {
            Ok(source) => pipeline::run(&source, &config).await,
            Err(e) => {
                error!(error = %format!("{e:#}"), "Could not set up arrival source");
                Report::failure(&e)
            }
        },
    };

    emit(&report);
}

/// Argument errors still reach the consumer as a failure report.
fn argument_failure(e: clap::Error) -> Report {
    Report::failure(&anyhow::Error::new(e).context("invalid arguments"))
}

fn emit(report: &Report) {
    print_pretty(report);
    if let Err(e) = write_report(std::io::stdout().lock(), report) {
        error!(error = %e, "Failed to write report to stdout");
    }
}

/// Logging setup: stderr always, plus a JSON rolling log file when
/// `LOG_FILE_PATH` is set. Stdout is reserved for the report.
fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(env_filter("RUST_LOG", "warn"));

    let (json_layer, guard) = match std::env::var("LOG_FILE_PATH") {
        Ok(log_file_path) => {
            let log_dir = Path::new(&log_file_path)
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("logs"));
            let log_file_name = Path::new(&log_file_path)
                .file_name()
                .unwrap_or(OsStr::new("transloc_arrivals.log"));

            let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

            let layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(non_blocking_file)
                .with_filter(env_filter("RUST_LOG_JSON", "debug"));
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    guard
}

/// Reads `var` as a filter, falling back to `default` when unset or invalid.
fn env_filter(var: &str, default: &str) -> EnvFilter {
    EnvFilter::try_from_env(var).unwrap_or_else(|_| EnvFilter::new(default))
}
