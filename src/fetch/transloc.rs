use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use tracing::debug;

use super::auth::UrlParam;
use super::{ArrivalSource, BasicClient, HttpClient, fetch_json};
use crate::config::FeedConfig;

/// Builds the `GetStopArrivalTimes` URL for the configured stops.
///
/// The API key is not part of it; [`UrlParam`] adds that per request.
pub fn arrival_times_url(config: &FeedConfig) -> Result<Url> {
    let base = format!(
        "{}{}",
        config.api_host.trim_end_matches('/'),
        config.api_path
    );
    Url::parse_with_params(
        &base,
        &[
            ("stopIds", config.stop_ids_param()),
            ("version", config.version.clone()),
        ],
    )
    .with_context(|| format!("invalid arrival feed URL '{base}'"))
}

/// Fetches stop arrival times from a TransLoc JSONP relay.
pub struct TranslocSource<C> {
    client: C,
    url: Url,
}

impl<C: HttpClient> TranslocSource<C> {
    pub fn new(client: C, url: Url) -> Self {
        Self { client, url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl TranslocSource<UrlParam<BasicClient>> {
    /// Creates a source with a timeout-bounded client and the `apiKey`
    /// parameter attached.
    pub fn from_config(config: &FeedConfig) -> Result<Self> {
        let client = BasicClient::new(config.timeout, &config.user_agent)
            .context("failed to build HTTP client")?;
        let client = UrlParam::api_key(client, config.api_key.clone());
        Ok(Self::new(client, arrival_times_url(config)?))
    }
}

#[async_trait]
impl<C: HttpClient> ArrivalSource for TranslocSource<C> {
    #[tracing::instrument(skip_all)]
    async fn fetch(&self) -> Result<Value> {
        debug!(url = %self.url, "Fetching stop arrival times");
        let payload = fetch_json(&self.client, self.url.as_str())
            .await
            .context("failed to fetch stop arrival times")?;
        debug!(
            route_blocks = payload.as_array().map(Vec::len),
            "Arrival payload received"
        );
        Ok(payload)
    }
}
