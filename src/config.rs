//! Static feed configuration, passed explicitly into the pipeline.

use std::collections::HashSet;
use std::time::Duration;

pub const DEFAULT_API_HOST: &str = "https://ucf.transloc.com";
pub const DEFAULT_API_PATH: &str = "/Services/JSONPRelay.svc/GetStopArrivalTimes";
pub const DEFAULT_VERSION: &str = "2";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_USER_AGENT: &str = "HomeAssistant/BusTracker";

/// Where to fetch arrivals from and which of them to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub api_host: String,
    pub api_path: String,
    /// Stops of interest, sent upstream as `stopIds`.
    pub stop_ids: Vec<String>,
    /// Route ids to keep; empty keeps every route.
    pub route_filter: HashSet<i64>,
    pub api_key: Option<String>,
    pub version: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            api_host: DEFAULT_API_HOST.to_string(),
            api_path: DEFAULT_API_PATH.to_string(),
            stop_ids: Vec::new(),
            route_filter: HashSet::new(),
            api_key: None,
            version: DEFAULT_VERSION.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FeedConfig {
    /// Comma separated stop ids, blanks dropped.
    pub fn stop_ids_param(&self) -> String {
        self.stop_ids
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn with_stop_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_routes<I: IntoIterator<Item = i64>>(mut self, routes: I) -> Self {
        self.route_filter = routes.into_iter().collect();
        self
    }
}
