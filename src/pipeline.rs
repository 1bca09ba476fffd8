//! Fetch, parse, group and present in one call that cannot fail.

use serde_json::Value;
use std::collections::HashSet;
use tracing::{error, info};

use crate::config::FeedConfig;
use crate::fetch::ArrivalSource;
use crate::output::{Report, present};
use crate::parser::parse_arrivals;
use crate::stops::aggregate_stops;

/// Turns one raw payload into a report.
pub fn build_report(payload: &Value, route_filter: &HashSet<i64>) -> Report {
    let arrivals = parse_arrivals(payload, route_filter);
    let count = arrivals.len();
    let stops = aggregate_stops(&arrivals);
    present(stops, count)
}

/// Fetches once from `source` and summarizes the result.
///
/// Any fetch or decode error becomes the failure-shaped [`Report`]; this
/// never returns an error to the caller.
#[tracing::instrument(skip_all, fields(routes = config.route_filter.len()))]
pub async fn run<S: ArrivalSource>(source: &S, config: &FeedConfig) -> Report {
    match source.fetch().await {
        Ok(payload) => {
            let report = build_report(&payload, &config.route_filter);
            info!(
                arrivals = report.count.unwrap_or(0),
                stops = report.stops.len(),
                next_minutes = report.next_minutes,
                "Arrival summary built"
            );
            report
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "Arrival fetch failed");
            Report::failure(&e)
        }
    }
}
