//! The summary handed to the downstream consumer, and its emission.
//!
//! Success and failure share one top-level shape so the consumer can read
//! fixed keys; only `count` and `error` depend on which path produced it.

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::io::Write;
use tracing::debug;

use crate::stops::StopSummary;

/// Stop name reported when nothing is on its way.
pub const NO_ACTIVE_ROUTES: &str = "No Active Routes";

/// Stop name reported on the failure shape.
pub const ERROR_STOP: &str = "Error";

const FALLBACK_JSON: &str = r#"{"next_minutes":null,"stop":"Error","stop_id":null,"stops":[],"error":"failed to serialize report"}"#;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub next_minutes: Option<u64>,
    pub stop: Option<String>,
    pub stop_id: Value,
    pub stops: Vec<StopSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Report {
    /// Builds the failure shape from any error.
    ///
    /// The message includes the whole context chain.
    pub fn failure(error: &anyhow::Error) -> Self {
        let mut message = format!("{error:#}");
        if message.trim().is_empty() {
            message = "unknown error".to_string();
        }

        Report {
            next_minutes: None,
            stop: Some(ERROR_STOP.to_string()),
            stop_id: Value::Null,
            stops: Vec::new(),
            count: None,
            error: Some(message),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Serializes without insignificant whitespace. Falls back to a fixed
    /// failure document instead of erroring.
    pub fn to_compact_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| FALLBACK_JSON.to_string())
    }
}

/// Picks the primary stop and assembles the success shape.
///
/// `stops` must already be in display order; the first stop is primary when
/// it has an upcoming arrival.
pub fn present(stops: Vec<StopSummary>, total_arrival_count: usize) -> Report {
    let primary = stops
        .first()
        .filter(|s| s.next_minutes.is_some())
        .map(|s| (s.next_minutes, s.stop.clone(), s.stop_id.clone()));

    let (next_minutes, stop, stop_id) = match primary {
        Some(primary) => primary,
        None => (None, Some(NO_ACTIVE_ROUTES.to_string()), Value::Null),
    };

    Report {
        next_minutes,
        stop,
        stop_id,
        stops,
        count: Some(total_arrival_count),
        error: None,
    }
}

/// Logs the report using Rust's debug pretty-print format.
pub fn print_pretty(report: &Report) {
    debug!("{:#?}", report);
}

/// Writes the report as a single compact JSON line.
pub fn write_report<W: Write>(mut writer: W, report: &Report) -> Result<()> {
    writeln!(writer, "{}", report.to_compact_json())?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ArrivalStatus;
    use crate::stops::Eta;
    use anyhow::{Context, anyhow};
    use serde_json::json;

    fn stop(stop_id: Value, name: &str, minutes: &[u64]) -> StopSummary {
        StopSummary {
            stop_id,
            stop: Some(name.to_string()),
            etas: minutes
                .iter()
                .map(|&m| Eta {
                    route: Some("Gold".to_string()),
                    route_id: json!(4),
                    vehicle_id: json!(1),
                    minutes: m,
                    status: ArrivalStatus::EnRoute,
                })
                .collect(),
            next_minutes: minutes.first().copied(),
            routes_present: vec!["Gold".to_string()],
        }
    }

    #[test]
    fn test_present_picks_first_stop() {
        let stops = vec![stop(json!(6), "Library", &[3, 8]), stop(json!(7), "Union", &[])];

        let report = present(stops, 2);

        assert_eq!(report.next_minutes, Some(3));
        assert_eq!(report.stop.as_deref(), Some("Library"));
        assert_eq!(report.stop_id, json!(6));
        assert_eq!(report.stops.len(), 2);
        assert_eq!(report.count, Some(2));
        assert!(!report.is_error());
    }

    #[test]
    fn test_present_without_primary_uses_sentinel() {
        for stops in [vec![], vec![stop(json!(7), "Union", &[])]] {
            let report = present(stops, 0);
            assert_eq!(report.next_minutes, None);
            assert_eq!(report.stop.as_deref(), Some(NO_ACTIVE_ROUTES));
            assert_eq!(report.stop_id, Value::Null);
        }
    }

    #[test]
    fn test_empty_report_json_shape() {
        let json: Value = serde_json::from_str(&present(vec![], 0).to_compact_json()).unwrap();

        assert_eq!(json["stops"], json!([]));
        assert_eq!(json["count"], json!(0));
        assert_eq!(json["next_minutes"], Value::Null);
        assert_eq!(json["stop_id"], Value::Null);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_failure_shape() {
        let err = Err::<(), _>(anyhow!("connection refused"))
            .context("failed to fetch stop arrival times")
            .unwrap_err();

        let report = Report::failure(&err);
        assert!(report.is_error());

        let json: Value = serde_json::from_str(&report.to_compact_json()).unwrap();
        assert_eq!(json["next_minutes"], Value::Null);
        assert_eq!(json["stop"], json!("Error"));
        assert_eq!(json["stop_id"], Value::Null);
        assert_eq!(json["stops"], json!([]));
        assert!(json.get("count").is_none());
        assert_eq!(
            json["error"],
            json!("failed to fetch stop arrival times: connection refused")
        );
    }

    #[test]
    fn test_failure_with_blank_message() {
        let report = Report::failure(&anyhow!(""));
        assert_eq!(report.error.as_deref(), Some("unknown error"));
    }

    #[test]
    fn test_compact_json_has_no_whitespace() {
        let report = present(vec![stop(json!(6), "Library", &[1])], 1);
        let line = report.to_compact_json();

        assert!(!line.contains(": "));
        assert!(!line.contains(", "));
        assert!(!line.contains('\n'));
        assert!(line.starts_with(r#"{"next_minutes":1,"stop":"Library","stop_id":6,"stops":["#));
        assert!(line.ends_with(r#""count":1}"#));
    }

    #[test]
    fn test_write_report_single_line() {
        let mut buf = Vec::new();
        write_report(&mut buf, &present(vec![], 0)).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&present(vec![], 0));
    }
}
