//! Flattens the TransLoc `GetStopArrivalTimes` payload into arrival records.
//!
//! The upstream JSON is untrusted: every route block and time entry is
//! validated on its own, and anything malformed is dropped without affecting
//! its neighbours.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{debug, trace};

/// Whether a vehicle is pulling in or still on its way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArrivalStatus {
    Arriving,
    #[serde(rename = "En route")]
    EnRoute,
}

impl ArrivalStatus {
    /// `Arriving` when the feed flags it, or when the status text says so.
    pub fn from_entry(is_arriving: bool, text: Option<&str>) -> Self {
        let text_says_arriving = text
            .map(|t| t.trim().eq_ignore_ascii_case("arriving"))
            .unwrap_or(false);

        if is_arriving || text_says_arriving {
            ArrivalStatus::Arriving
        } else {
            ArrivalStatus::EnRoute
        }
    }
}

/// A single predicted arrival of one vehicle at one stop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Arrival {
    pub route: Option<String>,
    pub route_id: Value,
    pub vehicle_id: Value,
    pub minutes: u64,
    pub status: ArrivalStatus,
    pub stop: Option<String>,
    pub stop_id: Value,
}

/// Rounds a seconds-until-arrival estimate up to whole minutes.
///
/// Negative estimates are treated as already arrived.
pub fn ceil_minutes(seconds: i64) -> u64 {
    (seconds.max(0) as u64).div_ceil(60)
}

/// Coerces a loosely-typed JSON scalar to an integer.
///
/// Accepts integers, finite floats (truncated) and numeric strings.
pub fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Truthiness of a loose JSON flag: `false`, `0`, `""`, `null` and empty
/// containers are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Display text for a description field. Numbers are kept as their text.
fn text_field(record: &Map<String, Value>, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn id_field(record: &Map<String, Value>, key: &str) -> Value {
    record.get(key).cloned().unwrap_or(Value::Null)
}

/// Parses the raw payload into arrivals sorted by minutes.
///
/// `route_filter` keeps only the listed route ids; an empty set keeps every
/// route. This never fails: a payload that is not an array yields nothing.
pub fn parse_arrivals(payload: &Value, route_filter: &HashSet<i64>) -> Vec<Arrival> {
    let Some(blocks) = payload.as_array() else {
        debug!("Arrival payload is not an array, ignoring");
        return Vec::new();
    };

    let mut arrivals = Vec::new();

    for block in blocks {
        let Some(block) = block.as_object() else {
            trace!("Skipping non-object route block");
            continue;
        };

        let route_id = id_field(block, "RouteId");
        if !route_filter.is_empty() {
            let numeric_id = coerce_int(&route_id).unwrap_or(0);
            if !route_filter.contains(&numeric_id) {
                trace!(route_id = numeric_id, "Route not in filter, skipping block");
                continue;
            }
        }

        let times = match block.get("Times").and_then(Value::as_array) {
            Some(times) if !times.is_empty() => times,
            _ => continue,
        };

        let route = text_field(block, "RouteDescription");
        let stop = text_field(block, "StopDescription");
        let stop_id = id_field(block, "StopId");

        for entry in times {
            let Some(entry) = entry.as_object() else {
                continue;
            };

            let Some(seconds) = entry.get("Seconds").and_then(coerce_int) else {
                debug!(stop_id = %stop_id, "Time entry has no usable Seconds, skipping");
                continue;
            };

            let is_arriving = entry.get("IsArriving").is_some_and(is_truthy);
            let text = entry.get("Text").and_then(Value::as_str);

            arrivals.push(Arrival {
                route: route.clone(),
                route_id: route_id.clone(),
                vehicle_id: id_field(entry, "VehicleId"),
                minutes: ceil_minutes(seconds),
                status: ArrivalStatus::from_entry(is_arriving, text),
                stop: stop.clone(),
                stop_id: stop_id.clone(),
            });
        }
    }

    // stable: equal minutes keep feed order
    arrivals.sort_by_key(|a| a.minutes);
    arrivals
}
