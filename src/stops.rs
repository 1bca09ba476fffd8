//! Groups arrivals by physical stop and orders the stops soonest-first.

use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use crate::parser::{Arrival, ArrivalStatus};

/// One upcoming vehicle at a stop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Eta {
    pub route: Option<String>,
    pub route_id: Value,
    pub vehicle_id: Value,
    pub minutes: u64,
    pub status: ArrivalStatus,
}

impl From<&Arrival> for Eta {
    fn from(a: &Arrival) -> Self {
        Eta {
            route: a.route.clone(),
            route_id: a.route_id.clone(),
            vehicle_id: a.vehicle_id.clone(),
            minutes: a.minutes,
            status: a.status,
        }
    }
}

/// Everything arriving at a single stop, soonest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopSummary {
    pub stop_id: Value,
    pub stop: Option<String>,
    pub etas: Vec<Eta>,
    pub next_minutes: Option<u64>,
    pub routes_present: Vec<String>,
}

impl StopSummary {
    fn new(stop_id: Value, stop: Option<String>) -> Self {
        StopSummary {
            stop_id,
            stop,
            etas: Vec::new(),
            next_minutes: None,
            routes_present: Vec::new(),
        }
    }

    /// Sorts the etas and fills in the derived fields.
    fn finalize(mut self) -> Self {
        self.etas.sort_by_key(|e| e.minutes);
        self.next_minutes = self.etas.first().map(|e| e.minutes);
        self.routes_present = self
            .etas
            .iter()
            .filter_map(|e| e.route.as_deref())
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        self
    }

    /// Text used to break ties between stops with the same next arrival.
    pub fn id_sort_key(&self) -> String {
        match &self.stop_id {
            Value::String(s) => s.clone(),
            Value::Null => "None".to_string(),
            other => other.to_string(),
        }
    }
}

/// Stops with arrivals first, then soonest, then by stop id.
fn compare_stops(a: &StopSummary, b: &StopSummary) -> Ordering {
    a.next_minutes
        .is_none()
        .cmp(&b.next_minutes.is_none())
        .then_with(|| {
            a.next_minutes
                .unwrap_or(u64::MAX)
                .cmp(&b.next_minutes.unwrap_or(u64::MAX))
        })
        .then_with(|| a.id_sort_key().cmp(&b.id_sort_key()))
}

/// Orders stop summaries by the composite stop key.
pub fn sort_stops(stops: &mut [StopSummary]) {
    stops.sort_by(compare_stops);
}

/// Groups arrivals into per-stop summaries.
///
/// The stop's display name comes from the first arrival seen for its id.
/// Stop ids are compared as JSON values, so `6` and `"6"` stay separate.
pub fn aggregate_stops(arrivals: &[Arrival]) -> Vec<StopSummary> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut stops: Vec<StopSummary> = Vec::new();

    for arrival in arrivals {
        let key = arrival.stop_id.to_string();
        let slot = *index.entry(key).or_insert_with(|| {
            stops.push(StopSummary::new(
                arrival.stop_id.clone(),
                arrival.stop.clone(),
            ));
            stops.len() - 1
        });
        stops[slot].etas.push(Eta::from(arrival));
    }

    let mut stops: Vec<StopSummary> = stops.into_iter().map(StopSummary::finalize).collect();
    sort_stops(&mut stops);
    stops
}
