use serde::Serialize;

use super::{most_common, Ranked};
use crate::data::model::TripTable;

/// Most popular stations and trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationStats {
    pub start: Ranked<String>,
    pub end: Ranked<String>,
    /// Most frequent (start, end) combination.
    pub trip: Ranked<(String, String)>,
}

/// `None` when the table is empty.
pub fn station_stats(table: &TripTable) -> Option<StationStats> {
    let start = most_common(table.iter().map(|t| t.start_station.as_str()))?;
    let end = most_common(table.iter().map(|t| t.end_station.as_str()))?;
    let trip = most_common(
        table
            .iter()
            .map(|t| (t.start_station.as_str(), t.end_station.as_str())),
    )?;

    Some(StationStats {
        start: owned(start),
        end: owned(end),
        trip: Ranked {
            value: (trip.value.0.to_string(), trip.value.1.to_string()),
            count: trip.count,
        },
    })
}

fn owned(r: Ranked<&str>) -> Ranked<String> {
    Ranked {
        value: r.value.to_string(),
        count: r.count,
    }
}
