use serde::Serialize;

use crate::data::model::TripTable;

/// Total and mean trip duration, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationStats {
    pub trips: usize,
    pub total_seconds: f64,
    /// `None` for an empty table.
    pub mean_seconds: Option<f64>,
}

pub fn duration_stats(table: &TripTable) -> DurationStats {
    let trips = table.len();
    let total_seconds: f64 = table.iter().map(|t| t.duration).sum();
    let mean_seconds = (trips > 0).then(|| total_seconds / trips as f64);
    DurationStats {
        trips,
        total_seconds,
        mean_seconds,
    }
}
