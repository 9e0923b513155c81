use chrono::{Month, Weekday};
use serde::{Serialize, Serializer};

use super::{most_common, Ranked};
use crate::data::model::{weekday_name, TripTable};

/// Most frequent times of travel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeStats {
    pub month: Ranked<Month>,
    #[serde(serialize_with = "weekday_by_name")]
    pub weekday: Ranked<Weekday>,
    pub hour: Ranked<u32>,
}

/// Full day names ("Monday"), the same spelling the day filter accepts.
fn weekday_by_name<S: Serializer>(ranked: &Ranked<Weekday>, s: S) -> Result<S::Ok, S::Error> {
    Ranked {
        value: weekday_name(ranked.value),
        count: ranked.count,
    }
    .serialize(s)
}

/// `None` when the table is empty.
pub fn time_stats(table: &TripTable) -> Option<TimeStats> {
    Some(TimeStats {
        month: most_common(table.iter().map(|t| t.month))?,
        weekday: most_common(table.iter().map(|t| t.weekday))?,
        hour: most_common(table.iter().map(|t| t.hour))?,
    })
}
