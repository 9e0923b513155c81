//! Aggregate reports over a (filtered) trip table.
//!
//! ```text
//!   TripTable ──┬──▶ time      most common month / weekday / hour
//!               ├──▶ station   most common start, end, and start→end pair
//!               ├──▶ duration  total and mean trip time
//!               └──▶ user      user types, gender, birth years
//! ```
//!
//! Every reporter is a pure read of the table; none of them fail. An empty
//! table yields `None` (or [`FieldReport::Empty`]) instead of a value.

use std::collections::HashMap;
use std::hash::Hash;

use serde::Serialize;

pub mod duration;
pub mod station;
pub mod time;
pub mod user;

// ---------------------------------------------------------------------------
// Ranked – a value together with how often it occurred
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ranked<T> {
    pub value: T,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Frequency counting
// ---------------------------------------------------------------------------

/// Occurrence counts in first-encounter order.
fn tally<T, I>(values: I) -> Vec<(T, usize)>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut position: HashMap<T, usize> = HashMap::new();
    let mut counts: Vec<(T, usize)> = Vec::new();
    for value in values {
        match position.get(&value) {
            Some(&i) => counts[i].1 += 1,
            None => {
                position.insert(value.clone(), counts.len());
                counts.push((value, 1));
            }
        }
    }
    counts
}

/// The most frequent value. Ties go to the value encountered first.
pub fn most_common<T, I>(values: I) -> Option<Ranked<T>>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    tally(values)
        .into_iter()
        // max_by_key would keep the last maximum
        .fold(None, |best: Option<(T, usize)>, (value, count)| match best {
            Some((_, top)) if top >= count => best,
            _ => Some((value, count)),
        })
        .map(|(value, count)| Ranked { value, count })
}

// ---------------------------------------------------------------------------
// CategoryCounts – label → count, looked up by label
// ---------------------------------------------------------------------------

/// Counts per distinct label, ordered by descending count then first
/// encounter. Access is by label; the number of categories is open-ended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts(Vec<Ranked<String>>);

impl CategoryCounts {
    /// Count the non-blank labels.
    pub fn from_labels<'a, I>(labels: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut counts = tally(labels.into_iter().filter(|l| !l.trim().is_empty()));
        // stable: equal counts stay in encounter order
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        CategoryCounts(
            counts
                .into_iter()
                .map(|(label, count)| Ranked {
                    value: label.to_string(),
                    count,
                })
                .collect(),
        )
    }

    #[cfg(test)]
    pub fn get(&self, label: &str) -> Option<usize> {
        self.0.iter().find(|r| r.value == label).map(|r| r.count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|r| (r.value.as_str(), r.count))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> usize {
        self.0.iter().map(|r| r.count).sum()
    }
}

// ---------------------------------------------------------------------------
// FieldReport – statistics over an optional column
// ---------------------------------------------------------------------------

/// Result for a column that only some datasets carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "stats", rename_all = "snake_case")]
pub enum FieldReport<T> {
    /// The dataset has no such column.
    Missing,
    /// The column exists but no non-blank value survived filtering.
    Empty,
    Available(T),
}

// ---------------------------------------------------------------------------
// TripReport – all four reports together
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripReport {
    pub trips: usize,
    pub time: Option<time::TimeStats>,
    pub station: Option<station::StationStats>,
    pub duration: duration::DurationStats,
    pub user: user::UserStats,
}

impl TripReport {
    pub fn compute(table: &crate::data::model::TripTable) -> Self {
        TripReport {
            trips: table.len(),
            time: time::time_stats(table),
            station: station::station_stats(table),
            duration: duration::duration_stats(table),
            user: user::user_stats(table),
        }
    }
}
