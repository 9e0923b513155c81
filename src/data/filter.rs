use chrono::{Month, Weekday};

use super::model::{weekday_name, TripRecord, TripTable};
use crate::error::ExploreError;

// ---------------------------------------------------------------------------
// Filter vocabularies
// ---------------------------------------------------------------------------

/// Keyword meaning "no filter on this axis".
pub const ALL: &str = "all";

/// Months the datasets cover, in the order offered to users.
pub const FILTER_MONTHS: [Month; 6] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
];

pub const FILTER_DAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

// ---------------------------------------------------------------------------
// FilterSelection – optional month and weekday predicates
// ---------------------------------------------------------------------------

/// The pair of optional constraints applied to a table.
/// `None` on an axis means no filtering on that axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub month: Option<Month>,
    pub day: Option<Weekday>,
}

impl FilterSelection {
    /// Parse both selectors from user input.
    pub fn parse(month: &str, day: &str) -> Result<Self, ExploreError> {
        Ok(FilterSelection {
            month: parse_month(month)?,
            day: parse_day(day)?,
        })
    }

    /// Whether a single trip satisfies every active predicate.
    pub fn matches(&self, trip: &TripRecord) -> bool {
        self.month.map_or(true, |m| trip.month == m)
            && self.day.map_or(true, |d| trip.weekday == d)
    }

    pub fn is_unfiltered(&self) -> bool {
        self.month.is_none() && self.day.is_none()
    }
}

/// `"all"` maps to `None`; otherwise the input must name one of
/// [`FILTER_MONTHS`], ignoring case and surrounding whitespace.
pub fn parse_month(input: &str) -> Result<Option<Month>, ExploreError> {
    let wanted = input.trim();
    if wanted.eq_ignore_ascii_case(ALL) {
        return Ok(None);
    }
    FILTER_MONTHS
        .into_iter()
        .find(|m| m.name().eq_ignore_ascii_case(wanted))
        .map(Some)
        .ok_or_else(|| ExploreError::UnknownMonth(input.to_string()))
}

/// Same rules as [`parse_month`] over the full weekday names.
pub fn parse_day(input: &str) -> Result<Option<Weekday>, ExploreError> {
    let wanted = input.trim();
    if wanted.eq_ignore_ascii_case(ALL) {
        return Ok(None);
    }
    FILTER_DAYS
        .into_iter()
        .find(|d| weekday_name(*d).eq_ignore_ascii_case(wanted))
        .map(Some)
        .ok_or_else(|| ExploreError::UnknownDay(input.to_string()))
}

// ---------------------------------------------------------------------------
// Applying a selection
// ---------------------------------------------------------------------------

/// Return indices of trips that pass all active filters, in table order.
pub fn filtered_indices(table: &TripTable, selection: &FilterSelection) -> Vec<usize> {
    table
        .iter()
        .enumerate()
        .filter(|(_, trip)| selection.matches(trip))
        .map(|(i, _)| i)
        .collect()
}

/// Apply a selection, producing a new table that keeps the original order.
/// An empty result is valid.
pub fn filter(table: &TripTable, selection: &FilterSelection) -> TripTable {
    let records = table
        .records()
        .iter()
        .filter(|trip| selection.matches(trip))
        .cloned()
        .collect::<Vec<_>>();

    log::debug!(
        "filter {:?}/{:?} kept {} of {} trips",
        selection.month,
        selection.day,
        records.len(),
        table.len()
    );
    TripTable::from_shared(table.schema(), records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::{table, trip};
    use crate::data::model::TripSchema;

    fn sample() -> TripTable {
        table(
            TripSchema::default(),
            vec![
                trip(2017, 1, 2, 8),   // Monday, January
                trip(2017, 3, 6, 17),  // Monday, March
                trip(2017, 3, 7, 9),   // Tuesday, March
                trip(2017, 6, 25, 12), // Sunday, June
                trip(2017, 1, 8, 0),   // Sunday, January
            ],
        )
    }

    #[test]
    fn parses_vocabulary_ignoring_case() {
        let sel = FilterSelection::parse("MARCH", " Sunday ").unwrap();
        assert_eq!(sel.month, Some(Month::March));
        assert_eq!(sel.day, Some(Weekday::Sun));

        let all = FilterSelection::parse("All", "all").unwrap();
        assert!(all.is_unfiltered());
    }

    #[test]
    fn rejects_values_outside_vocabulary() {
        assert_eq!(
            parse_month("july"),
            Err(ExploreError::UnknownMonth("july".to_string()))
        );
        assert_eq!(
            parse_month("jan"),
            Err(ExploreError::UnknownMonth("jan".to_string()))
        );
        assert_eq!(
            parse_day("funday"),
            Err(ExploreError::UnknownDay("funday".to_string()))
        );
    }

    #[test]
    fn all_all_is_identity() {
        let t = sample();
        let filtered = filter(&t, &FilterSelection::default());
        assert_eq!(filtered, t);
    }

    #[test]
    fn month_filter_keeps_only_that_month_in_order() {
        let t = sample();
        let sel = FilterSelection::parse("march", "all").unwrap();
        let filtered = filter(&t, &sel);
        assert!(filtered.len() <= t.len());
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|r| r.month_name().eq_ignore_ascii_case("march")));
        let hours: Vec<u32> = filtered.iter().map(|r| r.hour).collect();
        assert_eq!(hours, vec![17, 9]);
    }

    #[test]
    fn month_and_day_compose_with_and() {
        let t = sample();
        let sel = FilterSelection::parse("january", "sunday").unwrap();
        assert_eq!(filtered_indices(&t, &sel), vec![4]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let t = sample();
        let sel = FilterSelection::parse("all", "monday").unwrap();
        let once = filter(&t, &sel);
        let twice = filter(&once, &sel);
        assert_eq!(once, twice);
        assert_eq!(once.len(), 2);
    }

    #[test]
    fn empty_result_is_not_an_error() {
        let t = sample();
        let sel = FilterSelection::parse("february", "all").unwrap();
        let filtered = filter(&t, &sel);
        assert!(filtered.is_empty());
        assert_eq!(filtered.schema(), t.schema());
    }
}
