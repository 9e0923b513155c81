use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{Datelike, Month, NaiveDateTime, Timelike, Weekday};

use crate::error::ExploreError;

// ---------------------------------------------------------------------------
// City – one of the three known data sources
// ---------------------------------------------------------------------------

/// The fixed set of cities with trip data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum City {
    Chicago,
    NewYorkCity,
    Washington,
}

impl City {
    pub const ALL: [City; 3] = [City::Chicago, City::NewYorkCity, City::Washington];

    /// Lower-case name as typed by users and used as the config key.
    pub fn name(self) -> &'static str {
        match self {
            City::Chicago => "chicago",
            City::NewYorkCity => "new york city",
            City::Washington => "washington",
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for City {
    type Err = ExploreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        City::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ExploreError::UnknownCity(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Calendar helpers
// ---------------------------------------------------------------------------

const MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

/// Title-case weekday name ("Monday"), matching `Month::name`.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn month_of(ts: &NaiveDateTime) -> Month {
    // month0() is always in 0..12
    MONTHS[ts.month0() as usize]
}

// ---------------------------------------------------------------------------
// TripRecord – one row of a city dataset
// ---------------------------------------------------------------------------

/// A single trip with its derived time-part fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRecord {
    pub start_time: NaiveDateTime,
    /// Trip duration in seconds.
    pub duration: f64,
    pub start_station: String,
    pub end_station: String,
    pub user_type: String,
    /// `None` when the cell is blank or the column is absent.
    pub gender: Option<String>,
    pub birth_year: Option<i32>,
    /// Derived from `start_time`.
    pub month: Month,
    pub weekday: Weekday,
    pub hour: u32,
}

/// The source columns of a trip before derivation.
#[derive(Debug, Clone)]
pub struct RawTrip {
    pub start_time: NaiveDateTime,
    pub duration: f64,
    pub start_station: String,
    pub end_station: String,
    pub user_type: String,
    pub gender: Option<String>,
    pub birth_year: Option<i32>,
}

impl From<RawTrip> for TripRecord {
    fn from(raw: RawTrip) -> Self {
        TripRecord {
            month: month_of(&raw.start_time),
            weekday: raw.start_time.weekday(),
            hour: raw.start_time.hour(),
            start_time: raw.start_time,
            duration: raw.duration,
            start_station: raw.start_station,
            end_station: raw.end_station,
            user_type: raw.user_type,
            gender: raw.gender,
            birth_year: raw.birth_year,
        }
    }
}

impl TripRecord {
    pub fn month_name(&self) -> &'static str {
        self.month.name()
    }

    pub fn weekday_name(&self) -> &'static str {
        weekday_name(self.weekday)
    }
}

// ---------------------------------------------------------------------------
// TripTable – a loaded (or filtered) dataset
// ---------------------------------------------------------------------------

/// Which optional columns the source carried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TripSchema {
    pub has_gender: bool,
    pub has_birth_year: bool,
}

/// Ordered trips sharing one schema.
///
/// Records are behind `Arc` so a filtered table shares rows with the table it
/// was filtered from. Rows are never mutated after loading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripTable {
    schema: TripSchema,
    records: Vec<Arc<TripRecord>>,
}

impl TripTable {
    /// Build a table, dropping optional values the schema says are absent.
    pub fn new(schema: TripSchema, records: Vec<TripRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|mut r| {
                if !schema.has_gender {
                    r.gender = None;
                }
                if !schema.has_birth_year {
                    r.birth_year = None;
                }
                Arc::new(r)
            })
            .collect();
        TripTable { schema, records }
    }

    /// Table over rows already known to match `schema`.
    pub(crate) fn from_shared(schema: TripSchema, records: Vec<Arc<TripRecord>>) -> Self {
        TripTable { schema, records }
    }

    pub fn schema(&self) -> TripSchema {
        self.schema
    }

    pub fn records(&self) -> &[Arc<TripRecord>] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &TripRecord> {
        self.records.iter().map(|r| r.as_ref())
    }

    /// Number of trips.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no trips.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{table, trip};
    use super::*;

    #[test]
    fn city_parses_case_insensitively() {
        assert_eq!("Chicago".parse::<City>(), Ok(City::Chicago));
        assert_eq!("  NEW YORK CITY ".parse::<City>(), Ok(City::NewYorkCity));
        assert_eq!(
            "boston".parse::<City>(),
            Err(ExploreError::UnknownCity("boston".to_string()))
        );
    }

    #[test]
    fn derived_fields_follow_start_time() {
        // 2017-03-05 was a Sunday
        let rec = TripRecord::from(trip(2017, 3, 5, 23));
        assert_eq!(rec.month, Month::March);
        assert_eq!(rec.month_name(), "March");
        assert_eq!(rec.weekday, Weekday::Sun);
        assert_eq!(rec.weekday_name(), "Sunday");
        assert_eq!(rec.hour, 23);
    }

    #[test]
    fn schema_without_optional_columns_drops_values() {
        let mut raw = trip(2017, 1, 2, 8);
        raw.gender = Some("Male".to_string());
        raw.birth_year = Some(1985);
        let t = table(TripSchema::default(), vec![raw]);
        let rec = t.iter().next().expect("one row");
        assert_eq!(rec.gender, None);
        assert_eq!(rec.birth_year, None);
    }
}
