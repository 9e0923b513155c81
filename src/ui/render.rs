use std::fmt::Write as _;

use crate::data::model::{weekday_name, TripTable};
use crate::stats::duration::DurationStats;
use crate::stats::station::StationStats;
use crate::stats::time::TimeStats;
use crate::stats::user::UserStats;
use crate::stats::{CategoryCounts, FieldReport};

/// Printed between report sections.
pub const RULE: &str = "----------------------------------------";

const NO_DATA: &str = "No trips match the selected filters.\n";

// ---------------------------------------------------------------------------
// Report sections
// ---------------------------------------------------------------------------

pub fn time_section(stats: Option<&TimeStats>) -> String {
    let Some(stats) = stats else {
        return NO_DATA.to_string();
    };
    format!(
        "The month with the highest number of trips is {}.\n\
         Of all the days in a week, people most commonly traveled on {}.\n\
         Of all the hours in a day, people most commonly traveled in hour {}.\n",
        stats.month.value.name(),
        weekday_name(stats.weekday.value),
        stats.hour.value,
    )
}

pub fn station_section(stats: Option<&StationStats>) -> String {
    let Some(stats) = stats else {
        return NO_DATA.to_string();
    };
    let (from, to) = &stats.trip.value;
    format!(
        "The most commonly used start station is the {} station.\n\
         The most commonly used end station is the {} station.\n\
         \n\
         Trips are most frequently taken between the {from} station and the {to} station \
         ({} trips).\n",
        stats.start.value, stats.end.value, stats.trip.count,
    )
}

pub fn duration_section(stats: &DurationStats) -> String {
    let Some(mean) = stats.mean_seconds else {
        return NO_DATA.to_string();
    };
    format!(
        "The total travel time is {} seconds ({}).\n\
         The average travel time is {} seconds ({}).\n",
        format_seconds(stats.total_seconds),
        humanize(stats.total_seconds),
        format_seconds(mean),
        humanize(mean),
    )
}

/// `trips` is the size of the table the stats came from; only an empty
/// table is reported as "no data".
pub fn user_section(stats: &UserStats, trips: usize) -> String {
    if trips == 0 {
        return NO_DATA.to_string();
    }
    let mut text = String::new();
    if stats.user_types.is_empty() {
        text.push_str("No user type data for the selected trips.\n");
    } else {
        let _ = writeln!(
            text,
            "Bike service users consist of {}.",
            list_counts(&stats.user_types)
        );
    }

    match &stats.gender {
        FieldReport::Available(counts) => {
            let _ = writeln!(text, "By gender, users consist of {}.", list_counts(counts));
        }
        FieldReport::Empty => text.push_str("No gender data for the selected trips.\n"),
        FieldReport::Missing => text.push_str("Gender data is not available for this city.\n"),
    }

    match &stats.birth_year {
        FieldReport::Available(years) => {
            let _ = writeln!(text, "The earliest customer birth year is {}", years.earliest);
            let _ = writeln!(text, "The latest customer birth year is {}", years.latest);
            let _ = writeln!(text, "The most common customer birth year is {}", years.most_common);
        }
        FieldReport::Empty => text.push_str("No birth year data for the selected trips.\n"),
        FieldReport::Missing => {
            text.push_str("Birth year data is not available for this city.\n");
        }
    }
    text
}

/// "2 subscriber (66.7%), 1 customer (33.3%)" style listing, largest first.
fn list_counts(counts: &CategoryCounts) -> String {
    let total = counts.total().max(1) as f64;
    counts
        .iter()
        .map(|(label, n)| {
            let share = 100.0 * n as f64 / total;
            format!("{n} {} ({share:.1}%)", label.to_lowercase())
        })
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Number formatting
// ---------------------------------------------------------------------------

/// Whole numbers without a fraction, others to three decimals.
pub fn format_seconds(secs: f64) -> String {
    if secs.fract() == 0.0 {
        format!("{secs:.0}")
    } else {
        format!("{secs:.3}")
    }
}

/// Days / hours / minutes / seconds, largest unit first.
pub fn humanize(secs: f64) -> String {
    let total = secs.round().max(0.0) as u64;
    let (days, rem) = (total / 86_400, total % 86_400);
    let (hours, rem) = (rem / 3_600, rem % 3_600);
    let (minutes, seconds) = (rem / 60, rem % 60);

    let parts: Vec<String> = [(days, "d"), (hours, "h"), (minutes, "min")]
        .into_iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| format!("{n} {unit}"))
        .chain(std::iter::once(format!("{seconds} s")))
        .collect();
    parts.join(" ")
}

// ---------------------------------------------------------------------------
// Raw data preview
// ---------------------------------------------------------------------------

/// The given rows of `table` as a fixed-width listing, labelled by row number.
/// Out-of-range rows are skipped.
pub fn preview(table: &TripTable, rows: &[usize]) -> String {
    let schema = table.schema();
    let mut text = String::new();

    let _ = write!(
        text,
        "{:>7}  {:<19}  {:<9}  {:<9}  {:>10}  {:<32}  {:<32}  {:<10}",
        "#", "Start Time", "Month", "Day", "Duration", "Start Station", "End Station", "User Type"
    );
    if schema.has_gender {
        let _ = write!(text, "  {:<6}", "Gender");
    }
    if schema.has_birth_year {
        let _ = write!(text, "  {:>10}", "Birth Year");
    }
    text.push('\n');

    for &i in rows {
        let Some(trip) = table.records().get(i) else {
            continue;
        };
        let _ = write!(
            text,
            "{:>7}  {:<19}  {:<9}  {:<9}  {:>10}  {:<32}  {:<32}  {:<10}",
            i,
            trip.start_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            trip.month_name(),
            trip.weekday_name(),
            format_seconds(trip.duration),
            truncate(&trip.start_station, 32),
            truncate(&trip.end_station, 32),
            trip.user_type,
        );
        if schema.has_gender {
            let _ = write!(text, "  {:<6}", trip.gender.as_deref().unwrap_or("-"));
        }
        if schema.has_birth_year {
            let year = trip.birth_year.map_or_else(|| "-".to_string(), |y| y.to_string());
            let _ = write!(text, "  {year:>10}");
        }
        text.push('\n');
    }
    text
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut cut: String = s.chars().take(width - 1).collect();
        cut.push('…');
        cut
    }
}
