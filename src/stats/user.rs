use serde::Serialize;

use super::{most_common, CategoryCounts, FieldReport};
use crate::data::model::TripTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BirthYearStats {
    pub earliest: i32,
    pub latest: i32,
    pub most_common: i32,
}

/// Statistics on bikeshare users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub user_types: CategoryCounts,
    pub gender: FieldReport<CategoryCounts>,
    pub birth_year: FieldReport<BirthYearStats>,
}

pub fn user_stats(table: &TripTable) -> UserStats {
    let schema = table.schema();

    let user_types = CategoryCounts::from_labels(table.iter().map(|t| t.user_type.as_str()));

    let gender = if schema.has_gender {
        let counts =
            CategoryCounts::from_labels(table.iter().filter_map(|t| t.gender.as_deref()));
        if counts.is_empty() {
            FieldReport::Empty
        } else {
            FieldReport::Available(counts)
        }
    } else {
        FieldReport::Missing
    };

    let birth_year = if schema.has_birth_year {
        birth_year_stats(table).map_or(FieldReport::Empty, FieldReport::Available)
    } else {
        FieldReport::Missing
    };

    UserStats {
        user_types,
        gender,
        birth_year,
    }
}

fn birth_year_stats(table: &TripTable) -> Option<BirthYearStats> {
    let years = || table.iter().filter_map(|t| t.birth_year);
    Some(BirthYearStats {
        earliest: years().min()?,
        latest: years().max()?,
        most_common: most_common(years())?.value,
    })
}
