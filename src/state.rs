use anyhow::Result;

use crate::config::ExplorerConfig;
use crate::data::filter::{filter, filtered_indices, FilterSelection};
use crate::data::loader;
use crate::data::model::{City, TripTable};
use crate::stats::TripReport;

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// One exploration pass: a loaded city and the current filter selection.
#[derive(Debug, Clone)]
pub struct Session {
    pub city: City,
    pub selection: FilterSelection,

    /// Everything the source held.
    pub trips: TripTable,

    /// `trips` after applying `selection` (cached).
    pub filtered: TripTable,
}

impl Session {
    /// Load `city` through the configuration and apply `selection`.
    pub fn open(config: &ExplorerConfig, city: City, selection: FilterSelection) -> Result<Self> {
        let trips = loader::load(config, city)?;
        Ok(Self::from_table(city, trips, selection))
    }

    pub fn from_table(city: City, trips: TripTable, selection: FilterSelection) -> Self {
        let filtered = filter(&trips, &selection);
        Self {
            city,
            selection,
            trips,
            filtered,
        }
    }

    /// Positions in `trips` of the rows that make up `filtered`.
    pub fn matching_rows(&self) -> Vec<usize> {
        filtered_indices(&self.trips, &self.selection)
    }

    pub fn report(&self) -> TripReport {
        TripReport::compute(&self.filtered)
    }
}
