/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse rows, derive month / weekday / hour → TripTable
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ TripTable  │  Vec<Arc<TripRecord>>, TripSchema
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  month / weekday predicates → filtered TripTable
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
