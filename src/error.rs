use thiserror::Error;

/// Domain failures surfaced by loading and filter parsing.
///
/// These travel inside `anyhow::Error`; callers that need to react to a
/// specific kind use `err.downcast_ref::<ExploreError>()`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExploreError {
    #[error("unknown city '{0}' (expected chicago, new york city or washington)")]
    UnknownCity(String),

    #[error("unknown month '{0}' (expected all or january through june)")]
    UnknownMonth(String),

    #[error("unknown day '{0}' (expected all or monday through sunday)")]
    UnknownDay(String),

    #[error("row {row}: malformed start time '{value}'")]
    MalformedTimestamp { row: usize, value: String },

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),
}
