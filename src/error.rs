use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failure modes of the fetch/merge/normalize pipeline.
///
/// Empty fetch results and empty tables are NOT errors — they flow through
/// the pipeline as valid "nothing to show" states. These variants cover the
/// conditions that cannot be represented by data alone.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The upstream source for an indicator could not be reached at all.
    /// Recoverable at the merge boundary: the indicator degrades to an
    /// all-absent column and the remaining columns proceed.
    #[error("source unavailable for '{series}': {reason}")]
    SourceUnavailable { series: String, reason: String },

    /// A series carries timestamps off the shared midnight-UTC day calendar.
    /// Merging such a series would silently misalign every join, so it is
    /// rejected up front.
    #[error("series '{series}' is off the daily UTC calendar (first offender: {timestamp})")]
    SourceMisaligned {
        series: String,
        timestamp: DateTime<Utc>,
    },

    /// Normalization or threshold projection was attempted on a column whose
    /// statistics are undefined (fewer than 2 usable observations, or zero
    /// standard deviation). Surfaced instead of producing NaN/infinity so
    /// the caller can pick a fallback presentation.
    #[error("column '{column}' has degenerate statistics ({observations} usable observations)")]
    DegenerateColumn { column: String, observations: usize },
}
