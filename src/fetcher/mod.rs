use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::PipelineError;
use crate::models::DataPoint;

pub mod fred;

/// Boundary to an upstream time-series provider.
///
/// `fetch_series` returns observations in `[start, end]`, ascending and
/// deduplicated, timestamps normalized to midnight UTC. A reachable source
/// with no data in range returns an empty vec; only transport/API failure is
/// `SourceUnavailable`.
#[async_trait]
pub trait DataSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_series(
        &self,
        series_id: &str,
        start: NaiveDate,
        end: DateTime<Utc>,
    ) -> Result<Vec<DataPoint>, PipelineError>;
}
