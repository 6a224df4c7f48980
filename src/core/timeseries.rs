use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Timelike, Utc};

use crate::core::table::MergedTable;
use crate::error::PipelineError;
use crate::models::DataPoint;

/// Merges independently-sampled series onto the sorted union of their
/// timestamps (outer join) and forward-fills each column.
///
/// Financial series arrive at different native frequencies (monthly credit
/// data vs daily spreads), so a lower-frequency column keeps its last known
/// value across the higher-frequency rows. Rows before a column's first
/// observation stay absent. All-empty input produces an empty table with the
/// declared columns, not an error.
pub fn merge(columns: &[(String, Vec<DataPoint>)]) -> Result<MergedTable, PipelineError> {
    for (name, series) in columns {
        validate_calendar(name, series)?;
    }

    let mut all_timestamps: BTreeSet<DateTime<Utc>> = BTreeSet::new();
    for (_, series) in columns {
        for dp in series {
            all_timestamps.insert(dp.timestamp);
        }
    }
    let index: Vec<DateTime<Utc>> = all_timestamps.into_iter().collect();

    let mut values = Vec::with_capacity(columns.len());
    for (_, series) in columns {
        // BTreeMap dedupes repeated timestamps (last observation wins) and
        // gives sorted lookup regardless of input order.
        let by_ts: BTreeMap<DateTime<Utc>, f64> = series
            .iter()
            .map(|dp| (dp.timestamp, dp.value))
            .collect();

        let mut column = Vec::with_capacity(index.len());
        let mut last: Option<f64> = None;
        for ts in &index {
            match by_ts.get(ts) {
                // NaN observations count as absent, so they neither emit
                // nor overwrite the carried value.
                Some(v) if v.is_finite() => last = Some(*v),
                _ => {}
            }
            column.push(last);
        }
        values.push(column);
    }

    let names = columns.iter().map(|(name, _)| name.clone()).collect();
    Ok(MergedTable::from_parts(names, index, values))
}

/// The merge's join is only meaningful if every series shares the
/// midnight-UTC day convention the fetchers normalize to.
fn validate_calendar(name: &str, series: &[DataPoint]) -> Result<(), PipelineError> {
    for dp in series {
        if dp.timestamp.time().num_seconds_from_midnight() != 0
            || dp.timestamp.time().nanosecond() != 0
        {
            return Err(PipelineError::SourceMisaligned {
                series: name.to_string(),
                timestamp: dp.timestamp,
            });
        }
    }
    Ok(())
}
