use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::table::MergedTable;
use crate::error::PipelineError;

/// Mean and sample standard deviation of a column, computed over the
/// non-absent values in the current window. Window-local by design: the
/// same pair must be used for both the data and its threshold projection.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ColumnStats {
    pub mean: f64,
    pub std_dev: f64,
}

impl ColumnStats {
    pub fn zscore(&self, value: f64) -> f64 {
        (value - self.mean) / self.std_dev
    }
}

/// Mean/stddev of a column's non-absent values.
///
/// Signals `DegenerateColumn` instead of returning NaN or a zero divisor
/// when fewer than 2 usable observations exist or all values are identical.
pub fn column_stats(column: &str, values: &[Option<f64>]) -> Result<ColumnStats, PipelineError> {
    let present: Vec<f64> = values.iter().filter_map(|v| *v).collect();
    let n = present.len();
    if n < 2 {
        return Err(PipelineError::DegenerateColumn {
            column: column.to_string(),
            observations: n,
        });
    }

    let mean = present.iter().sum::<f64>() / n as f64;
    let variance = present
        .iter()
        .map(|value| {
            let diff = mean - *value;
            diff * diff
        })
        .sum::<f64>()
        / (n - 1) as f64;
    let std_dev = variance.sqrt();

    if std_dev == 0.0 || !std_dev.is_finite() {
        return Err(PipelineError::DegenerateColumn {
            column: column.to_string(),
            observations: n,
        });
    }

    Ok(ColumnStats { mean, std_dev })
}

/// Replaces each requested column's values with z-scores and returns the
/// per-column stats alongside, so callers can project absolute thresholds
/// into the same coordinate space.
///
/// The output table contains only the requested columns, in request order.
/// Any degenerate column fails the whole call; callers wanting per-column
/// degradation filter with `column_stats` first.
pub fn normalize(
    table: &MergedTable,
    columns: &[&str],
) -> Result<(MergedTable, BTreeMap<String, ColumnStats>), PipelineError> {
    let mut stats = BTreeMap::new();
    let mut names = Vec::with_capacity(columns.len());
    let mut values = Vec::with_capacity(columns.len());

    for name in columns {
        let raw = table
            .column(name)
            .ok_or_else(|| PipelineError::DegenerateColumn {
                column: name.to_string(),
                observations: 0,
            })?;
        let col_stats = column_stats(name, raw)?;

        values.push(raw.iter().map(|v| v.map(|v| col_stats.zscore(v))).collect());
        names.push(name.to_string());
        stats.insert(name.to_string(), col_stats);
    }

    let normalized = MergedTable::from_parts(names, table.index().to_vec(), values);
    Ok((normalized, stats))
}

/// Projects an absolute alert threshold into z-score space using the stats
/// of the window being displayed. Guards against a degenerate divisor even
/// though `column_stats` never produces one.
pub fn project_threshold(
    column: &str,
    raw_threshold: f64,
    stats: &ColumnStats,
) -> Result<f64, PipelineError> {
    if stats.std_dev == 0.0 || !stats.std_dev.is_finite() {
        return Err(PipelineError::DegenerateColumn {
            column: column.to_string(),
            observations: 0,
        });
    }
    Ok(stats.zscore(raw_threshold))
}
