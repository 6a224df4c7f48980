use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::analysis::statistics::{self, ColumnStats};
use crate::config::Config;
use crate::core::table::MergedTable;
use crate::core::timeseries;
use crate::error::PipelineError;
use crate::fetcher::DataSource;
use crate::indicators::Registry;
use crate::models::{DataPoint, ThresholdMarker};

/// Complete dashboard payload for one refresh cycle. Built from scratch on
/// every refresh and handed to the presentation layer as a single value, so
/// overlapping refreshes can never interleave partial results.
#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub generated_at: DateTime<Utc>,
    /// Slugs of the columns present in `rows`, in display order.
    pub columns: Vec<String>,
    /// Z-score rows of the trailing window.
    pub rows: Vec<DashboardRow>,
    /// Alert thresholds projected into the same z-score space as `rows`.
    pub markers: Vec<ThresholdMarker>,
    /// Last raw readings per indicator for the summary table.
    pub latest: Vec<LatestReading>,
    /// Columns omitted from the normalized view because their window
    /// statistics are undefined.
    pub degenerate: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DashboardRow {
    pub timestamp: DateTime<Utc>,
    /// One optional z-score per entry of `Dashboard::columns`.
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Serialize)]
pub struct LatestReading {
    pub slug: String,
    pub name: String,
    pub date: String,
    pub value: f64,
}

/// Fetches every registered indicator concurrently, applying each
/// indicator's unit scale. An unavailable source degrades to an empty
/// series so the merge can proceed with the remaining columns.
pub async fn fetch_indicators(
    source: Arc<dyn DataSource>,
    cfg: &Config,
    now: DateTime<Utc>,
) -> Vec<(String, Vec<DataPoint>)> {
    let mut set = JoinSet::new();

    for (pos, spec) in Registry::all().iter().enumerate() {
        let source = Arc::clone(&source);
        let start = cfg.start_date;
        set.spawn(async move {
            let result = source.fetch_series(spec.series_id, start, now).await;
            (pos, spec, result)
        });
    }

    let mut columns: Vec<Option<(String, Vec<DataPoint>)>> =
        (0..Registry::all().len()).map(|_| None).collect();

    while let Some(joined) = set.join_next().await {
        let (pos, spec, result) = match joined {
            Ok(v) => v,
            Err(e) => {
                warn!("fetch task panicked: {}", e);
                continue;
            }
        };

        let points = match result {
            Ok(mut points) => {
                if spec.scale != 1.0 {
                    for dp in &mut points {
                        dp.value *= spec.scale;
                    }
                }
                info!(slug = spec.slug, points = points.len(), "fetched indicator");
                points
            }
            Err(e) => {
                warn!(slug = spec.slug, "fetch failed, degrading to empty column: {}", e);
                Vec::new()
            }
        };

        columns[pos] = Some((spec.slug.to_string(), points));
    }

    columns.into_iter().flatten().collect()
}

/// Runs merge → window → normalize → threshold projection over freshly
/// fetched series and assembles the dashboard payload.
///
/// Degenerate columns are dropped from the normalized view (and listed), not
/// fatal; an entirely empty merge produces an empty dashboard.
pub fn build_dashboard(
    series: &[(String, Vec<DataPoint>)],
    cfg: &Config,
    now: DateTime<Utc>,
) -> Result<Dashboard, PipelineError> {
    let merged = timeseries::merge(series)?;
    let windowed = merged.window(Duration::days(cfg.retention_days));

    // Split columns into plottable and degenerate before normalizing, so one
    // flat series does not take the whole chart down.
    let mut plottable: Vec<&str> = Vec::new();
    let mut degenerate: Vec<String> = Vec::new();
    for name in windowed.columns() {
        let values = windowed.column(name).unwrap_or(&[]);
        match statistics::column_stats(name, values) {
            Ok(_) => plottable.push(name),
            Err(e) => {
                warn!(column = %name, "excluded from normalized view: {}", e);
                degenerate.push(name.clone());
            }
        }
    }

    let (normalized, stats) = if plottable.is_empty() {
        (MergedTable::empty(Vec::new()), Default::default())
    } else {
        statistics::normalize(&windowed, &plottable)?
    };

    let markers = build_markers(cfg, &stats)?;
    let latest = latest_readings(&windowed);

    let rows = normalized
        .index()
        .iter()
        .enumerate()
        .map(|(row, ts)| DashboardRow {
            timestamp: *ts,
            values: normalized
                .columns()
                .iter()
                .map(|name| normalized.column(name).unwrap()[row])
                .collect(),
        })
        .collect();

    Ok(Dashboard {
        generated_at: now,
        columns: normalized.columns().to_vec(),
        rows,
        markers,
        latest,
        degenerate,
    })
}

fn build_markers(
    cfg: &Config,
    stats: &std::collections::BTreeMap<String, ColumnStats>,
) -> Result<Vec<ThresholdMarker>, PipelineError> {
    let mut markers = Vec::new();

    for spec in Registry::all() {
        let col_stats = match stats.get(spec.slug) {
            Some(s) => s,
            None => continue,
        };
        let raw = match cfg.threshold(spec.slug) {
            Some(t) => t,
            None => continue,
        };

        let projected = statistics::project_threshold(spec.slug, raw, col_stats)?;
        markers.push(ThresholdMarker {
            slug: spec.slug.to_string(),
            name: spec.name.to_string(),
            direction: spec.direction,
            value: projected,
            label: format!(
                "{} {} {} {} (z={:.2})",
                spec.name,
                spec.direction.symbol(),
                raw,
                spec.unit,
                projected
            ),
        });
    }

    Ok(markers)
}

/// Last 3 raw observations per indicator, for the "Latest Readings" table.
fn latest_readings(windowed: &MergedTable) -> Vec<LatestReading> {
    let mut out = Vec::new();
    for name in windowed.columns() {
        let display = Registry::get(name).map(|s| s.name).unwrap_or(name);
        for (ts, value) in windowed.tail_of(name, 3) {
            out.push(LatestReading {
                slug: name.clone(),
                name: display.to_string(),
                date: ts.format("%Y-%m-%d").to_string(),
                value: (value * 100.0).round() / 100.0,
            });
        }
    }
    out
}
