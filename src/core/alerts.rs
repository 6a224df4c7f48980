use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::config::Config;
use crate::db;
use crate::indicators::{IndicatorSpec, Registry};
use crate::models::{BreachDirection, DataPoint};
use crate::notify::{escape_html, Notifier};

// Alert conditions, checked per indicator on every run:
// 1. New data (latest observation date moved past the persisted marker)
// 2. Staleness (latest observation older than STALE_DAYS)
// 3. Threshold breach (latest raw value beyond the configured level)

fn format_value(spec: &IndicatorSpec, value: f64) -> String {
    match spec.unit {
        "bps" => format!("{:.0} bps", value),
        "%" => format!("{:.2}%", value),
        _ => format!("{:.2}", value),
    }
}

/// Alert lines for one indicator's latest observation. Pure so the
/// conditions can be tested without a store or a live clock.
pub fn evaluate(
    spec: &IndicatorSpec,
    threshold: f64,
    latest: &DataPoint,
    last_seen: Option<NaiveDate>,
    stale_days: i64,
    now: DateTime<Utc>,
) -> Vec<String> {
    let mut lines = Vec::new();
    let latest_date = latest.timestamp.date_naive();

    if last_seen != Some(latest_date) {
        lines.push(format!(
            "🆕 New {} data ({}): {}",
            spec.name,
            latest_date,
            format_value(spec, latest.value)
        ));
    }

    if (now.date_naive() - latest_date).num_days() > stale_days {
        lines.push(format!(
            "⚠️ {} data is stale (latest: {})",
            spec.name, latest_date
        ));
    }

    if spec.direction.is_breach(latest.value, threshold) {
        let icon = match spec.direction {
            BreachDirection::Above => "🚨",
            BreachDirection::Below => "📉",
        };
        lines.push(format!(
            "{} {} breach: {} ({} {})",
            icon,
            spec.name,
            format_value(spec, latest.value),
            spec.direction.symbol(),
            format_value(spec, threshold)
        ));
    }

    lines
}

/// Checks every indicator's latest reading, persists the new last-seen
/// markers, and pushes the resulting alert lines through the notifier.
/// Returns the lines so callers can log or display them.
pub async fn check_and_send_alerts(
    pool: &SqlitePool,
    notifier: Option<&dyn Notifier>,
    cfg: &Config,
    series: &[(String, Vec<DataPoint>)],
    now: DateTime<Utc>,
) -> Result<Vec<String>> {
    let mut all_lines = Vec::new();

    for (slug, points) in series {
        let spec = match Registry::get(slug) {
            Some(spec) => spec,
            None => continue,
        };
        let latest = match points.last() {
            Some(dp) => dp,
            None => {
                info!(slug = %slug, "no data, skipping alert checks");
                continue;
            }
        };
        let threshold = match cfg.threshold(slug) {
            Some(t) => t,
            None => continue,
        };

        let last_seen = db::get_last_seen(pool, slug).await?;
        let lines = evaluate(spec, threshold, latest, last_seen, cfg.stale_days, now);

        let latest_date = latest.timestamp.date_naive();
        if last_seen != Some(latest_date) {
            db::save_last_seen(pool, slug, latest_date).await?;
        }

        all_lines.extend(lines);
    }

    if let Some(notifier) = notifier {
        for line in &all_lines {
            if let Err(e) = notifier.send(&escape_html(line)).await {
                warn!("{} send failed: {}", notifier.name(), e);
            }
        }
    }

    Ok(all_lines)
}

/// Latest value per indicator, formatted as the Telegram summary message.
/// Returns `None` when no indicator has any data to report.
pub fn build_summary(series: &[(String, Vec<DataPoint>)], now: DateTime<Utc>) -> Option<String> {
    let mut body = Vec::new();

    for (slug, points) in series {
        let spec = match Registry::get(slug) {
            Some(spec) => spec,
            None => continue,
        };
        if let Some(latest) = points.last() {
            // Escaped here so the message is safe to send with the literal
            // <b> markup of the header intact.
            body.push(escape_html(&format!(
                "• {}: {}",
                spec.name,
                format_value(spec, latest.value)
            )));
        }
    }

    if body.is_empty() {
        return None;
    }

    let mut msg = format!(
        "📊 <b>Credit Dashboard Update ({})</b>\n",
        now.format("%Y-%m-%d %H:%M")
    );
    msg.push_str(&body.join("\n"));
    Some(msg)
}
