use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use credit_monitor::config::Config;
use credit_monitor::core::{alerts, orchestrator};
use credit_monitor::db;
use credit_monitor::fetcher::fred::FredFetcher;
use credit_monitor::fetcher::DataSource;
use credit_monitor::notify::telegram::TelegramNotifier;
use credit_monitor::notify::Notifier;

/// One refresh cycle: fetch, build the dashboard payload, run alert checks,
/// optionally push the Telegram summary. Scheduling is left to the operator
/// (cron or a timer around this binary).
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let _ = dotenvy::dotenv();
    let cfg = Config::from_env()?;
    let send_summary = std::env::args().any(|a| a == "--send-summary");

    let pool = db::init(&cfg.db_path).await?;

    let notifier: Option<Box<dyn Notifier>> =
        match (cfg.telegram_token.clone(), cfg.telegram_chat_id.clone()) {
            (Some(token), Some(chat_id)) => Some(Box::new(TelegramNotifier::new(token, chat_id))),
            _ => {
                info!("telegram credentials missing, alerts will only be logged");
                None
            }
        };

    let now = Utc::now();
    let source: Arc<dyn DataSource> = Arc::new(FredFetcher::new(cfg.fred_api_key.clone()));

    let series = orchestrator::fetch_indicators(source, &cfg, now).await;
    let dashboard = orchestrator::build_dashboard(&series, &cfg, now)?;

    info!(
        rows = dashboard.rows.len(),
        markers = dashboard.markers.len(),
        degenerate = dashboard.degenerate.len(),
        "dashboard built"
    );
    println!("{}", serde_json::to_string_pretty(&dashboard)?);

    let lines = alerts::check_and_send_alerts(&pool, notifier.as_deref(), &cfg, &series, now).await?;
    for line in &lines {
        info!("alert: {}", line);
    }

    if send_summary {
        // The summary's body lines are escaped by build_summary; only the
        // header's <b> markup is literal.
        match alerts::build_summary(&series, now) {
            Some(summary) => match &notifier {
                Some(n) => {
                    if let Err(e) = n.send(&summary).await {
                        warn!("summary send failed: {}", e);
                    } else {
                        info!("summary sent via {}", n.name());
                    }
                }
                None => warn!("--send-summary requested but no notifier is configured"),
            },
            None => warn!("no data available, skipping summary"),
        }
    }

    Ok(())
}
