use std::collections::BTreeMap;
use std::env;

use chrono::NaiveDate;
use tracing::warn;

use crate::indicators::Registry;

/// Monitor configuration, resolved once at startup from the environment
/// (`.env` via dotenvy) and passed explicitly to every stage that needs it.
#[derive(Debug, Clone)]
pub struct Config {
    pub fred_api_key: String,
    pub telegram_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    /// First observation date requested from FRED.
    pub start_date: NaiveDate,
    /// Trailing window shown on the dashboard, in days.
    pub retention_days: i64,
    /// A series whose latest observation is older than this is stale.
    pub stale_days: i64,
    /// Resolved alert threshold per indicator slug (env override or default).
    pub thresholds: BTreeMap<String, f64>,
    pub db_path: String,
}

fn env_str(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_i64(name: &str, default: i64) -> i64 {
    match env_str(name) {
        Some(s) => match s.parse() {
            Ok(v) => v,
            Err(_) => {
                warn!("ignoring unparseable {}='{}', using default {}", name, s, default);
                default
            }
        },
        None => default,
    }
}

fn env_f64(name: &str) -> Option<f64> {
    env_str(name).and_then(|s| s.parse().ok())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let fred_api_key = env_str("FRED_API_KEY")
            .ok_or_else(|| anyhow::anyhow!("FRED_API_KEY is missing from the environment"))?;

        let start_date = match env_str("START_DATE") {
            Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .map_err(|e| anyhow::anyhow!("invalid START_DATE '{}': {}", s, e))?,
            None => NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
        };

        let mut thresholds = BTreeMap::new();
        for spec in Registry::all() {
            let value = env_f64(spec.threshold_env).unwrap_or(spec.default_threshold);
            thresholds.insert(spec.slug.to_string(), value);
        }

        Ok(Self {
            fred_api_key,
            telegram_token: env_str("TELEGRAM_TOKEN"),
            telegram_chat_id: env_str("TELEGRAM_CHAT_ID"),
            start_date,
            retention_days: env_i64("RETENTION_DAYS", 730),
            stale_days: env_i64("STALE_DAYS", 90),
            thresholds,
            db_path: env_str("MONITOR_DB_PATH").unwrap_or_else(|| "credit_monitor.db".to_string()),
        })
    }

    pub fn threshold(&self, slug: &str) -> Option<f64> {
        self.thresholds.get(slug).copied()
    }

    /// Config with registry defaults and no credentials, for tests and
    /// offline runs.
    pub fn defaults() -> Self {
        let thresholds = Registry::all()
            .iter()
            .map(|s| (s.slug.to_string(), s.default_threshold))
            .collect();
        Config {
            fred_api_key: String::new(),
            telegram_token: None,
            telegram_chat_id: None,
            start_date: NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
            retention_days: 730,
            stale_days: 90,
            thresholds,
            db_path: ":memory:".to_string(),
        }
    }
}
