use anyhow::Result;
use chrono::NaiveDate;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::info;

/// Opens (or creates) the monitor's SQLite store. The only persisted state
/// is a key/value settings table holding the last-seen observation date per
/// indicator; the pipeline itself is stateless.
pub async fn init(db_path: &str) -> Result<SqlitePool> {
    // An in-memory SQLite DB is per-connection, so it must not be pooled.
    let (database_url, max_connections) = if db_path == ":memory:" {
        ("sqlite::memory:".to_string(), 1)
    } else {
        (format!("sqlite://{}?mode=rwc", db_path), 5)
    };

    info!(%database_url, "connecting to SQLite store");

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(&database_url)
        .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(&pool)
    .await?;

    Ok(pool)
}

pub async fn save_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES ($1, $2)
         ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = CURRENT_TIMESTAMP",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_setting(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let row = sqlx::query("SELECT value FROM settings WHERE key = $1")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    Ok(row.and_then(|r| r.try_get("value").ok()))
}

fn last_seen_key(slug: &str) -> String {
    format!("LAST_SEEN_{}", slug)
}

pub async fn get_last_seen(pool: &SqlitePool, slug: &str) -> Result<Option<NaiveDate>> {
    let value = get_setting(pool, &last_seen_key(slug)).await?;
    Ok(value.and_then(|v| NaiveDate::parse_from_str(&v, "%Y-%m-%d").ok()))
}

pub async fn save_last_seen(pool: &SqlitePool, slug: &str, date: NaiveDate) -> Result<()> {
    save_setting(pool, &last_seen_key(slug), &date.format("%Y-%m-%d").to_string()).await
}
