//! Database module - SQLite connection and schema

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

/// Version of the log store layout, recorded in `schema_meta` and on each row
pub const STORE_SCHEMA_VERSION: i64 = 1;

/// Create database connection pool
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let in_memory = database_url.contains(":memory:");
    let mut options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    if !in_memory {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    // Every connection to an in-memory database is a separate database
    let mut pool = SqlitePoolOptions::new().max_connections(if in_memory { 1 } else { 5 });
    if in_memory {
        pool = pool.idle_timeout(None).max_lifetime(None);
    }
    pool.connect_with(options)
        .await
}

/// Run database migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;

    sqlx::query("INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('store_schema_version', ?)")
        .bind(STORE_SCHEMA_VERSION.to_string())
        .execute(pool)
        .await?;

    tracing::info!("Database schema applied successfully (v{})", STORE_SCHEMA_VERSION);
    Ok(())
}

/// Connect and migrate; any failure leaves the store unavailable
pub async fn connect(database_url: &str) -> Option<SqlitePool> {
    let pool = match create_pool(database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!("Database connection failed: {}. Continuing without log storage", e);
            return None;
        }
    };

    match run_migrations(&pool).await {
        Ok(()) => Some(pool),
        Err(e) => {
            tracing::warn!("Database migration failed: {}. Continuing without log storage", e);
            None
        }
    }
}

/// Stored schema version, if the store is reachable
pub async fn schema_version(pool: &SqlitePool) -> Result<Option<i64>, sqlx::Error> {
    let value: Option<String> =
        sqlx::query_scalar("SELECT value FROM schema_meta WHERE key = 'store_schema_version'")
            .fetch_optional(pool)
            .await?;
    Ok(value.and_then(|v| v.parse().ok()))
}

pub async fn ping(pool: &SqlitePool) -> bool {
    sqlx::query("SELECT 1").execute(pool).await.is_ok()
}

/// Database schema SQL
const SCHEMA_SQL: &str = r#"
-- Store metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Threat logs (append-only)
CREATE TABLE IF NOT EXISTS threat_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    scan_id TEXT NOT NULL,
    schema_version INTEGER NOT NULL,
    input_type TEXT NOT NULL,
    input_data TEXT NOT NULL,
    prediction TEXT NOT NULL,
    confidence_score REAL NOT NULL,
    model_reason TEXT NOT NULL,
    risk_indicators TEXT NOT NULL DEFAULT '[]',
    threat_level TEXT NOT NULL,
    content_length INTEGER,
    source_ip TEXT NOT NULL,
    user_agent TEXT,
    timestamp INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_threat_logs_timestamp ON threat_logs(timestamp);
CREATE INDEX IF NOT EXISTS idx_threat_logs_threat_level ON threat_logs(threat_level);
CREATE INDEX IF NOT EXISTS idx_threat_logs_input_type ON threat_logs(input_type);
"#;
