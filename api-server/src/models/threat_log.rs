//! Threat log model

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::types::Json;
use sqlx::{FromRow, Row, SqlitePool};

use crate::db::STORE_SCHEMA_VERSION;

pub const DEFAULT_LOG_LIMIT: i64 = 20;
pub const MAX_LOG_LIMIT: i64 = 500;

/// One stored verdict
#[derive(Debug, Clone, Serialize)]
pub struct ThreatLog {
    pub id: i64,
    pub scan_id: String,
    pub schema_version: i64,
    pub input_type: String,
    pub input_data: String,
    pub prediction: String,
    pub confidence_score: f64,
    pub model_reason: String,
    pub risk_indicators: Vec<String>,
    pub threat_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_length: Option<i64>,
    pub source_ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for ThreatLog {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let millis: i64 = row.try_get("timestamp")?;
        let timestamp = Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| sqlx::Error::Decode(format!("invalid timestamp {}", millis).into()))?;
        let Json(risk_indicators) = row.try_get::<Json<Vec<String>>, _>("risk_indicators")?;

        Ok(Self {
            id: row.try_get("id")?,
            scan_id: row.try_get("scan_id")?,
            schema_version: row.try_get("schema_version")?,
            input_type: row.try_get("input_type")?,
            input_data: row.try_get("input_data")?,
            prediction: row.try_get("prediction")?,
            confidence_score: row.try_get("confidence_score")?,
            model_reason: row.try_get("model_reason")?,
            risk_indicators,
            threat_level: row.try_get("threat_level")?,
            content_length: row.try_get("content_length")?,
            source_ip: row.try_get("source_ip")?,
            user_agent: row.try_get("user_agent")?,
            timestamp,
        })
    }
}

/// Entry about to be appended
#[derive(Debug, Clone)]
pub struct NewThreatLog {
    pub scan_id: String,
    pub input_type: String,
    pub input_data: String,
    pub prediction: String,
    pub confidence_score: f64,
    pub model_reason: String,
    pub risk_indicators: Vec<String>,
    pub threat_level: String,
    pub content_length: Option<i64>,
    pub source_ip: String,
    pub user_agent: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Default)]
pub struct LogFilter {
    pub limit: Option<i64>,
    pub threat_level: Option<String>,
}

impl LogFilter {
    /// Requested limit clamped to 1..=500
    pub fn effective_limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanDistribution {
    pub url_scans: i64,
    pub text_scans: i64,
    pub transaction_scans: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Analytics {
    pub total_scans: i64,
    pub phishing_detected: i64,
    pub fraud_detected: i64,
    pub high_threats: i64,
    pub recent_scans_24h: i64,
    pub recent_window_hours: i64,
    pub detection_rate: f64,
    pub scan_distribution: ScanDistribution,
}

/// Percentage rounded to two decimals; 0 when there is nothing to divide
pub fn detection_rate(detected: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    (detected as f64 / total as f64 * 10_000.0).round() / 100.0
}

impl ThreatLog {
    pub async fn insert(pool: &SqlitePool, entry: NewThreatLog) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO threat_logs (
                scan_id, schema_version, input_type, input_data, prediction,
                confidence_score, model_reason, risk_indicators, threat_level,
                content_length, source_ip, user_agent, timestamp
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.scan_id)
        .bind(STORE_SCHEMA_VERSION)
        .bind(&entry.input_type)
        .bind(&entry.input_data)
        .bind(&entry.prediction)
        .bind(entry.confidence_score)
        .bind(&entry.model_reason)
        .bind(Json(&entry.risk_indicators))
        .bind(&entry.threat_level)
        .bind(entry.content_length)
        .bind(&entry.source_ip)
        .bind(&entry.user_agent)
        .bind(entry.timestamp.timestamp_millis())
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Newest first; ties broken by insertion order
    pub async fn list(pool: &SqlitePool, filter: &LogFilter) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ThreatLog>(
            r#"
            SELECT * FROM threat_logs
            WHERE (?1 IS NULL OR threat_level = ?1)
            ORDER BY timestamp DESC, id DESC
            LIMIT ?2
            "#,
        )
        .bind(&filter.threat_level)
        .bind(filter.effective_limit())
        .fetch_all(pool)
        .await
    }

    pub async fn count(pool: &SqlitePool, threat_level: Option<&str>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM threat_logs WHERE (?1 IS NULL OR threat_level = ?1)")
            .bind(threat_level)
            .fetch_one(pool)
            .await
    }

    pub async fn analytics(pool: &SqlitePool, window_hours: i64) -> Result<Analytics, sqlx::Error> {
        let since = (Utc::now() - chrono::Duration::hours(window_hours)).timestamp_millis();

        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) as total,
                COUNT(*) FILTER (WHERE prediction = 'phishing') as phishing,
                COUNT(*) FILTER (WHERE prediction = 'fraud') as fraud,
                COUNT(*) FILTER (WHERE threat_level = 'high') as high,
                COUNT(*) FILTER (WHERE timestamp >= ?) as recent,
                COUNT(*) FILTER (WHERE input_type = 'url') as url_scans,
                COUNT(*) FILTER (WHERE input_type = 'text') as text_scans,
                COUNT(*) FILTER (WHERE input_type = 'transaction') as transaction_scans
            FROM threat_logs
            "#,
        )
        .bind(since)
        .fetch_one(pool)
        .await?;

        let total_scans: i64 = row.get("total");
        let phishing_detected: i64 = row.get("phishing");

        Ok(Analytics {
            total_scans,
            phishing_detected,
            fraud_detected: row.get("fraud"),
            high_threats: row.get("high"),
            recent_scans_24h: row.get("recent"),
            recent_window_hours: window_hours,
            detection_rate: detection_rate(phishing_detected, total_scans),
            scan_distribution: ScanDistribution {
                url_scans: row.get("url_scans"),
                text_scans: row.get("text_scans"),
                transaction_scans: row.get("transaction_scans"),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn store() -> SqlitePool {
        let pool = db::create_pool("sqlite::memory:").await.unwrap();
        db::run_migrations(&pool).await.unwrap();
        pool
    }

    fn entry(input_type: &str, prediction: &str, threat_level: &str, timestamp: DateTime<Utc>) -> NewThreatLog {
        NewThreatLog {
            scan_id: uuid::Uuid::new_v4().to_string(),
            input_type: input_type.to_string(),
            input_data: "http://example.com".to_string(),
            prediction: prediction.to_string(),
            confidence_score: 0.9,
            model_reason: "test".to_string(),
            risk_indicators: vec!["URL shortener detected".to_string()],
            threat_level: threat_level.to_string(),
            content_length: None,
            source_ip: "unknown".to_string(),
            user_agent: None,
            timestamp,
        }
    }

    #[test]
    fn test_detection_rate() {
        assert_eq!(detection_rate(0, 0), 0.0);
        assert_eq!(detection_rate(1, 3), 33.33);
        assert_eq!(detection_rate(2, 3), 66.67);
        assert_eq!(detection_rate(5, 5), 100.0);
    }

    #[test]
    fn test_limit_clamped() {
        let filter = |limit| LogFilter { limit, threat_level: None };
        assert_eq!(filter(None).effective_limit(), 20);
        assert_eq!(filter(Some(0)).effective_limit(), 1);
        assert_eq!(filter(Some(10_000)).effective_limit(), 500);
    }

    #[tokio::test]
    async fn test_insert_and_list_newest_first() {
        let pool = store().await;
        let now = Utc::now();
        ThreatLog::insert(&pool, entry("url", "benign", "low", now - chrono::Duration::minutes(5)))
            .await
            .unwrap();
        let newest = ThreatLog::insert(&pool, entry("url", "phishing", "high", now)).await.unwrap();

        let logs = ThreatLog::list(&pool, &LogFilter::default()).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].id, newest);
        assert_eq!(logs[0].risk_indicators, vec!["URL shortener detected"]);
        assert_eq!(logs[0].schema_version, STORE_SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn test_filter_by_threat_level() {
        let pool = store().await;
        let now = Utc::now();
        for level in ["low", "high", "medium", "high"] {
            ThreatLog::insert(&pool, entry("text", "phishing", level, now)).await.unwrap();
        }

        let filter = LogFilter {
            limit: None,
            threat_level: Some("high".to_string()),
        };
        let logs = ThreatLog::list(&pool, &filter).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().all(|l| l.threat_level == "high"));
        assert_eq!(ThreatLog::count(&pool, Some("high")).await.unwrap(), 2);
        assert_eq!(ThreatLog::count(&pool, None).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_analytics_counts() {
        let pool = store().await;
        let now = Utc::now();
        ThreatLog::insert(&pool, entry("url", "phishing", "high", now)).await.unwrap();
        ThreatLog::insert(&pool, entry("text", "benign", "low", now)).await.unwrap();
        ThreatLog::insert(&pool, entry("transaction", "fraud", "high", now)).await.unwrap();
        ThreatLog::insert(&pool, entry("url", "benign", "low", now - chrono::Duration::days(3)))
            .await
            .unwrap();

        let analytics = ThreatLog::analytics(&pool, 24).await.unwrap();
        assert_eq!(analytics.total_scans, 4);
        assert_eq!(analytics.phishing_detected, 1);
        assert_eq!(analytics.fraud_detected, 1);
        assert_eq!(analytics.high_threats, 2);
        assert_eq!(analytics.recent_scans_24h, 3);
        assert_eq!(analytics.detection_rate, 25.0);
        assert_eq!(
            analytics.scan_distribution,
            ScanDistribution {
                url_scans: 2,
                text_scans: 1,
                transaction_scans: 1
            }
        );
    }

    #[tokio::test]
    async fn test_empty_store_analytics() {
        let pool = store().await;
        let analytics = ThreatLog::analytics(&pool, 24).await.unwrap();
        assert_eq!(analytics.total_scans, 0);
        assert_eq!(analytics.detection_rate, 0.0);
    }
}
