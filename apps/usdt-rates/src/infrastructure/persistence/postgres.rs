//! PostgreSQL rate storage.
//!
//! Uses `PostgreSQL` via `SQLx`. The pool connects lazily, so an unreachable
//! database surfaces as a per-request storage error instead of a startup
//! failure.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use tracing::{debug, info};

use crate::application::ports::{PersistenceAdapter, PersistenceError};
use crate::domain::rate::{CurrencyRate, RateId, RateRecord};
use crate::infrastructure::config::DatabaseSettings;

/// [`PersistenceAdapter`] over a `currency_rates` table.
#[derive(Debug, Clone)]
pub struct PostgresRateAdapter {
    pool: PgPool,
}

impl PostgresRateAdapter {
    /// Build a lazily connected pool from settings.
    ///
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn connect_lazy(settings: &DatabaseSettings) -> Self {
        let options = PgConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .password(&settings.password)
            .database(&settings.database)
            .ssl_mode(PgSslMode::Disable);

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .connect_lazy_with(options);

        Self { pool }
    }

    /// Underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded schema migrations.
    pub async fn run_migrations(&self) -> Result<(), PersistenceError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| PersistenceError::Connection(e.to_string()))?;

        info!("Database migrations applied");
        Ok(())
    }
}

#[async_trait]
impl PersistenceAdapter for PostgresRateAdapter {
    async fn create(&self, rate: &CurrencyRate) -> Result<RateId, PersistenceError> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO currency_rates (pair, ask_price, bid_price, "timestamp")
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(rate.pair())
        .bind(rate.ask_price())
        .bind(rate.bid_price())
        .bind(rate.timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!(id, pair = rate.pair(), "Inserted currency rate");
        Ok(RateId::new(id))
    }

    async fn get_by_id(&self, id: RateId) -> Result<Option<RateRecord>, PersistenceError> {
        let row: Option<RateRow> = sqlx::query_as(
            r#"
            SELECT id, pair, ask_price, bid_price, "timestamp"
            FROM currency_rates
            WHERE id = $1
            "#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(RateRow::into_record))
    }

    async fn get_by_pair(&self, pair: &str) -> Result<Option<RateRecord>, PersistenceError> {
        let row: Option<RateRow> = sqlx::query_as(
            r#"
            SELECT id, pair, ask_price, bid_price, "timestamp"
            FROM currency_rates
            WHERE pair = $1
            ORDER BY "timestamp" DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(pair)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(RateRow::into_record))
    }

    async fn list(&self) -> Result<Vec<RateRecord>, PersistenceError> {
        let rows: Vec<RateRow> = sqlx::query_as(
            r#"
            SELECT id, pair, ask_price, bid_price, "timestamp"
            FROM currency_rates
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(RateRow::into_record).collect())
    }

    async fn update(&self, record: &RateRecord) -> Result<(), PersistenceError> {
        let result = sqlx::query(
            r#"
            UPDATE currency_rates
            SET pair = $2, ask_price = $3, bid_price = $4, "timestamp" = $5
            WHERE id = $1
            "#,
        )
        .bind(record.id.get())
        .bind(record.rate.pair())
        .bind(record.rate.ask_price())
        .bind(record.rate.bid_price())
        .bind(record.rate.timestamp())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::MissingRecord(record.id));
        }
        Ok(())
    }

    async fn delete(&self, id: RateId) -> Result<(), PersistenceError> {
        sqlx::query("DELETE FROM currency_rates WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn close(&self) {
        if !self.pool.is_closed() {
            self.pool.close().await;
            info!("Database pool closed");
        }
    }
}

/// Row shape shared by every `SELECT`.
#[derive(Debug, sqlx::FromRow)]
struct RateRow {
    id: i64,
    pair: String,
    ask_price: f64,
    bid_price: f64,
    timestamp: DateTime<Utc>,
}

impl RateRow {
    fn into_record(self) -> RateRecord {
        RateRecord::new(
            RateId::new(self.id),
            CurrencyRate::from_parts(self.pair, self.ask_price, self.bid_price, self.timestamp),
        )
    }
}

fn map_sqlx_error(err: sqlx::Error) -> PersistenceError {
    match err {
        sqlx::Error::PoolClosed => PersistenceError::Closed,
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
            PersistenceError::Connection(err.to_string())
        }
        sqlx::Error::ColumnNotFound(column) => PersistenceError::MissingField(column),
        other => PersistenceError::Query(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_settings() -> DatabaseSettings {
        DatabaseSettings {
            user: "usdt".to_string(),
            host: "127.0.0.1".to_string(),
            port: 1,
            database: "usdt".to_string(),
            max_connections: 1,
            ..DatabaseSettings::default()
        }
    }

    #[test]
    fn pool_errors_map_to_domain_errors() {
        assert_eq!(map_sqlx_error(sqlx::Error::PoolClosed), PersistenceError::Closed);
        assert!(matches!(
            map_sqlx_error(sqlx::Error::PoolTimedOut),
            PersistenceError::Connection(_)
        ));
        assert_eq!(
            map_sqlx_error(sqlx::Error::ColumnNotFound("pair".to_string())),
            PersistenceError::MissingField("pair".to_string())
        );
        assert!(matches!(
            map_sqlx_error(sqlx::Error::RowNotFound),
            PersistenceError::Query(_)
        ));
    }

    #[tokio::test]
    async fn lazy_pool_does_not_connect_on_construction() {
        let adapter = PostgresRateAdapter::connect_lazy(&unreachable_settings());

        assert!(!adapter.pool().is_closed());
        assert_eq!(adapter.pool().size(), 0);
    }

    #[tokio::test]
    async fn close_is_idempotent_and_rejects_later_queries() {
        let adapter = PostgresRateAdapter::connect_lazy(&unreachable_settings());

        adapter.close().await;
        adapter.close().await;

        assert!(adapter.pool().is_closed());
        assert_eq!(
            adapter.get_by_id(RateId::new(1)).await.unwrap_err(),
            PersistenceError::Closed
        );
    }
}
