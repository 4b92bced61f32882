// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
    ConnectOptions, PgPool, Postgres, QueryBuilder,
};
use std::collections::HashMap;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{IssuerStore, NewIssuer, Ticker};
use crate::config::DbConfig;
use crate::error::PersistError;

/// Rows per INSERT; keeps bind parameters well under Postgres' 65535 limit.
const CHUNK_ROWS: usize = 1000;

/// Postgres-backed store. Expects the tables from `sql/schema.sql`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Build a lazily connecting pool from the database config. No
    /// connection is opened until the first statement runs.
    pub fn new(config: &DbConfig, log_statements: bool) -> Self {
        let pool_size = config.effective_pool_size();
        info!(
            address = %config.url,
            db = %config.dbname,
            user = %config.user,
            ssl = config.sslmode,
            pool_size,
            "configuring database pool"
        );

        let mut options = PgConnectOptions::new()
            .host(config.host())
            .username(&config.user)
            .password(&config.password)
            .database(&config.dbname);
        if let Some(port) = config.port() {
            options = options.port(port);
        }
        if config.sslmode {
            options = options
                .ssl_mode(PgSslMode::VerifyCa)
                .ssl_root_cert(&config.ca_cert_file_path)
                .ssl_client_cert(&config.cert_file_path)
                .ssl_client_key(&config.key_file_path);
        }
        if !log_statements {
            options = options.disable_statement_logging();
        }

        let pool = PgPoolOptions::new()
            .max_connections(pool_size)
            .connect_lazy_with(options);
        Self { pool }
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl IssuerStore for PgStore {
    #[instrument(level = "debug", skip_all, fields(count = issuers.len()))]
    async fn insert_issuers(&self, issuers: &[NewIssuer]) -> Result<u64, PersistError> {
        let mut inserted = 0;
        for chunk in issuers.chunks(CHUNK_ROWS) {
            let mut qb: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO issuers (id, name, natural_key) ");
            qb.push_values(chunk, |mut row, issuer| {
                row.push_bind(issuer.id)
                    .push_bind(issuer.name.clone())
                    .push_bind(issuer.natural_key.clone());
            });
            qb.push(" ON CONFLICT (natural_key) DO NOTHING");
            let result = qb.build().execute(&self.pool).await?;
            inserted += result.rows_affected();
        }
        debug!(inserted, "issuers written");
        Ok(inserted)
    }

    async fn issuer_keys(&self) -> Result<HashMap<String, Uuid>, PersistError> {
        let rows: Vec<(String, Uuid)> =
            sqlx::query_as("SELECT natural_key, id FROM issuers")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().collect())
    }

    #[instrument(level = "debug", skip_all, fields(count = tickers.len()))]
    async fn insert_tickers(&self, tickers: &[Ticker]) -> Result<u64, PersistError> {
        let mut inserted = 0;
        for chunk in tickers.chunks(CHUNK_ROWS) {
            let mut qb: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO tickers (symbol, issuer_id, display_name) ");
            qb.push_values(chunk, |mut row, ticker| {
                row.push_bind(ticker.symbol.clone())
                    .push_bind(ticker.issuer_id)
                    .push_bind(ticker.display_name.clone());
            });
            qb.push(" ON CONFLICT (symbol, issuer_id) DO NOTHING");
            let result = qb.build().execute(&self.pool).await?;
            inserted += result.rows_affected();
        }
        debug!(inserted, "tickers written");
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> PgStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPool::connect(&url).await.unwrap();
        sqlx::raw_sql(include_str!("../../sql/schema.sql"))
            .execute(&pool)
            .await
            .unwrap();
        PgStore::from_pool(pool)
    }

    #[tokio::test]
    #[ignore] // needs a Postgres at DATABASE_URL
    async fn test_inserts_ignore_conflicts() {
        let store = store().await;
        let key = format!("test-{}", Uuid::new_v4());

        let first = NewIssuer::new(key.clone(), "First");
        assert_eq!(store.insert_issuers(&[first.clone()]).await.unwrap(), 1);
        let again = NewIssuer::new(key.clone(), "Renamed");
        assert_eq!(store.insert_issuers(&[again]).await.unwrap(), 0);

        let keys = store.issuer_keys().await.unwrap();
        assert_eq!(keys.get(&key), Some(&first.id));

        let ticker = Ticker {
            symbol: "TST".to_string(),
            issuer_id: first.id,
            display_name: "First".to_string(),
        };
        assert_eq!(store.insert_tickers(&[ticker.clone()]).await.unwrap(), 1);
        assert_eq!(store.insert_tickers(&[ticker]).await.unwrap(), 0);
    }
}
