//! SQLite-backed cache store.

use std::str::FromStr;

use countrycache_common::{constants, parse_iso, Timestamp};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, QueryBuilder, Sqlite};
use tracing::{debug, info, instrument};

use crate::batch::RefreshBatch;
use crate::error::{StoreError, StoreResult};
use crate::query::CountryFilter;
use crate::row::CountryRow;
use crate::schema::{COUNTRY_COLUMNS, LAST_REFRESHED_AT_KEY, SCHEMA_SQL};

/// Store connection settings.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// SQLite URL, e.g. `sqlite://data/countries.db` or `sqlite::memory:`.
    pub database_url: String,
    /// Pool size for file-backed databases.
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://data/countries.db".to_string(),
            max_connections: 5,
        }
    }
}

impl StoreConfig {
    /// Whether the URL names a private in-memory database.
    pub fn is_memory(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }
}

/// Durable cache of country rows plus the refresh timestamp.
#[derive(Clone)]
pub struct CacheStore {
    pool: Pool<Sqlite>,
}

impl CacheStore {
    /// Connect and create the schema if needed.
    #[instrument(skip(config), fields(url = %config.database_url))]
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let mut opts = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(constants::store_busy_timeout());

        let pool_options = if config.is_memory() {
            // Every connection to :memory: is a separate database, so keep
            // exactly one alive for the life of the pool.
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            if let Some(parent) = opts.get_filename().parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            opts = opts
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal);
            SqlitePoolOptions::new().max_connections(config.max_connections.max(1))
        };

        let pool = pool_options.connect_with(opts).await?;
        let store = Self { pool };
        store.migrate().await?;

        info!("Cache store ready");
        Ok(store)
    }

    /// Open a private in-memory store.
    pub async fn in_memory() -> StoreResult<Self> {
        Self::connect(&StoreConfig {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
        })
        .await
    }

    /// Create tables and indexes.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Open a refresh batch holding its own connection and transaction.
    pub async fn begin_batch(&self) -> StoreResult<RefreshBatch> {
        let tx = self.pool.begin().await?;
        debug!("Refresh batch opened");
        Ok(RefreshBatch::new(tx))
    }

    /// Total number of cached countries.
    pub async fn count(&self) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM countries")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// List countries matching `filter` in its sort order.
    pub async fn list(&self, filter: &CountryFilter) -> StoreResult<Vec<CountryRow>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {COUNTRY_COLUMNS} FROM countries"));

        let mut separator = " WHERE ";
        if let Some(region) = &filter.region {
            qb.push(separator).push("region = ").push_bind(region.clone());
            separator = " AND ";
        }
        if let Some(currency) = &filter.currency {
            qb.push(separator)
                .push("currency_code = ")
                .push_bind(currency.clone());
        }
        qb.push(" ORDER BY ").push(filter.sort.order_by());

        let rows = qb.build_query_as::<CountryRow>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    /// Get a country by name (case-insensitive).
    pub async fn get_by_name(&self, name: &str) -> StoreResult<Option<CountryRow>> {
        let row = sqlx::query_as::<_, CountryRow>(&format!(
            "SELECT {COUNTRY_COLUMNS} FROM countries WHERE name = ?"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Delete a country by name. Returns whether a row was removed.
    #[instrument(skip(self))]
    pub async fn delete_by_name(&self, name: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM countries WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Countries with the highest estimated GDP, excluding unknown estimates.
    pub async fn top_by_gdp(&self, limit: u32) -> StoreResult<Vec<CountryRow>> {
        let rows = sqlx::query_as::<_, CountryRow>(&format!(
            "SELECT {COUNTRY_COLUMNS} FROM countries \
             WHERE estimated_gdp IS NOT NULL \
             ORDER BY estimated_gdp DESC, name ASC LIMIT ?"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Timestamp of the most recent successful refresh, if any.
    pub async fn last_refreshed_at(&self) -> StoreResult<Option<Timestamp>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM metadata WHERE key = ?")
            .bind(LAST_REFRESHED_AT_KEY)
            .fetch_optional(&self.pool)
            .await?;

        value
            .map(|v| {
                parse_iso(&v)
                    .ok_or_else(|| StoreError::Corrupt(format!("{LAST_REFRESHED_AT_KEY}={v}")))
            })
            .transpose()
    }
}
