//! Atomic refresh batches.

use countrycache_common::{format_iso, CountryRecord, Timestamp};
use sqlx::{Sqlite, Transaction};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::schema::{LAST_REFRESHED_AT_KEY, UPSERT_COUNTRY_SQL, UPSERT_METADATA_SQL};

/// One unit of work replacing cache contents.
///
/// Owns a pooled connection for its whole lifetime. Nothing written through
/// the batch is visible to other connections until [`RefreshBatch::commit`]
/// succeeds. Dropping an uncommitted batch rolls it back and returns the
/// connection to the pool.
pub struct RefreshBatch {
    tx: Transaction<'static, Sqlite>,
    written: usize,
    refreshed_at: Option<Timestamp>,
}

impl RefreshBatch {
    pub(crate) fn new(tx: Transaction<'static, Sqlite>) -> Self {
        Self {
            tx,
            written: 0,
            refreshed_at: None,
        }
    }

    /// Insert a record, or overwrite every field of the row with the same name.
    ///
    /// Fails without writing if the population does not fit the column.
    pub async fn upsert_country(&mut self, record: &CountryRecord) -> StoreResult<()> {
        let population = i64::try_from(record.population).map_err(|_| {
            StoreError::OutOfRange(format!("population {} of {}", record.population, record.name))
        })?;

        sqlx::query(UPSERT_COUNTRY_SQL)
            .bind(&record.name)
            .bind(&record.capital)
            .bind(&record.region)
            .bind(population)
            .bind(&record.currency_code)
            .bind(record.exchange_rate)
            .bind(record.estimated_gdp)
            .bind(&record.flag_url)
            .bind(record.last_refreshed_at)
            .execute(&mut *self.tx)
            .await?;

        self.written += 1;
        Ok(())
    }

    /// Set the last-refreshed timestamp as part of this batch.
    pub async fn record_refresh(&mut self, at: Timestamp) -> StoreResult<()> {
        sqlx::query(UPSERT_METADATA_SQL)
            .bind(LAST_REFRESHED_AT_KEY)
            .bind(format_iso(&at))
            .execute(&mut *self.tx)
            .await?;

        self.refreshed_at = Some(at);
        Ok(())
    }

    /// Number of country upserts issued so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Make every write of the batch visible at once.
    pub async fn commit(self) -> StoreResult<usize> {
        if self.refreshed_at.is_none() {
            warn!(written = self.written, "Committing batch without a refresh timestamp");
        }
        let written = self.written;
        self.tx.commit().await?;
        debug!(written, "Refresh batch committed");
        Ok(written)
    }

    /// Discard every write of the batch.
    pub async fn rollback(self) -> StoreResult<()> {
        let written = self.written;
        self.tx.rollback().await?;
        debug!(discarded = written, "Refresh batch rolled back");
        Ok(())
    }
}
