//! Refresh coordinator.
//!
//! Drives one refresh end to end: both sources are fetched concurrently,
//! every entry is reconciled into the same store transaction, and the summary
//! is rendered only once that transaction has committed.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use countrycache_common::{
    batch_timestamp, constants, CacheError, DataSource, RateTable, RawCountry, Result, Timestamp,
};
use countrycache_sources::{CountrySource, RateSource, SourceError, SourceResult};
use countrycache_store::{CacheStore, RefreshBatch, StoreResult};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::metrics::{Metrics, SharedMetrics};
use crate::reconciler::{reconcile, MultiplierSource, UniformMultiplier};
use crate::summary::{SummaryEntry, SummaryRenderer, SummarySnapshot, SUMMARY_TOP_N};

/// Result of a committed refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshOutcome {
    /// Rows in the cache after the commit.
    pub total_count: u64,
    /// Timestamp shared by every record of the batch.
    pub last_refreshed_at: Timestamp,
    /// Records upserted by this refresh.
    pub written: usize,
    /// Directory entries dropped for lack of a name.
    pub skipped: usize,
}

/// Orchestrates refreshes of the country cache.
///
/// Refreshes are independent of each other; concurrent calls each run their
/// own transaction and the store serializes the commits.
pub struct RefreshCoordinator {
    countries: Arc<dyn CountrySource>,
    rates: Arc<dyn RateSource>,
    store: CacheStore,
    renderer: Arc<dyn SummaryRenderer>,
    multiplier: Arc<dyn MultiplierSource>,
    metrics: SharedMetrics,
    fetch_timeout: Duration,
}

impl RefreshCoordinator {
    /// Create a coordinator with uniform multipliers and default timeouts.
    pub fn new(
        countries: Arc<dyn CountrySource>,
        rates: Arc<dyn RateSource>,
        store: CacheStore,
        renderer: Arc<dyn SummaryRenderer>,
    ) -> Self {
        Self {
            countries,
            rates,
            store,
            renderer,
            multiplier: Arc::new(UniformMultiplier),
            metrics: Arc::new(Metrics::new()),
            fetch_timeout: constants::default_fetch_timeout(),
        }
    }

    /// Replace the GDP multiplier source.
    pub fn with_multiplier(mut self, multiplier: Arc<dyn MultiplierSource>) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Share an existing metrics registry.
    pub fn with_metrics(mut self, metrics: SharedMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Bound each external fetch by `timeout`.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Get the store this coordinator writes to.
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Get the metrics registry.
    pub fn metrics(&self) -> &SharedMetrics {
        &self.metrics
    }

    /// Run one refresh.
    ///
    /// Fails with `SourceUnavailable` before touching the store if either
    /// fetch fails, and with `PersistenceFailure` after a full rollback if
    /// the batch cannot be written.
    #[instrument(skip(self), fields(refresh_id = %Uuid::now_v7()))]
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        self.metrics.refresh_started();
        info!(
            countries = self.countries.name(),
            rates = self.rates.name(),
            "Refresh started"
        );

        let (raw_countries, rates) = match self.fetch_sources().await {
            Ok(fetched) => fetched,
            Err(err) => {
                self.metrics.refresh_source_failed();
                warn!(source = ?err.origin(), error = %err, "Refresh aborted, source unavailable");
                return Err(err.into());
            }
        };
        debug!(
            entries = raw_countries.len(),
            rates = rates.len(),
            "Sources fetched"
        );

        let now = batch_timestamp();
        let (written, skipped) = match self.commit_batch(&raw_countries, &rates, now).await {
            Ok(counts) => counts,
            Err(err) => {
                self.metrics.refresh_persistence_failed();
                error!(error = %err, "Refresh rolled back");
                return Err(CacheError::from(err));
            }
        };

        let total_count = self.publish_summary(now, written).await;
        self.metrics.refresh_succeeded(written, skipped);
        info!(written, skipped, total_count, "Refresh committed");

        Ok(RefreshOutcome {
            total_count,
            last_refreshed_at: now,
            written,
            skipped,
        })
    }

    async fn fetch_sources(&self) -> SourceResult<(Vec<RawCountry>, RateTable)> {
        let countries = bounded(
            DataSource::Countries,
            self.fetch_timeout,
            self.countries.fetch_countries(),
        );
        let rates = bounded(DataSource::Rates, self.fetch_timeout, self.rates.fetch_rates());

        tokio::try_join!(countries, rates)
    }

    async fn commit_batch(
        &self,
        raw_countries: &[RawCountry],
        rates: &RateTable,
        now: Timestamp,
    ) -> StoreResult<(usize, usize)> {
        let mut batch = self.store.begin_batch().await?;

        match self.write_batch(&mut batch, raw_countries, rates, now).await {
            Ok(skipped) => {
                let written = batch.commit().await?;
                Ok((written, skipped))
            }
            Err(err) => {
                if let Err(rollback_err) = batch.rollback().await {
                    warn!(error = %rollback_err, "Explicit rollback failed, connection dropped");
                }
                Err(err)
            }
        }
    }

    async fn write_batch(
        &self,
        batch: &mut RefreshBatch,
        raw_countries: &[RawCountry],
        rates: &RateTable,
        now: Timestamp,
    ) -> StoreResult<usize> {
        let mut skipped = 0;
        for raw in raw_countries {
            match reconcile(raw, rates, now, self.multiplier.as_ref()) {
                Some(record) => batch.upsert_country(&record).await?,
                None => {
                    skipped += 1;
                    warn!(capital = ?raw.capital, region = ?raw.region, "Skipping entry without a name");
                }
            }
        }
        batch.record_refresh(now).await?;
        Ok(skipped)
    }

    /// Count rows and render the summary. Never fails the refresh.
    async fn publish_summary(&self, now: Timestamp, written: usize) -> u64 {
        let total_countries = match self.store.count().await {
            Ok(count) => count,
            Err(err) => {
                warn!(error = %err, "Post-commit count failed, reporting rows written");
                written as u64
            }
        };

        let top = match self.store.top_by_gdp(SUMMARY_TOP_N).await {
            Ok(rows) => rows,
            Err(err) => {
                self.metrics.summary_failed();
                warn!(error = %err, "Could not load top countries for summary");
                return total_countries;
            }
        };

        let snapshot = SummarySnapshot {
            total_countries,
            last_refreshed_at: now,
            top: top
                .into_iter()
                .map(|row| SummaryEntry {
                    name: row.name,
                    estimated_gdp: row.estimated_gdp,
                })
                .collect(),
        };

        if let Err(err) = self.renderer.render(&snapshot).await {
            self.metrics.summary_failed();
            warn!(error = %err, "Summary render failed");
        }

        total_countries
    }
}

/// Run a fetch under a timeout attributed to `origin`.
async fn bounded<T, F>(origin: DataSource, limit: Duration, fetch: F) -> SourceResult<T>
where
    F: Future<Output = SourceResult<T>>,
{
    match tokio::time::timeout(limit, fetch).await {
        Ok(result) => result,
        Err(_) => Err(SourceError::Timeout {
            origin,
            timeout_ms: limit.as_millis() as u64,
        }),
    }
}
