//! Source traits and test doubles.

use async_trait::async_trait;
use countrycache_common::{RawCountry, RateTable};

use crate::error::SourceResult;

/// Trait for country directory providers.
#[async_trait]
pub trait CountrySource: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Fetch every entry of the directory.
    async fn fetch_countries(&self) -> SourceResult<Vec<RawCountry>>;
}

/// Trait for exchange-rate providers.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Fetch the full rate table against the provider's base currency.
    async fn fetch_rates(&self) -> SourceResult<RateTable>;
}

#[cfg(any(test, feature = "test-utils"))]
mod mock {
    use super::*;
    use crate::error::SourceError;
    use countrycache_common::DataSource;
    use dashmap::DashMap;
    use parking_lot::RwLock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Scripted behaviour shared by the mock sources.
    #[derive(Default)]
    struct Script {
        failure: RwLock<Option<String>>,
        delay: RwLock<Option<Duration>>,
        calls: AtomicUsize,
    }

    impl Script {
        async fn run(&self, origin: DataSource) -> SourceResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = *self.delay.read();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            match self.failure.read().clone() {
                Some(message) => Err(SourceError::Transport { origin, message }),
                None => Ok(()),
            }
        }
    }

    /// Mock country directory for testing.
    pub struct MockCountrySource {
        name: String,
        countries: RwLock<Vec<RawCountry>>,
        script: Script,
    }

    impl MockCountrySource {
        /// Create a new mock directory serving `countries`.
        pub fn new(countries: Vec<RawCountry>) -> Self {
            Self {
                name: "mock-countries".to_string(),
                countries: RwLock::new(countries),
                script: Script::default(),
            }
        }

        /// Replace the served entries.
        pub fn set_countries(&self, countries: Vec<RawCountry>) {
            *self.countries.write() = countries;
        }

        /// Make every subsequent fetch fail with a transport error.
        pub fn fail_with(&self, message: impl Into<String>) {
            *self.script.failure.write() = Some(message.into());
        }

        /// Stop failing.
        pub fn recover(&self) {
            *self.script.failure.write() = None;
        }

        /// Sleep for `delay` before answering.
        pub fn stall_for(&self, delay: Duration) {
            *self.script.delay.write() = Some(delay);
        }

        /// Number of fetches issued so far.
        pub fn calls(&self) -> usize {
            self.script.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CountrySource for MockCountrySource {
        fn name(&self) -> &str {
            &self.name
        }

        async fn fetch_countries(&self) -> SourceResult<Vec<RawCountry>> {
            self.script.run(DataSource::Countries).await?;
            Ok(self.countries.read().clone())
        }
    }

    /// Mock rate provider for testing.
    pub struct MockRateSource {
        name: String,
        rates: DashMap<String, f64>,
        script: Script,
    }

    impl MockRateSource {
        /// Create a new mock provider with no rates.
        pub fn new() -> Self {
            Self {
                name: "mock-rates".to_string(),
                rates: DashMap::new(),
                script: Script::default(),
            }
        }

        /// Set a rate for a currency code.
        pub fn set_rate(&self, code: impl Into<String>, rate: f64) {
            self.rates.insert(code.into(), rate);
        }

        /// Make every subsequent fetch fail with a transport error.
        pub fn fail_with(&self, message: impl Into<String>) {
            *self.script.failure.write() = Some(message.into());
        }

        /// Stop failing.
        pub fn recover(&self) {
            *self.script.failure.write() = None;
        }

        /// Sleep for `delay` before answering.
        pub fn stall_for(&self, delay: Duration) {
            *self.script.delay.write() = Some(delay);
        }

        /// Number of fetches issued so far.
        pub fn calls(&self) -> usize {
            self.script.calls.load(Ordering::SeqCst)
        }
    }

    impl Default for MockRateSource {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl RateSource for MockRateSource {
        fn name(&self) -> &str {
            &self.name
        }

        async fn fetch_rates(&self) -> SourceResult<RateTable> {
            self.script.run(DataSource::Rates).await?;
            Ok(self
                .rates
                .iter()
                .map(|entry| (entry.key().clone(), *entry.value()))
                .collect())
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use mock::{MockCountrySource, MockRateSource};

#[cfg(test)]
mod tests {
    use super::*;
    use countrycache_common::DataSource;

    #[tokio::test]
    async fn test_mock_country_source() {
        let source = MockCountrySource::new(vec![RawCountry::named("Ghana").with_currency("GHS")]);

        let countries = source.fetch_countries().await.unwrap();

        assert_eq!(countries.len(), 1);
        assert_eq!(countries[0].primary_currency_code(), Some("GHS"));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_rate_source() {
        let source = MockRateSource::new();
        source.set_rate("GHS", 15.4);
        source.set_rate("BAD", 0.0);

        let rates = source.fetch_rates().await.unwrap();

        assert_eq!(rates.rate_for("GHS"), Some(15.4));
        assert_eq!(rates.rate_for("BAD"), None);
    }

    #[tokio::test]
    async fn test_mock_failure_is_attributed() {
        let source = MockRateSource::new();
        source.fail_with("connection reset");

        let err = source.fetch_rates().await.unwrap_err();
        assert_eq!(err.origin(), Some(DataSource::Rates));

        source.recover();
        tokio_test::assert_ok!(source.fetch_rates().await);
        assert_eq!(source.calls(), 2);
    }
}
