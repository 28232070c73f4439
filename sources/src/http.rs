//! HTTP gateway to the public country and exchange-rate APIs.

use async_trait::async_trait;
use countrycache_common::{constants, rate_from_value, DataSource, RawCountry, RateTable};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::error::{SourceError, SourceResult};
use crate::provider::{CountrySource, RateSource};

/// Default country directory endpoint.
pub const DEFAULT_COUNTRIES_URL: &str =
    "https://restcountries.com/v2/all?fields=name,capital,region,population,flag,currencies";

/// Default exchange-rate endpoint (USD base).
pub const DEFAULT_RATES_URL: &str = "https://open.er-api.com/v6/latest/USD";

/// Configuration for the HTTP gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Country directory URL.
    pub countries_url: String,
    /// Exchange-rate table URL.
    pub rates_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            countries_url: DEFAULT_COUNTRIES_URL.to_string(),
            rates_url: DEFAULT_RATES_URL.to_string(),
            timeout: constants::default_fetch_timeout(),
        }
    }
}

/// Rates API response: `{result, rates: {CODE: rate}}`. Individual rates
/// are decoded leniently so one bad value does not sink the table.
#[derive(Debug, Deserialize)]
struct RatesPayload {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    rates: Option<HashMap<String, Value>>,
}

/// Gateway serving both directories over one pooled HTTP client.
pub struct HttpGateway {
    client: Client,
    config: GatewayConfig,
}

impl HttpGateway {
    /// Create a new gateway.
    pub fn new(config: GatewayConfig) -> SourceResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SourceError::Client {
                message: e.to_string(),
            })?;

        Ok(Self { client, config })
    }

    /// Get the gateway configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    async fn get_json<T: DeserializeOwned>(&self, origin: DataSource, url: &str) -> SourceResult<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(origin, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(source = %origin, status = status.as_u16(), "Source returned error status");
            return Err(SourceError::Status {
                origin,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| self.classify(origin, e))?;
        debug!(source = %origin, bytes = body.len(), "Source payload received");

        serde_json::from_slice(&body).map_err(|e| SourceError::malformed(origin, e.to_string()))
    }

    fn classify(&self, origin: DataSource, err: reqwest::Error) -> SourceError {
        if err.is_timeout() {
            SourceError::Timeout {
                origin,
                timeout_ms: self.config.timeout.as_millis() as u64,
            }
        } else {
            SourceError::transport(origin, err)
        }
    }
}

#[async_trait]
impl CountrySource for HttpGateway {
    fn name(&self) -> &str {
        "restcountries"
    }

    #[instrument(skip(self), fields(url = %self.config.countries_url))]
    async fn fetch_countries(&self) -> SourceResult<Vec<RawCountry>> {
        let countries: Vec<RawCountry> = self
            .get_json(DataSource::Countries, &self.config.countries_url)
            .await?;
        debug!(count = countries.len(), "Fetched country directory");
        Ok(countries)
    }
}

#[async_trait]
impl RateSource for HttpGateway {
    fn name(&self) -> &str {
        "open-er-api"
    }

    #[instrument(skip(self), fields(url = %self.config.rates_url))]
    async fn fetch_rates(&self) -> SourceResult<RateTable> {
        let payload: RatesPayload = self
            .get_json(DataSource::Rates, &self.config.rates_url)
            .await?;

        if payload.result.as_deref() == Some("error") {
            return Err(SourceError::malformed(
                DataSource::Rates,
                "provider reported an error result",
            ));
        }

        let rates = payload
            .rates
            .ok_or_else(|| SourceError::malformed(DataSource::Rates, "missing rate table"))?;

        let table = RateTable::from_raw(
            rates
                .into_iter()
                .map(|(code, value)| {
                    let rate = rate_from_value(&value);
                    if rate.is_none() {
                        debug!(code = %code, "Ignoring non-numeric rate");
                    }
                    (code, rate)
                }),
        );
        debug!(count = table.len(), "Fetched rate table");
        Ok(table)
    }
}
