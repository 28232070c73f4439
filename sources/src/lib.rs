//! Country Cache Source Gateway
//!
//! Fetches the two independent inputs of a refresh: the country directory and
//! the currency exchange-rate table.
//!
//! Every failure, whether transport, HTTP status or payload shape, is
//! normalized to a [`SourceError`] that records which directory failed. Callers
//! never see `reqwest` error types.
//!
//! # Example
//!
//! ```rust,ignore
//! use countrycache_sources::{CountrySource, GatewayConfig, HttpGateway, RateSource};
//!
//! let gateway = HttpGateway::new(GatewayConfig::default())?;
//! let (countries, rates) = tokio::try_join!(gateway.fetch_countries(), gateway.fetch_rates())?;
//! ```

pub mod error;
pub mod provider;
pub mod http;

pub use error::{SourceError, SourceResult};
pub use http::{GatewayConfig, HttpGateway};
pub use provider::{CountrySource, RateSource};

#[cfg(any(test, feature = "test-utils"))]
pub use provider::{MockCountrySource, MockRateSource};
