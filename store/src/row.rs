//! Stored country rows.

use chrono::{DateTime, Utc};
use countrycache_common::{iso_millis, CountryRecord};
use serde::Serialize;
use sqlx::FromRow;

/// A country record as persisted, with its surrogate id.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct CountryRow {
    pub id: i64,
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: i64,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: Option<f64>,
    pub flag_url: Option<String>,
    #[serde(serialize_with = "iso_millis::serialize")]
    pub last_refreshed_at: DateTime<Utc>,
}

impl CountryRow {
    /// The reconciled record this row holds.
    pub fn record(&self) -> CountryRecord {
        CountryRecord {
            name: self.name.clone(),
            capital: self.capital.clone(),
            region: self.region.clone(),
            population: u64::try_from(self.population).unwrap_or_default(),
            currency_code: self.currency_code.clone(),
            exchange_rate: self.exchange_rate,
            estimated_gdp: self.estimated_gdp,
            flag_url: self.flag_url.clone(),
            last_refreshed_at: self.last_refreshed_at,
        }
    }
}
