//! Country payload and cache record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A currency entry as listed by the country directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCurrency {
    /// ISO 4217 code, when the directory knows one.
    #[serde(default)]
    pub code: Option<String>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Currency symbol.
    #[serde(default)]
    pub symbol: Option<String>,
}

impl RawCurrency {
    /// Create a currency entry carrying only a code.
    pub fn with_code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Default::default()
        }
    }
}

/// One entry of the external country directory.
///
/// Decoding is deliberately forgiving: a field with an unexpected shape is
/// treated as absent rather than failing the whole directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCountry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub capital: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub region: Option<String>,
    #[serde(default, deserialize_with = "lenient_population")]
    pub population: Option<u64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub flag: Option<String>,
    #[serde(default, deserialize_with = "lenient_currencies")]
    pub currencies: Vec<RawCurrency>,
}

impl RawCountry {
    /// Create an entry with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Set the population.
    pub fn with_population(mut self, population: u64) -> Self {
        self.population = Some(population);
        self
    }

    /// Set the region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set the capital.
    pub fn with_capital(mut self, capital: impl Into<String>) -> Self {
        self.capital = Some(capital.into());
        self
    }

    /// Append a currency with the given code.
    pub fn with_currency(mut self, code: impl Into<String>) -> Self {
        self.currencies.push(RawCurrency::with_code(code));
        self
    }

    /// Code of the first listed currency, if it has a non-empty one.
    pub fn primary_currency_code(&self) -> Option<&str> {
        self.currencies
            .first()
            .and_then(|c| c.code.as_deref())
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }
}

/// A fully reconciled cache record, one per country name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRecord {
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: u64,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: Option<f64>,
    pub flag_url: Option<String>,
    pub last_refreshed_at: DateTime<Utc>,
}

impl CountryRecord {
    /// Check the currency/rate/estimate invariants of a reconciled record.
    pub fn is_consistent(&self) -> bool {
        match (&self.currency_code, self.exchange_rate, self.estimated_gdp) {
            (None, None, Some(gdp)) => gdp == 0.0,
            (None, _, _) => false,
            (Some(_), None, None) => true,
            (Some(_), None, Some(_)) => false,
            (Some(_), Some(rate), Some(gdp)) => rate > 0.0 && gdp >= 0.0,
            (Some(_), Some(_), None) => false,
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    })
}

fn lenient_population<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(population_from_value))
}

fn lenient_currencies<'de, D>(deserializer: D) -> Result<Vec<RawCurrency>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    })
}

/// Largest population a stored row can hold.
pub const MAX_POPULATION: u64 = i64::MAX as u64;

/// Coerce a JSON population value, treating anything non-numeric or above
/// [`MAX_POPULATION`] as absent.
pub fn population_from_value(value: &Value) -> Option<u64> {
    let population = match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(non_negative)),
        Value::String(s) => s.trim().parse::<f64>().ok().and_then(non_negative),
        _ => None,
    };
    population.filter(|p| *p <= MAX_POPULATION)
}

fn non_negative(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0).then(|| value.trunc() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_decode_directory_entry() {
        let raw: RawCountry = serde_json::from_value(json!({
            "name": "Nigeria",
            "capital": "Abuja",
            "region": "Africa",
            "population": 206139589,
            "flag": "https://flagcdn.com/ng.svg",
            "currencies": [{ "code": "NGN", "name": "Nigerian naira", "symbol": "₦" }]
        }))
        .unwrap();

        assert_eq!(raw.name.as_deref(), Some("Nigeria"));
        assert_eq!(raw.population, Some(206139589));
        assert_eq!(raw.primary_currency_code(), Some("NGN"));
    }

    #[test]
    fn test_malformed_optional_fields_are_absent() {
        let raw: RawCountry = serde_json::from_value(json!({
            "name": "Oddland",
            "capital": ["A", "B"],
            "population": "lots",
            "currencies": "none"
        }))
        .unwrap();

        assert_eq!(raw.capital, None);
        assert_eq!(raw.population, None);
        assert!(raw.currencies.is_empty());
    }

    #[test]
    fn test_numeric_string_population() {
        assert_eq!(population_from_value(&json!("1200")), Some(1200));
        assert_eq!(population_from_value(&json!(12.9)), Some(12));
        assert_eq!(population_from_value(&json!(-4)), None);
        assert_eq!(population_from_value(&json!(null)), None);
    }

    #[test]
    fn test_out_of_range_population_is_absent() {
        assert_eq!(population_from_value(&json!(i64::MAX)), Some(MAX_POPULATION));
        assert_eq!(population_from_value(&json!(u64::MAX)), None);
        assert_eq!(population_from_value(&json!(1e30)), None);
        assert_eq!(population_from_value(&json!("18446744073709551615")), None);
    }

    #[test]
    fn test_primary_currency_ignores_blank_code() {
        let raw = RawCountry::named("Blankia").with_currency("  ");
        assert_eq!(raw.primary_currency_code(), None);

        let mut raw = RawCountry::named("Multi");
        raw.currencies.push(RawCurrency::default());
        raw.currencies.push(RawCurrency::with_code("EUR"));
        assert_eq!(raw.primary_currency_code(), None);
    }

    #[test]
    fn test_record_consistency() {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut record = CountryRecord {
            name: "Atlantis".to_string(),
            capital: None,
            region: None,
            population: 500,
            currency_code: None,
            exchange_rate: None,
            estimated_gdp: Some(0.0),
            flag_url: None,
            last_refreshed_at: at,
        };
        assert!(record.is_consistent());

        record.estimated_gdp = None;
        assert!(!record.is_consistent());

        record.currency_code = Some("ATL".to_string());
        assert!(record.is_consistent());
    }
}
