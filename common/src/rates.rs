//! Exchange-rate table for a single refresh.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Mapping from currency code to its rate against the base currency.
///
/// Only finite, strictly positive rates are retained; anything else is
/// indistinguishable from a missing rate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    rates: HashMap<String, f64>,
}

impl RateTable {
    /// Create an empty rate table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from raw provider values, dropping unusable rates.
    pub fn from_raw<I, K>(raw: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<f64>)>,
        K: Into<String>,
    {
        let rates = raw
            .into_iter()
            .filter_map(|(code, rate)| {
                rate.filter(|r| r.is_finite() && *r > 0.0)
                    .map(|r| (code.into(), r))
            })
            .collect();
        Self { rates }
    }

    /// Set the rate for a currency code. Unusable rates remove the entry.
    pub fn insert(&mut self, code: impl Into<String>, rate: f64) {
        let code = code.into();
        if rate.is_finite() && rate > 0.0 {
            self.rates.insert(code, rate);
        } else {
            self.rates.remove(&code);
        }
    }

    /// Builder-style variant of [`RateTable::insert`].
    pub fn with_rate(mut self, code: impl Into<String>, rate: f64) -> Self {
        self.insert(code, rate);
        self
    }

    /// Look up the rate for a currency code.
    pub fn rate_for(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    /// Number of usable rates.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Check if the table has no usable rates.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for RateTable {
    fn from_iter<T: IntoIterator<Item = (K, f64)>>(iter: T) -> Self {
        Self::from_raw(iter.into_iter().map(|(k, v)| (k, Some(v))))
    }
}

/// Coerce a JSON rate value. Numbers and numeric strings are accepted;
/// anything else is absent.
pub fn rate_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
