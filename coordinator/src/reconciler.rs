//! Record reconciliation.
//!
//! Turns one raw directory entry plus the current rate table into a cache
//! record. No I/O and no failure modes: missing optional fields fall back to
//! defaults.

use countrycache_common::{CountryRecord, RateTable, RawCountry, Timestamp, MAX_POPULATION};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Lower bound of the GDP multiplier (inclusive).
pub const MULTIPLIER_MIN: f64 = 1000.0;

/// Upper bound of the GDP multiplier (exclusive).
pub const MULTIPLIER_MAX: f64 = 2000.0;

/// Source of the per-country GDP multiplier.
pub trait MultiplierSource: Send + Sync {
    /// Draw a value in `[MULTIPLIER_MIN, MULTIPLIER_MAX)`.
    fn draw(&self) -> f64;
}

/// Independent uniform draw per call, from the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformMultiplier;

impl MultiplierSource for UniformMultiplier {
    fn draw(&self) -> f64 {
        rand::thread_rng().gen_range(MULTIPLIER_MIN..MULTIPLIER_MAX)
    }
}

/// Always returns the same multiplier.
#[derive(Debug, Clone, Copy)]
pub struct FixedMultiplier(pub f64);

impl MultiplierSource for FixedMultiplier {
    fn draw(&self) -> f64 {
        self.0
    }
}

/// Uniform draws from a seeded generator, for reproducible runs.
pub struct SeededMultiplier {
    rng: Mutex<StdRng>,
}

impl SeededMultiplier {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl MultiplierSource for SeededMultiplier {
    fn draw(&self) -> f64 {
        self.rng.lock().gen_range(MULTIPLIER_MIN..MULTIPLIER_MAX)
    }
}

/// Reconcile a raw entry against the rate table.
///
/// Returns `None` only when the entry has no usable name, since such an
/// entry cannot be keyed in the store. The multiplier is drawn only when the
/// entry's currency has a rate.
pub fn reconcile(
    raw: &RawCountry,
    rates: &RateTable,
    now: Timestamp,
    multiplier: &dyn MultiplierSource,
) -> Option<CountryRecord> {
    let name = raw
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())?
        .to_string();

    let population = raw.population.unwrap_or(0).min(MAX_POPULATION);
    let currency_code = raw.primary_currency_code().map(str::to_string);

    let (exchange_rate, estimated_gdp) = match currency_code.as_deref() {
        None => (None, Some(0.0)),
        Some(code) => match rates.rate_for(code) {
            None => (None, None),
            Some(rate) => (Some(rate), Some(population as f64 * multiplier.draw() / rate)),
        },
    };

    Some(CountryRecord {
        name,
        capital: raw.capital.clone(),
        region: raw.region.clone(),
        population,
        currency_code,
        exchange_rate,
        estimated_gdp,
        flag_url: raw.flag.clone(),
        last_refreshed_at: now,
    })
}
