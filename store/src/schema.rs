//! Cache schema.

/// Key of the refresh timestamp in the metadata table.
pub const LAST_REFRESHED_AT_KEY: &str = "last_refreshed_at";

/// Idempotent schema creation.
///
/// Name, region and currency compare case-insensitively. The CHECK
/// constraints mirror the record invariants so a bad row aborts the batch.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS countries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL COLLATE NOCASE UNIQUE,
    capital TEXT,
    region TEXT COLLATE NOCASE,
    population INTEGER NOT NULL DEFAULT 0 CHECK (population >= 0),
    currency_code TEXT COLLATE NOCASE,
    exchange_rate REAL CHECK (exchange_rate IS NULL OR exchange_rate > 0),
    estimated_gdp REAL CHECK (estimated_gdp IS NULL OR estimated_gdp >= 0),
    flag_url TEXT,
    last_refreshed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_countries_region ON countries(region);
CREATE INDEX IF NOT EXISTS idx_countries_currency ON countries(currency_code);
CREATE INDEX IF NOT EXISTS idx_countries_gdp ON countries(estimated_gdp);

CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

pub(crate) const COUNTRY_COLUMNS: &str = "id, name, capital, region, population, currency_code, \
     exchange_rate, estimated_gdp, flag_url, last_refreshed_at";

pub(crate) const UPSERT_COUNTRY_SQL: &str = r#"
INSERT INTO countries
    (name, capital, region, population, currency_code, exchange_rate, estimated_gdp, flag_url, last_refreshed_at)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
ON CONFLICT(name) DO UPDATE SET
    name = excluded.name,
    capital = excluded.capital,
    region = excluded.region,
    population = excluded.population,
    currency_code = excluded.currency_code,
    exchange_rate = excluded.exchange_rate,
    estimated_gdp = excluded.estimated_gdp,
    flag_url = excluded.flag_url,
    last_refreshed_at = excluded.last_refreshed_at
"#;

pub(crate) const UPSERT_METADATA_SQL: &str = r#"
INSERT INTO metadata (key, value) VALUES (?, ?)
ON CONFLICT(key) DO UPDATE SET value = excluded.value
"#;
