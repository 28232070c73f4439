//! Service configuration.

use std::path::PathBuf;
use std::time::Duration;

use countrycache_sources::GatewayConfig;
use countrycache_store::StoreConfig;

/// Summary image configuration.
#[derive(Debug, Clone)]
pub struct SummaryConfig {
    /// Where the rendered summary is written and served from.
    pub image_path: PathBuf,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            image_path: PathBuf::from("cache/summary.svg"),
        }
    }
}

/// Main service configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Listen address.
    pub listen_addr: String,
    /// Listen port.
    pub listen_port: u16,
    /// External source configuration.
    pub sources: GatewayConfig,
    /// Store configuration.
    pub store: StoreConfig,
    /// Summary image configuration.
    pub summary: SummaryConfig,
    /// Enable metrics endpoint.
    pub metrics_enabled: bool,
    /// Log level.
    pub log_level: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".to_string(),
            listen_port: 8080,
            sources: GatewayConfig::default(),
            store: StoreConfig::default(),
            summary: SummaryConfig::default(),
            metrics_enabled: true,
            log_level: "info".to_string(),
        }
    }
}

impl CacheConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Unparseable numeric or boolean values keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        if let Some(port) = lookup("PORT").and_then(|p| p.trim().parse().ok()) {
            config.listen_port = port;
        }

        if let Some(url) = lookup("DATABASE_URL") {
            config.store.database_url = url;
        }

        if let Some(max) = lookup("DATABASE_MAX_CONNECTIONS").and_then(|m| m.trim().parse().ok()) {
            config.store.max_connections = max;
        }

        if let Some(url) = lookup("COUNTRIES_API_URL") {
            config.sources.countries_url = url;
        }

        if let Some(url) = lookup("RATES_API_URL") {
            config.sources.rates_url = url;
        }

        if let Some(ms) = lookup("EXTERNAL_TIMEOUT_MS").and_then(|ms| ms.trim().parse().ok()) {
            config.sources.timeout = Duration::from_millis(ms);
        }

        if let Some(path) = lookup("CACHE_IMAGE_PATH") {
            config.summary.image_path = PathBuf::from(path);
        }

        if let Some(enabled) = lookup("METRICS_ENABLED").and_then(|v| parse_flag(&v)) {
            config.metrics_enabled = enabled;
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_port == 0 {
            return Err("Listen port cannot be 0".to_string());
        }

        if self.store.database_url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }

        if self.store.max_connections == 0 {
            return Err("Database pool needs at least one connection".to_string());
        }

        if self.sources.countries_url.is_empty() || self.sources.rates_url.is_empty() {
            return Err("Source URLs cannot be empty".to_string());
        }

        if self.sources.timeout.is_zero() {
            return Err("External timeout cannot be 0".to_string());
        }

        if self.summary.image_path.as_os_str().is_empty() {
            return Err("Summary image path cannot be empty".to_string());
        }

        Ok(())
    }

    /// Socket address string for the HTTP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.listen_addr, self.listen_port)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
