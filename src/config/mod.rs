//! Configuration management for GoldBasis
//!
//! Loads from an optional YAML file + environment variables via .env.
//! Every key has a built-in default; the binary runs with zero external
//! configuration.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub http: HttpConfig,
    pub pyth: PythConfig,
    pub binance: BinanceConfig,
    pub hyperliquid: HyperliquidConfig,
    pub meteora: MeteoraConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Poll cadence in milliseconds
    pub refresh_ms: u64,
    /// Rolling chart window in milliseconds
    pub window_ms: u64,
    /// Feed staleness threshold in milliseconds
    pub stale_ms: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PythConfig {
    /// Hermes base URL
    pub base_url: String,
    /// Hex price feed id for XAU/USD
    pub feed_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BinanceConfig {
    /// USD-M futures API base URL
    pub futures_base_url: String,
    /// Spot API base URL
    pub spot_base_url: String,
    /// Futures trading pair symbol
    pub futures_symbol: String,
    /// Spot stablecoin pair used for the implied XAU/USDC conversion
    pub spot_symbol: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HyperliquidConfig {
    /// Info endpoint URL
    pub info_url: String,
    /// Builder-deployed perp dex name to select (case-insensitive match)
    pub dex: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeteoraConfig {
    /// DLMM data API base URL
    pub base_url: String,
    /// Pool address of the tracked GOLD/USDC pool
    pub pool_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Bind address for the dashboard HTTP API
    pub bind_addr: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let mut builder = Config::builder()
            // Engine defaults
            .set_default("engine.refresh_ms", 5_000i64)?
            .set_default("engine.window_ms", 3_600_000i64)?
            .set_default("engine.stale_ms", 30_000i64)?
            // HTTP defaults
            .set_default("http.timeout_secs", 10i64)?
            // Pyth defaults
            .set_default("pyth.base_url", "https://hermes.pyth.network")?
            .set_default(
                "pyth.feed_id",
                "0x765d2ba906dbc32ca17cc11f5310a89e9ee1f6420508c63861f2f8ba4ee34bb2",
            )?
            // Binance defaults
            .set_default("binance.futures_base_url", "https://fapi.binance.com")?
            .set_default("binance.spot_base_url", "https://api.binance.com")?
            .set_default("binance.futures_symbol", "XAUUSDT")?
            .set_default("binance.spot_symbol", "USDCUSDT")?
            // Hyperliquid defaults
            .set_default("hyperliquid.info_url", "https://api.hyperliquid.xyz/info")?
            .set_default("hyperliquid.dex", "flx")?
            // Meteora defaults
            .set_default("meteora.base_url", "https://dlmm.datapi.meteora.ag")?
            .set_default(
                "meteora.pool_address",
                "3Vj8miZuTSdonf4W1xLdYFatrXLm38CShrCi7NbZS5Ah",
            )?
            // Dashboard defaults
            .set_default("dashboard.bind_addr", "127.0.0.1:8090")?;

        // Optional config file layer
        if Path::new("config/default.yaml").exists() {
            builder = builder.add_source(File::with_name("config/default"));
        }

        // Environment overrides: GOLDBASIS_ENGINE__REFRESH_MS etc.
        builder = builder.add_source(
            Environment::with_prefix("GOLDBASIS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;
        let app: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        app.validate()?;
        Ok(app)
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.engine.refresh_ms >= 500, "engine.refresh_ms too low");
        anyhow::ensure!(self.engine.window_ms >= 60_000, "engine.window_ms too low");
        anyhow::ensure!(self.engine.stale_ms > 0, "engine.stale_ms must be positive");
        anyhow::ensure!(
            self.pyth.feed_id.starts_with("0x"),
            "pyth.feed_id must be a 0x-prefixed hex id"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_load_and_validate() {
        let config = AppConfig::load().expect("defaults should load");
        assert_eq!(config.engine.refresh_ms, 5_000);
        assert_eq!(config.engine.stale_ms, 30_000);
        assert_eq!(config.binance.futures_symbol, "XAUUSDT");
    }
}
