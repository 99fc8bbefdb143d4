use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::json;

/// Immutable runtime configuration, parsed once at startup and passed by
/// reference into components. Environment variables override the optional
/// `config/default` file.
#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    #[serde(default = "defaults::environment")]
    pub environment: String,
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "defaults::yes")]
    pub sandbox_mode: bool,

    // Trading
    #[serde(default = "defaults::initial_pool_value")]
    pub initial_pool_value: f64,
    #[serde(default = "defaults::initial_participants")]
    pub initial_participants: usize,
    #[serde(default = "defaults::cycle_interval")]
    pub cycle_interval: u64,
    #[serde(default = "defaults::trading_symbols")]
    pub trading_symbols: String,
    #[serde(default = "defaults::max_position_size_pct")]
    pub max_position_size_pct: f64,
    #[serde(default = "defaults::min_spread_threshold")]
    pub min_spread_threshold: f64,
    #[serde(default = "defaults::min_profit_pct")]
    pub min_profit_pct: f64,
    #[serde(default = "defaults::min_volume_usd")]
    pub min_volume_usd: f64,
    #[serde(default = "defaults::fee_pct")]
    pub fee_pct: f64,
    #[serde(default = "defaults::risk_threshold")]
    pub risk_threshold: u8,
    #[serde(default = "defaults::breaker_cooldown_secs")]
    pub breaker_cooldown_secs: u64,

    // Strategy oracle
    #[serde(default = "defaults::llm_provider")]
    pub llm_provider: String,
    #[serde(default)]
    pub groq_api_key: String,
    #[serde(default = "defaults::groq_model")]
    pub groq_model: String,
    #[serde(default = "defaults::groq_temperature")]
    pub groq_temperature: f64,
    #[serde(default = "defaults::groq_max_tokens")]
    pub groq_max_tokens: u32,
    #[serde(default = "defaults::groq_timeout_secs")]
    pub groq_timeout_secs: u64,

    // Venue credentials
    #[serde(default)]
    pub binance_api_key: String,
    #[serde(default)]
    pub binance_secret: String,
    #[serde(default = "defaults::yes")]
    pub binance_testnet: bool,
    #[serde(default)]
    pub coinbase_api_key: String,
    #[serde(default)]
    pub coinbase_secret: String,
    #[serde(default = "defaults::yes")]
    pub coinbase_sandbox: bool,

    // Service surface
    #[serde(default = "defaults::api_port")]
    pub api_port: u16,
    #[serde(default = "defaults::metrics_port")]
    pub metrics_port: u16,
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default = "defaults::data_dir")]
    pub data_dir: String,
}

mod defaults {
    pub fn environment() -> String {
        "development".to_string()
    }
    pub fn yes() -> bool {
        true
    }
    pub fn initial_pool_value() -> f64 {
        100_000.0
    }
    pub fn initial_participants() -> usize {
        10
    }
    pub fn cycle_interval() -> u64 {
        30
    }
    pub fn trading_symbols() -> String {
        "BTC/USDT,ETH/USDT".to_string()
    }
    pub fn max_position_size_pct() -> f64 {
        0.10
    }
    pub fn min_spread_threshold() -> f64 {
        0.5
    }
    pub fn min_profit_pct() -> f64 {
        0.1
    }
    pub fn min_volume_usd() -> f64 {
        1_000.0
    }
    pub fn fee_pct() -> f64 {
        pool_core::math::DEFAULT_FEE_PCT
    }
    pub fn risk_threshold() -> u8 {
        7
    }
    pub fn breaker_cooldown_secs() -> u64 {
        300
    }
    pub fn llm_provider() -> String {
        "groq".to_string()
    }
    pub fn groq_model() -> String {
        "llama3-70b-8192".to_string()
    }
    pub fn groq_temperature() -> f64 {
        0.1
    }
    pub fn groq_max_tokens() -> u32 {
        2_000
    }
    pub fn groq_timeout_secs() -> u64 {
        2
    }
    pub fn api_port() -> u16 {
        8_000
    }
    pub fn metrics_port() -> u16 {
        8_082
    }
    pub fn data_dir() -> String {
        "data".to_string()
    }
}

impl EngineConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            // Start with default values or a local config file if it exists
            .add_source(File::with_name("config/default").required(false))
            // Override with environment variables
            .add_source(Environment::default())
            .build()?;

        s.try_deserialize()
    }

    /// Validates configuration values at startup (Fail Fast)
    pub fn validate(&self) -> Result<(), String> {
        if self.initial_pool_value <= 0.0 {
            return Err(format!(
                "INITIAL_POOL_VALUE must be positive. Got: {}",
                self.initial_pool_value
            ));
        }
        if self.cycle_interval == 0 {
            return Err("CYCLE_INTERVAL cannot be 0".into());
        }
        if self.max_position_size_pct <= 0.0 || self.max_position_size_pct > 1.0 {
            return Err(format!(
                "MAX_POSITION_SIZE_PCT must be in (0, 1]. Got: {}",
                self.max_position_size_pct
            ));
        }
        if self.min_spread_threshold < 0.0 {
            return Err(format!(
                "MIN_SPREAD_THRESHOLD cannot be negative. Got: {}",
                self.min_spread_threshold
            ));
        }
        if !(1..=10).contains(&self.risk_threshold) {
            return Err(format!(
                "RISK_THRESHOLD must be in 1..=10. Got: {}",
                self.risk_threshold
            ));
        }
        if self.symbols().is_empty() {
            return Err("TRADING_SYMBOLS cannot be empty".into());
        }
        if self.llm_provider != "groq" && self.llm_provider != "disabled" {
            return Err(format!(
                "LLM_PROVIDER must be 'groq' or 'disabled'. Got: {}",
                self.llm_provider
            ));
        }
        if self.llm_provider == "groq" && self.groq_api_key.is_empty() {
            tracing::warn!("GROQ_API_KEY is empty; oracle calls will fail over to the fallback strategy");
        }

        Ok(())
    }

    pub fn symbols(&self) -> Vec<String> {
        self.trading_symbols
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Config view exposed over the API: secrets reduced to set/unset.
    pub fn redacted(&self) -> serde_json::Value {
        json!({
            "environment": self.environment,
            "debug": self.debug,
            "sandbox_mode": self.sandbox_mode,
            "trading": {
                "initial_pool_value": self.initial_pool_value,
                "initial_participants": self.initial_participants,
                "cycle_interval": self.cycle_interval,
                "trading_symbols": self.symbols(),
                "max_position_size_pct": self.max_position_size_pct,
                "min_spread_threshold": self.min_spread_threshold,
                "min_profit_pct": self.min_profit_pct,
                "min_volume_usd": self.min_volume_usd,
                "fee_pct": self.fee_pct,
                "risk_threshold": self.risk_threshold,
                "breaker_cooldown_secs": self.breaker_cooldown_secs,
            },
            "oracle": {
                "provider": self.llm_provider,
                "model": self.groq_model,
                "temperature": self.groq_temperature,
                "max_tokens": self.groq_max_tokens,
                "timeout_secs": self.groq_timeout_secs,
                "api_key_set": !self.groq_api_key.is_empty(),
            },
            "venues": {
                "binance": { "configured": !self.binance_api_key.is_empty(), "testnet": self.binance_testnet },
                "coinbase": { "configured": !self.coinbase_api_key.is_empty(), "sandbox": self.coinbase_sandbox },
            },
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
