/// Validation tests for EngineConfig. Environment mutation is process-wide,
/// so every test holds the same lock.
use super::*;
use std::env;
use std::sync::Mutex;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_engine_env() {
    for key in [
        "ENVIRONMENT",
        "DEBUG",
        "SANDBOX_MODE",
        "INITIAL_POOL_VALUE",
        "INITIAL_PARTICIPANTS",
        "CYCLE_INTERVAL",
        "TRADING_SYMBOLS",
        "MAX_POSITION_SIZE_PCT",
        "MIN_SPREAD_THRESHOLD",
        "RISK_THRESHOLD",
        "LLM_PROVIDER",
        "GROQ_API_KEY",
    ] {
        env::remove_var(key);
    }
}

#[test]
fn test_defaults_load_and_validate() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_engine_env();

    let config = EngineConfig::load().expect("Config should load");
    assert!(config.validate().is_ok());
    assert_eq!(config.initial_pool_value, 100_000.0);
    assert_eq!(config.cycle_interval, 30);
    assert_eq!(config.symbols(), vec!["BTC/USDT", "ETH/USDT"]);
    assert!(config.sandbox_mode);
}

#[test]
fn test_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_engine_env();
    env::set_var("INITIAL_POOL_VALUE", "50000");
    env::set_var("TRADING_SYMBOLS", "SOL/USDT, ADA/USDT");
    env::set_var("CYCLE_INTERVAL", "5");
    env::set_var("DEBUG", "true");

    let config = EngineConfig::load().expect("Config should load");
    assert_eq!(config.initial_pool_value, 50_000.0);
    assert_eq!(config.symbols(), vec!["SOL/USDT", "ADA/USDT"]);
    assert_eq!(config.cycle_interval, 5);
    assert!(config.debug);

    clear_engine_env();
}

#[test]
fn test_validate_rejects_bad_position_cap() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_engine_env();
    env::set_var("MAX_POSITION_SIZE_PCT", "1.5");

    let config = EngineConfig::load().expect("Config should load");
    assert!(config.validate().is_err());

    clear_engine_env();
}

#[test]
fn test_validate_rejects_zero_interval() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_engine_env();
    env::set_var("CYCLE_INTERVAL", "0");

    let config = EngineConfig::load().expect("Config should load");
    assert!(config.validate().is_err());

    clear_engine_env();
}

#[test]
fn test_validate_rejects_unknown_provider() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_engine_env();
    env::set_var("LLM_PROVIDER", "palmtree");

    let config = EngineConfig::load().expect("Config should load");
    assert!(config.validate().is_err());

    clear_engine_env();
}

#[test]
fn test_redacted_config_hides_secrets() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_engine_env();
    env::set_var("GROQ_API_KEY", "gsk_super_secret");

    let config = EngineConfig::load().expect("Config should load");
    let redacted = config.redacted().to_string();
    assert!(!redacted.contains("gsk_super_secret"));
    assert!(redacted.contains("api_key_set"));

    clear_engine_env();
}
