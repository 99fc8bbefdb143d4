/// Pooled cross-exchange arbitrage engine.
///
/// Wires the quote source, detector, strategy oracle, risk gate,
/// executor, pool ledger, case memory, and history recorder into the
/// cycle orchestrator, then serves the control API until shutdown.
mod api;
mod config;
mod history;
mod ledger;
mod memory;
mod oracle;
mod orchestrator;
mod quotes;
mod telemetry;
mod venues;

use crate::api::AppState;
use crate::config::EngineConfig;
use crate::history::HistoryRecorder;
use crate::ledger::PoolLedger;
use crate::memory::InMemoryCaseStore;
use crate::oracle::{DisabledOracle, GroqOracle};
use crate::orchestrator::Orchestrator;
use dotenvy::dotenv;
use executor::{SlippageModel, TradeExecutor, UniformSlippage};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use strategy::ports::{CaseStore, RiskAssessor, StrategyOracle};
use strategy::{ArbitrageDetector, RiskGate, StrategyEngine};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Arc::new(
        EngineConfig::load().map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?,
    );
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid config: {}", e))?;

    let default_filter = if config.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
    pool_core::telemetry::init_metrics();

    info!(
        "Starting arbitrage engine [{}] sandbox={} pool={:.0} USD",
        config.environment, config.sandbox_mode, config.initial_pool_value
    );

    // Pool ledger, seeded with synthetic participants
    let mut pool = PoolLedger::new(config.initial_pool_value);
    pool.seed_participants(config.initial_participants);
    let ledger = Arc::new(Mutex::new(pool));

    // Market data and execution plumbing
    let quote_source = quotes::build_quote_source(&config);
    let detector = ArbitrageDetector::new(config.min_spread_threshold).with_fee_pct(config.fee_pct);
    let slippage: Arc<dyn SlippageModel> = Arc::new(UniformSlippage::default());
    let trade_executor = TradeExecutor::new(slippage, config.fee_pct, config.sandbox_mode);
    let venue_clients = venues::build_venue_clients(&config);

    // Advisory stack: oracle provider selected by configuration, with the
    // deterministic fallback behind it either way.
    let (strategy_oracle, risk_assessor): (Arc<dyn StrategyOracle>, Arc<dyn RiskAssessor>) =
        if config.llm_provider == "groq" && !config.groq_api_key.is_empty() {
            let groq = Arc::new(GroqOracle::from_config(&config)?);
            (groq.clone(), groq)
        } else {
            if config.llm_provider == "groq" {
                warn!("GROQ_API_KEY missing; running with the oracle disabled");
            }
            (Arc::new(DisabledOracle), Arc::new(DisabledOracle))
        };
    let strategy_engine = StrategyEngine::new(
        strategy_oracle,
        Duration::from_secs(config.groq_timeout_secs),
    );
    let risk_gate = RiskGate::new(risk_assessor, config.risk_threshold);

    // Persistence: advisory case memory plus the cycle history store
    let case_store: Arc<dyn CaseStore> = Arc::new(InMemoryCaseStore::new());
    let history = Arc::new(
        HistoryRecorder::new(config.database_url.as_deref(), &config.data_dir).await?,
    );

    let orchestrator = Orchestrator::new(
        Arc::clone(&config),
        ledger,
        quote_source,
        detector,
        strategy_engine,
        risk_gate,
        trade_executor,
        venue_clients,
        case_store,
        Arc::clone(&history),
    );

    telemetry::serve_metrics(config.metrics_port).await;

    // The loop runs from boot; the API can stop and restart it.
    orchestrator
        .start()
        .map_err(|e| anyhow::anyhow!("failed to start trading loop: {}", e))?;

    let state = AppState {
        orchestrator: Arc::clone(&orchestrator),
        config: Arc::clone(&config),
    };
    api::serve(state, config.api_port, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutdown signal received");
    })
    .await?;

    // API is down; drain the orchestrator, then release persistence.
    if orchestrator.stop().is_ok() {
        for _ in 0..100 {
            if !orchestrator.is_running() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
    history.close().await;
    info!("Engine stopped");
    Ok(())
}
