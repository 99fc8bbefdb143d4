/// Cycle orchestrator: owns the observe -> reason -> act -> reflect loop,
/// the circuit breaker, and the bounded cycle history. All other
/// components are passive callees; the orchestrator task is the only
/// writer to the pool ledger while a cycle runs.
use crate::config::EngineConfig;
use crate::history::HistoryRecorder;
use crate::ledger::PoolLedger;
use crate::quotes::QuoteSource;
use executor::{TradeExecutor, VenueClient};
use parking_lot::Mutex;
use pool_core::math::usd_to_micros;
use pool_core::telemetry::{
    CASE_STORE_ERRORS_TOTAL, CIRCUIT_BREAKER_TRIPS_TOTAL, CYCLES_COMPLETED_TOTAL,
    CYCLES_ERROR_TOTAL, CYCLE_DURATION_SECONDS, OPPORTUNITIES_DETECTED_TOTAL,
    OPPORTUNITIES_FILTERED_TOTAL, RISK_VETOES_TOTAL,
};
use pool_core::{CaseContext, CaseOutcome, CycleRecord, CycleStatus};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use strategy::ports::CaseStore;
use strategy::{ArbitrageDetector, RiskGate, StrategyEngine};
use tokio::sync::watch;
use tracing::{error, info, warn};

const HISTORY_RING_CAPACITY: usize = 100;
const RECENT_CYCLES: usize = 5;
const NEAREST_CASES: usize = 5;

const BREAKER_MIN_OPERATIONS: u64 = 10;
const BREAKER_ERROR_RATE: f64 = 0.15;
const BREAKER_FALLBACK_RATE: f64 = 0.30;
const BREAKER_MAX_DRAWDOWN: f64 = 0.15;

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("already running")]
    AlreadyRunning,
    #[error("already stopped")]
    AlreadyStopped,
    #[error("busy: continuous loop is active")]
    Busy,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Breaker counters are mutated only by the orchestrator task and read
/// with atomic semantics by API handlers.
pub struct CircuitBreaker {
    error_count: AtomicU64,
    opportunities_detected: AtomicU64,
    executions_succeeded: AtomicU64,
    fallback_activations: AtomicU64,
    cooldown: Duration,
    tripped_until_ms: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BreakerStatus {
    pub error_count: u64,
    pub opportunities_detected: u64,
    pub executions_succeeded: u64,
    pub fallback_activations: u64,
    pub tripped: bool,
    pub tripped_until_ms: Option<u64>,
}

impl CircuitBreaker {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            error_count: AtomicU64::new(0),
            opportunities_detected: AtomicU64::new(0),
            executions_succeeded: AtomicU64::new(0),
            fallback_activations: AtomicU64::new(0),
            cooldown,
            tripped_until_ms: AtomicU64::new(0),
        }
    }

    pub fn record_error(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_detected(&self, count: u64) {
        self.opportunities_detected.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_executed(&self) {
        self.executions_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback(&self) {
        self.fallback_activations.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the trip reason when any threshold is crossed: rolling
    /// error rate, fallback share of executions, or pool drawdown.
    pub fn should_trip(&self, drawdown: f64) -> Option<&'static str> {
        let errors = self.error_count.load(Ordering::Relaxed);
        let detected = self.opportunities_detected.load(Ordering::Relaxed);
        let executed = self.executions_succeeded.load(Ordering::Relaxed);
        let fallbacks = self.fallback_activations.load(Ordering::Relaxed);

        let operations = detected + executed;
        if operations >= BREAKER_MIN_OPERATIONS
            && errors as f64 / operations as f64 > BREAKER_ERROR_RATE
        {
            return Some("error rate");
        }

        if executed > 0 && fallbacks as f64 / executed as f64 > BREAKER_FALLBACK_RATE {
            return Some("fallback rate");
        }

        if drawdown > BREAKER_MAX_DRAWDOWN {
            return Some("drawdown");
        }

        None
    }

    pub fn trip(&self) {
        let until = now_ms() + self.cooldown.as_millis() as u64;
        self.tripped_until_ms.store(until, Ordering::SeqCst);
    }

    pub fn is_tripped(&self) -> bool {
        now_ms() < self.tripped_until_ms.load(Ordering::SeqCst)
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn status(&self) -> BreakerStatus {
        let until = self.tripped_until_ms.load(Ordering::SeqCst);
        BreakerStatus {
            error_count: self.error_count.load(Ordering::Relaxed),
            opportunities_detected: self.opportunities_detected.load(Ordering::Relaxed),
            executions_succeeded: self.executions_succeeded.load(Ordering::Relaxed),
            fallback_activations: self.fallback_activations.load(Ordering::Relaxed),
            tripped: now_ms() < until,
            tripped_until_ms: if until > 0 { Some(until) } else { None },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub running: bool,
    pub last_cycle_ts: u64,
    pub metrics: BreakerStatus,
    pub pool: pool_core::PoolMetrics,
    pub recent_cycles: Vec<CycleRecord>,
}

pub struct Orchestrator {
    config: Arc<EngineConfig>,
    ledger: Arc<Mutex<PoolLedger>>,
    quotes: Arc<QuoteSource>,
    detector: ArbitrageDetector,
    strategy: StrategyEngine,
    risk_gate: RiskGate,
    trade_executor: TradeExecutor,
    venues: HashMap<String, Arc<dyn VenueClient>>,
    cases: Arc<dyn CaseStore>,
    history: Arc<HistoryRecorder>,
    breaker: CircuitBreaker,
    ring: Mutex<VecDeque<CycleRecord>>,
    running: AtomicBool,
    /// Serializes cycles between the loop and RunOneCycle.
    cycle_guard: tokio::sync::Mutex<()>,
    cycle_counter: AtomicU64,
    last_cycle_ts: AtomicU64,
    shutdown: watch::Sender<bool>,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<EngineConfig>,
        ledger: Arc<Mutex<PoolLedger>>,
        quotes: Arc<QuoteSource>,
        detector: ArbitrageDetector,
        strategy: StrategyEngine,
        risk_gate: RiskGate,
        trade_executor: TradeExecutor,
        venues: HashMap<String, Arc<dyn VenueClient>>,
        cases: Arc<dyn CaseStore>,
        history: Arc<HistoryRecorder>,
    ) -> Arc<Self> {
        let cooldown = Duration::from_secs(config.breaker_cooldown_secs);
        let (shutdown, _) = watch::channel(false);
        Arc::new(Self {
            config,
            ledger,
            quotes,
            detector,
            strategy,
            risk_gate,
            trade_executor,
            venues,
            cases,
            history,
            breaker: CircuitBreaker::new(cooldown),
            ring: Mutex::new(VecDeque::with_capacity(HISTORY_RING_CAPACITY)),
            running: AtomicBool::new(false),
            cycle_guard: tokio::sync::Mutex::new(()),
            cycle_counter: AtomicU64::new(0),
            last_cycle_ts: AtomicU64::new(0),
            shutdown,
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn ledger(&self) -> &Arc<Mutex<PoolLedger>> {
        &self.ledger
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Spawn the continuous loop. Rejected when already active.
    pub fn start(self: &Arc<Self>) -> Result<(), OrchestratorError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(OrchestratorError::AlreadyRunning);
        }
        self.shutdown.send_replace(false);
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            orchestrator.run_loop().await;
        });
        info!("Trading loop started");
        Ok(())
    }

    /// Signal the loop to exit after the in-flight cycle flushes Reflect.
    pub fn stop(&self) -> Result<(), OrchestratorError> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(OrchestratorError::AlreadyStopped);
        }
        self.shutdown.send_replace(true);
        info!("Trading loop stop requested");
        Ok(())
    }

    async fn run_loop(self: Arc<Self>) {
        let interval = Duration::from_secs(self.config.cycle_interval);

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            let started = Instant::now();
            {
                let _guard = self.cycle_guard.lock().await;
                self.execute_cycle().await;
            }

            let drawdown = {
                let metrics = self.ledger.lock().pool_metrics();
                if metrics.initial_pool_value_usd > 0.0 {
                    (metrics.initial_pool_value_usd - metrics.total_pool_value_usd)
                        / metrics.initial_pool_value_usd
                } else {
                    0.0
                }
            };
            if let Some(reason) = self.breaker.should_trip(drawdown) {
                CIRCUIT_BREAKER_TRIPS_TOTAL.inc();
                self.breaker.trip();
                warn!(
                    "Circuit breaker triggered ({}) - pausing trading for {:?}",
                    reason,
                    self.breaker.cooldown()
                );
                self.interruptible_sleep(self.breaker.cooldown()).await;
                continue;
            }

            // Fixed cadence: an over-running cycle starts the next one
            // immediately, never in a catch-up burst.
            let elapsed = started.elapsed();
            if elapsed < interval {
                self.interruptible_sleep(interval - elapsed).await;
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!("Trading loop stopped");
    }

    async fn interruptible_sleep(&self, duration: Duration) {
        let mut shutdown = self.shutdown.subscribe();
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = shutdown.changed() => {}
        }
    }

    /// One cycle on demand, rejected while the continuous loop is active.
    pub async fn run_one_cycle(&self) -> Result<CycleRecord, OrchestratorError> {
        if self.is_running() {
            return Err(OrchestratorError::Busy);
        }
        let _guard = self
            .cycle_guard
            .try_lock()
            .map_err(|_| OrchestratorError::Busy)?;
        Ok(self.execute_cycle().await)
    }

    async fn execute_cycle(&self) -> CycleRecord {
        let cycle_id = self.cycle_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let started = Instant::now();
        let ts = now_secs();
        info!("Starting trading cycle {}", cycle_id);

        let record = match self.run_stages(cycle_id, ts, started).await {
            Ok(record) => record,
            Err(message) => {
                self.breaker.record_error();
                CYCLES_ERROR_TOTAL.inc();
                error!("Cycle {} aborted: {}", cycle_id, message);
                CycleRecord {
                    cycle_id,
                    ts,
                    status: CycleStatus::Error,
                    opportunities_found: 0,
                    opportunities_filtered: 0,
                    proposal: None,
                    risk: None,
                    executions: Vec::new(),
                    pool: self.ledger.lock().pool_metrics(),
                    duration_s: started.elapsed().as_secs_f64(),
                    message: None,
                    error: Some(message),
                }
            }
        };

        self.finish_cycle(record).await
    }

    async fn run_stages(
        &self,
        cycle_id: u64,
        ts: u64,
        started: Instant,
    ) -> Result<CycleRecord, String> {
        // Observe
        let snapshot = self
            .quotes
            .snapshot()
            .await
            .map_err(|e| format!("observe failed: {}", e))?;

        let opportunities = self.detector.scan(&snapshot);
        let found = opportunities.len();
        OPPORTUNITIES_DETECTED_TOTAL.inc_by(found as f64);
        self.breaker.record_detected(found as u64);

        let filtered = self.detector.filter(
            opportunities,
            self.config.min_profit_pct,
            self.config.min_volume_usd,
        );
        OPPORTUNITIES_FILTERED_TOTAL.inc_by(filtered.len() as f64);

        if filtered.is_empty() {
            info!("No viable arbitrage opportunities found");
            return Ok(CycleRecord {
                cycle_id,
                ts,
                status: CycleStatus::Completed,
                opportunities_found: found,
                opportunities_filtered: 0,
                proposal: None,
                risk: None,
                executions: Vec::new(),
                pool: self.ledger.lock().pool_metrics(),
                duration_s: started.elapsed().as_secs_f64(),
                message: Some("No viable arbitrage opportunities found".to_string()),
                error: None,
            });
        }

        // Reason
        let pool_metrics = self.ledger.lock().pool_metrics();
        let retrieval_context = CaseContext {
            pool_value_usd: pool_metrics.total_pool_value_usd,
            participant_count: pool_metrics.participant_count,
            spread_pct: filtered[0].spread_pct,
            position_size_usd: 0.0,
        };
        let cases = match self.cases.nearest(&retrieval_context, NEAREST_CASES).await {
            Ok(cases) => cases,
            Err(e) => {
                CASE_STORE_ERRORS_TOTAL.inc();
                warn!("Case retrieval failed ({}), proceeding without history", e);
                Vec::new()
            }
        };

        let proposal = self
            .strategy
            .propose(&pool_metrics, &snapshot, &filtered, &cases)
            .await;
        if proposal.fallback {
            self.breaker.record_fallback();
        }

        let assessment = self
            .risk_gate
            .assess(&pool_metrics, &proposal, &filtered)
            .await;

        // Act
        let mut executions = Vec::new();
        let mut act_elapsed = 0.0;
        if self.risk_gate.clears(&assessment) {
            let act_started = Instant::now();
            let max_position =
                pool_metrics.total_pool_value_usd * self.config.max_position_size_pct;

            for (&index, &size_usd) in proposal.selected.iter().zip(proposal.sizes_usd.iter()) {
                let opportunity = match filtered.get(index) {
                    Some(opportunity) => opportunity,
                    None => continue,
                };
                let size = size_usd.min(max_position).min(opportunity.max_volume_usd);
                if size <= 0.0 {
                    continue;
                }

                let execution = self.trade_executor.execute(opportunity, size, &self.venues);
                if execution.success {
                    self.breaker.record_executed();
                }
                executions.push(execution);
            }
            act_elapsed = act_started.elapsed().as_secs_f64();
        } else {
            RISK_VETOES_TOTAL.inc();
            info!(
                "Skipping execution due to high risk score: {}",
                assessment.score
            );
        }

        // Reflect
        if !executions.is_empty() {
            let total_profit: f64 = executions.iter().map(|e| e.profit_usd).sum();
            {
                let mut ledger = self.ledger.lock();
                let new_value = ledger.pool_value_micros() + usd_to_micros(total_profit);
                ledger.mark_pool_value(new_value);
            }

            let pool_after = self.ledger.lock().pool_metrics();
            for execution in &executions {
                let context = CaseContext {
                    pool_value_usd: pool_after.total_pool_value_usd,
                    participant_count: pool_after.participant_count,
                    spread_pct: execution.opportunity.spread_pct,
                    position_size_usd: execution.size_usd,
                };
                let buy_slip = execution.actual_buy_price / execution.opportunity.buy_price - 1.0;
                let sell_slip = 1.0 - execution.actual_sell_price / execution.opportunity.sell_price;
                let outcome = CaseOutcome {
                    profit_usd: execution.profit_usd,
                    execution_time_s: act_elapsed,
                    slippage_pct: (buy_slip + sell_slip) / 2.0 * 100.0,
                };
                if let Err(e) = self.cases.record(context, outcome).await {
                    CASE_STORE_ERRORS_TOTAL.inc();
                    warn!("Failed to record trade case: {}", e);
                }
            }
        }

        Ok(CycleRecord {
            cycle_id,
            ts,
            status: CycleStatus::Completed,
            opportunities_found: found,
            opportunities_filtered: filtered.len(),
            proposal: Some(proposal),
            risk: Some(assessment),
            executions,
            pool: self.ledger.lock().pool_metrics(),
            duration_s: started.elapsed().as_secs_f64(),
            message: None,
            error: None,
        })
    }

    async fn finish_cycle(&self, record: CycleRecord) -> CycleRecord {
        if record.status == CycleStatus::Completed {
            CYCLES_COMPLETED_TOTAL.inc();
        }
        CYCLE_DURATION_SECONDS.observe(record.duration_s);
        self.last_cycle_ts.store(record.ts, Ordering::SeqCst);

        {
            let mut ring = self.ring.lock();
            ring.push_back(record.clone());
            while ring.len() > HISTORY_RING_CAPACITY {
                ring.pop_front();
            }
        }

        self.history.record_cycle(&record).await;
        record
    }

    pub fn status(&self) -> EngineStatus {
        let ring = self.ring.lock();
        let recent_cycles = ring
            .iter()
            .rev()
            .take(RECENT_CYCLES)
            .cloned()
            .collect::<Vec<_>>();
        EngineStatus {
            running: self.is_running(),
            last_cycle_ts: self.last_cycle_ts.load(Ordering::SeqCst),
            metrics: self.breaker.status(),
            pool: self.ledger.lock().pool_metrics(),
            recent_cycles,
        }
    }

    pub fn cycle_history_len(&self) -> usize {
        self.ring.lock().len()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_cycle_with_single_venue_finds_nothing() {
        // One symbol listed on one venue: no pairs, cycle completes clean.
        let quotes = fixed_quote_source(vec![("binance", 49_000.0, 49_100.0, 10.0)]);
        let parts = build_orchestrator(
            100_000.0,
            quotes,
            Arc::new(FailingOracle),
            Arc::new(FixedAssessor(3)),
        )
        .await;

        let record = parts.orchestrator.run_one_cycle().await.unwrap();
        assert_eq!(record.status, CycleStatus::Completed);
        assert_eq!(record.opportunities_found, 0);
        assert!(record.executions.is_empty());
        assert_eq!(record.pool.total_pool_value_usd, 100_000.0);
        assert_eq!(record.message.as_deref(), Some("No viable arbitrage opportunities found"));
    }

    #[tokio::test]
    async fn test_fallback_path_executes_and_counts() {
        // Oracle returns garbage for a 50k pool with one crossed pair:
        // the rule-based moderate tier sizes 5% of the pool into it and
        // the breaker counts one fallback activation.
        let quotes = fixed_quote_source(vec![
            ("binance", 49_000.0, 49_100.0, 10.0),
            ("kraken", 49_900.0, 50_000.0, 8.0),
        ]);
        let parts = build_orchestrator(
            50_000.0,
            quotes,
            Arc::new(FailingOracle),
            Arc::new(FixedAssessor(3)),
        )
        .await;

        let record = parts.orchestrator.run_one_cycle().await.unwrap();
        assert_eq!(record.status, CycleStatus::Completed);

        let proposal = record.proposal.as_ref().unwrap();
        assert!(proposal.fallback);
        assert_eq!(parts.orchestrator.breaker().status().fallback_activations, 1);

        assert_eq!(record.executions.len(), 1);
        // Moderate tier: 5% of 50k over the single viable pair
        assert!((record.executions[0].size_usd - 2_500.0).abs() < 1e-9);
        assert!(record.executions[0].success);
        // Realized profit marked into the pool
        assert!(record.pool.total_pool_value_usd > 50_000.0);
        // Each execution leaves a case behind
        assert_eq!(parts.cases.len(), 1);
    }

    #[tokio::test]
    async fn test_risk_veto_blocks_execution() {
        let quotes = fixed_quote_source(vec![
            ("binance", 49_000.0, 49_100.0, 10.0),
            ("kraken", 49_900.0, 50_000.0, 8.0),
        ]);
        let parts = build_orchestrator(
            50_000.0,
            quotes,
            Arc::new(FailingOracle),
            Arc::new(FixedAssessor(9)),
        )
        .await;

        let record = parts.orchestrator.run_one_cycle().await.unwrap();
        assert_eq!(record.status, CycleStatus::Completed);
        assert!(record.executions.is_empty());
        assert_eq!(record.pool.total_pool_value_usd, 50_000.0);
        assert_eq!(record.risk.as_ref().unwrap().score, 9);
        // Vetoed cycles record no cases
        assert_eq!(parts.cases.len(), 0);
    }

    #[tokio::test]
    async fn test_dead_quote_source_aborts_cycle() {
        let quotes = fixed_quote_source(vec![]);
        let parts = build_orchestrator(
            100_000.0,
            quotes,
            Arc::new(FailingOracle),
            Arc::new(FixedAssessor(3)),
        )
        .await;

        let record = parts.orchestrator.run_one_cycle().await.unwrap();
        assert_eq!(record.status, CycleStatus::Error);
        assert!(record.error.is_some());
        assert_eq!(parts.orchestrator.breaker().status().error_count, 1);
    }

    #[tokio::test]
    async fn test_history_ring_trims_to_capacity() {
        let quotes = fixed_quote_source(vec![("binance", 49_000.0, 49_100.0, 10.0)]);
        let parts = build_orchestrator(
            100_000.0,
            quotes,
            Arc::new(FailingOracle),
            Arc::new(FixedAssessor(3)),
        )
        .await;

        for _ in 0..110 {
            parts.orchestrator.run_one_cycle().await.unwrap();
        }
        assert_eq!(parts.orchestrator.cycle_history_len(), 100);

        let status = parts.orchestrator.status();
        assert_eq!(status.recent_cycles.len(), 5);
        // Most recent first
        assert!(status.recent_cycles[0].cycle_id > status.recent_cycles[4].cycle_id);
    }

    #[tokio::test]
    async fn test_breaker_trips_on_drawdown_and_holds_cooldown() {
        let breaker = CircuitBreaker::new(Duration::from_millis(50));
        assert!(breaker.should_trip(0.10).is_none());
        assert_eq!(breaker.should_trip(0.20), Some("drawdown"));

        breaker.trip();
        assert!(breaker.is_tripped());
        tokio::time::sleep(Duration::from_millis(70)).await;
        assert!(!breaker.is_tripped());
    }

    #[tokio::test]
    async fn test_breaker_error_rate_threshold() {
        let breaker = CircuitBreaker::new(Duration::from_secs(300));
        breaker.record_detected(10);
        breaker.record_error();
        // 1/10 = 10% is under the limit
        assert!(breaker.should_trip(0.0).is_none());
        breaker.record_error();
        // 2/10 = 20% crosses it
        assert_eq!(breaker.should_trip(0.0), Some("error rate"));
    }

    #[tokio::test]
    async fn test_breaker_fallback_rate_threshold() {
        let breaker = CircuitBreaker::new(Duration::from_secs(300));
        breaker.record_executed();
        breaker.record_executed();
        breaker.record_executed();
        breaker.record_fallback();
        // 1/3 > 30%
        assert_eq!(breaker.should_trip(0.0), Some("fallback rate"));
    }

    #[tokio::test]
    async fn test_run_one_cycle_rejected_while_loop_active() {
        let quotes = fixed_quote_source(vec![("binance", 49_000.0, 49_100.0, 10.0)]);
        let parts = build_orchestrator(
            100_000.0,
            quotes,
            Arc::new(FailingOracle),
            Arc::new(FixedAssessor(3)),
        )
        .await;

        parts.orchestrator.start().unwrap();
        assert!(matches!(
            parts.orchestrator.start(),
            Err(OrchestratorError::AlreadyRunning)
        ));
        assert!(matches!(
            parts.orchestrator.run_one_cycle().await,
            Err(OrchestratorError::Busy)
        ));

        parts.orchestrator.stop().unwrap();
        // The loop finishes its in-flight cycle and clears the flag
        for _ in 0..50 {
            if !parts.orchestrator.is_running() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(!parts.orchestrator.is_running());
        assert!(matches!(
            parts.orchestrator.stop(),
            Err(OrchestratorError::AlreadyStopped)
        ));
    }
}
