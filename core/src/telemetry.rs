use prometheus::{Counter, CounterVec, Gauge, Histogram, HistogramOpts, Opts, Registry};
use lazy_static::lazy_static;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Cycle metrics
    pub static ref CYCLES_COMPLETED_TOTAL: Counter = Counter::new(
        "cycles_completed_total",
        "Trading cycles that finished with status completed"
    ).unwrap();

    pub static ref CYCLES_ERROR_TOTAL: Counter = Counter::new(
        "cycles_error_total",
        "Trading cycles that aborted with status error"
    ).unwrap();

    pub static ref CYCLE_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "cycle_duration_seconds",
            "Wall-clock duration of one observe-reason-act-reflect pass"
        ).buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0])
    ).unwrap();

    // Opportunity metrics
    pub static ref OPPORTUNITIES_DETECTED_TOTAL: Counter = Counter::new(
        "opportunities_detected_total",
        "Total arbitrage opportunities emitted by the detector"
    ).unwrap();

    pub static ref OPPORTUNITIES_FILTERED_TOTAL: Counter = Counter::new(
        "opportunities_filtered_total",
        "Opportunities surviving the profit/volume filter"
    ).unwrap();

    // Execution metrics
    pub static ref EXECUTIONS_TOTAL: Counter = Counter::new(
        "executions_total",
        "Total simulated paired trades executed"
    ).unwrap();

    pub static ref EXECUTIONS_FAILED_TOTAL: Counter = Counter::new(
        "executions_failed_total",
        "Executions that closed at a loss"
    ).unwrap();

    pub static ref PROFIT_USD_TOTAL: Counter = Counter::new(
        "profit_usd_total",
        "Cumulative realized profit in USD"
    ).unwrap();

    pub static ref LOSS_USD_TOTAL: Counter = Counter::new(
        "loss_usd_total",
        "Cumulative realized loss in USD"
    ).unwrap();

    pub static ref POOL_VALUE_USD: Gauge = Gauge::new(
        "pool_value_usd",
        "Current marked pool value in USD"
    ).unwrap();

    // Oracle & fallback
    pub static ref ORACLE_ERRORS_TOTAL: Counter = Counter::new(
        "oracle_errors_total",
        "Strategy/risk oracle calls that failed validation or transport"
    ).unwrap();

    pub static ref FALLBACK_ACTIVATIONS_TOTAL: Counter = Counter::new(
        "fallback_activations_total",
        "Cycles that fell back to the rule-based strategy"
    ).unwrap();

    // Risk & breaker
    pub static ref RISK_VETOES_TOTAL: Counter = Counter::new(
        "risk_vetoes_total",
        "Proposals blocked by the risk gate"
    ).unwrap();

    pub static ref CIRCUIT_BREAKER_TRIPS_TOTAL: Counter = Counter::new(
        "circuit_breaker_trips_total",
        "Number of times the circuit breaker paused the loop"
    ).unwrap();

    // Ledger metrics
    pub static ref WITHDRAWALS_COMPLETED_TOTAL: Counter = Counter::new(
        "withdrawals_completed_total",
        "Withdrawal requests completed against the cash reserve"
    ).unwrap();

    pub static ref WITHDRAWALS_DELAYED_TOTAL: Counter = Counter::new(
        "withdrawals_delayed_total",
        "Withdrawal requests delayed for lack of cash"
    ).unwrap();

    // External dependency health
    pub static ref QUOTE_FETCH_ERRORS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("quote_fetch_errors_total", "Per-venue quote fetch failures"),
        &["venue"]
    ).unwrap();

    pub static ref CASE_STORE_ERRORS_TOTAL: Counter = Counter::new(
        "case_store_errors_total",
        "Case store reads/writes that failed and were degraded"
    ).unwrap();

    pub static ref HISTORY_WRITE_ERRORS_TOTAL: Counter = Counter::new(
        "history_write_errors_total",
        "Cycle history rows that could not be persisted"
    ).unwrap();
}

pub fn init_metrics() {
    REGISTRY.register(Box::new(CYCLES_COMPLETED_TOTAL.clone())).unwrap();
    REGISTRY.register(Box::new(CYCLES_ERROR_TOTAL.clone())).unwrap();
    REGISTRY.register(Box::new(CYCLE_DURATION_SECONDS.clone())).unwrap();
    REGISTRY.register(Box::new(OPPORTUNITIES_DETECTED_TOTAL.clone())).unwrap();
    REGISTRY.register(Box::new(OPPORTUNITIES_FILTERED_TOTAL.clone())).unwrap();
    REGISTRY.register(Box::new(EXECUTIONS_TOTAL.clone())).unwrap();
    REGISTRY.register(Box::new(EXECUTIONS_FAILED_TOTAL.clone())).unwrap();
    REGISTRY.register(Box::new(PROFIT_USD_TOTAL.clone())).unwrap();
    REGISTRY.register(Box::new(LOSS_USD_TOTAL.clone())).unwrap();
    REGISTRY.register(Box::new(POOL_VALUE_USD.clone())).unwrap();
    REGISTRY.register(Box::new(ORACLE_ERRORS_TOTAL.clone())).unwrap();
    REGISTRY.register(Box::new(FALLBACK_ACTIVATIONS_TOTAL.clone())).unwrap();
    REGISTRY.register(Box::new(RISK_VETOES_TOTAL.clone())).unwrap();
    REGISTRY.register(Box::new(CIRCUIT_BREAKER_TRIPS_TOTAL.clone())).unwrap();
    REGISTRY.register(Box::new(WITHDRAWALS_COMPLETED_TOTAL.clone())).unwrap();
    REGISTRY.register(Box::new(WITHDRAWALS_DELAYED_TOTAL.clone())).unwrap();
    REGISTRY.register(Box::new(QUOTE_FETCH_ERRORS_TOTAL.clone())).unwrap();
    REGISTRY.register(Box::new(CASE_STORE_ERRORS_TOTAL.clone())).unwrap();
    REGISTRY.register(Box::new(HISTORY_WRITE_ERRORS_TOTAL.clone())).unwrap();
}
