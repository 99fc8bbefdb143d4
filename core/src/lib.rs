pub mod math;
pub mod telemetry;

use serde::{Serialize, Deserialize};
use std::collections::HashMap;

/// Fixed-point USD amount in micro-dollars (1 USD = 1_000_000).
/// All ledger balances are held in this unit; floats are for prices
/// and percentages only.
pub type UsdMicros = i64;

/// Top-of-book quote from a single venue.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct VenueQuote {
    pub bid: f64,
    pub ask: f64,
    pub volume: f64,
    pub ts: u64,
}

/// Immutable snapshot of quotes: symbol -> venue -> quote.
/// All entries share one logical timestamp.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct QuoteSnapshot {
    pub quotes: HashMap<String, HashMap<String, VenueQuote>>,
    pub ts: u64,
}

impl QuoteSnapshot {
    pub fn is_empty(&self) -> bool {
        self.quotes.values().all(|v| v.is_empty())
    }

    pub fn venues_for(&self, symbol: &str) -> usize {
        self.quotes.get(symbol).map_or(0, |v| v.len())
    }
}

/// A crossed market between two venues: buy at `buy_venue`'s ask,
/// sell at `sell_venue`'s bid.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Opportunity {
    pub symbol: String,
    pub buy_venue: String,
    pub sell_venue: String,
    pub buy_price: f64,
    pub sell_price: f64,
    pub spread_pct: f64,
    pub max_volume_usd: f64,
    pub ts: u64,
}

impl Opportunity {
    /// Spread net of modeled fees, in percentage points.
    pub fn profit_pct(&self, fee_pct: f64) -> f64 {
        self.spread_pct - fee_pct
    }
}

/// Selected opportunities and their position sizes, produced by the
/// strategy oracle or the deterministic fallback.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Proposal {
    pub selected: Vec<usize>,
    pub sizes_usd: Vec<f64>,
    pub risk_label: String,
    pub reasoning: String,
    /// Set when the rule-based fallback produced this proposal.
    pub fallback: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct RiskFactors {
    pub liquidity: Option<String>,
    pub venue: Option<String>,
    pub market: Option<String>,
    pub pool_impact: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RiskAssessment {
    /// 1 (lowest risk) to 10 (highest risk).
    pub score: u8,
    pub recommendation: String,
    pub factors: Option<RiskFactors>,
}

impl RiskAssessment {
    pub fn unable_to_assess() -> Self {
        Self {
            score: 5,
            recommendation: "unable to assess".to_string(),
            factors: None,
        }
    }
}

/// Outcome of one simulated paired buy/sell.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExecutionRecord {
    pub opportunity: Opportunity,
    pub size_usd: f64,
    pub asset_amount: f64,
    pub actual_buy_price: f64,
    pub actual_sell_price: f64,
    pub cost_usd: f64,
    pub revenue_usd: f64,
    pub profit_usd: f64,
    pub profit_pct: f64,
    pub executed_at: u64,
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    Completed,
    Error,
}

/// One observe -> reason -> act -> reflect pass. Retained in a bounded
/// ring (capacity 100) and appended to the history store.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CycleRecord {
    pub cycle_id: u64,
    pub ts: u64,
    pub status: CycleStatus,
    pub opportunities_found: usize,
    pub opportunities_filtered: usize,
    pub proposal: Option<Proposal>,
    pub risk: Option<RiskAssessment>,
    pub executions: Vec<ExecutionRecord>,
    pub pool: PoolMetrics,
    pub duration_s: f64,
    pub message: Option<String>,
    pub error: Option<String>,
}

/// Pool-level readout, taken under the ledger lock.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PoolMetrics {
    pub total_pool_value_usd: f64,
    pub initial_pool_value_usd: f64,
    pub cash_reserve_usd: f64,
    pub cash_ratio: f64,
    pub roi: f64,
    pub participant_count: usize,
    pub asset_count: usize,
    pub assets: HashMap<String, f64>,
    pub age_days: f64,
    pub last_update: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ParticipantMetrics {
    pub id: String,
    pub initial_investment_usd: f64,
    pub current_value_usd: f64,
    pub roi: f64,
    pub join_time: u64,
    pub pending_withdrawals: usize,
}

/// Fixed-schema context a trade was taken in; embedded by the case store.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct CaseContext {
    pub pool_value_usd: f64,
    pub participant_count: usize,
    pub spread_pct: f64,
    pub position_size_usd: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct CaseOutcome {
    pub profit_usd: f64,
    pub execution_time_s: f64,
    pub slippage_pct: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CaseMatch {
    pub context: CaseContext,
    pub outcome: CaseOutcome,
    pub distance: f64,
}
