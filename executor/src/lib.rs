// Paired buy/sell execution. Today every order is simulated with a
// slippage model; the VenueClient port is the seam where real order
// placement slots in without changing the orchestrator.

use pool_core::telemetry::{EXECUTIONS_FAILED_TOTAL, EXECUTIONS_TOTAL, LOSS_USD_TOTAL, PROFIT_USD_TOTAL};
use pool_core::{ExecutionRecord, Opportunity};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

/// Opaque handle to a trading venue. The simulator never places orders;
/// a live implementation would route `place_order` to the venue's API.
#[async_trait::async_trait]
pub trait VenueClient: Send + Sync {
    fn name(&self) -> &str;

    async fn place_order(
        &self,
        symbol: &str,
        side: OrderSide,
        price: f64,
        amount: f64,
    ) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Source of the per-leg slippage draws, injectable so tests can pin
/// execution to exact arithmetic.
pub trait SlippageModel: Send + Sync {
    /// Returns (buy_slip, sell_slip) as fractions.
    fn draw(&self) -> (f64, f64);
}

/// Production model: two independent uniforms on [0, 0.2%].
pub struct UniformSlippage {
    pub max_fraction: f64,
}

impl Default for UniformSlippage {
    fn default() -> Self {
        Self { max_fraction: 0.002 }
    }
}

impl SlippageModel for UniformSlippage {
    fn draw(&self) -> (f64, f64) {
        let mut rng = rand::thread_rng();
        (
            rng.gen_range(0.0..=self.max_fraction),
            rng.gen_range(0.0..=self.max_fraction),
        )
    }
}

pub struct ZeroSlippage;

impl SlippageModel for ZeroSlippage {
    fn draw(&self) -> (f64, f64) {
        (0.0, 0.0)
    }
}

/// Same slippage on both legs, every time.
pub struct FixedSlippage(pub f64);

impl SlippageModel for FixedSlippage {
    fn draw(&self) -> (f64, f64) {
        (self.0, self.0)
    }
}

pub struct TradeExecutor {
    slippage: Arc<dyn SlippageModel>,
    /// Total modeled fees in percentage points, deducted from the
    /// gross edge of every fill.
    fee_pct: f64,
    sandbox: bool,
}

impl TradeExecutor {
    pub fn new(slippage: Arc<dyn SlippageModel>, fee_pct: f64, sandbox: bool) -> Self {
        if !sandbox {
            warn!("Live order placement is not implemented; executions stay simulated");
        }
        Self { slippage, fee_pct, sandbox }
    }

    pub fn sandbox(&self) -> bool {
        self.sandbox
    }

    /// Simulate the paired fill: buy `size_usd` worth at the buy venue's
    /// ask, sell the same asset amount at the sell venue's bid, each leg
    /// slipped against us, fees deducted from the gross edge.
    pub fn execute(
        &self,
        opportunity: &Opportunity,
        size_usd: f64,
        _venues: &HashMap<String, Arc<dyn VenueClient>>,
    ) -> ExecutionRecord {
        info!(
            "Executing arbitrage: {} - buy on {} at {}, sell on {} at {}",
            opportunity.symbol,
            opportunity.buy_venue,
            opportunity.buy_price,
            opportunity.sell_venue,
            opportunity.sell_price
        );

        let asset_amount = size_usd / opportunity.buy_price;
        let (buy_slip, sell_slip) = self.slippage.draw();

        let actual_buy_price = opportunity.buy_price * (1.0 + buy_slip);
        let actual_sell_price = opportunity.sell_price * (1.0 - sell_slip);

        let cost_usd = asset_amount * actual_buy_price;
        let revenue_usd = asset_amount * actual_sell_price;
        let fee_fraction = self.fee_pct / 100.0;
        let profit_usd = (revenue_usd - cost_usd) * (1.0 - fee_fraction);
        let profit_pct = if cost_usd > 0.0 { profit_usd / cost_usd * 100.0 } else { 0.0 };
        let success = profit_usd > 0.0;

        EXECUTIONS_TOTAL.inc();
        if success {
            PROFIT_USD_TOTAL.inc_by(profit_usd);
        } else {
            EXECUTIONS_FAILED_TOTAL.inc();
            LOSS_USD_TOTAL.inc_by(-profit_usd);
        }

        info!(
            "Arbitrage execution result: {:.2} USD ({:.3}%)",
            profit_usd, profit_pct
        );

        ExecutionRecord {
            opportunity: opportunity.clone(),
            size_usd,
            asset_amount,
            actual_buy_price,
            actual_sell_price,
            cost_usd,
            revenue_usd,
            profit_usd,
            profit_pct,
            executed_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            success,
        }
    }
}
