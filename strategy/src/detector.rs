/// Cross-venue arbitrage scan.
///
/// For each symbol the detector pairs every distinct buy venue (lowest
/// asks first) with every distinct sell venue (highest bids first) and
/// emits an opportunity whenever the crossed spread clears the floor.
use pool_core::{Opportunity, QuoteSnapshot};
use pool_core::math::{spread_pct, DEFAULT_FEE_PCT};
use smallvec::SmallVec;
use tracing::info;

/// Quotes per symbol rarely exceed a handful of venues; keep the
/// sort buffers on the stack.
type VenueSide<'a> = SmallVec<[(&'a str, f64, f64); 8]>;

pub struct ArbitrageDetector {
    min_spread_pct: f64,
    fee_pct: f64,
}

impl ArbitrageDetector {
    pub fn new(min_spread_pct: f64) -> Self {
        Self {
            min_spread_pct,
            fee_pct: DEFAULT_FEE_PCT,
        }
    }

    /// Substitute the fee model (tests inject alternatives).
    pub fn with_fee_pct(mut self, fee_pct: f64) -> Self {
        self.fee_pct = fee_pct;
        self
    }

    pub fn fee_pct(&self) -> f64 {
        self.fee_pct
    }

    /// Enumerate buy/sell venue pairs whose spread exceeds the floor,
    /// ranked by net profit descending. Ties break on symbol, then buy
    /// venue, then sell venue, so the ordering is deterministic.
    pub fn scan(&self, snapshot: &QuoteSnapshot) -> Vec<Opportunity> {
        let mut opportunities = Vec::new();

        for (symbol, venues) in &snapshot.quotes {
            let mut asks: VenueSide = SmallVec::new();
            let mut bids: VenueSide = SmallVec::new();

            for (venue, quote) in venues {
                if quote.bid > 0.0 {
                    bids.push((venue.as_str(), quote.bid, quote.volume));
                }
                if quote.ask > 0.0 {
                    asks.push((venue.as_str(), quote.ask, quote.volume));
                }
            }

            // Lowest ask first, highest bid first.
            asks.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
            bids.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

            for &(sell_venue, sell_price, sell_volume) in &bids {
                for &(buy_venue, buy_price, buy_volume) in &asks {
                    if sell_venue == buy_venue {
                        continue;
                    }

                    let spread = spread_pct(sell_price, buy_price);
                    if spread <= self.min_spread_pct {
                        continue;
                    }

                    let max_volume_usd = sell_volume.min(buy_volume) * buy_price;
                    opportunities.push(Opportunity {
                        symbol: symbol.clone(),
                        buy_venue: buy_venue.to_string(),
                        sell_venue: sell_venue.to_string(),
                        buy_price,
                        sell_price,
                        spread_pct: spread,
                        max_volume_usd,
                        ts: snapshot.ts,
                    });
                }
            }
        }

        let fee = self.fee_pct;
        opportunities.sort_by(|a, b| {
            b.profit_pct(fee)
                .partial_cmp(&a.profit_pct(fee))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.symbol.cmp(&b.symbol))
                .then_with(|| a.buy_venue.cmp(&b.buy_venue))
                .then_with(|| a.sell_venue.cmp(&b.sell_venue))
        });

        info!("Found {} arbitrage opportunities", opportunities.len());
        opportunities
    }

    /// Drop opportunities below either floor; order is preserved.
    pub fn filter(
        &self,
        opportunities: Vec<Opportunity>,
        min_profit_pct: f64,
        min_volume_usd: f64,
    ) -> Vec<Opportunity> {
        let before = opportunities.len();
        let filtered: Vec<Opportunity> = opportunities
            .into_iter()
            .filter(|opp| {
                opp.profit_pct(self.fee_pct) >= min_profit_pct
                    && opp.max_volume_usd >= min_volume_usd
            })
            .collect();

        info!("Filtered {} opportunities to {}", before, filtered.len());
        filtered
    }
}
