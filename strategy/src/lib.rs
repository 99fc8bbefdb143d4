pub mod detector;
pub mod fallback;
pub mod ports;
pub mod risk;

pub use detector::ArbitrageDetector;
pub use risk::RiskGate;

use crate::fallback::fallback_proposal;
use crate::ports::{validate_proposal, OracleError, StrategyOracle};
use pool_core::telemetry::{FALLBACK_ACTIVATIONS_TOTAL, ORACLE_ERRORS_TOTAL};
use pool_core::{CaseMatch, Opportunity, PoolMetrics, Proposal, QuoteSnapshot};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

const RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// Wires the oracle to the deterministic fallback. Transport failures get
/// one retry with a short backoff; anything else (timeout exhaustion,
/// malformed output, failed validation, disabled provider) routes straight
/// to the rule-based proposal.
pub struct StrategyEngine {
    oracle: Arc<dyn StrategyOracle>,
    oracle_timeout: Duration,
}

impl StrategyEngine {
    pub fn new(oracle: Arc<dyn StrategyOracle>, oracle_timeout: Duration) -> Self {
        Self { oracle, oracle_timeout }
    }

    pub async fn propose(
        &self,
        pool: &PoolMetrics,
        snapshot: &QuoteSnapshot,
        opportunities: &[Opportunity],
        cases: &[CaseMatch],
    ) -> Proposal {
        match self.try_oracle(pool, snapshot, opportunities, cases).await {
            Ok(proposal) => proposal,
            Err(e) => {
                if !matches!(e, OracleError::Disabled) {
                    ORACLE_ERRORS_TOTAL.inc();
                    warn!("Strategy oracle failed ({}), falling back to rules", e);
                }
                FALLBACK_ACTIVATIONS_TOTAL.inc();
                fallback_proposal(pool, opportunities)
            }
        }
    }

    async fn try_oracle(
        &self,
        pool: &PoolMetrics,
        snapshot: &QuoteSnapshot,
        opportunities: &[Opportunity],
        cases: &[CaseMatch],
    ) -> Result<Proposal, OracleError> {
        let mut last_error = None;

        for attempt in 0..2 {
            if attempt > 0 {
                tokio::time::sleep(RETRY_BACKOFF).await;
            }

            let result = tokio::time::timeout(
                self.oracle_timeout,
                self.oracle.propose(pool, snapshot, opportunities, cases),
            )
            .await
            .map_err(|_| OracleError::Timeout)
            .and_then(|inner| inner);

            match result {
                Ok(proposal) => {
                    validate_proposal(&proposal, opportunities.len())?;
                    return Ok(proposal);
                }
                Err(e) if e.is_transient() => {
                    warn!("Oracle attempt {} failed: {}", attempt + 1, e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(OracleError::Timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pool(value: f64) -> PoolMetrics {
        PoolMetrics {
            total_pool_value_usd: value,
            initial_pool_value_usd: value,
            cash_reserve_usd: value,
            cash_ratio: 1.0,
            roi: 0.0,
            participant_count: 2,
            asset_count: 0,
            assets: HashMap::new(),
            age_days: 0.0,
            last_update: 0,
        }
    }

    fn opportunity(spread_pct: f64) -> Opportunity {
        Opportunity {
            symbol: "BTC/USDT".into(),
            buy_venue: "binance".into(),
            sell_venue: "kraken".into(),
            buy_price: 50_000.0,
            sell_price: 50_000.0 * (1.0 + spread_pct / 100.0),
            spread_pct,
            max_volume_usd: 1e9,
            ts: 0,
        }
    }

    struct MalformedOracle;

    #[async_trait::async_trait]
    impl StrategyOracle for MalformedOracle {
        async fn propose(
            &self,
            _pool: &PoolMetrics,
            _snapshot: &QuoteSnapshot,
            _opportunities: &[Opportunity],
            _cases: &[CaseMatch],
        ) -> Result<Proposal, OracleError> {
            Err(OracleError::Malformed("invalid json".into()))
        }
    }

    struct OutOfRangeOracle;

    #[async_trait::async_trait]
    impl StrategyOracle for OutOfRangeOracle {
        async fn propose(
            &self,
            _pool: &PoolMetrics,
            _snapshot: &QuoteSnapshot,
            _opportunities: &[Opportunity],
            _cases: &[CaseMatch],
        ) -> Result<Proposal, OracleError> {
            Ok(Proposal {
                selected: vec![7],
                sizes_usd: vec![500.0],
                risk_label: "LOW".into(),
                reasoning: "hallucinated".into(),
                fallback: false,
            })
        }
    }

    struct FlakyOracle {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl StrategyOracle for FlakyOracle {
        async fn propose(
            &self,
            _pool: &PoolMetrics,
            _snapshot: &QuoteSnapshot,
            _opportunities: &[Opportunity],
            _cases: &[CaseMatch],
        ) -> Result<Proposal, OracleError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(OracleError::Transport("reset by peer".into()))
            } else {
                Ok(Proposal {
                    selected: vec![0],
                    sizes_usd: vec![1_000.0],
                    risk_label: "LOW".into(),
                    reasoning: "retry worked".into(),
                    fallback: false,
                })
            }
        }
    }

    #[tokio::test]
    async fn test_malformed_reply_activates_fallback() {
        // 50k pool, 2 opportunities: fallback proposes both at 5% total
        let engine = StrategyEngine::new(Arc::new(MalformedOracle), Duration::from_secs(2));
        let opps = vec![opportunity(2.0), opportunity(1.0)];
        let proposal = engine
            .propose(&pool(50_000.0), &QuoteSnapshot::default(), &opps, &[])
            .await;

        assert!(proposal.fallback);
        assert_eq!(proposal.selected, vec![0, 1]);
        assert!((proposal.sizes_usd.iter().sum::<f64>() - 2_500.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_invalid_indices_activate_fallback() {
        let engine = StrategyEngine::new(Arc::new(OutOfRangeOracle), Duration::from_secs(2));
        let opps = vec![opportunity(2.0)];
        let proposal = engine
            .propose(&pool(50_000.0), &QuoteSnapshot::default(), &opps, &[])
            .await;

        assert!(proposal.fallback);
    }

    #[tokio::test]
    async fn test_transient_failure_retried_once() {
        let engine = StrategyEngine::new(
            Arc::new(FlakyOracle { calls: AtomicUsize::new(0) }),
            Duration::from_secs(2),
        );
        let opps = vec![opportunity(2.0)];
        let proposal = engine
            .propose(&pool(50_000.0), &QuoteSnapshot::default(), &opps, &[])
            .await;

        assert!(!proposal.fallback);
        assert_eq!(proposal.reasoning, "retry worked");
    }
}
