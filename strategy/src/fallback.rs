/// Rule-based proposal used whenever the oracle is down, disabled, or
/// returns output that fails validation. Deterministic so the loop keeps
/// trading (conservatively) without the advisory model.
use pool_core::{Opportunity, PoolMetrics, Proposal};
use tracing::info;

const CONSERVATIVE_CEILING_USD: f64 = 10_000.0;
const MODERATE_CEILING_USD: f64 = 100_000.0;

/// Tiered by pool size: pick the top-ranked opportunities and spread a
/// fixed fraction of the pool across them equally. Per-opportunity sizes
/// never exceed the opportunity's available volume; overflow is truncated
/// rather than redistributed.
pub fn fallback_proposal(pool: &PoolMetrics, opportunities: &[Opportunity]) -> Proposal {
    let pool_value = pool.total_pool_value_usd;

    let (tier, max_opportunities, total_pct) = if pool_value < CONSERVATIVE_CEILING_USD {
        ("CONSERVATIVE", 1, 0.02)
    } else if pool_value < MODERATE_CEILING_USD {
        ("MODERATE", 3, 0.05)
    } else {
        ("AGGRESSIVE", 5, 0.10)
    };

    let count = opportunities.len().min(max_opportunities);
    if count == 0 {
        return Proposal {
            selected: Vec::new(),
            sizes_usd: Vec::new(),
            risk_label: "MEDIUM".to_string(),
            reasoning: format!("Fallback {} strategy: no opportunities available", tier),
            fallback: true,
        };
    }

    // The detector already ranks by net profit descending.
    let per_opportunity = pool_value * total_pct / count as f64;
    let selected: Vec<usize> = (0..count).collect();
    let sizes_usd: Vec<f64> = selected
        .iter()
        .map(|&i| per_opportunity.min(opportunities[i].max_volume_usd))
        .collect();

    info!(
        "Fallback {} strategy: {} opportunities, {:.2} USD total",
        tier,
        count,
        sizes_usd.iter().sum::<f64>()
    );

    Proposal {
        selected,
        sizes_usd,
        risk_label: "MEDIUM".to_string(),
        reasoning: format!("Fallback {} strategy due to oracle failure", tier),
        fallback: true,
    }
}
