// Port definitions for the decision layer. These traits are the seams
// between the cycle orchestrator and the external advisory services so
// providers can be swapped without touching the loop.

use pool_core::{
    CaseContext, CaseMatch, CaseOutcome, Opportunity, PoolMetrics, Proposal, QuoteSnapshot,
    RiskAssessment,
};

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("oracle disabled by configuration")]
    Disabled,
    #[error("oracle transport failed: {0}")]
    Transport(String),
    #[error("oracle call timed out")]
    Timeout,
    #[error("malformed oracle reply: {0}")]
    Malformed(String),
    #[error("proposal failed validation: {0}")]
    Invalid(String),
}

impl OracleError {
    /// Transport-level failures are worth one retry; bad output is not.
    pub fn is_transient(&self) -> bool {
        matches!(self, OracleError::Transport(_) | OracleError::Timeout)
    }
}

/// Advisory service proposing which opportunities to take and at what size.
#[async_trait::async_trait]
pub trait StrategyOracle: Send + Sync {
    async fn propose(
        &self,
        pool: &PoolMetrics,
        snapshot: &QuoteSnapshot,
        opportunities: &[Opportunity],
        cases: &[CaseMatch],
    ) -> Result<Proposal, OracleError>;
}

/// Advisory service scoring a proposal 1..=10.
#[async_trait::async_trait]
pub trait RiskAssessor: Send + Sync {
    async fn assess(
        &self,
        pool: &PoolMetrics,
        proposal: &Proposal,
        opportunities: &[Opportunity],
    ) -> Result<RiskAssessment, OracleError>;
}

/// Append-only store of (context, outcome) records with nearest-neighbor
/// retrieval. Advisory only: failures must degrade, never propagate into
/// the cycle.
#[async_trait::async_trait]
pub trait CaseStore: Send + Sync {
    async fn record(&self, context: CaseContext, outcome: CaseOutcome) -> anyhow::Result<()>;

    /// Nearest stored cases by ascending cosine distance.
    async fn nearest(&self, context: &CaseContext, k: usize) -> anyhow::Result<Vec<CaseMatch>>;
}

/// Schema checks applied to every oracle-produced proposal before it is
/// allowed downstream: indices in-range and unique, sizes non-negative,
/// lengths equal.
pub fn validate_proposal(proposal: &Proposal, opportunity_count: usize) -> Result<(), OracleError> {
    if proposal.selected.len() != proposal.sizes_usd.len() {
        return Err(OracleError::Invalid(format!(
            "{} selections but {} sizes",
            proposal.selected.len(),
            proposal.sizes_usd.len()
        )));
    }

    let mut seen = std::collections::HashSet::new();
    for &index in &proposal.selected {
        if index >= opportunity_count {
            return Err(OracleError::Invalid(format!(
                "index {} out of range for {} opportunities",
                index, opportunity_count
            )));
        }
        if !seen.insert(index) {
            return Err(OracleError::Invalid(format!("duplicate index {}", index)));
        }
    }

    for &size in &proposal.sizes_usd {
        if !size.is_finite() || size < 0.0 {
            return Err(OracleError::Invalid(format!("invalid position size {}", size)));
        }
    }

    Ok(())
}
