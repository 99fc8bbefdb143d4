/// Risk gate: scores a proposal through the advisory assessor and vetoes
/// execution above the threshold. The gate never edits a proposal; it
/// only decides whether the act stage may run.
use crate::ports::RiskAssessor;
use pool_core::telemetry::ORACLE_ERRORS_TOTAL;
use pool_core::{Opportunity, PoolMetrics, Proposal, RiskAssessment};
use std::sync::Arc;
use tracing::warn;

pub const DEFAULT_RISK_THRESHOLD: u8 = 7;

pub struct RiskGate {
    assessor: Arc<dyn RiskAssessor>,
    threshold: u8,
}

impl RiskGate {
    pub fn new(assessor: Arc<dyn RiskAssessor>, threshold: u8) -> Self {
        Self { assessor, threshold }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Always returns a usable assessment: assessor failures degrade to
    /// the neutral score-5 "unable to assess" default.
    pub async fn assess(
        &self,
        pool: &PoolMetrics,
        proposal: &Proposal,
        opportunities: &[Opportunity],
    ) -> RiskAssessment {
        match self.assessor.assess(pool, proposal, opportunities).await {
            Ok(mut assessment) => {
                assessment.score = assessment.score.clamp(1, 10);
                assessment
            }
            Err(e) => {
                ORACLE_ERRORS_TOTAL.inc();
                warn!("Risk assessor failed ({}), using neutral assessment", e);
                RiskAssessment::unable_to_assess()
            }
        }
    }

    pub fn clears(&self, assessment: &RiskAssessment) -> bool {
        assessment.score <= self.threshold
    }
}
