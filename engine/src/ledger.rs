/// Share-based accounting for the pooled capital. The ledger is one
/// critical section: the orchestrator and the API serialize every
/// mutation and every coherent read behind a single `parking_lot::Mutex`
/// around this struct. Balances are fixed-point micro-USD.
use pool_core::math::{micros_to_usd, scale_micros_down, usd_to_micros};
use pool_core::telemetry::{POOL_VALUE_USD, WITHDRAWALS_COMPLETED_TOTAL, WITHDRAWALS_DELAYED_TOTAL};
use pool_core::{ParticipantMetrics, PoolMetrics, UsdMicros};
use serde::Serialize;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("participant {0} already exists")]
    DuplicateParticipant(String),
    #[error("unknown participant {0}")]
    UnknownParticipant(String),
    #[error("amount must be positive")]
    NonPositiveAmount,
    #[error("withdrawal exceeds participant value")]
    Overdrawn,
    #[error("asset allocation would drive cash reserve negative")]
    NegativeCash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    Pending,
    Completed,
    Delayed,
}

#[derive(Debug, Clone, Serialize)]
pub struct WithdrawalRequest {
    pub amount: UsdMicros,
    pub request_time: u64,
    pub status: WithdrawalStatus,
    pub process_time: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Participant {
    pub id: String,
    pub initial_investment: UsdMicros,
    pub current_value: UsdMicros,
    pub join_time: u64,
    pub withdrawals: Vec<WithdrawalRequest>,
}

/// One row of a `process_withdrawals` report.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedWithdrawal {
    pub participant_id: String,
    pub amount_usd: f64,
    pub status: WithdrawalStatus,
}

pub struct PoolLedger {
    initial_pool_value: UsdMicros,
    pool_value: UsdMicros,
    cash_reserve: UsdMicros,
    /// Marked USD value per held symbol, as of the last allocation update.
    assets: HashMap<String, UsdMicros>,
    participants: HashMap<String, Participant>,
    /// Insertion order; withdrawal processing iterates this.
    order: Vec<String>,
    created_at: u64,
    updated_at: u64,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl PoolLedger {
    pub fn new(initial_pool_value_usd: f64) -> Self {
        let initial = usd_to_micros(initial_pool_value_usd);
        let now = now_secs();
        POOL_VALUE_USD.set(initial_pool_value_usd);
        Self {
            initial_pool_value: initial,
            pool_value: initial,
            cash_reserve: initial,
            assets: HashMap::new(),
            participants: HashMap::new(),
            order: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Seed synthetic participants holding claims on the initial pool,
    /// investments varied across +-20% of the average.
    pub fn seed_participants(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        let average = micros_to_usd(self.initial_pool_value) / count as f64;
        for i in 0..count {
            let variation = 0.8 + 0.4 * (i as f64 / count as f64);
            let investment = usd_to_micros(average * variation);
            let id = format!("participant_{}", i + 1);
            self.participants.insert(
                id.clone(),
                Participant {
                    id: id.clone(),
                    initial_investment: investment,
                    current_value: investment,
                    join_time: now_secs(),
                    withdrawals: Vec::new(),
                },
            );
            self.order.push(id);
        }
        info!("Seeded {} pool participants", count);
    }

    pub fn add_participant(&mut self, id: &str, investment_usd: f64) -> Result<(), LedgerError> {
        if investment_usd <= 0.0 {
            return Err(LedgerError::NonPositiveAmount);
        }
        if self.participants.contains_key(id) {
            return Err(LedgerError::DuplicateParticipant(id.to_string()));
        }

        let investment = usd_to_micros(investment_usd);
        self.participants.insert(
            id.to_string(),
            Participant {
                id: id.to_string(),
                initial_investment: investment,
                current_value: investment,
                join_time: now_secs(),
                withdrawals: Vec::new(),
            },
        );
        self.order.push(id.to_string());
        self.pool_value += investment;
        self.cash_reserve += investment;
        self.updated_at = now_secs();
        POOL_VALUE_USD.set(micros_to_usd(self.pool_value));
        info!("Participant {} joined with {:.2} USD", id, investment_usd);
        Ok(())
    }

    /// Queue a withdrawal; cash only moves in `process_withdrawals`.
    pub fn request_withdrawal(&mut self, id: &str, amount_usd: f64) -> Result<(), LedgerError> {
        if amount_usd <= 0.0 {
            return Err(LedgerError::NonPositiveAmount);
        }
        let amount = usd_to_micros(amount_usd);
        let participant = self
            .participants
            .get_mut(id)
            .ok_or_else(|| LedgerError::UnknownParticipant(id.to_string()))?;
        if amount > participant.current_value {
            return Err(LedgerError::Overdrawn);
        }

        participant.withdrawals.push(WithdrawalRequest {
            amount,
            request_time: now_secs(),
            status: WithdrawalStatus::Pending,
            process_time: None,
        });
        self.updated_at = now_secs();
        Ok(())
    }

    /// Settle open withdrawal requests in participant insertion order,
    /// FIFO within each participant. Requests the cash reserve covers
    /// complete immediately; the rest are marked delayed and retried on
    /// the next call. A completed request is never touched again.
    pub fn process_withdrawals(&mut self) -> Vec<ProcessedWithdrawal> {
        let mut processed = Vec::new();
        let mut cash = self.cash_reserve;
        let mut pool = self.pool_value;
        let now = now_secs();

        for id in &self.order {
            let participant = match self.participants.get_mut(id) {
                Some(p) => p,
                None => continue,
            };
            for request in &mut participant.withdrawals {
                if request.status == WithdrawalStatus::Completed {
                    continue;
                }
                if request.amount <= cash {
                    request.status = WithdrawalStatus::Completed;
                    request.process_time = Some(now);
                    cash -= request.amount;
                    pool -= request.amount;
                    participant.current_value -= request.amount;
                    WITHDRAWALS_COMPLETED_TOTAL.inc();
                    processed.push(ProcessedWithdrawal {
                        participant_id: id.clone(),
                        amount_usd: micros_to_usd(request.amount),
                        status: WithdrawalStatus::Completed,
                    });
                } else {
                    request.status = WithdrawalStatus::Delayed;
                    WITHDRAWALS_DELAYED_TOTAL.inc();
                    processed.push(ProcessedWithdrawal {
                        participant_id: id.clone(),
                        amount_usd: micros_to_usd(request.amount),
                        status: WithdrawalStatus::Delayed,
                    });
                }
            }
        }

        self.cash_reserve = cash;
        self.pool_value = pool;
        self.updated_at = now;
        POOL_VALUE_USD.set(micros_to_usd(self.pool_value));
        processed
    }

    /// Replace the asset inventory with freshly marked USD values and
    /// recompute the cash reserve as the remainder of the pool value.
    pub fn update_asset_allocation(
        &mut self,
        assets_usd: HashMap<String, f64>,
    ) -> Result<(), LedgerError> {
        let marked: HashMap<String, UsdMicros> = assets_usd
            .into_iter()
            .map(|(symbol, usd)| (symbol, usd_to_micros(usd)))
            .collect();
        let total: UsdMicros = marked.values().sum();
        let cash = self.pool_value - total;
        if cash < 0 {
            return Err(LedgerError::NegativeCash);
        }

        self.assets = marked;
        self.cash_reserve = cash;
        self.updated_at = now_secs();
        Ok(())
    }

    /// Revalue the pool and scale every participant's claim by the same
    /// ratio. With a non-positive previous value there is nothing to
    /// scale against; the change stays unattributed.
    pub fn mark_pool_value(&mut self, new_value: UsdMicros) {
        let old_value = self.pool_value;
        self.pool_value = new_value;

        if old_value > 0 {
            let ratio = new_value as f64 / old_value as f64;
            for participant in self.participants.values_mut() {
                participant.current_value = scale_micros_down(participant.current_value, ratio);
            }
        } else {
            warn!(
                "Mark from non-positive pool value {}; {:.2} USD left unattributed",
                old_value,
                micros_to_usd(new_value)
            );
        }

        self.updated_at = now_secs();
        POOL_VALUE_USD.set(micros_to_usd(self.pool_value));
    }

    pub fn pool_value_micros(&self) -> UsdMicros {
        self.pool_value
    }

    pub fn cash_reserve_micros(&self) -> UsdMicros {
        self.cash_reserve
    }

    pub fn pool_metrics(&self) -> PoolMetrics {
        let total_initial: UsdMicros = self
            .participants
            .values()
            .map(|p| p.initial_investment)
            .sum();
        let total_current: UsdMicros = self.participants.values().map(|p| p.current_value).sum();

        let roi = if total_initial > 0 {
            (total_current - total_initial) as f64 / total_initial as f64
        } else {
            0.0
        };
        let cash_ratio = if self.pool_value > 0 {
            self.cash_reserve as f64 / self.pool_value as f64
        } else {
            0.0
        };

        PoolMetrics {
            total_pool_value_usd: micros_to_usd(self.pool_value),
            initial_pool_value_usd: micros_to_usd(self.initial_pool_value),
            cash_reserve_usd: micros_to_usd(self.cash_reserve),
            cash_ratio,
            roi,
            participant_count: self.participants.len(),
            asset_count: self.assets.len(),
            assets: self
                .assets
                .iter()
                .map(|(symbol, &value)| (symbol.clone(), micros_to_usd(value)))
                .collect(),
            age_days: (now_secs().saturating_sub(self.created_at)) as f64 / 86_400.0,
            last_update: self.updated_at,
        }
    }

    pub fn participant_metrics(&self, id: &str) -> Option<ParticipantMetrics> {
        self.participants.get(id).map(|p| ParticipantMetrics {
            id: p.id.clone(),
            initial_investment_usd: micros_to_usd(p.initial_investment),
            current_value_usd: micros_to_usd(p.current_value),
            roi: if p.initial_investment > 0 {
                (p.current_value - p.initial_investment) as f64 / p.initial_investment as f64
            } else {
                0.0
            },
            join_time: p.join_time,
            pending_withdrawals: p
                .withdrawals
                .iter()
                .filter(|w| w.status != WithdrawalStatus::Completed)
                .count(),
        })
    }

    /// All participants, in insertion order.
    pub fn all_participant_metrics(&self) -> Vec<ParticipantMetrics> {
        self.order
            .iter()
            .filter_map(|id| self.participant_metrics(id))
            .collect()
    }
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod ledger_tests;
