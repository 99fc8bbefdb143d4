/// In-memory case store: append-only (context, outcome) records with a
/// cosine scan over a small fixed-schema embedding. Stands in for an
/// external nearest-neighbor engine behind the same port.
use parking_lot::RwLock;
use pool_core::{CaseContext, CaseMatch, CaseOutcome};
use strategy::ports::CaseStore;
use tracing::debug;

const EMBEDDING_DIM: usize = 4;

struct StoredCase {
    embedding: [f64; EMBEDDING_DIM],
    context: CaseContext,
    outcome: CaseOutcome,
}

pub struct InMemoryCaseStore {
    cases: RwLock<Vec<StoredCase>>,
}

impl InMemoryCaseStore {
    pub fn new() -> Self {
        Self {
            cases: RwLock::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.cases.read().len()
    }
}

/// Log-scale the unbounded dollar features so pool size does not drown
/// out spread, then normalize to the unit sphere for cosine distance.
fn embed(context: &CaseContext) -> [f64; EMBEDDING_DIM] {
    let mut v = [
        (1.0 + context.pool_value_usd.max(0.0)).ln(),
        context.participant_count as f64,
        context.spread_pct,
        (1.0 + context.position_size_usd.max(0.0)).ln(),
    ];
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

fn cosine_distance(a: &[f64; EMBEDDING_DIM], b: &[f64; EMBEDDING_DIM]) -> f64 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    1.0 - dot
}

#[async_trait::async_trait]
impl CaseStore for InMemoryCaseStore {
    async fn record(&self, context: CaseContext, outcome: CaseOutcome) -> anyhow::Result<()> {
        let embedding = embed(&context);
        self.cases.write().push(StoredCase {
            embedding,
            context,
            outcome,
        });
        debug!("Trade outcome stored in case memory");
        Ok(())
    }

    async fn nearest(&self, context: &CaseContext, k: usize) -> anyhow::Result<Vec<CaseMatch>> {
        let query = embed(context);
        let cases = self.cases.read();

        let mut matches: Vec<CaseMatch> = cases
            .iter()
            .map(|case| CaseMatch {
                context: case.context,
                outcome: case.outcome,
                distance: cosine_distance(&query, &case.embedding),
            })
            .collect();
        matches.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(k);
        Ok(matches)
    }
}
