/// Control API: pool and orchestrator operations over HTTP. Handlers run
/// on the runtime's dispatch pool and take only short synchronous borrows
/// of the ledger lock. 400 means the request was invalid, 409 means the
/// orchestrator is in the wrong state, 500 carries a correlation id
/// matching the cycle record.
use crate::config::EngineConfig;
use crate::ledger::LedgerError;
use crate::orchestrator::{EngineStatus, Orchestrator, OrchestratorError};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use pool_core::{CycleRecord, CycleStatus, PoolMetrics};
use serde::Deserialize;
use serde_json::{json, Value};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub config: Arc<EngineConfig>,
}

#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    Conflict(String),
    Internal { correlation_id: u64, message: String },
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        ApiError::Validation(e.to_string())
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(e: OrchestratorError) -> Self {
        ApiError::Conflict(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(message) => (StatusCode::BAD_REQUEST, json!({ "error": message })),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, json!({ "error": message })),
            ApiError::Internal { correlation_id, message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": message, "correlation_id": correlation_id }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct ParticipantRequest {
    pub id: String,
    pub investment: f64,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawalRequestBody {
    pub participant_id: String,
    pub amount: f64,
}

#[derive(Debug, Deserialize)]
pub struct ParticipantQuery {
    pub id: Option<String>,
}

async fn get_status(State(state): State<AppState>) -> Json<EngineStatus> {
    Json(state.orchestrator.status())
}

async fn start_system(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state.orchestrator.start()?;
    Ok(Json(json!({ "message": "trading loop started" })))
}

async fn stop_system(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state.orchestrator.stop()?;
    Ok(Json(json!({ "message": "trading loop stopping" })))
}

async fn run_single_cycle(State(state): State<AppState>) -> Result<Json<CycleRecord>, ApiError> {
    let record = state.orchestrator.run_one_cycle().await?;
    if record.status == CycleStatus::Error {
        return Err(ApiError::Internal {
            correlation_id: record.cycle_id,
            message: record
                .error
                .unwrap_or_else(|| "cycle aborted".to_string()),
        });
    }
    Ok(Json(record))
}

async fn get_pool_metrics(State(state): State<AppState>) -> Json<PoolMetrics> {
    Json(state.orchestrator.ledger().lock().pool_metrics())
}

async fn get_participants(
    State(state): State<AppState>,
    Query(query): Query<ParticipantQuery>,
) -> Result<Json<Value>, ApiError> {
    let ledger = state.orchestrator.ledger().lock();
    match query.id {
        Some(id) => {
            let metrics = ledger
                .participant_metrics(&id)
                .ok_or_else(|| ApiError::Validation(format!("unknown participant {}", id)))?;
            Ok(Json(serde_json::to_value(metrics).unwrap_or_default()))
        }
        None => Ok(Json(
            serde_json::to_value(ledger.all_participant_metrics()).unwrap_or_default(),
        )),
    }
}

async fn add_participant(
    State(state): State<AppState>,
    Json(body): Json<ParticipantRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    state
        .orchestrator
        .ledger()
        .lock()
        .add_participant(&body.id, body.investment)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": format!("participant {} added", body.id) })),
    ))
}

async fn request_withdrawal(
    State(state): State<AppState>,
    Json(body): Json<WithdrawalRequestBody>,
) -> Result<Json<Value>, ApiError> {
    state
        .orchestrator
        .ledger()
        .lock()
        .request_withdrawal(&body.participant_id, body.amount)?;
    Ok(Json(json!({ "message": "withdrawal request submitted" })))
}

async fn process_withdrawals(State(state): State<AppState>) -> Json<Value> {
    let processed = state.orchestrator.ledger().lock().process_withdrawals();
    Json(json!({
        "processed_count": processed.len(),
        "withdrawals": processed,
    }))
}

async fn get_config(State(state): State<AppState>) -> Json<Value> {
    Json(state.config.redacted())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/start", post(start_system))
        .route("/stop", post(stop_system))
        .route("/run-cycle", post(run_single_cycle))
        .route("/pool", get(get_pool_metrics))
        .route("/participants", get(get_participants).post(add_participant))
        .route("/withdrawals", post(request_withdrawal))
        .route("/process-withdrawals", post(process_withdrawals))
        .route("/config", get(get_config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the shutdown future resolves. The caller stops
/// this server before shutting the orchestrator down so no new cycle
/// requests arrive mid-teardown.
pub async fn serve(
    state: AppState,
    port: u16,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Control API listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
