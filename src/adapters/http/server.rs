//! Axum Router and Handlers
//!
//! One handler per core operation. Validation errors map to 400,
//! `NothingPlanned` to 409; anything unexpected is caught by the
//! outermost boundary and reported as 500 without crashing the
//! process.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, instrument};

use crate::adapters::metrics::MetricsRegistry;
use crate::domain::error::PolicyError;
use crate::domain::ledger::BetResult;
use crate::ports::repository::{LedgerRepository, RecoveryKind};
use crate::usecases::bankroll::BankrollService;

/// Shared state behind every handler.
///
/// The service sits behind an async mutex so concurrent HTTP requests
/// are handled one at a time against the single ledger document.
pub struct ApiState {
    pub service: Mutex<BankrollService>,
    pub repo: Arc<dyn LedgerRepository>,
    pub metrics: Arc<MetricsRegistry>,
}

/// Policy error to HTTP response mapping.
struct ApiError(PolicyError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PolicyError::InvalidResult(_) | PolicyError::InvalidRange(_) => {
                StatusCode::BAD_REQUEST
            }
            PolicyError::NothingPlanned => StatusCode::CONFLICT,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

impl From<PolicyError> for ApiError {
    fn from(err: PolicyError) -> Self {
        Self(err)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PlanRequest {
    odds: Option<Decimal>,
    /// Compute without storing a pending plan or touching disk.
    preview: bool,
}

#[derive(Debug, Deserialize)]
struct ResultRequest {
    result: String,
    #[serde(default)]
    odds: Option<Decimal>,
    #[serde(default)]
    stake: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct ConfirmRequest {
    result: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PauseRequest {
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BandRequest {
    min: Decimal,
    max: Decimal,
}

#[derive(Serialize)]
struct MutatedStatus<T: Serialize> {
    persisted: bool,
    #[serde(flatten)]
    body: T,
}

/// Build the API router.
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/report", get(get_report))
        .route("/plan", post(post_plan))
        .route("/result", post(post_result))
        .route("/confirm", post(post_confirm))
        .route("/pause", post(post_pause))
        .route("/resume", post(post_resume))
        .route("/odds-band", post(post_odds_band))
        .route("/reset", post(post_reset))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
        .route("/metrics", get(get_metrics))
        .with_state(state)
}

/// Serve the API until the shutdown signal fires.
#[instrument(skip(state, shutdown_rx))]
pub async fn serve(
    state: Arc<ApiState>,
    bind_address: &str,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind_address).await?;

    info!(address = %bind_address, "API server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await?;

    Ok(())
}

async fn get_status(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    let service = state.service.lock().await;
    let (status, recovery) = service.status().await;
    if recovery == RecoveryKind::RecoveredCorrupt {
        state.metrics.state_recoveries.inc();
    }
    state.metrics.observe_status(&status);
    Json(json!({
        "recovered": recovery == RecoveryKind::RecoveredCorrupt,
        "status": status,
    }))
}

async fn get_report(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    let service = state.service.lock().await;
    Json(service.report().await)
}

async fn post_plan(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<PlanRequest>,
) -> impl IntoResponse {
    let service = state.service.lock().await;

    if req.preview {
        let plan = service.preview_stake(req.odds).await;
        return Json(json!({ "preview": true, "plan": plan }));
    }

    let committed = service.plan_stake(req.odds).await;
    let outcome = if committed.value.paused { "refused" } else { "planned" };
    state.metrics.plans_computed.with_label_values(&[outcome]).inc();
    if !committed.persisted {
        state.metrics.persistence_failures.inc();
    }

    Json(json!({
        "persisted": committed.persisted,
        "plan": committed.value,
    }))
}

async fn post_result(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<ResultRequest>,
) -> Result<Response, ApiError> {
    let result = BetResult::parse(&req.result)?;
    let service = state.service.lock().await;

    let committed = service.apply_result(result, req.odds, req.stake).await;
    let label = result.to_string();
    state
        .metrics
        .results_applied
        .with_label_values(&[label.as_str()])
        .inc();
    if !committed.persisted {
        state.metrics.persistence_failures.inc();
    }

    Ok(Json(json!({
        "persisted": committed.persisted,
        "auto_paused": committed.value.auto_paused,
        "entry": committed.value.entry,
        "stats": committed.value.stats,
    }))
    .into_response())
}

async fn post_confirm(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<ConfirmRequest>,
) -> Result<Response, ApiError> {
    let result = BetResult::parse(&req.result)?;
    let service = state.service.lock().await;

    let committed = service.confirm_pending(result).await?;
    let label = result.to_string();
    state
        .metrics
        .results_applied
        .with_label_values(&[label.as_str()])
        .inc();

    Ok(Json(json!({
        "persisted": committed.persisted,
        "auto_paused": committed.value.auto_paused,
        "entry": committed.value.entry,
        "stats": committed.value.stats,
    }))
    .into_response())
}

async fn post_pause(
    State(state): State<Arc<ApiState>>,
    req: Option<Json<PauseRequest>>,
) -> impl IntoResponse {
    let reason = req.and_then(|Json(r)| r.reason);
    let service = state.service.lock().await;
    let committed = service.pause(reason).await;
    state.metrics.observe_status(&committed.value);
    Json(MutatedStatus {
        persisted: committed.persisted,
        body: json!({ "status": committed.value }),
    })
}

async fn post_resume(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    let service = state.service.lock().await;
    let committed = service.resume().await;
    state.metrics.observe_status(&committed.value);
    Json(MutatedStatus {
        persisted: committed.persisted,
        body: json!({ "status": committed.value }),
    })
}

async fn post_odds_band(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<BandRequest>,
) -> Result<Response, ApiError> {
    let service = state.service.lock().await;
    let committed = service.set_odds_band(req.min, req.max).await?;
    Ok(Json(MutatedStatus {
        persisted: committed.persisted,
        body: json!({ "status": committed.value }),
    })
    .into_response())
}

async fn post_reset(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    let service = state.service.lock().await;
    let committed = service.reset().await;
    state.metrics.observe_status(&committed.value);
    Json(MutatedStatus {
        persisted: committed.persisted,
        body: json!({ "status": committed.value }),
    })
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Readiness probe: returns 200 only while the backing store is usable.
async fn readiness(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    if state.repo.is_healthy().await {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

async fn get_metrics(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    state.metrics.render()
}
