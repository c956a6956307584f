// =============================================================================
// REST API Endpoints: Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`.  Health and analysis are public; the
// config endpoints require a valid Bearer token checked via the `AuthBearer`
// extractor.
//
// CORS is configured permissively; tighten `allow_origin` in production.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::analysis::{AnalysisContext, AnalysisEngine, AnalysisRequest, AnalysisResult};
use crate::api::auth::AuthBearer;
use crate::app_state::AppState;
use crate::runtime_config::{AnalysisParams, RuntimeConfig};

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ── Public ──────────────────────────────────────────────────
        .route("/api/v1/health", get(health))
        .route("/api/v1/analyze", post(analyze))
        // ── Authenticated ───────────────────────────────────────────
        .route("/api/v1/config", get(get_config).post(set_config))
        // ── Middleware & State ───────────────────────────────────────
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Errors
// =============================================================================

fn error_response(
    status: StatusCode,
    message: impl Into<String>,
    problems: Vec<String>,
) -> Response {
    let mut body = serde_json::json!({ "error": message.into() });
    if !problems.is_empty() {
        if let Some(obj) = body.as_object_mut() {
            obj.insert("problems".to_string(), serde_json::json!(problems));
        }
    }
    (status, Json(body)).into_response()
}

// =============================================================================
// Health (public)
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    analyses_served: u64,
    uptime_secs: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        analyses_served: state.analyses_served(),
        uptime_secs: state.uptime_secs(),
        server_time: chrono::Utc::now().timestamp_millis(),
    };
    Json(resp)
}

// =============================================================================
// Analysis (public)
// =============================================================================

#[derive(Serialize)]
struct AnalyzeResponse {
    #[serde(flatten)]
    context: AnalysisContext,
    params: AnalysisParams,
    #[serde(flatten)]
    result: AnalysisResult,
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalysisRequest>,
) -> Response {
    let defaults = state.runtime_config.read().clone();

    let (candles, ctx, params) = match request.resolve(&defaults) {
        Ok(parts) => parts,
        Err(problems) => {
            warn!(problems = ?problems, "Rejected analysis request");
            return error_response(StatusCode::BAD_REQUEST, "invalid analysis request", problems);
        }
    };

    let task_ctx = ctx.clone();
    let task_params = params.clone();
    let joined = tokio::task::spawn_blocking(move || {
        AnalysisEngine::analyze(&candles, &task_ctx, &task_params)
    })
    .await;

    match joined {
        Ok(result) => {
            let served = state.record_analysis();
            info!(
                symbol = %ctx.symbol,
                signals = result.all_signals.len(),
                analyses_served = served,
                "Analysis served"
            );
            Json(AnalyzeResponse {
                context: ctx,
                params,
                result,
            })
            .into_response()
        }
        Err(e) => {
            error!(symbol = %ctx.symbol, error = %e, "Analysis task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "analysis failed", Vec::new())
        }
    }
}

// =============================================================================
// Runtime config (authenticated)
// =============================================================================

async fn get_config(_auth: AuthBearer, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let config = state.runtime_config.read().clone();
    Json(config)
}

#[derive(Serialize)]
struct ConfigUpdateResponse {
    state_version: u64,
    persisted: bool,
    config: RuntimeConfig,
}

async fn set_config(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Json(update): Json<RuntimeConfig>,
) -> Response {
    let problems = update.analysis.validate();
    if !problems.is_empty() {
        warn!(problems = ?problems, "Rejected runtime config update");
        return error_response(StatusCode::BAD_REQUEST, "invalid runtime config", problems);
    }

    {
        let mut config = state.runtime_config.write();
        *config = update.clone();
    }
    state.increment_version();

    // Save to disk (best-effort); the in-memory config is already live.
    let persisted = match update.save(&state.config_path) {
        Ok(()) => true,
        Err(e) => {
            warn!(
                error = %e,
                path = %state.config_path.display(),
                "Failed to persist runtime config"
            );
            false
        }
    };

    info!(
        state_version = state.current_state_version(),
        persisted,
        "Runtime config updated"
    );

    Json(ConfigUpdateResponse {
        state_version: state.current_state_version(),
        persisted,
        config: update,
    })
    .into_response()
}
