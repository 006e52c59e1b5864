//! HTTP routes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use cnrates_fx::SharedRateCache;
use serde::Serialize;
use serde_json::json;
use tracing::error;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub cache: SharedRateCache,
}

impl AppState {
    pub fn new(cache: SharedRateCache) -> Self {
        Self { cache }
    }
}

/// Body returned when no snapshot could be produced.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/exchange-rates", get(exchange_rates))
        .route("/health", get(health))
        .with_state(state)
}

/// GET /api/exchange-rates
/// Returns the cached combined USD/CNY and USD/CNH snapshot.
pub async fn exchange_rates(State(state): State<AppState>) -> Response {
    let rates = state.cache.get_rates().await;

    if rates.success {
        return Json(rates).into_response();
    }

    let message = rates
        .message
        .unwrap_or_else(|| "Failed to fetch exchange rates".to_string());
    error!(message = %message, "Exchange rate snapshot failed");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            success: false,
            message,
        }),
    )
        .into_response()
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
