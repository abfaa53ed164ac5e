use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;

use crate::state::AppState;

/// Health check endpoint
pub async fn health() -> &'static str {
	"OK"
}

/// Readiness response
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
	pub status: String,
	pub storage_healthy: bool,
	pub registered_engines: usize,
}

/// GET /ready - Readiness probe with storage and registry checks
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
	let storage_healthy = state.storage.health_check().await.unwrap_or(false);
	let registered_engines = state.registry.len();
	let overall = storage_healthy && registered_engines > 0;

	let body = ReadinessResponse {
		status: if overall { "ready" } else { "degraded" }.to_string(),
		storage_healthy,
		registered_engines,
	};
	let code = if overall {
		StatusCode::OK
	} else {
		StatusCode::SERVICE_UNAVAILABLE
	};
	(code, Json(body))
}
