//! Handlers for submitting and querying analysis jobs

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use auditor_types::{AggregateResult, Analysis, AnalysisError, AnalysisRequest, AnalysisStatus};

use crate::handlers::common::ErrorResponse;
use crate::state::AppState;

const DEFAULT_TENANT: &str = "default";
const DEFAULT_LIST_LIMIT: usize = 50;
const MAX_LIST_LIMIT: usize = 200;

/// Submission payload for a new analysis
#[derive(Debug, Deserialize)]
pub struct SubmitAnalysisRequest {
	pub url: String,
	/// Engine identifiers; every known engine when omitted
	#[serde(default)]
	pub engines: Option<Vec<String>>,
	#[serde(default)]
	pub tenant: Option<String>,
	#[serde(default)]
	pub force_refresh: bool,
}

#[derive(Debug, Serialize)]
pub struct SubmitAnalysisResponse {
	pub analysis_id: String,
	pub status: AnalysisStatus,
}

/// Job state as exposed over the API
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
	pub analysis_id: String,
	pub url: String,
	pub status: AnalysisStatus,
	pub engines_requested: Vec<String>,
	pub created_at: DateTime<Utc>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub started_at: Option<DateTime<Utc>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub completed_at: Option<DateTime<Utc>>,
	/// Present only once the job is terminal
	#[serde(skip_serializing_if = "Option::is_none")]
	pub result: Option<AggregateResult>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

impl From<Analysis> for AnalysisResponse {
	fn from(analysis: Analysis) -> Self {
		Self {
			analysis_id: analysis.analysis_id,
			url: analysis.request.url.to_string(),
			status: analysis.status,
			engines_requested: analysis
				.request
				.engines
				.iter()
				.map(|e| e.to_string())
				.collect(),
			created_at: analysis.created_at,
			started_at: analysis.started_at,
			completed_at: analysis.completed_at,
			result: analysis.result,
			error: analysis.error_message,
		}
	}
}

/// One row of a tenant's job history
#[derive(Debug, Serialize)]
pub struct AnalysisSummary {
	pub analysis_id: String,
	pub url: String,
	pub status: AnalysisStatus,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub overall_score: Option<u8>,
	pub created_at: DateTime<Utc>,
}

impl From<Analysis> for AnalysisSummary {
	fn from(analysis: Analysis) -> Self {
		Self {
			analysis_id: analysis.analysis_id,
			url: analysis.request.url.to_string(),
			status: analysis.status,
			overall_score: analysis.result.as_ref().and_then(|r| r.overall_score),
			created_at: analysis.created_at,
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct TenantQuery {
	#[serde(default)]
	pub tenant: Option<String>,
	#[serde(default)]
	pub limit: Option<usize>,
}

/// POST /api/v1/analyses - Submit a URL for analysis
pub async fn post_analyses(
	State(state): State<AppState>,
	Json(payload): Json<SubmitAnalysisRequest>,
) -> Result<(StatusCode, Json<SubmitAnalysisResponse>), (StatusCode, Json<ErrorResponse>)> {
	let tenant = payload
		.tenant
		.unwrap_or_else(|| DEFAULT_TENANT.to_string());

	let request = match payload.engines {
		Some(engines) => AnalysisRequest::new(&payload.url, &engines, tenant),
		None => AnalysisRequest::all_engines(&payload.url, tenant),
	}
	.map_err(|e| {
		(
			StatusCode::BAD_REQUEST,
			Json(ErrorResponse::new("VALIDATION_ERROR", e.to_string())),
		)
	})?
	.with_force_refresh(payload.force_refresh);

	info!(
		"Received analysis request for {} with {} engine(s)",
		request.url,
		request.engines.len()
	);

	let analysis_id = state.orchestrator.submit(request).await.map_err(|e| {
		(
			StatusCode::INTERNAL_SERVER_ERROR,
			Json(ErrorResponse::new("SUBMISSION_ERROR", e.to_string())),
		)
	})?;

	Ok((
		StatusCode::ACCEPTED,
		Json(SubmitAnalysisResponse {
			analysis_id,
			status: AnalysisStatus::Pending,
		}),
	))
}

/// GET /api/v1/analyses/{id} - Poll one analysis
pub async fn get_analysis(
	State(state): State<AppState>,
	Path(analysis_id): Path<String>,
) -> Result<Json<AnalysisResponse>, (StatusCode, Json<ErrorResponse>)> {
	let analysis = state
		.orchestrator
		.get_result(&analysis_id)
		.await
		.map_err(analysis_error_response)?;
	Ok(Json(analysis.into()))
}

/// GET /api/v1/analyses - A tenant's recent analyses, newest first
pub async fn get_analyses(
	State(state): State<AppState>,
	Query(query): Query<TenantQuery>,
) -> Result<Json<Vec<AnalysisSummary>>, (StatusCode, Json<ErrorResponse>)> {
	let tenant = query.tenant.unwrap_or_else(|| DEFAULT_TENANT.to_string());
	let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);

	let analyses = state
		.orchestrator
		.list_analyses(&tenant, limit)
		.await
		.map_err(analysis_error_response)?;
	Ok(Json(analyses.into_iter().map(Into::into).collect()))
}

/// DELETE /api/v1/analyses/{id} - Remove one analysis record
pub async fn delete_analysis(
	State(state): State<AppState>,
	Path(analysis_id): Path<String>,
	Query(query): Query<TenantQuery>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
	let tenant = query.tenant.unwrap_or_else(|| DEFAULT_TENANT.to_string());
	state
		.orchestrator
		.delete_analysis(&analysis_id, &tenant)
		.await
		.map_err(analysis_error_response)?;
	Ok(StatusCode::NO_CONTENT)
}

fn analysis_error_response(error: AnalysisError) -> (StatusCode, Json<ErrorResponse>) {
	let (code, tag) = match &error {
		AnalysisError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
		AnalysisError::Forbidden { .. } => (StatusCode::FORBIDDEN, "FORBIDDEN"),
		AnalysisError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
		AnalysisError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
	};
	(code, Json(ErrorResponse::new(tag, error.to_string())))
}
