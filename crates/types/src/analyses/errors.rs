//! Error types for analysis requests and jobs

use thiserror::Error;

/// Caller-input validation errors.
///
/// These are reported synchronously to the caller of `submit`; no job record
/// is ever created for a request that fails validation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
	#[error("malformed URL '{url}': {reason}")]
	MalformedUrl { url: String, reason: String },

	#[error("unsupported URL scheme '{scheme}' (only http and https are analyzable)")]
	UnsupportedScheme { scheme: String },

	#[error("unknown engine '{engine}'")]
	UnknownEngine { engine: String },

	#[error("at least one engine must be requested")]
	EmptyEngineSet,

	#[error("missing required field: {field}")]
	MissingField { field: String },
}

/// Job-level errors surfaced by the orchestrator's public operations.
#[derive(Debug, Error)]
pub enum AnalysisError {
	#[error("validation failed: {0}")]
	Validation(#[from] ValidationError),

	#[error("analysis not found: {analysis_id}")]
	NotFound { analysis_id: String },

	#[error("analysis {analysis_id} belongs to a different tenant")]
	Forbidden { analysis_id: String },

	#[error("storage error: {0}")]
	Storage(String),
}
