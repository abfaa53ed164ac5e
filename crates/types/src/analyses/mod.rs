//! Core analysis (job) domain model and lifecycle

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod errors;

pub use errors::{AnalysisError, ValidationError};

use crate::engines::{EngineName, EngineOutcome, Recommendation};
use crate::models::NormalizedUrl;

/// Result type for analysis operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// A validated analysis request.
///
/// Construction is the validation boundary: the URL is normalized, engine
/// identifiers are resolved against the known set, and duplicates are removed
/// preserving first-occurrence order. An invalid request never produces a job
/// record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
	pub url: NormalizedUrl,
	pub engines: Vec<EngineName>,
	/// Opaque client identifier; scopes job-record access, never cache keys
	pub tenant: String,
	/// Bypass cache reads (successful outcomes are still written back)
	#[serde(default)]
	pub force_refresh: bool,
}

impl AnalysisRequest {
	pub fn new<S: AsRef<str>>(
		url: &str,
		engines: &[S],
		tenant: impl Into<String>,
	) -> Result<Self, ValidationError> {
		let url = NormalizedUrl::parse(url)?;

		if engines.is_empty() {
			return Err(ValidationError::EmptyEngineSet);
		}

		let mut resolved = Vec::with_capacity(engines.len());
		for raw in engines {
			let engine: EngineName = raw.as_ref().parse()?;
			if !resolved.contains(&engine) {
				resolved.push(engine);
			}
		}

		Ok(Self {
			url,
			engines: resolved,
			tenant: tenant.into(),
			force_refresh: false,
		})
	}

	/// Request every known engine.
	pub fn all_engines(url: &str, tenant: impl Into<String>) -> Result<Self, ValidationError> {
		let url = NormalizedUrl::parse(url)?;
		Ok(Self {
			url,
			engines: EngineName::ALL.to_vec(),
			tenant: tenant.into(),
			force_refresh: false,
		})
	}

	pub fn with_force_refresh(mut self, force_refresh: bool) -> Self {
		self.force_refresh = force_refresh;
		self
	}
}

/// Lifecycle state of one analysis job.
///
/// Transitions are monotonic: `Pending → Running → {Completed | Partial |
/// Failed}`. Terminal states are never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
	Pending,
	Running,
	/// Every requested engine succeeded
	Completed,
	/// At least one engine succeeded and at least one did not
	Partial,
	/// No engine succeeded
	Failed,
}

impl AnalysisStatus {
	pub fn is_terminal(&self) -> bool {
		matches!(
			self,
			AnalysisStatus::Completed | AnalysisStatus::Partial | AnalysisStatus::Failed
		)
	}
}

/// The merged result of one analysis job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
	/// Rounded mean of successful engines' scores; absent when none succeeded
	#[serde(skip_serializing_if = "Option::is_none")]
	pub overall_score: Option<u8>,
	/// Exactly one outcome per requested engine
	pub per_engine: HashMap<EngineName, EngineOutcome>,
	/// Merged, deduplicated, priority-ordered, capped
	pub recommendations: Vec<Recommendation>,
	/// True iff at least one requested engine did not succeed
	pub degraded: bool,
}

/// One analysis request's execution lifecycle, from submission to terminal
/// state.
///
/// The orchestrator exclusively owns a job's transient state while it runs;
/// the record is persisted through the injected store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
	pub analysis_id: String,
	pub request: AnalysisRequest,
	pub status: AnalysisStatus,
	pub created_at: DateTime<Utc>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub started_at: Option<DateTime<Utc>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub completed_at: Option<DateTime<Utc>>,
	/// Present only in terminal states
	#[serde(skip_serializing_if = "Option::is_none")]
	pub result: Option<AggregateResult>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error_message: Option<String>,
}

impl Analysis {
	pub fn new(request: AnalysisRequest) -> Self {
		Self {
			analysis_id: Uuid::new_v4().to_string(),
			request,
			status: AnalysisStatus::Pending,
			created_at: Utc::now(),
			started_at: None,
			completed_at: None,
			result: None,
			error_message: None,
		}
	}

	/// `Pending → Running`; records `started_at`. No-op once running or done.
	pub fn mark_running(&mut self) {
		if self.status == AnalysisStatus::Pending {
			self.status = AnalysisStatus::Running;
			self.started_at = Some(Utc::now());
		}
	}

	/// Enter a terminal state derived from the aggregate result.
	///
	/// `completed_at` is set exactly once; a job already in a terminal state
	/// is left untouched.
	pub fn finalize(&mut self, result: AggregateResult) {
		if self.status.is_terminal() {
			return;
		}

		let successes = result.per_engine.values().filter(|o| o.is_success()).count();
		self.status = if successes == 0 {
			self.error_message = Some("no engine produced a result".to_string());
			AnalysisStatus::Failed
		} else if result.degraded {
			AnalysisStatus::Partial
		} else {
			AnalysisStatus::Completed
		};
		self.result = Some(result);
		self.completed_at = Some(Utc::now());
	}

	/// Enter `Failed` for a job that could not run at all.
	pub fn fail(&mut self, error_message: impl Into<String>) {
		if self.status.is_terminal() {
			return;
		}
		self.status = AnalysisStatus::Failed;
		self.error_message = Some(error_message.into());
		self.completed_at = Some(Utc::now());
	}

	pub fn is_terminal(&self) -> bool {
		self.status.is_terminal()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engines::{EngineOutcome, EngineReport};

	fn request() -> AnalysisRequest {
		AnalysisRequest::new("https://example.com", &["technical", "seo"], "tenant-1").unwrap()
	}

	fn result_with(successes: &[EngineName], failures: &[EngineName]) -> AggregateResult {
		let mut per_engine = HashMap::new();
		for engine in successes {
			per_engine.insert(
				*engine,
				EngineOutcome::success(*engine, EngineReport::new(80, vec![]), 10),
			);
		}
		for engine in failures {
			per_engine.insert(*engine, EngineOutcome::failure(*engine, "boom", 10));
		}
		AggregateResult {
			overall_score: if successes.is_empty() { None } else { Some(80) },
			per_engine,
			recommendations: vec![],
			degraded: !failures.is_empty(),
		}
	}

	#[test]
	fn test_request_deduplicates_engines() {
		let request = AnalysisRequest::new(
			"https://example.com",
			&["seo", "technical", "seo"],
			"tenant-1",
		)
		.unwrap();
		assert_eq!(request.engines, vec![EngineName::Seo, EngineName::Technical]);
	}

	#[test]
	fn test_request_rejects_unknown_engine() {
		let err = AnalysisRequest::new("https://example.com", &["seo", "quantum"], "t").unwrap_err();
		assert_eq!(
			err,
			ValidationError::UnknownEngine {
				engine: "quantum".to_string()
			}
		);
	}

	#[test]
	fn test_request_rejects_empty_engine_set() {
		let engines: [&str; 0] = [];
		let err = AnalysisRequest::new("https://example.com", &engines, "t").unwrap_err();
		assert_eq!(err, ValidationError::EmptyEngineSet);
	}

	#[test]
	fn test_new_analysis_is_pending() {
		let analysis = Analysis::new(request());
		assert_eq!(analysis.status, AnalysisStatus::Pending);
		assert!(analysis.started_at.is_none());
		assert!(analysis.completed_at.is_none());
	}

	#[test]
	fn test_lifecycle_all_success_completes() {
		let mut analysis = Analysis::new(request());
		analysis.mark_running();
		assert_eq!(analysis.status, AnalysisStatus::Running);
		assert!(analysis.started_at.is_some());

		analysis.finalize(result_with(&[EngineName::Technical, EngineName::Seo], &[]));
		assert_eq!(analysis.status, AnalysisStatus::Completed);
		assert!(analysis.completed_at.is_some());
	}

	#[test]
	fn test_lifecycle_mixed_is_partial() {
		let mut analysis = Analysis::new(request());
		analysis.mark_running();
		analysis.finalize(result_with(&[EngineName::Technical], &[EngineName::Seo]));
		assert_eq!(analysis.status, AnalysisStatus::Partial);
	}

	#[test]
	fn test_lifecycle_no_success_is_failed() {
		let mut analysis = Analysis::new(request());
		analysis.mark_running();
		analysis.finalize(result_with(&[], &[EngineName::Technical, EngineName::Seo]));
		assert_eq!(analysis.status, AnalysisStatus::Failed);
		assert!(analysis.error_message.is_some());
	}

	#[test]
	fn test_terminal_state_is_sticky() {
		let mut analysis = Analysis::new(request());
		analysis.mark_running();
		analysis.finalize(result_with(&[EngineName::Technical], &[EngineName::Seo]));
		let completed_at = analysis.completed_at;

		analysis.finalize(result_with(&[EngineName::Technical, EngineName::Seo], &[]));
		assert_eq!(analysis.status, AnalysisStatus::Partial);
		assert_eq!(analysis.completed_at, completed_at);
	}
}
