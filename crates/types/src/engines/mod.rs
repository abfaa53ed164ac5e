//! Engine domain model: identifiers, outcomes, and recommendations

use serde::{Deserialize, Serialize};

pub mod errors;
pub mod traits;

pub use errors::{EngineError, EngineResult};
pub use traits::{AnalysisEngine, EngineRuntimeConfig};

/// Identifier of one analysis domain.
///
/// The set is closed: unknown identifiers are rejected during request
/// validation, before any dispatch happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineName {
	/// Crawlability and indexability checks (status, robots.txt, sitemap)
	Technical,
	/// Load-time and page-weight checks
	Performance,
	/// On-page SEO checks (title, meta description, headings, content)
	Seo,
	/// Mobile usability checks (viewport, responsive signals)
	Mobile,
}

impl EngineName {
	/// All engines known to the system, in canonical order.
	pub const ALL: [EngineName; 4] = [
		EngineName::Technical,
		EngineName::Performance,
		EngineName::Seo,
		EngineName::Mobile,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			EngineName::Technical => "technical",
			EngineName::Performance => "performance",
			EngineName::Seo => "seo",
			EngineName::Mobile => "mobile",
		}
	}
}

impl std::fmt::Display for EngineName {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl std::str::FromStr for EngineName {
	type Err = crate::analyses::ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"technical" => Ok(EngineName::Technical),
			"performance" => Ok(EngineName::Performance),
			"seo" => Ok(EngineName::Seo),
			"mobile" => Ok(EngineName::Mobile),
			other => Err(crate::analyses::ValidationError::UnknownEngine {
				engine: other.to_string(),
			}),
		}
	}
}

/// Remediation priority, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
	High,
	Medium,
	Low,
}

/// One remediation advice item produced by an engine.
///
/// Opaque to the aggregation layer except for `priority` and `category`,
/// which drive ordering and deduplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
	/// Short description of the problem
	pub issue: String,
	/// Remediation text
	pub detail: String,
	/// Engine that produced this recommendation
	pub category: EngineName,
	pub priority: Priority,
	/// Estimated effect of fixing the issue, when the engine can state one
	#[serde(skip_serializing_if = "Option::is_none")]
	pub impact: Option<String>,
}

impl Recommendation {
	pub fn new(
		category: EngineName,
		priority: Priority,
		issue: impl Into<String>,
		detail: impl Into<String>,
	) -> Self {
		Self {
			issue: issue.into(),
			detail: detail.into(),
			category,
			priority,
			impact: None,
		}
	}

	pub fn with_impact(mut self, impact: impl Into<String>) -> Self {
		self.impact = Some(impact.into());
		self
	}
}

/// Terminal status of one engine invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
	/// Engine produced a score and recommendations
	Success,
	/// Engine reported a categorized failure
	Failure,
	/// Engine exceeded its deadline (or the global one)
	Timeout,
	/// Engine was not run (disabled by configuration)
	Skipped,
}

/// What a successful engine invocation reports back to the orchestrator.
///
/// The orchestrator wraps this into an [`EngineOutcome`] together with timing
/// and caching metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineReport {
	/// Normalized score in 0..=100
	pub score: u8,
	pub recommendations: Vec<Recommendation>,
	/// Engine-specific check details, kept for diagnostics
	#[serde(default)]
	pub details: serde_json::Value,
}

impl EngineReport {
	pub fn new(score: u8, recommendations: Vec<Recommendation>) -> Self {
		Self {
			score: score.min(100),
			recommendations,
			details: serde_json::Value::Null,
		}
	}

	pub fn with_details(mut self, details: serde_json::Value) -> Self {
		self.details = details;
		self
	}
}

/// The per-engine result of one analysis. Immutable once produced.
///
/// Invariants: `score` is present iff `status == Success`; `error` is present
/// iff `status != Success`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineOutcome {
	pub engine: EngineName,
	pub status: OutcomeStatus,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub score: Option<u8>,
	#[serde(default)]
	pub recommendations: Vec<Recommendation>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	/// Engine-specific check details, carried through for diagnostics
	#[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
	pub details: serde_json::Value,
	/// Wall-clock execution time, zero for cache hits
	pub execution_time_ms: u64,
	/// Whether this outcome was served from the cache
	#[serde(default)]
	pub from_cache: bool,
}

impl EngineOutcome {
	pub fn success(engine: EngineName, report: EngineReport, execution_time_ms: u64) -> Self {
		Self {
			engine,
			status: OutcomeStatus::Success,
			score: Some(report.score.min(100)),
			recommendations: report.recommendations,
			error: None,
			details: report.details,
			execution_time_ms,
			from_cache: false,
		}
	}

	pub fn failure(engine: EngineName, error: impl Into<String>, execution_time_ms: u64) -> Self {
		Self {
			engine,
			status: OutcomeStatus::Failure,
			score: None,
			recommendations: Vec::new(),
			error: Some(error.into()),
			details: serde_json::Value::Null,
			execution_time_ms,
			from_cache: false,
		}
	}

	pub fn timeout(engine: EngineName, timeout_ms: u64) -> Self {
		Self {
			engine,
			status: OutcomeStatus::Timeout,
			score: None,
			recommendations: Vec::new(),
			error: Some(format!("deadline of {}ms exceeded", timeout_ms)),
			details: serde_json::Value::Null,
			execution_time_ms: timeout_ms,
			from_cache: false,
		}
	}

	pub fn skipped(engine: EngineName, reason: impl Into<String>) -> Self {
		Self {
			engine,
			status: OutcomeStatus::Skipped,
			score: None,
			recommendations: Vec::new(),
			error: Some(reason.into()),
			details: serde_json::Value::Null,
			execution_time_ms: 0,
			from_cache: false,
		}
	}

	/// Mark this outcome as adopted from the cache rather than computed live.
	pub fn into_cached(mut self) -> Self {
		self.from_cache = true;
		self.execution_time_ms = 0;
		self
	}

	pub fn is_success(&self) -> bool {
		self.status == OutcomeStatus::Success
	}
}
