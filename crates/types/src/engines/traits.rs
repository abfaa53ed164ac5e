//! The engine adapter capability contract

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

use super::{EngineName, EngineReport, EngineResult};
use crate::models::NormalizedUrl;

/// Runtime configuration handed to an engine on every invocation.
#[derive(Debug, Clone)]
pub struct EngineRuntimeConfig {
	/// User-Agent sent on outbound requests
	pub user_agent: String,
	/// Timeout for individual outbound HTTP requests, in milliseconds
	pub request_timeout_ms: u64,
}

impl Default for EngineRuntimeConfig {
	fn default() -> Self {
		Self {
			user_agent: "SiteAuditor/0.1 (+https://github.com/site-auditor/site-auditor)"
				.to_string(),
			request_timeout_ms: 10_000,
		}
	}
}

/// Capability contract implemented by every analysis engine.
///
/// Implementations must respect the supplied deadline (returning
/// [`super::EngineError::Timeout`] rather than running unbounded), must turn
/// unreachable or malformed targets into categorized errors rather than
/// panics, and must normalize any internal metric into a 0..=100 score using
/// a monotonic mapping.
#[async_trait]
pub trait AnalysisEngine: Send + Sync + Debug {
	/// The identifier this engine is registered under.
	fn name(&self) -> EngineName;

	/// Human-readable description of what this engine checks.
	fn description(&self) -> &str {
		"website analysis engine"
	}

	/// Analyze the target URL within the given deadline.
	async fn analyze(
		&self,
		url: &NormalizedUrl,
		config: &EngineRuntimeConfig,
		deadline: Duration,
	) -> EngineResult<EngineReport>;
}
