//! Mock engines for examples and testing
//!
//! Simple, working mock engines usable in examples and tests without real
//! network access.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use auditor_types::{
	AnalysisEngine, EngineError, EngineName, EngineReport, EngineResult, EngineRuntimeConfig,
	NormalizedUrl, Priority, Recommendation,
};

/// Configurable mock engine
///
/// Provides call tracking for cache assertions, configurable response delays
/// for timeout testing, and failure simulation for fault-isolation testing.
#[derive(Debug, Clone)]
pub struct MockEngine {
	name: EngineName,
	score: u8,
	response_delay: Duration,
	should_fail: bool,
	calls: Arc<AtomicUsize>,
}

impl MockEngine {
	pub fn new(name: EngineName, score: u8) -> Self {
		Self {
			name,
			score,
			response_delay: Duration::ZERO,
			should_fail: false,
			calls: Arc::new(AtomicUsize::new(0)),
		}
	}

	/// Engine that fails every invocation with a connection error.
	pub fn failing(name: EngineName) -> Self {
		Self {
			should_fail: true,
			..Self::new(name, 0)
		}
	}

	/// Engine that sleeps before answering; combine with a short deadline to
	/// exercise timeouts.
	pub fn slow(name: EngineName, response_delay: Duration) -> Self {
		Self {
			response_delay,
			..Self::new(name, 50)
		}
	}

	/// Number of times `analyze` has been invoked.
	pub fn call_count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	/// Shared handle to the call counter, usable after the engine moves into
	/// a registry.
	pub fn call_tracker(&self) -> Arc<AtomicUsize> {
		Arc::clone(&self.calls)
	}
}

#[async_trait]
impl AnalysisEngine for MockEngine {
	fn name(&self) -> EngineName {
		self.name
	}

	fn description(&self) -> &str {
		"mock engine for tests and demos"
	}

	async fn analyze(
		&self,
		url: &NormalizedUrl,
		_config: &EngineRuntimeConfig,
		_deadline: Duration,
	) -> EngineResult<EngineReport> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		if !self.response_delay.is_zero() {
			tokio::time::sleep(self.response_delay).await;
		}

		if self.should_fail {
			return Err(EngineError::Connection {
				reason: format!("mock engine {} configured to fail", self.name),
			});
		}

		let recommendation = Recommendation::new(
			self.name,
			Priority::Medium,
			format!("Mock {} finding for {}", self.name, url.host_str()),
			"No action needed; produced by a mock engine",
		);
		Ok(EngineReport::new(self.score, vec![recommendation]))
	}
}
