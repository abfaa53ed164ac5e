//! Error types for engine invocations

use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Categorized failure of one engine invocation.
///
/// Engine errors never unwind past the orchestrator's dispatch loop; they are
/// captured into an `EngineOutcome` and surfaced as data.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("request failed: {reason}")]
	Http { reason: String },

	#[error("HTTP {status_code} from target")]
	HttpStatus { status_code: u16 },

	#[error("connection error: {reason}")]
	Connection { reason: String },

	#[error("DNS resolution failed for {host}")]
	DnsFailure { host: String },

	#[error("deadline of {timeout_ms}ms exceeded")]
	Timeout { timeout_ms: u64 },

	#[error("could not parse target content: {reason}")]
	Parse { reason: String },

	#[error("upstream API error: {reason}")]
	Upstream { reason: String },

	#[error("engine configuration error: {reason}")]
	Config { reason: String },
}

impl EngineError {
	/// Whether this error is a deadline violation (tagged distinctly in
	/// outcomes for diagnostics).
	pub fn is_timeout(&self) -> bool {
		matches!(self, EngineError::Timeout { .. })
	}

	/// Whether a single idempotent retry is worth attempting.
	pub fn is_transient(&self) -> bool {
		matches!(self, EngineError::Connection { .. })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_timeout_classification() {
		assert!(EngineError::Timeout { timeout_ms: 500 }.is_timeout());
		assert!(!EngineError::HttpStatus { status_code: 500 }.is_timeout());
	}

	#[test]
	fn test_transient_classification() {
		assert!(EngineError::Connection {
			reason: "reset".to_string()
		}
		.is_transient());
		assert!(!EngineError::Parse {
			reason: "bad html".to_string()
		}
		.is_transient());
	}
}
