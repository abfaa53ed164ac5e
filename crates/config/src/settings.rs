//! Configuration settings structures

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main application settings
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Settings {
	pub server: ServerSettings,
	pub timeouts: TimeoutSettings,
	pub cache: CacheSettings,
	pub orchestrator: OrchestratorSettings,
	/// Per-engine configuration, keyed by engine identifier
	pub engines: HashMap<String, EngineSettings>,
	pub logging: LoggingSettings,
}

/// Server configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
	pub host: String,
	pub port: u16,
}

/// Timeout configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct TimeoutSettings {
	/// Per-engine deadline in milliseconds
	pub per_engine_ms: u64,
	/// Global job deadline in milliseconds
	pub global_ms: u64,
	/// Timeout for individual outbound HTTP requests
	pub request_ms: u64,
}

/// Engine-outcome cache configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CacheSettings {
	pub enabled: bool,
	/// Time-to-live for cached outcomes, in seconds
	pub ttl_secs: u64,
}

/// Orchestration limits
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct OrchestratorSettings {
	/// Maximum engine executions in flight across all jobs
	pub worker_pool_size: usize,
	/// Cap on the merged recommendation list
	pub max_recommendations: usize,
}

/// Individual engine configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct EngineSettings {
	pub enabled: bool,
	/// Override of the default outbound User-Agent
	pub user_agent: Option<String>,
	/// Override of the default outbound request timeout
	pub request_timeout_ms: Option<u64>,
}

impl Default for EngineSettings {
	fn default() -> Self {
		Self {
			enabled: true,
			user_agent: None,
			request_timeout_ms: None,
		}
	}
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingSettings {
	pub level: String,
	pub format: LogFormat,
	pub structured: bool,
}

/// Log format options
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	Json,
	Pretty,
	Compact,
}

/// Settings rejected at startup
#[derive(Debug, Error)]
pub enum ConfigValidationError {
	#[error("timeout '{name}' must be greater than zero")]
	ZeroTimeout { name: &'static str },

	#[error("global timeout ({global_ms}ms) must not be shorter than the per-engine timeout ({per_engine_ms}ms)")]
	GlobalShorterThanPerEngine { global_ms: u64, per_engine_ms: u64 },

	#[error("worker pool size must be greater than zero")]
	EmptyWorkerPool,

	#[error("cache ttl must be greater than zero when the cache is enabled")]
	ZeroCacheTtl,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			server: ServerSettings::default(),
			timeouts: TimeoutSettings::default(),
			cache: CacheSettings::default(),
			orchestrator: OrchestratorSettings::default(),
			engines: HashMap::new(),
			logging: LoggingSettings::default(),
		}
	}
}

impl Default for ServerSettings {
	fn default() -> Self {
		Self {
			host: "0.0.0.0".to_string(),
			port: 3000,
		}
	}
}

impl Default for TimeoutSettings {
	fn default() -> Self {
		Self {
			per_engine_ms: 30_000,
			global_ms: 60_000,
			request_ms: 10_000,
		}
	}
}

impl Default for CacheSettings {
	fn default() -> Self {
		Self {
			enabled: true,
			// 24 hours
			ttl_secs: 24 * 60 * 60,
		}
	}
}

impl Default for OrchestratorSettings {
	fn default() -> Self {
		Self {
			worker_pool_size: 8,
			max_recommendations: 50,
		}
	}
}

impl Default for LoggingSettings {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			format: LogFormat::Pretty,
			structured: false,
		}
	}
}

impl Settings {
	/// Get server bind address
	pub fn bind_address(&self) -> String {
		format!("{}:{}", self.server.host, self.server.port)
	}

	/// Engine identifiers explicitly disabled in configuration.
	pub fn disabled_engines(&self) -> Vec<String> {
		self.engines
			.iter()
			.filter(|(_, settings)| !settings.enabled)
			.map(|(name, _)| name.clone())
			.collect()
	}

	/// Reject settings that cannot produce a working deployment.
	pub fn validate(&self) -> Result<(), ConfigValidationError> {
		if self.timeouts.per_engine_ms == 0 {
			return Err(ConfigValidationError::ZeroTimeout {
				name: "per_engine_ms",
			});
		}
		if self.timeouts.global_ms == 0 {
			return Err(ConfigValidationError::ZeroTimeout { name: "global_ms" });
		}
		if self.timeouts.request_ms == 0 {
			return Err(ConfigValidationError::ZeroTimeout { name: "request_ms" });
		}
		if self.timeouts.global_ms < self.timeouts.per_engine_ms {
			return Err(ConfigValidationError::GlobalShorterThanPerEngine {
				global_ms: self.timeouts.global_ms,
				per_engine_ms: self.timeouts.per_engine_ms,
			});
		}
		if self.orchestrator.worker_pool_size == 0 {
			return Err(ConfigValidationError::EmptyWorkerPool);
		}
		if self.cache.enabled && self.cache.ttl_secs == 0 {
			return Err(ConfigValidationError::ZeroCacheTtl);
		}
		Ok(())
	}
}
