//! Site Auditor Library
//!
//! A website-quality analysis service: one request fans out to independent
//! analysis engines (technical, performance, SEO, mobile), partial results
//! are merged into a single score with prioritized recommendations, and
//! per-URL engine outcomes are cached to avoid redundant network work.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

// Core domain types - the most commonly used types
pub use auditor_types::{
	chrono,
	// External dependencies for convenience
	serde_json,
	AggregateResult,
	Analysis,
	// Engine contract
	AnalysisEngine,
	// Error types
	AnalysisError,
	AnalysisRequest,
	AnalysisStatus,
	EngineError,
	EngineName,
	EngineOutcome,
	EngineReport,
	EngineRuntimeConfig,
	NormalizedUrl,
	OutcomeStatus,
	Priority,
	Recommendation,
	ValidationError,
};

// Service layer
pub use auditor_service::{aggregate, OrchestratorConfig, OrchestratorService};

// Storage layer
pub use auditor_storage::{AnalysisStore, CacheStore, MemoryStore, Storage, StorageError};

// API layer
pub use auditor_api::{create_router, AppState};

// Engines
pub use auditor_engines::{
	EngineRegistry, Fetcher, MobileEngine, PerformanceEngine, SeoEngine, TechnicalEngine,
};

// Config
pub use auditor_config::{
	load_config, log_service_info, log_startup_complete, LogFormat, Settings,
};

// Module aliases for advanced usage
pub mod types {
	pub use auditor_types::*;
}

pub mod service {
	pub use auditor_service::*;
}

pub mod storage {
	pub use auditor_storage::*;
}

pub mod api {
	pub use auditor_api::*;
	pub mod routes {
		pub use auditor_api::{create_router, AppState};
	}
}

pub mod engines {
	pub use auditor_engines::*;
}

pub mod config {
	pub use auditor_config::*;
}

pub mod mocks;

/// Builder pattern for configuring the auditor
pub struct AuditorBuilder<S = MemoryStore>
where
	S: Storage + Clone + 'static,
{
	settings: Option<Settings>,
	storage: S,
	registry: Option<EngineRegistry>,
}

impl AuditorBuilder<MemoryStore> {
	/// Create a new auditor builder with default memory storage
	pub fn new() -> Self {
		Self::with_storage(MemoryStore::new())
	}
}

impl Default for AuditorBuilder<MemoryStore> {
	fn default() -> Self {
		Self::new()
	}
}

impl<S> AuditorBuilder<S>
where
	S: Storage + Clone + 'static,
{
	/// Create a new auditor builder with the provided storage
	pub fn with_storage(storage: S) -> Self {
		Self {
			settings: None,
			storage,
			registry: None,
		}
	}

	/// Set custom settings
	pub fn with_settings(mut self, settings: Settings) -> Self {
		self.settings = Some(settings);
		self
	}

	/// Get the current settings
	pub fn settings(&self) -> Option<&Settings> {
		self.settings.as_ref()
	}

	/// Register a custom engine (uses the engine's own name; replaces any
	/// default registered under it)
	pub fn with_engine(mut self, engine: Arc<dyn AnalysisEngine>) -> Self {
		let mut registry = self.registry.unwrap_or_default();
		registry.register(engine);
		self.registry = Some(registry);
		self
	}

	/// Start with an empty registry instead of the built-in engines; combine
	/// with [`Self::with_engine`].
	pub fn without_default_engines(mut self) -> Self {
		self.registry.get_or_insert_with(EngineRegistry::new);
		self
	}

	/// Initialize tracing with configuration-based settings
	fn init_tracing_from_settings(
		&self,
		settings: &Settings,
	) -> Result<(), Box<dyn std::error::Error>> {
		// Create env filter using config level or environment variable
		let log_level = &settings.logging.level;
		let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
			.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

		match settings.logging.format {
			LogFormat::Json => {
				let subscriber = tracing_subscriber::fmt().json().with_env_filter(env_filter);
				if settings.logging.structured {
					subscriber.with_target(true).with_thread_ids(true).init();
				} else {
					subscriber.init();
				}
			},
			LogFormat::Pretty => {
				let subscriber = tracing_subscriber::fmt()
					.pretty()
					.with_env_filter(env_filter);
				if settings.logging.structured {
					subscriber.with_target(true).with_thread_ids(true).init();
				} else {
					subscriber.init();
				}
			},
			LogFormat::Compact => {
				let subscriber = tracing_subscriber::fmt()
					.compact()
					.with_env_filter(env_filter);
				if settings.logging.structured {
					subscriber.with_target(true).with_thread_ids(true).init();
				} else {
					subscriber.init();
				}
			},
		}

		info!(
			"Logging configuration applied: level={}, format={:?}, structured={}",
			settings.logging.level, settings.logging.format, settings.logging.structured
		);

		Ok(())
	}

	/// Start the auditor and return the configured router with state
	pub async fn start(self) -> Result<(axum::Router, AppState), Box<dyn std::error::Error>> {
		let settings = self.settings.clone().unwrap_or_default();
		settings
			.validate()
			.map_err(|e| format!("Invalid configuration: {}", e))?;

		let registry = Arc::new(self.registry.unwrap_or_default());
		if registry.is_empty() {
			warn!("Starting with an empty engine registry; every request will resolve as skipped");
		}
		info!(
			"Initialized engine registry with {} engine(s)",
			registry.len()
		);

		let orchestrator_config = orchestrator_config_from(&settings);
		let disabled_engines = orchestrator_config.disabled_engines.clone();

		let storage_arc: Arc<dyn Storage> = Arc::new(self.storage.clone());
		let orchestrator = OrchestratorService::new(
			Arc::clone(&registry),
			Arc::new(self.storage.clone()),
			Arc::new(self.storage.clone()),
			orchestrator_config,
		);

		let app_state = AppState {
			orchestrator: Arc::new(orchestrator),
			registry,
			storage: storage_arc,
			disabled_engines: Arc::new(disabled_engines),
		};

		let router = create_router().with_state(app_state.clone());
		Ok((router, app_state))
	}

	/// Start the complete server with all defaults and setup
	///
	/// Loads `.env` and the config file, initializes tracing, starts storage
	/// housekeeping, and serves until shutdown.
	pub async fn start_server(mut self) -> Result<(), Box<dyn std::error::Error>> {
		// Load .env file if it exists
		dotenvy::dotenv().ok();

		// Use provided settings or load from config with defaults
		let using_provided_settings = self.settings.is_some();
		let settings = if using_provided_settings {
			self.settings.take().unwrap()
		} else {
			load_config().unwrap_or_default()
		};

		self.init_tracing_from_settings(&settings)?;
		log_service_info();

		info!(
			"Using configuration loaded from {}",
			if using_provided_settings {
				"provided settings"
			} else {
				"config file or defaults"
			}
		);
		info!(
			"Timeouts: per-engine {}ms, global {}ms; cache ttl {}s ({})",
			settings.timeouts.per_engine_ms,
			settings.timeouts.global_ms,
			settings.cache.ttl_secs,
			if settings.cache.enabled {
				"enabled"
			} else {
				"disabled"
			}
		);

		let bind_addr = settings.bind_address();
		let addr: SocketAddr = bind_addr
			.parse()
			.map_err(|e| format!("Invalid bind address '{}': {}", bind_addr, e))?;

		if self.settings.is_none() {
			self.settings = Some(settings);
		}

		let (app, state) = self.start().await?;
		state.storage.start_background_tasks().await?;

		let listener = tokio::net::TcpListener::bind(addr).await?;
		log_startup_complete(&bind_addr);
		info!("API endpoints available:");
		info!("  GET    /health");
		info!("  GET    /ready");
		info!("  POST   /api/v1/analyses");
		info!("  GET    /api/v1/analyses");
		info!("  GET    /api/v1/analyses/{{id}}");
		info!("  DELETE /api/v1/analyses/{{id}}");
		info!("  GET    /api/v1/engines");

		axum::serve(listener, app).await?;
		Ok(())
	}
}

/// Bind deployment settings into the orchestrator's immutable configuration.
fn orchestrator_config_from(settings: &Settings) -> OrchestratorConfig {
	let mut disabled_engines = HashSet::new();
	for name in settings.disabled_engines() {
		match name.parse::<EngineName>() {
			Ok(engine) => {
				disabled_engines.insert(engine);
			},
			Err(_) => warn!("Ignoring configuration for unknown engine '{}'", name),
		}
	}

	let default_runtime = EngineRuntimeConfig {
		request_timeout_ms: settings.timeouts.request_ms,
		..EngineRuntimeConfig::default()
	};

	let mut engine_overrides = HashMap::new();
	for (name, engine_settings) in &settings.engines {
		let Ok(engine) = name.parse::<EngineName>() else {
			continue;
		};
		if engine_settings.user_agent.is_none() && engine_settings.request_timeout_ms.is_none() {
			continue;
		}
		let mut runtime = default_runtime.clone();
		if let Some(user_agent) = &engine_settings.user_agent {
			runtime.user_agent = user_agent.clone();
		}
		if let Some(request_timeout_ms) = engine_settings.request_timeout_ms {
			runtime.request_timeout_ms = request_timeout_ms;
		}
		engine_overrides.insert(engine, runtime);
	}

	OrchestratorConfig {
		per_engine_timeout: Duration::from_millis(settings.timeouts.per_engine_ms),
		global_timeout: Duration::from_millis(settings.timeouts.global_ms),
		cache_ttl: Duration::from_secs(settings.cache.ttl_secs),
		cache_enabled: settings.cache.enabled,
		worker_pool_size: settings.orchestrator.worker_pool_size,
		max_recommendations: settings.orchestrator.max_recommendations,
		disabled_engines,
		engine_runtime: default_runtime,
		engine_overrides,
	}
}
