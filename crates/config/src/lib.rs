//! Auditor Configuration
//!
//! Configuration management and startup utilities for the site auditor.

pub mod loader;
pub mod settings;
pub mod startup_logger;

pub use loader::load_config;
pub use settings::{
	CacheSettings, ConfigValidationError, EngineSettings, LogFormat, LoggingSettings,
	OrchestratorSettings, ServerSettings, Settings, TimeoutSettings,
};
pub use startup_logger::{log_service_info, log_service_shutdown, log_startup_complete};
