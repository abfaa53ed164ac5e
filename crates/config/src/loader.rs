//! Configuration loading utilities

use crate::Settings;
use config::{Config, ConfigError, Environment, File};

/// Load configuration from the config file, with `AUDITOR__`-prefixed
/// environment variables taking precedence (e.g. `AUDITOR__SERVER__PORT`).
pub fn load_config() -> Result<Settings, ConfigError> {
	let s = Config::builder()
		.add_source(File::with_name("config/config").required(false))
		.add_source(Environment::with_prefix("AUDITOR").separator("__"))
		.build()?;

	s.try_deserialize()
}
