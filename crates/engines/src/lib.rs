//! Auditor Engines
//!
//! Concrete analysis engines for the site auditor and the registry that
//! binds engine identifiers to implementations.

use std::collections::HashMap;
use std::sync::Arc;

pub mod fetch;
pub mod html;
pub mod mobile;
pub mod performance;
pub mod seo;
pub mod technical;

pub use fetch::{FetchedPage, Fetcher};
pub use mobile::MobileEngine;
pub use performance::PerformanceEngine;
pub use seo::SeoEngine;
pub use technical::TechnicalEngine;

pub use auditor_types::{AnalysisEngine, EngineError, EngineName, EngineResult};

/// Immutable engine-identifier → adapter binding, built once at startup and
/// passed by reference into the orchestrator.
pub struct EngineRegistry {
	engines: HashMap<EngineName, Arc<dyn AnalysisEngine>>,
}

impl EngineRegistry {
	pub fn new() -> Self {
		Self {
			engines: HashMap::new(),
		}
	}

	/// Registry with every built-in engine, sharing one HTTP fetch pool.
	pub fn with_defaults() -> Self {
		let fetcher = Fetcher::new();
		let mut registry = Self::new();
		registry.register(Arc::new(TechnicalEngine::new(fetcher.clone())));
		registry.register(Arc::new(PerformanceEngine::new(fetcher.clone())));
		registry.register(Arc::new(SeoEngine::new(fetcher.clone())));
		registry.register(Arc::new(MobileEngine::new(fetcher)));
		registry
	}

	/// Register an engine under its own name. A later registration for the
	/// same name replaces the earlier one.
	pub fn register(&mut self, engine: Arc<dyn AnalysisEngine>) {
		self.engines.insert(engine.name(), engine);
	}

	pub fn get(&self, name: EngineName) -> Option<Arc<dyn AnalysisEngine>> {
		self.engines.get(&name).cloned()
	}

	pub fn contains(&self, name: EngineName) -> bool {
		self.engines.contains_key(&name)
	}

	/// Registered engine names in canonical order.
	pub fn names(&self) -> Vec<EngineName> {
		EngineName::ALL
			.into_iter()
			.filter(|name| self.engines.contains_key(name))
			.collect()
	}

	pub fn len(&self) -> usize {
		self.engines.len()
	}

	pub fn is_empty(&self) -> bool {
		self.engines.is_empty()
	}
}

impl Default for EngineRegistry {
	fn default() -> Self {
		Self::with_defaults()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_registry_covers_known_set() {
		let registry = EngineRegistry::with_defaults();
		assert_eq!(registry.len(), 4);
		for name in EngineName::ALL {
			assert!(registry.contains(name), "missing engine {}", name);
		}
		assert_eq!(registry.names(), EngineName::ALL.to_vec());
	}

	#[test]
	fn test_registration_replaces_by_name() {
		let fetcher = Fetcher::new();
		let mut registry = EngineRegistry::new();
		registry.register(Arc::new(SeoEngine::new(fetcher.clone())));
		registry.register(Arc::new(SeoEngine::new(fetcher)));
		assert_eq!(registry.len(), 1);
	}
}
