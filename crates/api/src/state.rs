use std::collections::HashSet;
use std::sync::Arc;

use auditor_engines::EngineRegistry;
use auditor_service::OrchestratorService;
use auditor_storage::Storage;
use auditor_types::EngineName;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
	pub orchestrator: Arc<OrchestratorService>,
	pub registry: Arc<EngineRegistry>,
	pub storage: Arc<dyn Storage>,
	/// Engines configured off; surfaced by the engine listing
	pub disabled_engines: Arc<HashSet<EngineName>>,
}
