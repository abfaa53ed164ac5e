//! Engine registry listing

use axum::extract::State;
use axum::response::Json;
use serde::Serialize;

use crate::state::AppState;

/// One registered engine, as exposed over the API
#[derive(Debug, Serialize)]
pub struct EngineInfo {
	pub name: String,
	pub description: String,
	pub enabled: bool,
}

/// GET /api/v1/engines - The known engine set and its configuration state
pub async fn get_engines(State(state): State<AppState>) -> Json<Vec<EngineInfo>> {
	let engines = state
		.registry
		.names()
		.into_iter()
		.filter_map(|name| {
			state.registry.get(name).map(|engine| EngineInfo {
				name: name.to_string(),
				description: engine.description().to_string(),
				enabled: !state.disabled_engines.contains(&name),
			})
		})
		.collect();
	Json(engines)
}
