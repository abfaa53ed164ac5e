//! Traits for pluggable cache and job-record storage

use std::time::Duration;

use async_trait::async_trait;

use super::StorageResult;
use crate::analyses::Analysis;
use crate::engines::{EngineName, EngineOutcome};
use crate::models::NormalizedUrl;

/// Per-URL, per-engine cache of successful engine outcomes.
///
/// Keys are `(normalized URL, engine)` only, never the requesting tenant or
/// job, so requests for different engine subsets of the same URL share
/// entries per engine. Implementations store success outcomes only and treat
/// entries past their expiry as absent on read (lazy expiry; reclamation
/// timing is a backend detail). Entries are independent: atomic per-key
/// get/put semantics are sufficient, and concurrent writers may race with
/// last-write-wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
	/// Look up a previously computed outcome. Expired entries read as absent.
	async fn get(
		&self,
		url: &NormalizedUrl,
		engine: EngineName,
	) -> StorageResult<Option<EngineOutcome>>;

	/// Store a successful outcome with the given time-to-live.
	async fn put(
		&self,
		url: &NormalizedUrl,
		engine: EngineName,
		outcome: EngineOutcome,
		ttl: Duration,
	) -> StorageResult<()>;

	/// Drop cached outcomes for a URL: one engine's, or all of them.
	async fn invalidate(
		&self,
		url: &NormalizedUrl,
		engine: Option<EngineName>,
	) -> StorageResult<usize>;
}

/// Persistence surface for analysis job records.
///
/// The surrounding product owns durable persistence; the orchestrator only
/// needs these operations to create, advance, and expose job lifecycles.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
	async fn add_analysis(&self, analysis: Analysis) -> StorageResult<()>;

	async fn get_analysis(&self, analysis_id: &str) -> StorageResult<Option<Analysis>>;

	async fn update_analysis(&self, analysis: Analysis) -> StorageResult<()>;

	async fn remove_analysis(&self, analysis_id: &str) -> StorageResult<bool>;

	/// Most recent analyses for one tenant, newest first.
	async fn get_analyses_by_tenant(
		&self,
		tenant: &str,
		limit: usize,
	) -> StorageResult<Vec<Analysis>>;

	async fn analysis_count(&self) -> StorageResult<usize>;
}

/// Combined storage backend surface.
#[async_trait]
pub trait Storage: CacheStore + AnalysisStore {
	/// Backend liveness, for readiness probes.
	async fn health_check(&self) -> StorageResult<bool>;

	/// Kick off backend housekeeping (e.g. expired-entry sweeps). Optional;
	/// correctness never depends on it.
	async fn start_background_tasks(&self) -> StorageResult<()> {
		Ok(())
	}
}
