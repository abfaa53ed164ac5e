//! In-memory storage implementation using DashMap with TTL support

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, info};

use auditor_types::{Analysis, EngineName, EngineOutcome, NormalizedUrl, OutcomeStatus};

use crate::traits::{AnalysisStore, CacheStore, Storage, StorageError, StorageResult};

/// Cache key: normalized URL string + engine identifier. Never tenant-scoped.
type CacheKey = (String, EngineName);

/// A cached engine outcome with its expiry.
#[derive(Debug, Clone)]
struct CacheEntry {
	outcome: EngineOutcome,
	expires_at: DateTime<Utc>,
}

impl CacheEntry {
	fn is_expired(&self, now: DateTime<Utc>) -> bool {
		self.expires_at <= now
	}
}

/// In-memory store for cached engine outcomes and analysis job records.
///
/// Expiry is lazy: reads treat expired entries as absent; actual removal
/// happens on the read path or in the optional background sweep.
#[derive(Clone)]
pub struct MemoryStore {
	outcomes: Arc<DashMap<CacheKey, CacheEntry>>,
	analyses: Arc<DashMap<String, Analysis>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self {
			outcomes: Arc::new(DashMap::new()),
			analyses: Arc::new(DashMap::new()),
		}
	}

	/// Spawn the periodic sweep that reclaims expired cache entries.
	///
	/// Purely a storage-reclamation aid; reads are already correct without it.
	pub fn start_ttl_cleanup(&self) -> tokio::task::JoinHandle<()> {
		let outcomes = Arc::clone(&self.outcomes);
		tokio::spawn(async move {
			let mut cleanup_interval = tokio::time::interval(Duration::from_secs(60));

			loop {
				cleanup_interval.tick().await;

				let now = Utc::now();
				let before = outcomes.len();
				outcomes.retain(|_key, entry| !entry.is_expired(now));
				let removed = before.saturating_sub(outcomes.len());
				if removed > 0 {
					debug!("Cleaned up {} expired cache entries", removed);
				}
			}
		})
	}

	/// Remove expired cache entries immediately, returning how many went.
	pub fn cleanup_expired(&self) -> usize {
		let now = Utc::now();
		let mut removed = 0;
		self.outcomes.retain(|_key, entry| {
			if entry.is_expired(now) {
				removed += 1;
				false
			} else {
				true
			}
		});
		if removed > 0 {
			info!("Cleaned up {} expired cache entries", removed);
		}
		removed
	}

	/// Count of live (non-expired) cache entries.
	pub fn cached_outcome_count(&self) -> usize {
		let now = Utc::now();
		self.outcomes
			.iter()
			.filter(|entry| !entry.value().is_expired(now))
			.count()
	}
}

impl Default for MemoryStore {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl CacheStore for MemoryStore {
	async fn get(
		&self,
		url: &NormalizedUrl,
		engine: EngineName,
	) -> StorageResult<Option<EngineOutcome>> {
		let key = (url.as_str().to_string(), engine);
		if let Some(entry) = self.outcomes.get(&key) {
			if entry.is_expired(Utc::now()) {
				drop(entry);
				self.outcomes.remove(&key);
				return Ok(None);
			}
			return Ok(Some(entry.outcome.clone()));
		}
		Ok(None)
	}

	async fn put(
		&self,
		url: &NormalizedUrl,
		engine: EngineName,
		outcome: EngineOutcome,
		ttl: Duration,
	) -> StorageResult<()> {
		// Failures are never cached; a stale error would poison later requests.
		if outcome.status != OutcomeStatus::Success {
			return Err(StorageError::Operation {
				message: format!(
					"refusing to cache non-success outcome for {} ({})",
					engine,
					url.as_str()
				),
			});
		}

		let ttl = chrono::Duration::from_std(ttl).map_err(|e| StorageError::Operation {
			message: format!("invalid ttl: {}", e),
		})?;
		let entry = CacheEntry {
			outcome,
			expires_at: Utc::now() + ttl,
		};
		self.outcomes.insert((url.as_str().to_string(), engine), entry);
		Ok(())
	}

	async fn invalidate(
		&self,
		url: &NormalizedUrl,
		engine: Option<EngineName>,
	) -> StorageResult<usize> {
		match engine {
			Some(engine) => {
				let key = (url.as_str().to_string(), engine);
				Ok(self.outcomes.remove(&key).map(|_| 1).unwrap_or(0))
			},
			None => {
				let mut removed = 0;
				self.outcomes.retain(|(entry_url, _), _| {
					if entry_url == url.as_str() {
						removed += 1;
						false
					} else {
						true
					}
				});
				Ok(removed)
			},
		}
	}
}

#[async_trait]
impl AnalysisStore for MemoryStore {
	async fn add_analysis(&self, analysis: Analysis) -> StorageResult<()> {
		self.analyses.insert(analysis.analysis_id.clone(), analysis);
		Ok(())
	}

	async fn get_analysis(&self, analysis_id: &str) -> StorageResult<Option<Analysis>> {
		Ok(self.analyses.get(analysis_id).map(|a| a.clone()))
	}

	async fn update_analysis(&self, analysis: Analysis) -> StorageResult<()> {
		self.analyses.insert(analysis.analysis_id.clone(), analysis);
		Ok(())
	}

	async fn remove_analysis(&self, analysis_id: &str) -> StorageResult<bool> {
		Ok(self.analyses.remove(analysis_id).is_some())
	}

	async fn get_analyses_by_tenant(
		&self,
		tenant: &str,
		limit: usize,
	) -> StorageResult<Vec<Analysis>> {
		let mut analyses: Vec<Analysis> = self
			.analyses
			.iter()
			.filter(|entry| entry.value().request.tenant == tenant)
			.map(|entry| entry.value().clone())
			.collect();
		analyses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		analyses.truncate(limit);
		Ok(analyses)
	}

	async fn analysis_count(&self) -> StorageResult<usize> {
		Ok(self.analyses.len())
	}
}

#[async_trait]
impl Storage for MemoryStore {
	async fn health_check(&self) -> StorageResult<bool> {
		// For in-memory storage, just check that the maps are accessible
		Ok(true)
	}

	async fn start_background_tasks(&self) -> StorageResult<()> {
		self.start_ttl_cleanup();
		Ok(())
	}
}
