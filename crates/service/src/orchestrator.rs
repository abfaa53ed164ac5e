//! Analysis orchestration: cache resolution, bounded fan-out, job lifecycle
//!
//! For each requested engine the orchestrator first consults the cache, then
//! dispatches the misses concurrently, each under its own deadline, with the
//! whole job bounded by a global deadline. One engine's failure or timeout
//! never delays the others; every requested engine contributes exactly one
//! outcome to the final result.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

use auditor_engines::EngineRegistry;
use auditor_storage::{AnalysisStore, CacheStore};
use auditor_types::{
	AggregateResult, Analysis, AnalysisEngine, AnalysisError, AnalysisRequest, AnalysisResult,
	EngineName, EngineOutcome, EngineRuntimeConfig,
};

use crate::aggregator::aggregate;

/// Deployment-level orchestration configuration, bound once at startup.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
	/// Deadline for one engine's execution
	pub per_engine_timeout: Duration,
	/// Deadline for the whole job
	pub global_timeout: Duration,
	/// Time-to-live for cached engine outcomes
	pub cache_ttl: Duration,
	pub cache_enabled: bool,
	/// Maximum engine executions in flight across all jobs
	pub worker_pool_size: usize,
	/// Cap on the merged recommendation list
	pub max_recommendations: usize,
	/// Engines configured off; requested ones resolve as `Skipped`
	pub disabled_engines: HashSet<EngineName>,
	/// Default runtime configuration handed to engines
	pub engine_runtime: EngineRuntimeConfig,
	/// Per-engine overrides of the default runtime configuration
	pub engine_overrides: HashMap<EngineName, EngineRuntimeConfig>,
}

impl Default for OrchestratorConfig {
	fn default() -> Self {
		Self {
			per_engine_timeout: Duration::from_secs(30),
			global_timeout: Duration::from_secs(60),
			cache_ttl: Duration::from_secs(24 * 60 * 60),
			cache_enabled: true,
			worker_pool_size: 8,
			max_recommendations: 50,
			disabled_engines: HashSet::new(),
			engine_runtime: EngineRuntimeConfig::default(),
			engine_overrides: HashMap::new(),
		}
	}
}

/// Service orchestrating analysis jobs across the engine registry, the
/// outcome cache, and the job-record store.
#[derive(Clone)]
pub struct OrchestratorService {
	registry: Arc<EngineRegistry>,
	cache: Arc<dyn CacheStore>,
	analyses: Arc<dyn AnalysisStore>,
	config: Arc<OrchestratorConfig>,
	/// Bounds concurrent engine executions process-wide, not per job
	limiter: Arc<Semaphore>,
}

impl OrchestratorService {
	pub fn new(
		registry: Arc<EngineRegistry>,
		cache: Arc<dyn CacheStore>,
		analyses: Arc<dyn AnalysisStore>,
		config: OrchestratorConfig,
	) -> Self {
		let limiter = Arc::new(Semaphore::new(config.worker_pool_size.max(1)));
		Self {
			registry,
			cache,
			analyses,
			config: Arc::new(config),
			limiter,
		}
	}

	/// Run an analysis to completion and return the finished job record.
	pub async fn run(&self, request: AnalysisRequest) -> AnalysisResult<Analysis> {
		let analysis = self.create_job(request).await?;
		Ok(self.execute(analysis).await)
	}

	/// Submit an analysis and return its job id immediately.
	///
	/// The job runs on a detached task; callers poll [`Self::get_result`].
	/// A caller that stops polling does not abort the job; dispatched
	/// engines run to completion and still populate the cache.
	pub async fn submit(&self, request: AnalysisRequest) -> AnalysisResult<String> {
		let analysis = self.create_job(request).await?;
		let analysis_id = analysis.analysis_id.clone();

		let orchestrator = self.clone();
		tokio::spawn(async move {
			orchestrator.execute(analysis).await;
		});

		Ok(analysis_id)
	}

	/// Polling accessor. The result is present only once the job is terminal.
	pub async fn get_result(&self, analysis_id: &str) -> AnalysisResult<Analysis> {
		self.analyses
			.get_analysis(analysis_id)
			.await
			.map_err(|e| AnalysisError::Storage(e.to_string()))?
			.ok_or_else(|| AnalysisError::NotFound {
				analysis_id: analysis_id.to_string(),
			})
	}

	/// Most recent jobs for one tenant, newest first.
	pub async fn list_analyses(&self, tenant: &str, limit: usize) -> AnalysisResult<Vec<Analysis>> {
		self.analyses
			.get_analyses_by_tenant(tenant, limit)
			.await
			.map_err(|e| AnalysisError::Storage(e.to_string()))
	}

	/// Delete a job record. Tenant ownership is enforced here, never in the
	/// cache layer.
	pub async fn delete_analysis(&self, analysis_id: &str, tenant: &str) -> AnalysisResult<()> {
		let analysis = self.get_result(analysis_id).await?;
		if analysis.request.tenant != tenant {
			return Err(AnalysisError::Forbidden {
				analysis_id: analysis_id.to_string(),
			});
		}
		self.analyses
			.remove_analysis(analysis_id)
			.await
			.map_err(|e| AnalysisError::Storage(e.to_string()))?;
		Ok(())
	}

	async fn create_job(&self, request: AnalysisRequest) -> AnalysisResult<Analysis> {
		let analysis = Analysis::new(request);
		self.analyses
			.add_analysis(analysis.clone())
			.await
			.map_err(|e| AnalysisError::Storage(e.to_string()))?;
		Ok(analysis)
	}

	/// Drive one job from `Pending` to a terminal state.
	async fn execute(&self, mut analysis: Analysis) -> Analysis {
		info!(
			"Starting analysis {} for {} with {} engine(s)",
			analysis.analysis_id,
			analysis.request.url,
			analysis.request.engines.len()
		);

		analysis.mark_running();
		self.persist(&analysis).await;

		let started = Instant::now();
		let outcomes = self.resolve_engines(&analysis.request).await;
		let result: AggregateResult = aggregate(
			&analysis.request.engines,
			outcomes,
			self.config.max_recommendations,
		);

		analysis.finalize(result);
		self.persist(&analysis).await;

		info!(
			"Analysis {} reached {:?} in {}ms (overall score: {:?})",
			analysis.analysis_id,
			analysis.status,
			started.elapsed().as_millis(),
			analysis.result.as_ref().and_then(|r| r.overall_score),
		);
		analysis
	}

	/// Job-record updates are best-effort: the record store and the cache are
	/// updated independently, with no transaction spanning them.
	async fn persist(&self, analysis: &Analysis) {
		if let Err(e) = self.analyses.update_analysis(analysis.clone()).await {
			warn!(
				"Failed to persist analysis {}: {}",
				analysis.analysis_id, e
			);
		}
	}

	/// Resolve every requested engine to exactly one outcome, from cache or
	/// by concurrent dispatch.
	async fn resolve_engines(&self, request: &AnalysisRequest) -> HashMap<EngineName, EngineOutcome> {
		let mut outcomes: HashMap<EngineName, EngineOutcome> = HashMap::new();
		let mut misses: Vec<(EngineName, Arc<dyn AnalysisEngine>)> = Vec::new();

		for &engine in &request.engines {
			if self.config.disabled_engines.contains(&engine) {
				outcomes.insert(
					engine,
					EngineOutcome::skipped(engine, "engine disabled by configuration"),
				);
				continue;
			}
			let Some(adapter) = self.registry.get(engine) else {
				outcomes.insert(
					engine,
					EngineOutcome::skipped(engine, "no adapter registered for engine"),
				);
				continue;
			};

			if self.config.cache_enabled && !request.force_refresh {
				match self.cache.get(&request.url, engine).await {
					Ok(Some(outcome)) => {
						debug!("Cache hit for {} ({})", engine, request.url);
						outcomes.insert(engine, outcome.into_cached());
						continue;
					},
					Ok(None) => {},
					// A cache outage reads as a miss, never as a failure.
					Err(e) => warn!("Cache read failed for {}, treating as miss: {}", engine, e),
				}
			}
			misses.push((engine, adapter));
		}

		if misses.is_empty() {
			return outcomes;
		}

		let (tx, mut rx) = mpsc::unbounded_channel::<(EngineName, EngineOutcome)>();
		let miss_names: Vec<EngineName> = misses.iter().map(|(engine, _)| *engine).collect();

		for (engine, adapter) in misses {
			let tx = tx.clone();
			let url = request.url.clone();
			let runtime = self.runtime_for(engine);
			let per_engine_timeout = self.config.per_engine_timeout;
			let limiter = Arc::clone(&self.limiter);
			let cache = Arc::clone(&self.cache);
			let cache_enabled = self.config.cache_enabled;
			let cache_ttl = self.config.cache_ttl;

			tokio::spawn(async move {
				let outcome =
					dispatch_engine(engine, adapter, &url, runtime, per_engine_timeout, limiter)
						.await;

				// Written from the task so a job that stopped waiting (global
				// deadline, caller gone) still benefits future requests.
				if cache_enabled && outcome.is_success() {
					if let Err(e) = cache.put(&url, engine, outcome.clone(), cache_ttl).await {
						warn!("Cache write failed for {} ({}): {}", engine, url, e);
					}
				}

				// The receiver may already have given up on this job.
				let _ = tx.send((engine, outcome));
			});
		}
		drop(tx);

		let deadline = tokio::time::Instant::now() + self.config.global_timeout;
		let mut received = 0;
		while received < miss_names.len() {
			match tokio::time::timeout_at(deadline, rx.recv()).await {
				Ok(Some((engine, outcome))) => {
					outcomes.insert(engine, outcome);
					received += 1;
				},
				Ok(None) => break,
				Err(_) => {
					warn!(
						"Global deadline of {}ms reached with {} engine(s) still pending",
						self.config.global_timeout.as_millis(),
						miss_names.len() - received
					);
					break;
				},
			}
		}

		// Engines still pending at the global deadline are timeouts; nothing
		// is ever silently dropped.
		let global_ms = self.config.global_timeout.as_millis() as u64;
		for engine in miss_names {
			outcomes
				.entry(engine)
				.or_insert_with(|| EngineOutcome::timeout(engine, global_ms));
		}

		outcomes
	}

	fn runtime_for(&self, engine: EngineName) -> EngineRuntimeConfig {
		self.config
			.engine_overrides
			.get(&engine)
			.cloned()
			.unwrap_or_else(|| self.config.engine_runtime.clone())
	}
}

/// Run one engine under the worker-pool bound and its own deadline,
/// capturing every failure mode as an outcome.
async fn dispatch_engine(
	engine: EngineName,
	adapter: Arc<dyn AnalysisEngine>,
	url: &auditor_types::NormalizedUrl,
	runtime: EngineRuntimeConfig,
	deadline: Duration,
	limiter: Arc<Semaphore>,
) -> EngineOutcome {
	let permit = match limiter.acquire_owned().await {
		Ok(permit) => permit,
		Err(_) => return EngineOutcome::skipped(engine, "worker pool closed"),
	};

	// The deadline clock starts once a worker slot is held, so time spent
	// queueing under load does not count against an engine's deadline; the
	// global deadline still bounds the whole job.
	let started = Instant::now();
	let result = tokio::time::timeout(deadline, adapter.analyze(url, &runtime, deadline)).await;
	drop(permit);
	let elapsed_ms = started.elapsed().as_millis() as u64;

	match result {
		Err(_) => {
			warn!("Engine {} exceeded its {}ms deadline", engine, deadline.as_millis());
			EngineOutcome::timeout(engine, deadline.as_millis() as u64)
		},
		Ok(Ok(report)) => {
			debug!("Engine {} succeeded in {}ms", engine, elapsed_ms);
			EngineOutcome::success(engine, report, elapsed_ms)
		},
		Ok(Err(e)) if e.is_timeout() => {
			warn!("Engine {} reported timeout: {}", engine, e);
			EngineOutcome::timeout(engine, elapsed_ms)
		},
		Ok(Err(e)) => {
			warn!("Engine {} failed: {}", engine, e);
			EngineOutcome::failure(engine, e.to_string(), elapsed_ms)
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use auditor_storage::MemoryStore;
	use auditor_types::{
		AnalysisStatus, EngineReport, EngineResult, NormalizedUrl, OutcomeStatus, Priority,
		Recommendation, StorageResult,
	};
	use std::sync::atomic::{AtomicUsize, Ordering};

	/// Test engine with a call counter, configurable delay and failure mode.
	#[derive(Debug)]
	struct ProbeEngine {
		name: EngineName,
		score: u8,
		delay: Duration,
		fail: bool,
		calls: Arc<AtomicUsize>,
	}

	impl ProbeEngine {
		fn new(name: EngineName, score: u8) -> Self {
			Self {
				name,
				score,
				delay: Duration::ZERO,
				fail: false,
				calls: Arc::new(AtomicUsize::new(0)),
			}
		}

		fn failing(name: EngineName) -> Self {
			Self {
				fail: true,
				..Self::new(name, 0)
			}
		}

		fn slow(name: EngineName, delay: Duration) -> Self {
			Self {
				delay,
				..Self::new(name, 50)
			}
		}

		fn calls(&self) -> Arc<AtomicUsize> {
			Arc::clone(&self.calls)
		}
	}

	#[async_trait]
	impl AnalysisEngine for ProbeEngine {
		fn name(&self) -> EngineName {
			self.name
		}

		async fn analyze(
			&self,
			_url: &NormalizedUrl,
			_config: &EngineRuntimeConfig,
			_deadline: Duration,
		) -> EngineResult<EngineReport> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			if !self.delay.is_zero() {
				tokio::time::sleep(self.delay).await;
			}
			if self.fail {
				return Err(auditor_types::EngineError::Connection {
					reason: "probe configured to fail".to_string(),
				});
			}
			Ok(EngineReport::new(
				self.score,
				vec![Recommendation::new(
					self.name,
					Priority::Medium,
					format!("{} finding", self.name),
					"details",
				)],
			))
		}
	}

	struct Harness {
		orchestrator: OrchestratorService,
		store: Arc<MemoryStore>,
	}

	fn harness(engines: Vec<ProbeEngine>, config: OrchestratorConfig) -> Harness {
		let mut registry = EngineRegistry::new();
		for engine in engines {
			registry.register(Arc::new(engine));
		}
		let store = Arc::new(MemoryStore::new());
		let orchestrator = OrchestratorService::new(
			Arc::new(registry),
			store.clone(),
			store.clone(),
			config,
		);
		Harness { orchestrator, store }
	}

	fn request(engines: &[&str]) -> AnalysisRequest {
		AnalysisRequest::new("https://example.com", engines, "tenant-1").unwrap()
	}

	fn fast_config() -> OrchestratorConfig {
		OrchestratorConfig {
			per_engine_timeout: Duration::from_millis(200),
			global_timeout: Duration::from_millis(500),
			..OrchestratorConfig::default()
		}
	}

	#[tokio::test]
	async fn test_all_success_completes_with_mean_score() {
		let h = harness(
			vec![
				ProbeEngine::new(EngineName::Technical, 90),
				ProbeEngine::new(EngineName::Seo, 70),
			],
			fast_config(),
		);

		let analysis = h.orchestrator.run(request(&["technical", "seo"])).await.unwrap();
		assert_eq!(analysis.status, AnalysisStatus::Completed);
		let result = analysis.result.unwrap();
		assert_eq!(result.overall_score, Some(80));
		assert!(!result.degraded);
		assert_eq!(result.per_engine.len(), 2);
	}

	#[tokio::test]
	async fn test_one_failure_yields_partial() {
		let h = harness(
			vec![
				ProbeEngine::new(EngineName::Technical, 90),
				ProbeEngine::failing(EngineName::Seo),
			],
			fast_config(),
		);

		let analysis = h.orchestrator.run(request(&["technical", "seo"])).await.unwrap();
		assert_eq!(analysis.status, AnalysisStatus::Partial);
		let result = analysis.result.unwrap();
		assert_eq!(result.overall_score, Some(90));
		assert!(result.degraded);
		assert_eq!(
			result.per_engine[&EngineName::Seo].status,
			OutcomeStatus::Failure
		);
	}

	#[tokio::test]
	async fn test_all_failures_yield_failed_without_score() {
		let h = harness(
			vec![
				ProbeEngine::failing(EngineName::Technical),
				ProbeEngine::failing(EngineName::Seo),
			],
			fast_config(),
		);

		let analysis = h.orchestrator.run(request(&["technical", "seo"])).await.unwrap();
		assert_eq!(analysis.status, AnalysisStatus::Failed);
		let result = analysis.result.unwrap();
		assert_eq!(result.overall_score, None);
		assert_eq!(result.per_engine.len(), 2);
	}

	#[tokio::test]
	async fn test_slow_engine_times_out_without_delaying_others() {
		let h = harness(
			vec![
				ProbeEngine::new(EngineName::Technical, 90),
				ProbeEngine::slow(EngineName::Seo, Duration::from_secs(5)),
			],
			fast_config(),
		);

		let started = Instant::now();
		let analysis = h.orchestrator.run(request(&["technical", "seo"])).await.unwrap();
		assert!(started.elapsed() < Duration::from_secs(2));

		assert_eq!(analysis.status, AnalysisStatus::Partial);
		let result = analysis.result.unwrap();
		assert_eq!(result.overall_score, Some(90));
		assert_eq!(
			result.per_engine[&EngineName::Seo].status,
			OutcomeStatus::Timeout
		);
	}

	#[tokio::test]
	async fn test_cache_hit_skips_adapter_within_ttl() {
		let technical = ProbeEngine::new(EngineName::Technical, 90);
		let calls = technical.calls();
		let h = harness(vec![technical], fast_config());

		let first = h.orchestrator.run(request(&["technical"])).await.unwrap();
		assert_eq!(calls.load(Ordering::SeqCst), 1);
		assert!(!first.result.unwrap().per_engine[&EngineName::Technical].from_cache);

		let second = h.orchestrator.run(request(&["technical"])).await.unwrap();
		assert_eq!(calls.load(Ordering::SeqCst), 1, "cached run must not re-invoke the adapter");
		let result = second.result.unwrap();
		let outcome = &result.per_engine[&EngineName::Technical];
		assert!(outcome.from_cache);
		assert_eq!(outcome.score, Some(90));
		assert_eq!(second.status, AnalysisStatus::Completed);
	}

	#[tokio::test]
	async fn test_force_refresh_bypasses_reads_but_still_writes() {
		let technical = ProbeEngine::new(EngineName::Technical, 90);
		let calls = technical.calls();
		let h = harness(vec![technical], fast_config());

		h.orchestrator.run(request(&["technical"])).await.unwrap();
		h.orchestrator
			.run(request(&["technical"]).with_force_refresh(true))
			.await
			.unwrap();
		assert_eq!(calls.load(Ordering::SeqCst), 2, "force refresh must re-invoke the adapter");

		// The refreshed value is reused by the next plain run.
		h.orchestrator.run(request(&["technical"])).await.unwrap();
		assert_eq!(calls.load(Ordering::SeqCst), 2);
	}

	#[tokio::test]
	async fn test_engine_subsets_share_cache_entries() {
		let technical = ProbeEngine::new(EngineName::Technical, 90);
		let seo = ProbeEngine::new(EngineName::Seo, 70);
		let technical_calls = technical.calls();
		let h = harness(vec![technical, seo], fast_config());

		h.orchestrator.run(request(&["technical"])).await.unwrap();
		let both = h.orchestrator.run(request(&["technical", "seo"])).await.unwrap();

		assert_eq!(technical_calls.load(Ordering::SeqCst), 1);
		let result = both.result.unwrap();
		assert!(result.per_engine[&EngineName::Technical].from_cache);
		assert!(!result.per_engine[&EngineName::Seo].from_cache);
		assert_eq!(result.overall_score, Some(80));
	}

	#[tokio::test]
	async fn test_normalized_urls_hit_the_same_entry() {
		let technical = ProbeEngine::new(EngineName::Technical, 90);
		let calls = technical.calls();
		let h = harness(vec![technical], fast_config());

		let first =
			AnalysisRequest::new("https://example.com/?b=2&a=1", &["technical"], "t").unwrap();
		let second =
			AnalysisRequest::new("https://example.com?a=1&b=2", &["technical"], "t").unwrap();
		h.orchestrator.run(first).await.unwrap();
		h.orchestrator.run(second).await.unwrap();
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn test_disabled_engine_is_skipped() {
		let mut config = fast_config();
		config.disabled_engines.insert(EngineName::Seo);
		let h = harness(
			vec![
				ProbeEngine::new(EngineName::Technical, 90),
				ProbeEngine::new(EngineName::Seo, 70),
			],
			config,
		);

		let analysis = h.orchestrator.run(request(&["technical", "seo"])).await.unwrap();
		assert_eq!(analysis.status, AnalysisStatus::Partial);
		let result = analysis.result.unwrap();
		assert_eq!(
			result.per_engine[&EngineName::Seo].status,
			OutcomeStatus::Skipped
		);
		assert_eq!(result.overall_score, Some(90));
	}

	#[tokio::test]
	async fn test_unregistered_engine_is_skipped_not_dropped() {
		let h = harness(vec![ProbeEngine::new(EngineName::Technical, 90)], fast_config());

		let analysis = h.orchestrator.run(request(&["technical", "mobile"])).await.unwrap();
		let result = analysis.result.unwrap();
		assert_eq!(result.per_engine.len(), 2);
		assert_eq!(
			result.per_engine[&EngineName::Mobile].status,
			OutcomeStatus::Skipped
		);
	}

	#[tokio::test]
	async fn test_submit_and_poll_to_terminal_state() {
		let h = harness(vec![ProbeEngine::new(EngineName::Technical, 90)], fast_config());

		let id = h.orchestrator.submit(request(&["technical"])).await.unwrap();

		let mut analysis = h.orchestrator.get_result(&id).await.unwrap();
		for _ in 0..50 {
			if analysis.is_terminal() {
				break;
			}
			tokio::time::sleep(Duration::from_millis(20)).await;
			analysis = h.orchestrator.get_result(&id).await.unwrap();
		}

		assert_eq!(analysis.status, AnalysisStatus::Completed);
		assert!(analysis.result.is_some());
		assert!(analysis.started_at.is_some());
		assert!(analysis.completed_at.is_some());
	}

	#[tokio::test]
	async fn test_worker_pool_bounds_concurrent_executions() {
		// Two 100ms engines behind a single worker slot cannot overlap, so
		// the job takes at least two engine-durations.
		let config = OrchestratorConfig {
			per_engine_timeout: Duration::from_millis(500),
			global_timeout: Duration::from_millis(2_000),
			worker_pool_size: 1,
			..OrchestratorConfig::default()
		};
		let h = harness(
			vec![
				ProbeEngine::slow(EngineName::Technical, Duration::from_millis(100)),
				ProbeEngine::slow(EngineName::Seo, Duration::from_millis(100)),
			],
			config,
		);

		let started = Instant::now();
		let analysis = h.orchestrator.run(request(&["technical", "seo"])).await.unwrap();
		assert_eq!(analysis.status, AnalysisStatus::Completed);
		assert!(
			started.elapsed() >= Duration::from_millis(200),
			"engines must serialize through the single worker slot"
		);
	}

	#[tokio::test]
	async fn test_get_result_unknown_id() {
		let h = harness(vec![], fast_config());
		let err = h.orchestrator.get_result("missing").await.unwrap_err();
		assert!(matches!(err, AnalysisError::NotFound { .. }));
	}

	#[tokio::test]
	async fn test_delete_enforces_tenant_ownership() {
		let h = harness(vec![ProbeEngine::new(EngineName::Technical, 90)], fast_config());
		let analysis = h.orchestrator.run(request(&["technical"])).await.unwrap();
		let id = analysis.analysis_id;

		let err = h.orchestrator.delete_analysis(&id, "other-tenant").await.unwrap_err();
		assert!(matches!(err, AnalysisError::Forbidden { .. }));

		h.orchestrator.delete_analysis(&id, "tenant-1").await.unwrap();
		assert!(h.orchestrator.get_result(&id).await.is_err());
	}

	#[tokio::test]
	async fn test_engine_finishing_after_global_deadline_still_populates_cache() {
		let config = OrchestratorConfig {
			per_engine_timeout: Duration::from_millis(300),
			global_timeout: Duration::from_millis(50),
			..OrchestratorConfig::default()
		};
		let h = harness(
			vec![ProbeEngine::slow(
				EngineName::Technical,
				Duration::from_millis(120),
			)],
			config,
		);

		let analysis = h.orchestrator.run(request(&["technical"])).await.unwrap();
		assert_eq!(analysis.status, AnalysisStatus::Failed);
		assert_eq!(
			analysis.result.unwrap().per_engine[&EngineName::Technical].status,
			OutcomeStatus::Timeout
		);

		// The dispatched task keeps running past the deadline and writes its
		// success into the cache for future requests.
		tokio::time::sleep(Duration::from_millis(250)).await;
		let url = NormalizedUrl::parse("https://example.com").unwrap();
		let cached = h.store.get(&url, EngineName::Technical).await.unwrap();
		assert!(cached.is_some());
	}

	mod infrastructure {
		use super::*;
		use mockall::mock;
		use std::time::Duration as StdDuration;

		mock! {
			pub Cache {}

			#[async_trait]
			impl CacheStore for Cache {
				async fn get(
					&self,
					url: &NormalizedUrl,
					engine: EngineName,
				) -> StorageResult<Option<EngineOutcome>>;

				async fn put(
					&self,
					url: &NormalizedUrl,
					engine: EngineName,
					outcome: EngineOutcome,
					ttl: StdDuration,
				) -> StorageResult<()>;

				async fn invalidate(
					&self,
					url: &NormalizedUrl,
					engine: Option<EngineName>,
				) -> StorageResult<usize>;
			}
		}

		fn broken_cache() -> MockCache {
			let mut cache = MockCache::new();
			cache.expect_get().returning(|_, _| {
				Err(auditor_types::StorageError::Connection {
					message: "cache backend unreachable".to_string(),
				})
			});
			cache.expect_put().returning(|_, _, _, _| {
				Err(auditor_types::StorageError::Connection {
					message: "cache backend unreachable".to_string(),
				})
			});
			cache
		}

		#[tokio::test]
		async fn test_cache_outage_never_fails_a_job() {
			let technical = ProbeEngine::new(EngineName::Technical, 90);
			let calls = technical.calls();

			let mut registry = EngineRegistry::new();
			registry.register(Arc::new(technical));
			let store = Arc::new(MemoryStore::new());
			let orchestrator = OrchestratorService::new(
				Arc::new(registry),
				Arc::new(broken_cache()),
				store,
				fast_config(),
			);

			let analysis = orchestrator.run(request(&["technical"])).await.unwrap();
			assert_eq!(analysis.status, AnalysisStatus::Completed);
			assert_eq!(analysis.result.unwrap().overall_score, Some(90));
			// Read degraded to a miss, so the adapter ran.
			assert_eq!(calls.load(Ordering::SeqCst), 1);
		}
	}
}
