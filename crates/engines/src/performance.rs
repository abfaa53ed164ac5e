//! Performance engine
//!
//! Measures transfer-level performance facts: time to first byte, full load
//! time, page weight, compression, and caching headers. Millisecond and byte
//! metrics are normalized into the 0..=100 score through fixed monotonic
//! thresholds.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use auditor_types::{
	AnalysisEngine, EngineError, EngineName, EngineReport, EngineResult, EngineRuntimeConfig,
	NormalizedUrl, Priority, Recommendation,
};

use crate::fetch::Fetcher;

// Threshold pairs follow the poor/needs-improvement split of the Core Web
// Vitals guidance: one deduction past the first threshold, a larger one past
// the second.
const LOAD_SLOW_MS: u64 = 2_500;
const LOAD_POOR_MS: u64 = 4_000;
const WEIGHT_HEAVY_BYTES: usize = 1_500_000;
const WEIGHT_POOR_BYTES: usize = 3_000_000;

const PENALTY_LOAD_POOR: i32 = 40;
const PENALTY_LOAD_SLOW: i32 = 20;
const PENALTY_WEIGHT_POOR: i32 = 30;
const PENALTY_WEIGHT_HEAVY: i32 = 15;
const PENALTY_NO_COMPRESSION: i32 = 15;
const PENALTY_NO_CACHE_CONTROL: i32 = 10;

#[derive(Debug, Clone)]
pub struct PerformanceEngine {
	fetcher: Fetcher,
}

impl PerformanceEngine {
	pub fn new(fetcher: Fetcher) -> Self {
		Self { fetcher }
	}

	async fn run(
		&self,
		url: &NormalizedUrl,
		config: &EngineRuntimeConfig,
	) -> EngineResult<EngineReport> {
		let page = self.fetcher.get_transfer(url.as_str(), config).await?;
		if !page.is_success() {
			return Err(EngineError::HttpStatus {
				status_code: page.status,
			});
		}

		let compressed = page
			.content_encoding
			.as_deref()
			.map(|e| {
				let e = e.to_ascii_lowercase();
				e.contains("gzip") || e.contains("br") || e.contains("zstd")
			})
			.unwrap_or(false);
		let has_cache_control = page
			.cache_control
			.as_deref()
			.map(|v| !v.trim().is_empty())
			.unwrap_or(false);

		let mut score: i32 = 100;
		let mut recommendations = Vec::new();

		if page.elapsed_ms > LOAD_POOR_MS {
			score -= PENALTY_LOAD_POOR;
			recommendations.push(
				Recommendation::new(
					EngineName::Performance,
					Priority::High,
					format!("Page loads in {:.1}s", page.elapsed_ms as f64 / 1000.0),
					"Reduce server response time and defer non-critical resources",
				)
				.with_impact("Load times above 4s sharply increase abandonment"),
			);
		} else if page.elapsed_ms > LOAD_SLOW_MS {
			score -= PENALTY_LOAD_SLOW;
			recommendations.push(Recommendation::new(
				EngineName::Performance,
				Priority::Medium,
				format!("Page loads in {:.1}s", page.elapsed_ms as f64 / 1000.0),
				"Aim for a full load under 2.5s",
			));
		}

		if page.body_bytes > WEIGHT_POOR_BYTES {
			score -= PENALTY_WEIGHT_POOR;
			recommendations.push(
				Recommendation::new(
					EngineName::Performance,
					Priority::High,
					format!("Page transfers {} KB", page.body_bytes / 1024),
					"Cut page weight: compress images, split bundles, lazy-load below the fold",
				)
				.with_impact("Heavy pages dominate load time on mobile networks"),
			);
		} else if page.body_bytes > WEIGHT_HEAVY_BYTES {
			score -= PENALTY_WEIGHT_HEAVY;
			recommendations.push(Recommendation::new(
				EngineName::Performance,
				Priority::Medium,
				format!("Page transfers {} KB", page.body_bytes / 1024),
				"Keep the initial document under 1.5 MB on the wire",
			));
		}

		if !compressed {
			score -= PENALTY_NO_COMPRESSION;
			recommendations.push(
				Recommendation::new(
					EngineName::Performance,
					Priority::Medium,
					"Response is not compressed",
					"Enable gzip or brotli compression on the server",
				)
				.with_impact("Typically shrinks HTML transfer by 60-80%"),
			);
		}

		if !has_cache_control {
			score -= PENALTY_NO_CACHE_CONTROL;
			recommendations.push(Recommendation::new(
				EngineName::Performance,
				Priority::Low,
				"No Cache-Control header",
				"Send caching headers so repeat visits skip the network",
			));
		}

		let details = json!({
			"ttfb_ms": page.ttfb_ms,
			"load_time_ms": page.elapsed_ms,
			"transfer_bytes": page.body_bytes,
			"compressed": compressed,
			"content_encoding": page.content_encoding,
			"cache_control": page.cache_control,
		});

		Ok(EngineReport::new(score.max(0) as u8, recommendations).with_details(details))
	}
}

#[async_trait]
impl AnalysisEngine for PerformanceEngine {
	fn name(&self) -> EngineName {
		EngineName::Performance
	}

	fn description(&self) -> &str {
		"load-time, page-weight, compression, and caching checks"
	}

	async fn analyze(
		&self,
		url: &NormalizedUrl,
		config: &EngineRuntimeConfig,
		deadline: Duration,
	) -> EngineResult<EngineReport> {
		let timeout_ms = deadline.as_millis() as u64;
		tokio::time::timeout(deadline, self.run(url, config))
			.await
			.map_err(|_| EngineError::Timeout { timeout_ms })?
	}
}
