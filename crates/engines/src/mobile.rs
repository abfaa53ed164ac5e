//! Mobile usability engine
//!
//! Static heuristics over the delivered markup: viewport configuration,
//! responsive-design signals, and legibility/tap-target approximations.
//! All signals are coarse; the scoring mapping from a base of 100 is
//! monotonic in each failed check.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use auditor_types::{
	AnalysisEngine, EngineError, EngineName, EngineReport, EngineResult, EngineRuntimeConfig,
	NormalizedUrl, Priority, Recommendation,
};

use crate::fetch::Fetcher;
use crate::html;

const PENALTY_NOT_MOBILE_FRIENDLY: i32 = 40;
const PENALTY_NOT_RESPONSIVE: i32 = 30;
const PENALTY_SMALL_TEXT: i32 = 20;
const PENALTY_NO_VIEWPORT: i32 = 10;

/// Inline widths at or above this many pixels suggest a fixed desktop layout.
const FIXED_WIDTH_PX: u32 = 600;
/// Font sizes below this many pixels are treated as illegible on mobile.
const MIN_FONT_PX: u32 = 12;

#[derive(Debug, Clone)]
pub struct MobileEngine {
	fetcher: Fetcher,
}

impl MobileEngine {
	pub fn new(fetcher: Fetcher) -> Self {
		Self { fetcher }
	}

	async fn run(
		&self,
		url: &NormalizedUrl,
		config: &EngineRuntimeConfig,
	) -> EngineResult<EngineReport> {
		let page = self.fetcher.get(url.as_str(), config).await?;
		if !page.is_success() {
			return Err(EngineError::HttpStatus {
				status_code: page.status,
			});
		}
		let body = &page.body;

		let viewport = html::meta_content_ci(body, "viewport");
		let viewport_configured = viewport
			.as_deref()
			.map(|v| v.to_ascii_lowercase().contains("width=device-width"))
			.unwrap_or(false);
		let responsive = has_responsive_signals(body);
		let fixed_width = has_fixed_width_layout(body);
		let small_text = has_small_font_sizes(body);
		let mobile_friendly = viewport_configured && !fixed_width;

		let mut score: i32 = 100;
		let mut recommendations = Vec::new();

		if !mobile_friendly {
			score -= PENALTY_NOT_MOBILE_FRIENDLY;
			recommendations.push(
				Recommendation::new(
					EngineName::Mobile,
					Priority::High,
					"Page is not mobile-friendly",
					"Configure a device-width viewport and drop fixed-width layout elements",
				)
				.with_impact("Mobile-first indexing evaluates the mobile rendering"),
			);
		}

		if !responsive {
			score -= PENALTY_NOT_RESPONSIVE;
			recommendations.push(Recommendation::new(
				EngineName::Mobile,
				Priority::Medium,
				"No responsive-design signals",
				"Use CSS media queries or responsive images (srcset) to adapt to screen size",
			));
		}

		if small_text {
			score -= PENALTY_SMALL_TEXT;
			recommendations.push(Recommendation::new(
				EngineName::Mobile,
				Priority::Medium,
				"Text too small to read on mobile",
				format!("Use font sizes of at least {}px for body text", MIN_FONT_PX),
			));
		}

		if !viewport_configured {
			score -= PENALTY_NO_VIEWPORT;
			recommendations.push(
				Recommendation::new(
					EngineName::Mobile,
					Priority::High,
					"Missing viewport meta tag",
					r#"Add <meta name="viewport" content="width=device-width, initial-scale=1">"#,
				)
				.with_impact("Without it, phones render the desktop layout zoomed out"),
			);
		}

		let details = json!({
			"viewport": viewport,
			"viewport_configured": viewport_configured,
			"responsive_signals": responsive,
			"fixed_width_layout": fixed_width,
			"small_font_sizes": small_text,
			"mobile_friendly": mobile_friendly,
		});

		Ok(EngineReport::new(score.max(0) as u8, recommendations).with_details(details))
	}
}

fn has_responsive_signals(body: &str) -> bool {
	let lc = body.to_ascii_lowercase();
	lc.contains("@media") || lc.contains("srcset=")
}

/// Scan inline `width` attributes and `width:` style declarations for large
/// pixel values.
fn has_fixed_width_layout(body: &str) -> bool {
	px_values(body, "width=\"")
		.chain(px_values(body, "width:"))
		.any(|px| px >= FIXED_WIDTH_PX)
}

fn has_small_font_sizes(body: &str) -> bool {
	px_values(body, "font-size:").any(|px| px > 0 && px < MIN_FONT_PX)
}

/// Pixel values following each occurrence of `needle` (e.g. `width:` or
/// `font-size:`). Non-pixel units are skipped.
fn px_values<'a>(body: &'a str, needle: &'a str) -> impl Iterator<Item = u32> + 'a {
	let lc = body.to_ascii_lowercase();
	let needle = needle.to_ascii_lowercase();
	let mut from = 0;
	std::iter::from_fn(move || {
		while let Some(idx) = lc[from..].find(&needle) {
			let at = from + idx + needle.len();
			from = at;
			let rest = lc[at..].trim_start();
			let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
			if digits.is_empty() {
				continue;
			}
			let after = &rest[digits.len()..];
			// `width="960"` carries an implicit pixel unit.
			let is_px = after.starts_with("px") || after.starts_with('"') || after.starts_with('\'');
			if is_px {
				if let Ok(px) = digits.parse() {
					return Some(px);
				}
			}
		}
		None
	})
}

#[async_trait]
impl AnalysisEngine for MobileEngine {
	fn name(&self) -> EngineName {
		EngineName::Mobile
	}

	fn description(&self) -> &str {
		"mobile usability checks (viewport, responsive signals, legibility)"
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

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_responsive_signals() {
		assert!(has_responsive_signals(
			"<style>@media (max-width: 600px) { body { margin: 0 } }</style>"
		));
		assert!(has_responsive_signals(r#"<img srcset="a.jpg 1x, b.jpg 2x">"#));
		assert!(!has_responsive_signals("<p>static page</p>"));
	}

	#[test]
	fn test_fixed_width_detection() {
		assert!(has_fixed_width_layout(r#"<table width="960">"#));
		assert!(has_fixed_width_layout(r#"<div style="width: 1200px">"#));
		assert!(!has_fixed_width_layout(r#"<div style="width: 100%">"#));
		assert!(!has_fixed_width_layout(r#"<img width="320">"#));
	}

	#[test]
	fn test_small_font_detection() {
		assert!(has_small_font_sizes(r#"<span style="font-size: 9px">tiny</span>"#));
		assert!(!has_small_font_sizes(r#"<span style="font-size: 16px">fine</span>"#));
		assert!(!has_small_font_sizes(r#"<span style="font-size: 1.2em">fine</span>"#));
	}
}
