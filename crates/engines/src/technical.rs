//! Technical crawlability engine
//!
//! Checks the factors that gate a crawler's ability to reach and index the
//! page: HTTP status, robots.txt rules, sitemap presence, linked-resource
//! accessibility, and transport security.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use auditor_types::{
	AnalysisEngine, EngineError, EngineName, EngineReport, EngineResult, EngineRuntimeConfig,
	NormalizedUrl, Priority, Recommendation,
};

use crate::fetch::Fetcher;
use crate::html;

/// Score deductions, applied from a base of 100. The mapping is monotonic:
/// every failed check only ever lowers the score.
const PENALTY_HTTP_STATUS: u8 = 50;
const PENALTY_ROBOTS_BLOCKED: u8 = 20;
const PENALTY_NO_SITEMAP: u8 = 15;
const PENALTY_CSS_INACCESSIBLE: u8 = 10;
const PENALTY_JS_INACCESSIBLE: u8 = 5;

#[derive(Debug, Clone)]
pub struct TechnicalEngine {
	fetcher: Fetcher,
}

#[derive(Debug, Default)]
struct RobotsCheck {
	exists: bool,
	url_allowed: bool,
	sitemaps: Vec<String>,
}

#[derive(Debug, Default)]
struct ResourceCheck {
	css_found: bool,
	css_accessible: bool,
	js_found: bool,
	js_accessible: bool,
}

impl TechnicalEngine {
	pub fn new(fetcher: Fetcher) -> Self {
		Self { fetcher }
	}

	async fn run(
		&self,
		url: &NormalizedUrl,
		config: &EngineRuntimeConfig,
	) -> EngineResult<EngineReport> {
		let page = self.fetcher.get(url.as_str(), config).await?;
		let http_ok = page.status == 200;

		let robots = self.check_robots(url, config).await;
		let sitemap_found = self.check_sitemap(url, &robots.sitemaps, config).await;
		let resources = self.check_resources(url, &page.body, config).await;

		let mut score: i32 = 100;
		let mut recommendations = Vec::new();

		if !http_ok {
			score -= PENALTY_HTTP_STATUS as i32;
			recommendations.push(
				Recommendation::new(
					EngineName::Technical,
					Priority::High,
					format!("Page returns HTTP {}", page.status),
					"Make the page respond with HTTP 200 so crawlers can index it",
				)
				.with_impact("Blocks indexing entirely"),
			);
		}

		if robots.exists && !robots.url_allowed {
			score -= PENALTY_ROBOTS_BLOCKED as i32;
			recommendations.push(
				Recommendation::new(
					EngineName::Technical,
					Priority::High,
					"URL disallowed by robots.txt",
					"Remove the Disallow rule covering this path or move the page",
				)
				.with_impact("Crawlers will not fetch this page"),
			);
		} else if !robots.exists {
			recommendations.push(Recommendation::new(
				EngineName::Technical,
				Priority::Low,
				"No robots.txt found",
				"Add a robots.txt with a Sitemap declaration to guide crawlers",
			));
		}

		if !sitemap_found {
			score -= PENALTY_NO_SITEMAP as i32;
			recommendations.push(Recommendation::new(
				EngineName::Technical,
				Priority::Medium,
				"No XML sitemap discovered",
				"Publish a sitemap.xml and declare it in robots.txt",
			));
		}

		if resources.css_found && !resources.css_accessible {
			score -= PENALTY_CSS_INACCESSIBLE as i32;
			recommendations.push(Recommendation::new(
				EngineName::Technical,
				Priority::Medium,
				"Stylesheet is not accessible",
				"Ensure linked CSS files return HTTP 200; blocked CSS distorts rendering-based indexing",
			));
		}
		if resources.js_found && !resources.js_accessible {
			score -= PENALTY_JS_INACCESSIBLE as i32;
			recommendations.push(Recommendation::new(
				EngineName::Technical,
				Priority::Low,
				"Script is not accessible",
				"Ensure linked JavaScript files return HTTP 200",
			));
		}

		if !url.is_https() {
			recommendations.push(
				Recommendation::new(
					EngineName::Technical,
					Priority::High,
					"Page is not served over HTTPS",
					"Serve the site over TLS and redirect HTTP traffic",
				)
				.with_impact("HTTPS is a ranking signal and protects visitors"),
			);
		}

		if page.redirected {
			recommendations.push(Recommendation::new(
				EngineName::Technical,
				Priority::Low,
				"URL redirects before resolving",
				"Link the final URL directly to avoid redirect hops",
			));
		}

		let details = json!({
			"http_status": page.status,
			"final_url": page.final_url,
			"redirected": page.redirected,
			"https": url.is_https(),
			"robots_txt": {
				"exists": robots.exists,
				"url_allowed": robots.url_allowed,
				"sitemaps_declared": robots.sitemaps,
			},
			"sitemap_found": sitemap_found,
			"resources": {
				"css_found": resources.css_found,
				"css_accessible": resources.css_accessible,
				"js_found": resources.js_found,
				"js_accessible": resources.js_accessible,
			},
		});

		Ok(EngineReport::new(score.max(0) as u8, recommendations).with_details(details))
	}

	/// Fetch and evaluate robots.txt. An unreachable or missing robots.txt
	/// means the URL is treated as allowed.
	async fn check_robots(&self, url: &NormalizedUrl, config: &EngineRuntimeConfig) -> RobotsCheck {
		let robots_url = format!("{}/robots.txt", url.origin_str());
		match self.fetcher.get(&robots_url, config).await {
			Ok(page) if page.status == 200 => {
				let (url_allowed, sitemaps) = parse_robots(&page.body, url.path());
				RobotsCheck {
					exists: true,
					url_allowed,
					sitemaps,
				}
			},
			Ok(_) => RobotsCheck {
				exists: false,
				url_allowed: true,
				sitemaps: Vec::new(),
			},
			Err(e) => {
				debug!("robots.txt fetch failed for {}: {}", robots_url, e);
				RobotsCheck {
					exists: false,
					url_allowed: true,
					sitemaps: Vec::new(),
				}
			},
		}
	}

	/// Probe declared sitemaps first, then the conventional locations.
	async fn check_sitemap(
		&self,
		url: &NormalizedUrl,
		declared: &[String],
		config: &EngineRuntimeConfig,
	) -> bool {
		let origin = url.origin_str();
		let mut candidates: Vec<String> = declared.to_vec();
		candidates.push(format!("{}/sitemap.xml", origin));
		candidates.push(format!("{}/sitemap_index.xml", origin));

		for candidate in candidates {
			if let Ok(page) = self.fetcher.get(&candidate, config).await {
				if page.status == 200
					&& (page.body.contains("<urlset") || page.body.contains("<sitemapindex"))
				{
					return true;
				}
			}
		}
		false
	}

	/// Fetch the first linked stylesheet and script and record whether they
	/// resolve.
	async fn check_resources(
		&self,
		url: &NormalizedUrl,
		body: &str,
		config: &EngineRuntimeConfig,
	) -> ResourceCheck {
		let mut check = ResourceCheck::default();

		if let Some(href) = html::first_stylesheet_href(body) {
			check.css_found = true;
			check.css_accessible = self.resource_resolves(url, &href, config).await;
		}
		if let Some(src) = html::first_tag_attr_ci(body, "script", "src") {
			check.js_found = true;
			check.js_accessible = self.resource_resolves(url, &src, config).await;
		}

		check
	}

	async fn resource_resolves(
		&self,
		base: &NormalizedUrl,
		reference: &str,
		config: &EngineRuntimeConfig,
	) -> bool {
		let resolved = match base.url().join(reference) {
			Ok(resolved) => resolved,
			Err(_) => return false,
		};
		match self.fetcher.get(resolved.as_str(), config).await {
			Ok(page) => page.status == 200,
			Err(_) => false,
		}
	}
}

/// Minimal robots.txt evaluation: collect `Disallow` prefixes from the `*`
/// user-agent group and every `Sitemap:` declaration.
fn parse_robots(content: &str, path: &str) -> (bool, Vec<String>) {
	let mut sitemaps = Vec::new();
	let mut disallows: Vec<String> = Vec::new();
	let mut in_wildcard_group = false;

	for line in content.lines() {
		let line = line.split('#').next().unwrap_or("").trim();
		if line.is_empty() {
			continue;
		}
		let Some((field, value)) = line.split_once(':') else {
			continue;
		};
		let field = field.trim().to_ascii_lowercase();
		let value = value.trim();

		match field.as_str() {
			"user-agent" => in_wildcard_group = value == "*",
			"disallow" if in_wildcard_group && !value.is_empty() => {
				disallows.push(value.to_string());
			},
			"sitemap" => sitemaps.push(value.to_string()),
			_ => {},
		}
	}

	let allowed = !disallows.iter().any(|prefix| path.starts_with(prefix.as_str()));
	(allowed, sitemaps)
}

#[async_trait]
impl AnalysisEngine for TechnicalEngine {
	fn name(&self) -> EngineName {
		EngineName::Technical
	}

	fn description(&self) -> &str {
		"crawlability and indexability checks (status, robots.txt, sitemap, resources)"
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
	fn test_parse_robots_wildcard_disallow() {
		let robots = "User-agent: googlebot\nDisallow: /private\n\nUser-agent: *\nDisallow: /admin\nSitemap: https://example.com/sitemap.xml\n";

		let (allowed, sitemaps) = parse_robots(robots, "/admin/panel");
		assert!(!allowed);
		assert_eq!(sitemaps, vec!["https://example.com/sitemap.xml"]);

		let (allowed, _) = parse_robots(robots, "/blog");
		assert!(allowed);

		// The googlebot-only rule does not apply to the wildcard group.
		let (allowed, _) = parse_robots(robots, "/private/page");
		assert!(allowed);
	}

	#[test]
	fn test_parse_robots_empty_disallow_allows_everything() {
		let robots = "User-agent: *\nDisallow:\n";
		let (allowed, _) = parse_robots(robots, "/anything");
		assert!(allowed);
	}

	#[test]
	fn test_parse_robots_ignores_comments() {
		let robots = "User-agent: * # everyone\nDisallow: /tmp # scratch space\n";
		let (allowed, _) = parse_robots(robots, "/tmp/file");
		assert!(!allowed);
	}
}
