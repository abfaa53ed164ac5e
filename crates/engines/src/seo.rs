//! On-page SEO engine
//!
//! Checks the handful of on-page factors with the broadest ranking effect:
//! title tag, meta description, heading structure, URL shape, and content
//! volume. Deductions follow a fixed monotonic mapping from a base of 100.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use auditor_types::{
	AnalysisEngine, EngineError, EngineName, EngineReport, EngineResult, EngineRuntimeConfig,
	NormalizedUrl, Priority, Recommendation,
};

use crate::fetch::Fetcher;
use crate::html;

const TITLE_MIN: usize = 30;
const TITLE_MAX: usize = 60;
const DESCRIPTION_MIN: usize = 70;
const DESCRIPTION_MAX: usize = 160;
const MIN_CONTENT_WORDS: usize = 300;
const MAX_PATH_LEN: usize = 100;

const PENALTY_TITLE: i32 = 25;
const PENALTY_DESCRIPTION: i32 = 20;
const PENALTY_HEADINGS: i32 = 15;
const PENALTY_URL_SHAPE: i32 = 15;
const PENALTY_THIN_CONTENT: i32 = 25;

#[derive(Debug, Clone)]
pub struct SeoEngine {
	fetcher: Fetcher,
}

impl SeoEngine {
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

		let title = html::tag_inner_ci(&page.body, "title").unwrap_or_default();
		let description = html::meta_content_ci(&page.body, "description").unwrap_or_default();
		let h1_count = html::count_tag_ci(&page.body, "h1");
		let word_count = html::visible_word_count(&page.body);

		let title_ok = (TITLE_MIN..=TITLE_MAX).contains(&title.chars().count());
		let description_ok =
			(DESCRIPTION_MIN..=DESCRIPTION_MAX).contains(&description.chars().count());
		let headings_ok = h1_count == 1;
		let url_ok = url_shape_ok(url.path());
		let content_ok = word_count >= MIN_CONTENT_WORDS;

		let mut score: i32 = 100;
		let mut recommendations = Vec::new();

		if !title_ok {
			score -= PENALTY_TITLE;
			let (issue, detail) = if title.is_empty() {
				(
					"Missing title tag".to_string(),
					format!(
						"Add a descriptive title tag between {} and {} characters",
						TITLE_MIN, TITLE_MAX
					),
				)
			} else {
				(
					format!("Title tag is {} characters", title.chars().count()),
					format!(
						"Keep the title between {} and {} characters so it displays fully",
						TITLE_MIN, TITLE_MAX
					),
				)
			};
			recommendations.push(
				Recommendation::new(EngineName::Seo, Priority::High, issue, detail)
					.with_impact("The title tag is the strongest on-page relevance signal"),
			);
		}

		if !description_ok {
			score -= PENALTY_DESCRIPTION;
			let (issue, detail) = if description.is_empty() {
				(
					"Missing meta description".to_string(),
					format!(
						"Add a meta description between {} and {} characters",
						DESCRIPTION_MIN, DESCRIPTION_MAX
					),
				)
			} else {
				(
					format!(
						"Meta description is {} characters",
						description.chars().count()
					),
					format!(
						"Keep the description between {} and {} characters",
						DESCRIPTION_MIN, DESCRIPTION_MAX
					),
				)
			};
			recommendations.push(Recommendation::new(
				EngineName::Seo,
				Priority::Medium,
				issue,
				detail,
			));
		}

		if !headings_ok {
			score -= PENALTY_HEADINGS;
			let issue = if h1_count == 0 {
				"No H1 heading".to_string()
			} else {
				format!("{} H1 headings on one page", h1_count)
			};
			recommendations.push(Recommendation::new(
				EngineName::Seo,
				Priority::Medium,
				issue,
				"Use exactly one H1 that states the page topic",
			));
		}

		if !url_ok {
			score -= PENALTY_URL_SHAPE;
			recommendations.push(Recommendation::new(
				EngineName::Seo,
				Priority::Low,
				"URL path is not search-friendly",
				"Prefer short, lowercase, hyphen-separated paths",
			));
		}

		if !content_ok {
			score -= PENALTY_THIN_CONTENT;
			recommendations.push(
				Recommendation::new(
					EngineName::Seo,
					Priority::Medium,
					format!("Thin content ({} words)", word_count),
					format!(
						"Expand the page to at least {} words of substantive text",
						MIN_CONTENT_WORDS
					),
				)
				.with_impact("Thin pages rarely rank for competitive queries"),
			);
		}

		let details = json!({
			"title": title,
			"title_length": title.chars().count(),
			"meta_description_length": description.chars().count(),
			"h1_count": h1_count,
			"word_count": word_count,
			"url_path": url.path(),
		});

		Ok(EngineReport::new(score.max(0) as u8, recommendations).with_details(details))
	}
}

/// Short, lowercase, no underscores.
fn url_shape_ok(path: &str) -> bool {
	path.len() <= MAX_PATH_LEN
		&& !path.contains('_')
		&& !path.chars().any(|c| c.is_ascii_uppercase())
}

#[async_trait]
impl AnalysisEngine for SeoEngine {
	fn name(&self) -> EngineName {
		EngineName::Seo
	}

	fn description(&self) -> &str {
		"on-page SEO checks (title, meta description, headings, content)"
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
