//! Pure aggregation of per-engine outcomes into one result
//!
//! No I/O here: the only failure mode is an input-contract violation (a
//! success outcome without a score), which is a programming error upstream,
//! not a runtime condition to recover from.

use std::collections::{HashMap, HashSet};

use auditor_types::{AggregateResult, EngineName, EngineOutcome, Recommendation};

/// Merge per-engine outcomes into one [`AggregateResult`].
///
/// `overall_score` is the arithmetic mean of successful engines' scores
/// rounded to the nearest integer, absent when no engine succeeded.
/// Recommendations from successful engines are concatenated in
/// requested-engine order, deduplicated on exact `(issue, category)`
/// equality, stably sorted high-to-low priority, and capped.
pub fn aggregate(
	requested: &[EngineName],
	per_engine: HashMap<EngineName, EngineOutcome>,
	max_recommendations: usize,
) -> AggregateResult {
	debug_assert!(
		requested.iter().all(|e| per_engine.contains_key(e)),
		"per_engine must carry one outcome per requested engine"
	);

	let successes: Vec<&EngineOutcome> = requested
		.iter()
		.filter_map(|engine| per_engine.get(engine))
		.filter(|outcome| outcome.is_success())
		.collect();

	let overall_score = if successes.is_empty() {
		None
	} else {
		let sum: u32 = successes
			.iter()
			.map(|outcome| {
				u32::from(
					outcome
						.score
						.expect("success outcome carries a score by contract"),
				)
			})
			.sum();
		Some((sum as f64 / successes.len() as f64).round() as u8)
	};

	let mut seen: HashSet<(String, EngineName)> = HashSet::new();
	let mut recommendations: Vec<Recommendation> = Vec::new();
	for outcome in &successes {
		for recommendation in &outcome.recommendations {
			let key = (recommendation.issue.clone(), recommendation.category);
			if seen.insert(key) {
				recommendations.push(recommendation.clone());
			}
		}
	}
	// Stable: per-engine order is preserved within each priority band.
	recommendations.sort_by_key(|r| r.priority);
	recommendations.truncate(max_recommendations);

	let degraded = successes.len() < requested.len();

	AggregateResult {
		overall_score,
		per_engine,
		recommendations,
		degraded,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use auditor_types::{EngineReport, Priority};

	fn success(engine: EngineName, score: u8, recommendations: Vec<Recommendation>) -> EngineOutcome {
		EngineOutcome::success(engine, EngineReport::new(score, recommendations), 10)
	}

	fn rec(engine: EngineName, priority: Priority, issue: &str) -> Recommendation {
		Recommendation::new(engine, priority, issue, "fix it")
	}

	#[test]
	fn test_overall_score_is_rounded_mean() {
		let requested = [EngineName::Technical, EngineName::Seo];
		let mut per_engine = HashMap::new();
		per_engine.insert(EngineName::Technical, success(EngineName::Technical, 90, vec![]));
		per_engine.insert(EngineName::Seo, success(EngineName::Seo, 70, vec![]));

		let result = aggregate(&requested, per_engine, 50);
		assert_eq!(result.overall_score, Some(80));
		assert!(!result.degraded);
	}

	#[test]
	fn test_mean_rounds_to_nearest() {
		let requested = [EngineName::Technical, EngineName::Seo, EngineName::Mobile];
		let mut per_engine = HashMap::new();
		per_engine.insert(EngineName::Technical, success(EngineName::Technical, 50, vec![]));
		per_engine.insert(EngineName::Seo, success(EngineName::Seo, 50, vec![]));
		per_engine.insert(EngineName::Mobile, success(EngineName::Mobile, 51, vec![]));

		// 151 / 3 = 50.33 -> 50
		let result = aggregate(&requested, per_engine, 50);
		assert_eq!(result.overall_score, Some(50));
	}

	#[test]
	fn test_failures_excluded_from_mean_and_flag_degraded() {
		let requested = [EngineName::Technical, EngineName::Seo];
		let mut per_engine = HashMap::new();
		per_engine.insert(EngineName::Technical, success(EngineName::Technical, 90, vec![]));
		per_engine.insert(
			EngineName::Seo,
			EngineOutcome::timeout(EngineName::Seo, 5_000),
		);

		let result = aggregate(&requested, per_engine, 50);
		assert_eq!(result.overall_score, Some(90));
		assert!(result.degraded);
		assert_eq!(result.per_engine.len(), 2);
	}

	#[test]
	fn test_no_success_means_no_score() {
		let requested = [EngineName::Seo];
		let mut per_engine = HashMap::new();
		per_engine.insert(
			EngineName::Seo,
			EngineOutcome::failure(EngineName::Seo, "connection refused", 5),
		);

		let result = aggregate(&requested, per_engine, 50);
		assert_eq!(result.overall_score, None);
		assert!(result.degraded);
	}

	#[test]
	fn test_recommendations_sorted_by_priority_stably() {
		let requested = [EngineName::Technical, EngineName::Seo];
		let mut per_engine = HashMap::new();
		per_engine.insert(
			EngineName::Technical,
			success(
				EngineName::Technical,
				80,
				vec![
					rec(EngineName::Technical, Priority::Low, "tech-low"),
					rec(EngineName::Technical, Priority::High, "tech-high"),
				],
			),
		);
		per_engine.insert(
			EngineName::Seo,
			success(
				EngineName::Seo,
				80,
				vec![
					rec(EngineName::Seo, Priority::High, "seo-high"),
					rec(EngineName::Seo, Priority::Medium, "seo-medium"),
				],
			),
		);

		let result = aggregate(&requested, per_engine, 50);
		let issues: Vec<&str> = result.recommendations.iter().map(|r| r.issue.as_str()).collect();
		// High before medium before low; requested-engine order within a band.
		assert_eq!(issues, vec!["tech-high", "seo-high", "seo-medium", "tech-low"]);
	}

	#[test]
	fn test_dedup_is_per_issue_and_category() {
		let requested = [EngineName::Technical, EngineName::Seo];
		let mut per_engine = HashMap::new();
		per_engine.insert(
			EngineName::Technical,
			success(
				EngineName::Technical,
				80,
				vec![
					rec(EngineName::Technical, Priority::High, "duplicate"),
					rec(EngineName::Technical, Priority::High, "duplicate"),
				],
			),
		);
		// Same issue text from a different engine is a different finding.
		per_engine.insert(
			EngineName::Seo,
			success(
				EngineName::Seo,
				80,
				vec![rec(EngineName::Seo, Priority::High, "duplicate")],
			),
		);

		let result = aggregate(&requested, per_engine, 50);
		assert_eq!(result.recommendations.len(), 2);
	}

	#[test]
	fn test_recommendations_capped() {
		let requested = [EngineName::Seo];
		let recommendations = (0..10)
			.map(|i| rec(EngineName::Seo, Priority::Medium, &format!("issue-{}", i)))
			.collect();
		let mut per_engine = HashMap::new();
		per_engine.insert(EngineName::Seo, success(EngineName::Seo, 80, recommendations));

		let result = aggregate(&requested, per_engine, 3);
		assert_eq!(result.recommendations.len(), 3);
		assert_eq!(result.recommendations[0].issue, "issue-0");
	}

	#[test]
	fn test_failed_engine_recommendations_are_dropped() {
		let requested = [EngineName::Seo, EngineName::Mobile];
		let mut per_engine = HashMap::new();
		per_engine.insert(
			EngineName::Seo,
			success(
				EngineName::Seo,
				80,
				vec![rec(EngineName::Seo, Priority::High, "keep")],
			),
		);
		let mut failed = EngineOutcome::failure(EngineName::Mobile, "boom", 5);
		failed
			.recommendations
			.push(rec(EngineName::Mobile, Priority::High, "drop"));
		per_engine.insert(EngineName::Mobile, failed);

		let result = aggregate(&requested, per_engine, 50);
		assert_eq!(result.recommendations.len(), 1);
		assert_eq!(result.recommendations[0].issue, "keep");
	}
}
