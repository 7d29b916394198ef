//! Turns free-text keywords into exact-match filter searches over every source vocabulary.

use std::collections::HashSet;

use kspace_config::Config;
use kspace_domain::{CandidateRecord, StructuredFilter, fuzzy};
use kspace_providers::catalog::ENTITY_SEARCH_SIZE;

use crate::{SourceAdapter, vocabulary::Vocabulary};

/// Tuning for one scan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScanOptions {
	pub threshold: f32,
	pub max_matches: usize,
	/// Unique hits gathered before the scan stops.
	pub pool_cap: usize,
}
impl ScanOptions {
	pub fn from_config(cfg: &Config) -> Self {
		Self {
			threshold: cfg.fuzzy.threshold,
			max_matches: cfg.fuzzy.max_matches as usize,
			pool_cap: cfg.fuzzy.pool_cap.min(cfg.pipeline.retrieval_pool) as usize,
		}
	}
}

/// One filter per (source, field) whose vocabulary has a match for `token`, using the best
/// match as the filter value. Sources and fields keep vocabulary order.
pub fn plan_filters(
	token: &str,
	vocabulary: &Vocabulary,
	threshold: f32,
	max_matches: usize,
) -> Vec<StructuredFilter> {
	if token.trim().is_empty() {
		return Vec::new();
	}

	let mut filters = Vec::new();

	for source in &vocabulary.sources {
		for field in &source.fields {
			let matches = fuzzy::best_matches(token, &field.values, threshold, max_matches);

			if let Some(best) = matches.first() {
				filters.push(StructuredFilter {
					source_id: source.source_id.clone(),
					field_path: field.field_path.clone(),
					value: best.to_string(),
				});
			}
		}
	}

	filters
}

/// Runs one filtered search per planned filter. A failing (source, field) is logged and skipped.
pub async fn search_across_all_fields(
	adapter: &dyn SourceAdapter,
	cfg: &Config,
	token: &str,
	vocabulary: &Vocabulary,
	options: ScanOptions,
) -> Vec<CandidateRecord> {
	let mut out = Vec::new();

	for filter in plan_filters(token, vocabulary, options.threshold, options.max_matches) {
		match adapter.search(cfg, token, Some(&filter), ENTITY_SEARCH_SIZE).await {
			Ok(records) => out.extend(records),
			Err(err) => {
				tracing::warn!(
					source = %filter.source_id,
					field = %filter.field_path,
					error = %err,
					"Filtered source search failed."
				);
			},
		}
	}

	out
}

/// Scans keywords in order, unioning hits by canonical id until `pool_cap` unique hits are held.
pub async fn keyword_search(
	adapter: &dyn SourceAdapter,
	cfg: &Config,
	keywords: &[String],
	vocabulary: &Vocabulary,
	options: ScanOptions,
) -> Vec<CandidateRecord> {
	let mut out: Vec<CandidateRecord> = Vec::new();

	if options.pool_cap == 0 || vocabulary.is_empty() {
		return out;
	}

	let mut seen = HashSet::new();

	'keywords: for keyword in keywords {
		let keyword = keyword.trim();

		if keyword.is_empty() {
			continue;
		}

		let hits = search_across_all_fields(adapter, cfg, keyword, vocabulary, options).await;

		for hit in hits {
			if !seen.insert(hit.canonical_id(out.len())) {
				continue;
			}

			out.push(hit);

			if out.len() >= options.pool_cap {
				break 'keywords;
			}
		}
	}

	tracing::debug!(keywords = keywords.len(), hits = out.len(), "Keyword scan finished.");

	out
}
