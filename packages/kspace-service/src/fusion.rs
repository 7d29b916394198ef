//! Weighted merge of per-backend candidate lists into one ranked, deduplicated list.

use std::{
	cmp::Ordering,
	collections::{BTreeSet, HashMap},
};

use kspace_domain::{CandidateRecord, FusedRecord, SourceKind};

/// Backends are merged in this order; later backends overwrite earlier payload fields.
pub const FUSION_ORDER: [SourceKind; 2] = [SourceKind::Vector, SourceKind::Lexical];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FusionWeights {
	pub vector: f32,
	pub lexical: f32,
}
impl FusionWeights {
	pub fn from_config(cfg: &kspace_config::Fusion) -> Self {
		Self { vector: cfg.vector_weight, lexical: cfg.lexical_weight }
	}

	pub fn weight(&self, kind: SourceKind) -> f32 {
		match kind {
			SourceKind::Vector => self.vector,
			SourceKind::Lexical => self.lexical,
		}
	}
}

impl Default for FusionWeights {
	fn default() -> Self {
		Self { vector: 0.6, lexical: 0.4 }
	}
}

/// Candidates returned by one backend, in backend order.
#[derive(Clone, Debug)]
pub struct SourceBatch {
	pub kind: SourceKind,
	pub candidates: Vec<CandidateRecord>,
}
impl SourceBatch {
	pub fn new(kind: SourceKind, candidates: Vec<CandidateRecord>) -> Self {
		Self { kind, candidates }
	}
}

/// Merges batches into one record per canonical id, sorted by composite score descending.
///
/// Each backend contributes `weight * score` once per id, from its first occurrence of that id.
/// Negative and non-finite scores contribute nothing. Equal scores keep first-seen order.
pub fn fuse(batches: Vec<SourceBatch>, weights: FusionWeights) -> Vec<FusedRecord> {
	let mut by_kind: HashMap<SourceKind, Vec<CandidateRecord>> = HashMap::new();

	for batch in batches {
		by_kind.entry(batch.kind).or_default().extend(batch.candidates);
	}

	let mut fused: Vec<FusedRecord> = Vec::new();
	let mut index_by_id: HashMap<String, usize> = HashMap::new();

	for kind in FUSION_ORDER {
		let Some(candidates) = by_kind.remove(&kind) else { continue };
		let weight = weights.weight(kind);

		for (ordinal, candidate) in candidates.into_iter().enumerate() {
			let id = candidate.canonical_id(ordinal);
			let contribution = weight * candidate.score_or_zero().max(0.0);

			match index_by_id.get(&id) {
				Some(&index) => {
					let record = &mut fused[index];

					if record.contributing_sources.insert(kind) {
						record.composite_score += contribution;
					}

					record.payload.merge_from(candidate.payload);
				},
				None => {
					index_by_id.insert(id.clone(), fused.len());
					fused.push(FusedRecord {
						id,
						composite_score: contribution,
						contributing_sources: BTreeSet::from([kind]),
						payload: candidate.payload,
					});
				},
			}
		}
	}

	fused.sort_by(|left, right| cmp_f32_desc(left.composite_score, right.composite_score));

	fused
}

pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

#[cfg(test)]
mod tests {
	use kspace_domain::Payload;

	use super::*;

	fn candidate(kind: SourceKind, id: &str, score: f32) -> CandidateRecord {
		CandidateRecord::new(kind, Payload::default()).with_id(id).with_score(score)
	}

	#[test]
	fn repeated_id_within_one_backend_counts_once() {
		let fused = fuse(
			vec![SourceBatch::new(
				SourceKind::Lexical,
				vec![
					candidate(SourceKind::Lexical, "a", 1.0),
					candidate(SourceKind::Lexical, "a", 1.0),
				],
			)],
			FusionWeights::default(),
		);

		assert_eq!(fused.len(), 1);
		assert!((fused[0].composite_score - 0.4).abs() < 1e-6);
	}

	#[test]
	fn negative_scores_do_not_lower_the_composite() {
		let fused = fuse(
			vec![
				SourceBatch::new(SourceKind::Vector, vec![candidate(SourceKind::Vector, "a", -0.3)]),
				SourceBatch::new(SourceKind::Lexical, vec![candidate(SourceKind::Lexical, "a", 1.0)]),
			],
			FusionWeights::default(),
		);

		assert!((fused[0].composite_score - 0.4).abs() < 1e-6);
	}

	#[test]
	fn nan_sorts_last() {
		assert_eq!(cmp_f32_desc(f32::NAN, 0.1), Ordering::Greater);
		assert_eq!(cmp_f32_desc(0.9, 0.1), Ordering::Less);
	}
}
