use std::collections::HashSet;

use kspace_domain::{CandidateRecord, Payload, SourceKind};
use kspace_service::{FUSION_ORDER, FusionWeights, SourceBatch, fusion::fuse};

fn candidate(kind: SourceKind, id: &str, score: f32) -> CandidateRecord {
	CandidateRecord::new(kind, Payload::default()).with_id(id).with_score(score)
}

fn titled(kind: SourceKind, id: &str, score: f32, title: &str) -> CandidateRecord {
	let mut record = candidate(kind, id, score);

	record.payload.title = Some(title.to_string());

	record
}

#[test]
fn weights_vector_and_lexical_scores_additively() {
	let fused = fuse(
		vec![
			SourceBatch::new(
				SourceKind::Vector,
				vec![
					candidate(SourceKind::Vector, "x", 0.9),
					candidate(SourceKind::Vector, "y", 0.9),
				],
			),
			SourceBatch::new(
				SourceKind::Lexical,
				vec![
					candidate(SourceKind::Lexical, "z", 1.0),
					candidate(SourceKind::Lexical, "x", 1.0),
				],
			),
		],
		FusionWeights::default(),
	);
	let ids: Vec<&str> = fused.iter().map(|record| record.id.as_str()).collect();

	assert_eq!(ids, vec!["x", "y", "z"]);
	assert!((fused[0].composite_score - 0.94).abs() < 1e-6);
	assert!((fused[1].composite_score - 0.54).abs() < 1e-6);
	assert!((fused[2].composite_score - 0.4).abs() < 1e-6);
	assert_eq!(
		fused[0].contributing_sources.iter().copied().collect::<Vec<_>>(),
		vec![SourceKind::Vector, SourceKind::Lexical]
	);
}

#[test]
fn output_ids_are_unique_and_missing_ids_are_synthesized() {
	let mut anonymous_vector = CandidateRecord::new(SourceKind::Vector, Payload::default());
	let mut secondary_only = CandidateRecord::new(SourceKind::Lexical, Payload::default());

	anonymous_vector.source_score = Some(0.5);
	secondary_only.secondary_id = Some("b".to_string());

	let fused = fuse(
		vec![
			SourceBatch::new(
				SourceKind::Vector,
				vec![candidate(SourceKind::Vector, "a", 0.2), anonymous_vector],
			),
			SourceBatch::new(
				SourceKind::Lexical,
				vec![
					candidate(SourceKind::Lexical, "a", 0.2),
					CandidateRecord::new(SourceKind::Lexical, Payload::default()),
					secondary_only,
					candidate(SourceKind::Lexical, "b", 0.5),
				],
			),
		],
		FusionWeights::default(),
	);
	let ids: HashSet<&str> = fused.iter().map(|record| record.id.as_str()).collect();

	assert_eq!(ids.len(), fused.len());
	assert_eq!(ids, HashSet::from(["a", "vector_1", "lexical_1", "b"]));
}

#[test]
fn fusion_is_deterministic_and_ties_keep_first_seen_order() {
	let batches = || {
		vec![
			SourceBatch::new(
				SourceKind::Vector,
				(0..10).map(|i| candidate(SourceKind::Vector, &format!("v{i}"), 0.5)).collect(),
			),
			SourceBatch::new(
				SourceKind::Lexical,
				(0..10).map(|i| candidate(SourceKind::Lexical, &format!("l{i}"), 0.5)).collect(),
			),
		]
	};
	let weights = FusionWeights { vector: 0.5, lexical: 0.5 };
	let first: Vec<String> =
		fuse(batches(), weights).into_iter().map(|record| record.id).collect();
	let second: Vec<String> =
		fuse(batches(), weights).into_iter().map(|record| record.id).collect();

	assert_eq!(first, second);
	assert_eq!(first[0], "v0");
	assert_eq!(first[9], "v9");
	assert_eq!(first[10], "l0");
}

#[test]
fn vector_batches_merge_before_lexical_regardless_of_input_order() {
	assert_eq!(FUSION_ORDER, [SourceKind::Vector, SourceKind::Lexical]);

	let fused = fuse(
		vec![
			SourceBatch::new(
				SourceKind::Lexical,
				vec![
					titled(SourceKind::Lexical, "shared", 0.0, "Catalog title"),
					titled(SourceKind::Lexical, "lex-only", 0.0, "Lexical"),
				],
			),
			SourceBatch::new(
				SourceKind::Vector,
				vec![
					titled(SourceKind::Vector, "vec-only", 0.0, "Vector"),
					titled(SourceKind::Vector, "shared", 0.0, "Vector title"),
				],
			),
		],
		FusionWeights::default(),
	);
	let ids: Vec<&str> = fused.iter().map(|record| record.id.as_str()).collect();

	assert_eq!(ids, vec!["vec-only", "shared", "lex-only"]);
	assert_eq!(fused[1].payload.title.as_deref(), Some("Catalog title"));
}

#[test]
fn configured_weights_are_applied() {
	let weights = FusionWeights { vector: 1.0, lexical: 0.0 };
	let fused = fuse(
		vec![
			SourceBatch::new(SourceKind::Lexical, vec![candidate(SourceKind::Lexical, "l", 1.0)]),
			SourceBatch::new(SourceKind::Vector, vec![candidate(SourceKind::Vector, "v", 0.1)]),
		],
		weights,
	);

	assert_eq!(fused[0].id, "v");
	assert_eq!(fused[1].composite_score, 0.0);
}
