use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::payload::Payload;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
	Vector,
	Lexical,
}
impl SourceKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Vector => "vector",
			Self::Lexical => "lexical",
		}
	}
}

impl std::fmt::Display for SourceKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One hit from one backend, before fusion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
	/// Primary backend-native identifier.
	pub external_id: Option<String>,
	/// Secondary backend-native identifier, consulted when the primary is absent.
	pub secondary_id: Option<String>,
	pub source_score: Option<f32>,
	pub source_kind: SourceKind,
	pub payload: Payload,
}
impl CandidateRecord {
	pub fn new(source_kind: SourceKind, payload: Payload) -> Self {
		Self { external_id: None, secondary_id: None, source_score: None, source_kind, payload }
	}

	pub fn with_id(mut self, id: impl Into<String>) -> Self {
		self.external_id = Some(id.into());

		self
	}

	pub fn with_score(mut self, score: f32) -> Self {
		self.source_score = Some(score);

		self
	}

	/// Reconciliation key: primary id, else secondary id, else `<kind>_<ordinal>` where
	/// `ordinal` is the record's position in its backend batch. Blank ids count as absent.
	pub fn canonical_id(&self, ordinal: usize) -> String {
		[self.external_id.as_deref(), self.secondary_id.as_deref()]
			.into_iter()
			.flatten()
			.map(str::trim)
			.find(|id| !id.is_empty())
			.map(str::to_string)
			.unwrap_or_else(|| format!("{}_{ordinal}", self.source_kind.as_str()))
	}

	pub fn score_or_zero(&self) -> f32 {
		self.source_score.filter(|score| score.is_finite()).unwrap_or(0.0)
	}
}

/// A record keyed into the merged corpus.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FusedRecord {
	pub id: String,
	pub composite_score: f32,
	pub contributing_sources: BTreeSet<SourceKind>,
	pub payload: Payload,
}
