use serde::{Deserialize, Serialize};

/// Exact-match filter on one field of one catalog source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredFilter {
	pub source_id: String,
	/// Concrete queryable path on the backend, e.g. `species.keyword`.
	pub field_path: String,
	pub value: String,
}
