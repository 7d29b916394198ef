use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
	DataDiscovery,
	AccessDownload,
	MetadataQuery,
	QualityCheck,
	ToolingFormat,
	Institution,
	Greeting,
}
impl QueryIntent {
	pub const ALL: [QueryIntent; 7] = [
		Self::DataDiscovery,
		Self::AccessDownload,
		Self::MetadataQuery,
		Self::QualityCheck,
		Self::ToolingFormat,
		Self::Institution,
		Self::Greeting,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::DataDiscovery => "data_discovery",
			Self::AccessDownload => "access_download",
			Self::MetadataQuery => "metadata_query",
			Self::QualityCheck => "quality_check",
			Self::ToolingFormat => "tooling_format",
			Self::Institution => "institution",
			Self::Greeting => "greeting",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		let raw = raw.trim();

		Self::ALL.into_iter().find(|intent| intent.as_str().eq_ignore_ascii_case(raw))
	}

	/// Extra rendering emphasis associated with the intent, if any.
	pub fn emphasis(self) -> Option<&'static str> {
		match self {
			Self::AccessDownload =>
				Some("Focus on access methods, download links, APIs, and license information."),
			Self::MetadataQuery =>
				Some("Emphasize technical specs, preprocessing, collection methods, parameters."),
			Self::QualityCheck =>
				Some("Highlight sample sizes, completeness, QC metrics, known issues."),
			Self::ToolingFormat =>
				Some("Focus on file formats, tool compatibility, and pipelines."),
			Self::Institution =>
				Some("Highlight the institution/organization and collaborations."),
			Self::DataDiscovery | Self::Greeting => None,
		}
	}
}

/// Deduplicates in first-seen order and guarantees a non-empty result.
pub fn normalize_intents(intents: impl IntoIterator<Item = QueryIntent>) -> Vec<QueryIntent> {
	let mut out = Vec::new();

	for intent in intents {
		if !out.contains(&intent) {
			out.push(intent);
		}
	}

	if out.is_empty() {
		out.push(QueryIntent::DataDiscovery);
	}

	out
}

pub fn is_pure_greeting(intents: &[QueryIntent]) -> bool {
	!intents.is_empty() && intents.iter().all(|intent| *intent == QueryIntent::Greeting)
}

/// Output of the language-understanding collaborator for one user message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryUnderstanding {
	/// Self-contained rewrite of the message, used for retrieval and rendering.
	pub canonical_query: String,
	/// Verbatim keywords and phrases, deduplicated, case preserved, at most 20.
	pub keywords: Vec<String>,
	pub intents: Vec<QueryIntent>,
}
impl QueryUnderstanding {
	/// Understanding used when no collaborator output is available: the raw query, no keywords,
	/// discovery intent.
	pub fn passthrough(query: &str) -> Self {
		Self {
			canonical_query: query.trim().to_string(),
			keywords: Vec::new(),
			intents: vec![QueryIntent::DataDiscovery],
		}
	}
}
