use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub catalog: Catalog,
	pub vector: Vector,
	pub providers: Providers,
	pub vocabulary: Vocabulary,
	#[serde(default)]
	pub fusion: Fusion,
	#[serde(default)]
	pub fuzzy: Fuzzy,
	#[serde(default)]
	pub session: Session,
	#[serde(default)]
	pub pipeline: Pipeline,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

/// Lexical catalog backend.
#[derive(Debug, Deserialize)]
pub struct Catalog {
	/// Base of the catalog REST API, e.g. "https://api.knowledge-space.org".
	pub api_base: String,
	/// Per-source entity search endpoint accepting an Elasticsearch-style body.
	pub entity_search_url: String,
	pub timeout_ms: u64,
	#[serde(default = "default_catalog_per_page")]
	pub per_page: u32,
	#[serde(default)]
	pub enrich_details: bool,
	#[serde(default = "default_enrich_top_k")]
	pub enrich_top_k: u32,
}

/// Dense nearest-neighbor backend.
#[derive(Debug, Deserialize)]
pub struct Vector {
	pub enabled: bool,
	pub api_base: String,
	pub path: String,
	pub api_key: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub understanding: LlmProviderConfig,
	pub synthesis: LlmProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Vocabulary {
	/// JSON file keyed by source id, each with `available_filters`.
	pub path: std::path::PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct Fusion {
	#[serde(default = "default_vector_weight")]
	pub vector_weight: f32,
	#[serde(default = "default_lexical_weight")]
	pub lexical_weight: f32,
}

#[derive(Debug, Deserialize)]
pub struct Fuzzy {
	#[serde(default = "default_fuzzy_threshold")]
	pub threshold: f32,
	#[serde(default = "default_fuzzy_max_matches")]
	pub max_matches: u32,
	/// Upper bound on unique hits gathered by the keyword scan.
	#[serde(default = "default_fuzzy_pool_cap")]
	pub pool_cap: u32,
}

#[derive(Debug, Deserialize)]
pub struct Session {
	#[serde(default = "default_page_size")]
	pub page_size: u32,
	/// Rolling rendered-text history, in characters.
	#[serde(default = "default_history_chars")]
	pub history_chars: u32,
	#[serde(default = "default_chat_history_turns")]
	pub chat_history_turns: u32,
	/// Chat lines handed to the understanding provider.
	#[serde(default = "default_history_window")]
	pub history_window: u32,
}

#[derive(Debug, Deserialize)]
pub struct Pipeline {
	/// Candidates requested from each backend per query.
	#[serde(default = "default_retrieval_pool")]
	pub retrieval_pool: u32,
	#[serde(default = "default_backend_timeout_ms")]
	pub backend_timeout_ms: u64,
	#[serde(default = "default_pipeline_timeout_ms")]
	pub pipeline_timeout_ms: u64,
}

impl Default for Fusion {
	fn default() -> Self {
		Self { vector_weight: default_vector_weight(), lexical_weight: default_lexical_weight() }
	}
}

impl Default for Fuzzy {
	fn default() -> Self {
		Self {
			threshold: default_fuzzy_threshold(),
			max_matches: default_fuzzy_max_matches(),
			pool_cap: default_fuzzy_pool_cap(),
		}
	}
}

impl Default for Session {
	fn default() -> Self {
		Self {
			page_size: default_page_size(),
			history_chars: default_history_chars(),
			chat_history_turns: default_chat_history_turns(),
			history_window: default_history_window(),
		}
	}
}

impl Default for Pipeline {
	fn default() -> Self {
		Self {
			retrieval_pool: default_retrieval_pool(),
			backend_timeout_ms: default_backend_timeout_ms(),
			pipeline_timeout_ms: default_pipeline_timeout_ms(),
		}
	}
}

fn default_catalog_per_page() -> u32 {
	50
}

fn default_enrich_top_k() -> u32 {
	10
}

fn default_vector_weight() -> f32 {
	0.6
}

fn default_lexical_weight() -> f32 {
	0.4
}

fn default_fuzzy_threshold() -> f32 {
	0.8
}

fn default_fuzzy_max_matches() -> u32 {
	5
}

fn default_fuzzy_pool_cap() -> u32 {
	50
}

fn default_page_size() -> u32 {
	15
}

fn default_history_chars() -> u32 {
	12_000
}

fn default_chat_history_turns() -> u32 {
	20
}

fn default_history_window() -> u32 {
	10
}

fn default_retrieval_pool() -> u32 {
	60
}

fn default_backend_timeout_ms() -> u64 {
	20_000
}

fn default_pipeline_timeout_ms() -> u64 {
	120_000
}
