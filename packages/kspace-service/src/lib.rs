pub mod chat;
pub mod fusion;
pub mod fuzzy_scan;
pub mod pipeline;
pub mod session;
pub mod vocabulary;

mod error;

pub use chat::{ChatReply, DEFAULT_SESSION_ID, ReplyKind};
pub use error::{Error, Result};
pub use fusion::{FUSION_ORDER, FusionWeights, SourceBatch};
pub use pipeline::{ContinueOutcome, PipelineOutcome, RenderedPage};
pub use session::{Continuation, PageSlice, SessionLimits, SessionState, SessionStore};
pub use vocabulary::Vocabulary;

use std::{future::Future, pin::Pin, sync::Arc};

use kspace_config::{Config, LlmProviderConfig};
use kspace_domain::{CandidateRecord, QueryUnderstanding, RenderRequest, StructuredFilter};
use kspace_providers::{catalog, synthesis, understanding, vector};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A retrieval backend. `filter` narrows a lexical search to one exact field value; backends
/// without structured filters ignore it. Empty results are not an error.
pub trait SourceAdapter
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		cfg: &'a Config,
		query: &'a str,
		filter: Option<&'a StructuredFilter>,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<CandidateRecord>>>;
}

pub trait UnderstandingProvider
where
	Self: Send + Sync,
{
	fn understand<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		query: &'a str,
		history: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<QueryUnderstanding>>;
}

pub trait SynthesisProvider
where
	Self: Send + Sync,
{
	fn synthesize<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		request: RenderRequest<'a>,
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

#[derive(Clone)]
pub struct Providers {
	pub lexical: Arc<dyn SourceAdapter>,
	pub vector: Arc<dyn SourceAdapter>,
	pub understanding: Arc<dyn UnderstandingProvider>,
	pub synthesis: Arc<dyn SynthesisProvider>,
}
impl Providers {
	pub fn new(
		lexical: Arc<dyn SourceAdapter>,
		vector: Arc<dyn SourceAdapter>,
		understanding: Arc<dyn UnderstandingProvider>,
		synthesis: Arc<dyn SynthesisProvider>,
	) -> Self {
		Self { lexical, vector, understanding, synthesis }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self {
			lexical: Arc::new(CatalogAdapter),
			vector: Arc::new(VectorAdapter),
			understanding: provider.clone(),
			synthesis: provider,
		}
	}
}

pub struct DiscoveryService {
	pub cfg: Config,
	pub providers: Providers,
	pub vocabulary: Vocabulary,
	pub sessions: SessionStore,
}
impl DiscoveryService {
	pub fn new(cfg: Config, vocabulary: Vocabulary) -> Self {
		Self::with_providers(cfg, vocabulary, Providers::default())
	}

	pub fn with_providers(cfg: Config, vocabulary: Vocabulary, providers: Providers) -> Self {
		let sessions = SessionStore::new(SessionLimits::from_config(&cfg.session));

		Self { cfg, providers, vocabulary, sessions }
	}
}

struct CatalogAdapter;

struct VectorAdapter;

struct DefaultProviders;

impl SourceAdapter for CatalogAdapter {
	fn search<'a>(
		&'a self,
		cfg: &'a Config,
		query: &'a str,
		filter: Option<&'a StructuredFilter>,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<CandidateRecord>>> {
		Box::pin(async move {
			if let Some(filter) = filter {
				return catalog::source_search(&cfg.catalog, filter, query, limit).await;
			}

			let mut records = catalog::general_search(&cfg.catalog, query, limit).await?;

			if cfg.catalog.enrich_details {
				catalog::enrich(&cfg.catalog, &mut records).await;
			}

			Ok(records)
		})
	}
}

impl SourceAdapter for VectorAdapter {
	fn search<'a>(
		&'a self,
		cfg: &'a Config,
		query: &'a str,
		_filter: Option<&'a StructuredFilter>,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<CandidateRecord>>> {
		Box::pin(vector::search(&cfg.vector, query, limit))
	}
}

impl UnderstandingProvider for DefaultProviders {
	fn understand<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		query: &'a str,
		history: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<QueryUnderstanding>> {
		Box::pin(understanding::understand(cfg, query, history))
	}
}

impl SynthesisProvider for DefaultProviders {
	fn synthesize<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		request: RenderRequest<'a>,
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(synthesis::synthesize(cfg, request))
	}
}
