use std::{future::Future, time::Duration};

use kspace_domain::{
	CandidateRecord, FusedRecord, QueryIntent, QueryUnderstanding, RenderRequest, SourceKind,
	intent::is_pure_greeting, render::NO_RESULTS_TEXT,
};

use crate::{
	DiscoveryService, Result,
	fusion::{self, FusionWeights, SourceBatch},
	fuzzy_scan::{self, ScanOptions},
	session::Continuation,
};

/// One rendered page of a stored result list.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedPage {
	/// Display number of the first record.
	pub start_number: usize,
	pub records: Vec<FusedRecord>,
	/// Size of the full stored result list.
	pub total: usize,
	pub text: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PipelineOutcome {
	/// The message was only a greeting; nothing was retrieved and the stored results were
	/// discarded.
	Greeting,
	Page(RenderedPage),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ContinueOutcome {
	Page(RenderedPage),
	NoMoreResults,
	NoPriorSession,
}

impl DiscoveryService {
	/// Understands `query`, retrieves and fuses results, renders the first page and replaces the
	/// session's stored results. The session is only written after rendering succeeds.
	pub async fn run_pipeline(&self, session_id: &str, query: &str) -> Result<PipelineOutcome> {
		let history = {
			let guard = self.sessions.lock(session_id).await;

			guard.recent_history(self.cfg.session.history_window as usize)
		};
		let understanding = self.understand(query, &history).await;

		if is_pure_greeting(&understanding.intents) {
			tracing::info!(session_id, "Greeting detected. Skipping retrieval.");

			self.sessions.lock(session_id).await.clear_results();

			return Ok(PipelineOutcome::Greeting);
		}

		let fused = self.retrieve(&understanding).await;
		let page_size = self.sessions.limits().page_size.max(1);
		let first_page = &fused[..page_size.min(fused.len())];
		let text = self
			.render(&understanding.canonical_query, &understanding.intents, 1, first_page, None)
			.await?;
		let page = RenderedPage {
			start_number: 1,
			records: first_page.to_vec(),
			total: fused.len(),
			text,
		};
		let mut guard = self.sessions.lock(session_id).await;

		guard.store_fresh(fused, understanding.canonical_query, understanding.intents, &page.text);

		Ok(PipelineOutcome::Page(page))
	}

	/// Serves the next page of the stored results without re-running retrieval. The session
	/// lock is held through rendering, and the cursor only advances once rendering succeeds.
	pub async fn continue_session(
		&self,
		session_id: &str,
		requested: Option<u32>,
	) -> Result<ContinueOutcome> {
		let mut guard = self.sessions.lock(session_id).await;
		let page = match guard.peek(requested) {
			Continuation::Page(page) => page,
			Continuation::NoMoreResults => return Ok(ContinueOutcome::NoMoreResults),
			Continuation::NoPriorSession => return Ok(ContinueOutcome::NoPriorSession),
		};
		let text = self
			.render(
				&page.canonical_query,
				&page.intents,
				page.start_number(),
				&page.records,
				Some(page.previous_text.as_str()),
			)
			.await?;

		guard.commit(&page, &text);

		Ok(ContinueOutcome::Page(RenderedPage {
			start_number: page.start_number(),
			records: page.records,
			total: page.total,
			text,
		}))
	}

	pub async fn reset_session(&self, session_id: &str) {
		self.sessions.reset(session_id).await;

		tracing::info!(session_id, "Session reset.");
	}

	/// Runs every enabled backend concurrently under the per-backend timeout and fuses the
	/// results. Backend failures degrade to empty candidate lists.
	pub async fn retrieve(&self, understanding: &QueryUnderstanding) -> Vec<FusedRecord> {
		let cfg = &self.cfg;
		let pool = cfg.pipeline.retrieval_pool;
		let budget = Duration::from_millis(cfg.pipeline.backend_timeout_ms);
		let query = understanding.canonical_query.as_str();
		let options = ScanOptions::from_config(cfg);
		let general =
			bounded("lexical", budget, self.providers.lexical.search(cfg, query, None, pool));
		let keyword = bounded("keyword_scan", budget, async {
			let hits = fuzzy_scan::keyword_search(
				self.providers.lexical.as_ref(),
				cfg,
				&understanding.keywords,
				&self.vocabulary,
				options,
			)
			.await;

			Ok::<_, color_eyre::Report>(hits)
		});
		let vector = async {
			if !cfg.vector.enabled {
				return Vec::new();
			}

			bounded("vector", budget, self.providers.vector.search(cfg, query, None, pool)).await
		};
		let (mut lexical, keyword, vector) = tokio::join!(general, keyword, vector);

		lexical.extend(keyword);

		let lexical_count = lexical.len();
		let vector_count = vector.len();
		let fused = fusion::fuse(
			vec![
				SourceBatch::new(SourceKind::Vector, vector),
				SourceBatch::new(SourceKind::Lexical, lexical),
			],
			FusionWeights::from_config(&cfg.fusion),
		);

		tracing::info!(
			lexical = lexical_count,
			vector = vector_count,
			fused = fused.len(),
			"Retrieval finished."
		);

		fused
	}

	async fn understand(&self, query: &str, history: &[String]) -> QueryUnderstanding {
		let cfg = &self.cfg.providers.understanding;

		match self.providers.understanding.understand(cfg, query, history).await {
			Ok(understanding) => understanding,
			Err(err) => {
				tracing::warn!(error = %err, "Query understanding failed. Using the raw query.");

				QueryUnderstanding::passthrough(query)
			},
		}
	}

	async fn render(
		&self,
		query: &str,
		intents: &[QueryIntent],
		start_number: usize,
		records: &[FusedRecord],
		previous_text: Option<&str>,
	) -> Result<String> {
		if records.is_empty() {
			return Ok(NO_RESULTS_TEXT.to_string());
		}

		let request = RenderRequest { query, intents, start_number, records, previous_text };
		let text =
			self.providers.synthesis.synthesize(&self.cfg.providers.synthesis, request).await?;

		Ok(text)
	}
}

async fn bounded<F>(backend: &'static str, budget: Duration, search: F) -> Vec<CandidateRecord>
where
	F: Future<Output = color_eyre::Result<Vec<CandidateRecord>>>,
{
	match tokio::time::timeout(budget, search).await {
		Ok(Ok(records)) => records,
		Ok(Err(err)) => {
			tracing::warn!(backend, error = %err, "Backend search failed.");

			Vec::new()
		},
		Err(_) => {
			tracing::warn!(
				backend,
				timeout_ms = budget.as_millis() as u64,
				"Backend search timed out."
			);

			Vec::new()
		},
	}
}
