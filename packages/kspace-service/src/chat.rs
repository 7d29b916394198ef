//! Conversation entry point: continuation detection, greeting replies and chat history.

use std::time::Duration;

use serde::Serialize;

use kspace_domain::{
	QueryKind, continuation,
	render::{END_OF_RESULTS_TEXT, GREETING_TEXT, NO_PRIOR_SESSION_TEXT},
};

use crate::{ContinueOutcome, DiscoveryService, Error, PipelineOutcome, Result};

pub const DEFAULT_SESSION_ID: &str = "default";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
	Greeting,
	Results,
	MoreResults,
	NoPriorSession,
	EndOfResults,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatReply {
	pub session_id: String,
	pub kind: ReplyKind,
	pub text: String,
}

impl DiscoveryService {
	/// Handles one user message for `session_id`, optionally resetting the session first. The
	/// whole exchange runs under the pipeline timeout.
	pub async fn handle_chat(
		&self,
		session_id: &str,
		query: &str,
		reset: bool,
	) -> Result<ChatReply> {
		let session_id = match session_id.trim() {
			"" => DEFAULT_SESSION_ID,
			trimmed => trimmed,
		};
		let query = query.trim();

		if query.is_empty() {
			return Err(Error::InvalidRequest { message: "query must be non-empty.".to_string() });
		}

		let timeout_ms = self.cfg.pipeline.pipeline_timeout_ms;

		tokio::time::timeout(
			Duration::from_millis(timeout_ms),
			self.handle_chat_inner(session_id, query, reset),
		)
		.await
		.map_err(|_| {
			tracing::warn!(session_id, timeout_ms, "Chat request timed out.");

			Error::Timeout { message: format!("Request exceeded {timeout_ms} ms.") }
		})?
	}

	async fn handle_chat_inner(
		&self,
		session_id: &str,
		query: &str,
		reset: bool,
	) -> Result<ChatReply> {
		if reset {
			self.reset_session(session_id).await;
		}

		let (kind, text) = match continuation::classify(query) {
			QueryKind::Continuation { count } =>
				match self.continue_session(session_id, count).await? {
					ContinueOutcome::Page(page) => (ReplyKind::MoreResults, page.text),
					ContinueOutcome::NoMoreResults => {
						return Ok(reply(session_id, ReplyKind::EndOfResults, END_OF_RESULTS_TEXT));
					},
					ContinueOutcome::NoPriorSession => {
						return Ok(reply(
							session_id,
							ReplyKind::NoPriorSession,
							NO_PRIOR_SESSION_TEXT,
						));
					},
				},
			QueryKind::Fresh => match self.run_pipeline(session_id, query).await? {
				PipelineOutcome::Greeting => (ReplyKind::Greeting, GREETING_TEXT.to_string()),
				PipelineOutcome::Page(page) => (ReplyKind::Results, page.text),
			},
		};

		self.sessions.lock(session_id).await.push_exchange(query, &text);

		Ok(ChatReply { session_id: session_id.to_string(), kind, text })
	}
}

fn reply(session_id: &str, kind: ReplyKind, text: &str) -> ChatReply {
	ChatReply { session_id: session_id.to_string(), kind, text: text.to_string() }
}
