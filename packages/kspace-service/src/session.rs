//! In-memory per-conversation pagination state.
//!
//! Every session id owns one async mutex inside a sharded map. Callers hold a [`SessionGuard`]
//! for the whole read, render and commit sequence, so concurrent requests for the same session
//! are serialized while other sessions proceed independently.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use kspace_domain::{FusedRecord, QueryIntent};

pub const HISTORY_SEPARATOR: &str = "\n\n";

/// Fused results and carried context from the most recent full retrieval.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionState {
	pub fused_results: Vec<FusedRecord>,
	/// Pages already served, at least one.
	pub cursor_page: usize,
	pub page_size: usize,
	pub canonical_query: String,
	pub intents: Vec<QueryIntent>,
	/// Rolling rendered output, bounded to the configured character budget.
	pub last_rendered_text: String,
}

#[derive(Debug, Default)]
pub struct SessionSlot {
	pub state: Option<SessionState>,
	pub chat_history: Vec<String>,
}

/// The next page of a stored result list, ready to render.
#[derive(Clone, Debug, PartialEq)]
pub struct PageSlice {
	pub records: Vec<FusedRecord>,
	/// Zero-based offset of the first record in the stored list.
	pub start: usize,
	pub page_size: usize,
	pub total: usize,
	pub canonical_query: String,
	pub intents: Vec<QueryIntent>,
	pub previous_text: String,
}
impl PageSlice {
	pub fn start_number(&self) -> usize {
		self.start + 1
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum Continuation {
	Page(PageSlice),
	NoMoreResults,
	NoPriorSession,
}

#[derive(Clone, Copy, Debug)]
pub struct SessionLimits {
	pub page_size: usize,
	pub history_chars: usize,
	pub chat_history_turns: usize,
}
impl SessionLimits {
	pub fn from_config(cfg: &kspace_config::Session) -> Self {
		Self {
			page_size: cfg.page_size as usize,
			history_chars: cfg.history_chars as usize,
			chat_history_turns: cfg.chat_history_turns as usize,
		}
	}
}

impl Default for SessionLimits {
	fn default() -> Self {
		Self { page_size: 15, history_chars: 12_000, chat_history_turns: 20 }
	}
}

pub struct SessionStore {
	sessions: DashMap<String, Arc<Mutex<SessionSlot>>>,
	limits: SessionLimits,
}
impl SessionStore {
	pub fn new(limits: SessionLimits) -> Self {
		Self { sessions: DashMap::new(), limits }
	}

	pub fn limits(&self) -> SessionLimits {
		self.limits
	}

	/// Locks the slot for `session_id`, creating an empty one on first use.
	pub async fn lock(&self, session_id: &str) -> SessionGuard {
		let slot = self.sessions.entry(session_id.to_string()).or_default().value().clone();

		SessionGuard { slot: slot.lock_owned().await, limits: self.limits }
	}

	/// Clears results and chat history. The slot itself stays registered so that requests
	/// already waiting on its lock observe the reset.
	pub async fn reset(&self, session_id: &str) {
		self.lock(session_id).await.reset();
	}

	pub fn session_count(&self) -> usize {
		self.sessions.len()
	}
}

impl Default for SessionStore {
	fn default() -> Self {
		Self::new(SessionLimits::default())
	}
}

pub struct SessionGuard {
	slot: OwnedMutexGuard<SessionSlot>,
	limits: SessionLimits,
}
impl SessionGuard {
	pub fn state(&self) -> Option<&SessionState> {
		self.slot.state.as_ref()
	}

	/// Computes the next page without mutating the session. A positive `requested` count
	/// replaces the stored page size.
	pub fn peek(&self, requested: Option<u32>) -> Continuation {
		let Some(state) = self.slot.state.as_ref() else { return Continuation::NoPriorSession };
		let page_size = requested
			.filter(|count| *count > 0)
			.map(|count| count as usize)
			.unwrap_or(state.page_size)
			.max(1);
		let total = state.fused_results.len();
		let start = state.cursor_page.saturating_mul(page_size);

		if start >= total {
			return Continuation::NoMoreResults;
		}

		let end = start.saturating_add(page_size).min(total);

		Continuation::Page(PageSlice {
			records: state.fused_results[start..end].to_vec(),
			start,
			page_size,
			total,
			canonical_query: state.canonical_query.clone(),
			intents: state.intents.clone(),
			previous_text: state.last_rendered_text.clone(),
		})
	}

	/// Records that `page` was served and rendered as `rendered`.
	pub fn commit(&mut self, page: &PageSlice, rendered: &str) {
		let history_chars = self.limits.history_chars;
		let Some(state) = self.slot.state.as_mut() else { return };

		state.cursor_page += 1;
		state.page_size = page.page_size;

		let mut combined = std::mem::take(&mut state.last_rendered_text);

		if !combined.is_empty() {
			combined.push_str(HISTORY_SEPARATOR);
		}

		combined.push_str(rendered);
		state.last_rendered_text = keep_last_chars(combined, history_chars);
	}

	/// Replaces the session with the results of a new query whose first page was rendered as
	/// `rendered`.
	pub fn store_fresh(
		&mut self,
		fused_results: Vec<FusedRecord>,
		canonical_query: String,
		intents: Vec<QueryIntent>,
		rendered: &str,
	) {
		self.slot.state = Some(SessionState {
			fused_results,
			cursor_page: 1,
			page_size: self.limits.page_size.max(1),
			canonical_query,
			intents,
			last_rendered_text: keep_last_chars(rendered.to_string(), self.limits.history_chars),
		});
	}

	/// Drops the stored results but keeps chat history.
	pub fn clear_results(&mut self) {
		self.slot.state = None;
	}

	pub fn reset(&mut self) {
		self.slot.state = None;
		self.slot.chat_history.clear();
	}

	pub fn push_exchange(&mut self, query: &str, response: &str) {
		let history = &mut self.slot.chat_history;

		history.push(format!("User: {query}"));
		history.push(format!("Assistant: {response}"));

		let overflow = history.len().saturating_sub(self.limits.chat_history_turns);

		history.drain(..overflow);
	}

	/// The most recent `lines` chat history entries, oldest first.
	pub fn recent_history(&self, lines: usize) -> Vec<String> {
		let history = &self.slot.chat_history;

		history[history.len().saturating_sub(lines)..].to_vec()
	}
}

fn keep_last_chars(text: String, max_chars: usize) -> String {
	let count = text.chars().count();

	if count <= max_chars {
		return text;
	}

	text.chars().skip(count - max_chars).collect()
}
