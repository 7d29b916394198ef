use std::time::Instant;

use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use kspace_service::{DEFAULT_SESSION_ID, Error as ServiceError};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
	pub query: String,
	#[serde(default)]
	pub session_id: Option<String>,
	#[serde(default)]
	pub reset: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
	pub response: String,
	pub metadata: ChatMetadata,
}

#[derive(Debug, Serialize)]
pub struct ChatMetadata {
	/// Seconds spent handling the request.
	pub process_time: f64,
	pub session_id: String,
	pub timestamp: String,
	pub reset: bool,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
	#[serde(default)]
	pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
	pub status: &'static str,
	pub session_id: String,
	pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
	pub message: &'static str,
	pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
	pub status: &'static str,
	pub version: &'static str,
	pub components: HealthComponents,
	pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct HealthComponents {
	pub vector_search: &'static str,
	pub llm: &'static str,
	pub keyword_search: &'static str,
	/// Fuzzy filter scan over the source vocabularies; disabled when none were loaded.
	pub filter_vocabulary: &'static str,
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/", get(root))
		.route("/api/health", get(health))
		.route("/api/chat", post(chat))
		.route("/api/session/reset", post(reset_session))
		.with_state(state)
}

async fn root() -> Json<RootResponse> {
	Json(RootResponse {
		message: "KnowledgeSpace dataset discovery backend is running.",
		version: crate::VERSION,
	})
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
	let cfg = &state.service.cfg;
	let llm_enabled = !cfg.providers.understanding.api_key.trim().is_empty()
		&& !cfg.providers.synthesis.api_key.trim().is_empty();
	let components = HealthComponents {
		vector_search: enabled(cfg.vector.enabled),
		llm: enabled(llm_enabled),
		keyword_search: enabled(true),
		filter_vocabulary: enabled(!state.service.vocabulary.is_empty()),
	};

	Ok(Json(HealthResponse {
		status: "healthy",
		version: crate::VERSION,
		components,
		timestamp: now_rfc3339()?,
	}))
}

async fn chat(
	State(state): State<AppState>,
	Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
	let started = Instant::now();
	let session_id = session_id_or_default(payload.session_id.as_deref());
	let reset = payload.reset.unwrap_or(false);
	let reply = state.service.handle_chat(&session_id, &payload.query, reset).await?;

	Ok(Json(ChatResponse {
		response: reply.text,
		metadata: ChatMetadata {
			process_time: started.elapsed().as_secs_f64(),
			session_id: reply.session_id,
			timestamp: now_rfc3339()?,
			reset,
		},
	}))
}

async fn reset_session(
	State(state): State<AppState>,
	Json(payload): Json<ResetRequest>,
) -> Json<ResetResponse> {
	let session_id = session_id_or_default(payload.session_id.as_deref());

	state.service.reset_session(&session_id).await;

	Json(ResetResponse { status: "ok", session_id, message: "Session cleared" })
}

fn session_id_or_default(raw: Option<&str>) -> String {
	raw.map(str::trim).filter(|id| !id.is_empty()).unwrap_or(DEFAULT_SESSION_ID).to_string()
}

fn enabled(flag: bool) -> &'static str {
	if flag { "enabled" } else { "disabled" }
}

fn now_rfc3339() -> Result<String, ApiError> {
	OffsetDateTime::now_utc().format(&Rfc3339).map_err(|_| {
		json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", "Failed to format timestamp.")
	})
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}

pub fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
	ApiError::new(status, code, message)
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "invalid_request", message),
			ServiceError::Timeout { .. } => json_error(
				StatusCode::GATEWAY_TIMEOUT,
				"timeout",
				"Request timed out. Please try with a simpler query.",
			),
			ServiceError::Provider { message } => {
				tracing::error!(error = %message, "Provider failure while handling chat.");

				json_error(StatusCode::BAD_GATEWAY, "provider_error", message)
			},
			ServiceError::Vocabulary { message } =>
				json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", message),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
