use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode},
};
use serde_json::{Map, Value};
use tower::util::ServiceExt;

use kspace_api::{routes, state::AppState};
use kspace_config::{
	Catalog, Config, Fusion, Fuzzy, LlmProviderConfig, Pipeline, Providers as ProviderConfigs,
	Service, Session, Vector, Vocabulary as VocabularyConfig,
};
use kspace_domain::{
	CandidateRecord, Payload, QueryIntent, QueryUnderstanding, RenderRequest, SourceKind,
	StructuredFilter,
	render::{NO_PRIOR_SESSION_TEXT, NO_RESULTS_TEXT},
};
use kspace_service::{
	BoxFuture, DiscoveryService, Providers, SourceAdapter, SynthesisProvider,
	UnderstandingProvider, Vocabulary,
};

struct StubSource {
	records: Vec<CandidateRecord>,
}
impl SourceAdapter for StubSource {
	fn search<'a>(
		&'a self,
		_cfg: &'a Config,
		_query: &'a str,
		filter: Option<&'a StructuredFilter>,
		_limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<CandidateRecord>>> {
		let records = if filter.is_some() { Vec::new() } else { self.records.clone() };

		Box::pin(async move { Ok(records) })
	}
}

struct StubUnderstanding;
impl UnderstandingProvider for StubUnderstanding {
	fn understand<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		query: &'a str,
		_history: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<QueryUnderstanding>> {
		let understanding = QueryUnderstanding {
			canonical_query: query.to_string(),
			keywords: Vec::new(),
			intents: vec![QueryIntent::DataDiscovery],
		};

		Box::pin(async move { Ok(understanding) })
	}
}

struct RangeSynthesis {
	delay: Option<Duration>,
}
impl SynthesisProvider for RangeSynthesis {
	fn synthesize<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		request: RenderRequest<'a>,
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		let text = format!(
			"items {}-{}",
			request.start_number,
			request.start_number + request.records.len() - 1
		);

		Box::pin(async move {
			if let Some(delay) = self.delay {
				tokio::time::sleep(delay).await;
			}

			Ok(text)
		})
	}
}

fn llm_config() -> LlmProviderConfig {
	LlmProviderConfig {
		provider_id: "test".to_string(),
		api_base: "http://127.0.0.1:1".to_string(),
		api_key: "test-key".to_string(),
		path: "/chat/completions".to_string(),
		model: "test".to_string(),
		temperature: 0.0,
		timeout_ms: 1_000,
		default_headers: Map::new(),
	}
}

fn test_config(pipeline_timeout_ms: u64) -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		catalog: Catalog {
			api_base: "http://127.0.0.1:1".to_string(),
			entity_search_url: "http://127.0.0.1:1/entity".to_string(),
			timeout_ms: 1_000,
			per_page: 50,
			enrich_details: false,
			enrich_top_k: 0,
		},
		vector: Vector {
			enabled: false,
			api_base: "http://127.0.0.1:1".to_string(),
			path: "/neighbors".to_string(),
			api_key: String::new(),
			timeout_ms: 1_000,
			default_headers: Map::new(),
		},
		providers: ProviderConfigs { understanding: llm_config(), synthesis: llm_config() },
		vocabulary: VocabularyConfig { path: PathBuf::from("datasources_config.json") },
		fusion: Fusion::default(),
		fuzzy: Fuzzy::default(),
		session: Session::default(),
		pipeline: Pipeline { retrieval_pool: 60, backend_timeout_ms: 200, pipeline_timeout_ms },
	}
}

fn records(count: usize) -> Vec<CandidateRecord> {
	(0..count)
		.map(|i| {
			let payload = Payload { title: Some(format!("Dataset {i}")), ..Payload::default() };

			CandidateRecord::new(SourceKind::Lexical, payload)
				.with_id(format!("ds-{i:02}"))
				.with_score(1.0 - i as f32 / 100.0)
		})
		.collect()
}

fn app_with(count: usize, pipeline_timeout_ms: u64, synthesis_delay: Option<Duration>) -> Router {
	let providers = Providers::new(
		Arc::new(StubSource { records: records(count) }),
		Arc::new(StubSource { records: Vec::new() }),
		Arc::new(StubUnderstanding),
		Arc::new(RangeSynthesis { delay: synthesis_delay }),
	);
	let service = DiscoveryService::with_providers(
		test_config(pipeline_timeout_ms),
		Vocabulary::default(),
		providers,
	);

	routes::router(AppState::from_service(service))
}

fn app(count: usize) -> Router {
	app_with(count, 2_000, None)
}

async fn post_json(app: Router, uri: &str, payload: Value) -> (StatusCode, Value) {
	let response = app
		.oneshot(
			Request::builder()
				.method("POST")
				.uri(uri)
				.header("content-type", "application/json")
				.body(Body::from(payload.to_string()))
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call the router.");

	read_json(response).await
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
	let response = app
		.oneshot(Request::builder().uri(uri).body(Body::empty()).expect("Failed to build request."))
		.await
		.expect("Failed to call the router.");

	read_json(response).await
}

async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
	let status = response.status();
	let body = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");
	let json = serde_json::from_slice(&body).expect("Failed to parse response.");

	(status, json)
}

#[tokio::test]
async fn root_and_health_report_status() {
	let app = app(0);
	let (status, json) = get_json(app.clone(), "/").await;

	assert_eq!(status, StatusCode::OK);
	assert!(json["message"].as_str().is_some_and(|message| message.contains("running")));

	let (status, json) = get_json(app, "/api/health").await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["status"], "healthy");
	assert_eq!(json["components"]["vector_search"], "disabled");
	assert_eq!(json["components"]["llm"], "enabled");
	assert_eq!(json["components"]["keyword_search"], "enabled");
	assert_eq!(json["components"]["filter_vocabulary"], "disabled");
	assert!(json["timestamp"].as_str().is_some());
}

#[tokio::test]
async fn chat_pages_through_results_in_one_session() {
	let app = app(20);
	let (status, json) =
		post_json(app.clone(), "/api/chat", serde_json::json!({ "query": "mouse cortex" })).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["response"], "items 1-15");
	assert_eq!(json["metadata"]["session_id"], "default");
	assert_eq!(json["metadata"]["reset"], false);
	assert!(json["metadata"]["process_time"].as_f64().is_some());

	let (status, json) =
		post_json(app, "/api/chat", serde_json::json!({ "query": "show more" })).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["response"], "items 16-20");
}

#[tokio::test]
async fn continuation_in_new_session_asks_for_a_query() {
	let app = app(20);
	let (status, json) = post_json(
		app,
		"/api/chat",
		serde_json::json!({ "query": "more", "session_id": "fresh" }),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["response"], NO_PRIOR_SESSION_TEXT);
	assert_eq!(json["metadata"]["session_id"], "fresh");
}

#[tokio::test]
async fn empty_retrieval_returns_no_results_text() {
	let (status, json) =
		post_json(app(0), "/api/chat", serde_json::json!({ "query": "unicorn neurons" })).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["response"], NO_RESULTS_TEXT);
}

#[tokio::test]
async fn reset_clears_the_session() {
	let app = app(20);
	let (status, _) = post_json(
		app.clone(),
		"/api/chat",
		serde_json::json!({ "query": "mouse cortex", "session_id": "s1" }),
	)
	.await;

	assert_eq!(status, StatusCode::OK);

	let (status, json) =
		post_json(app.clone(), "/api/session/reset", serde_json::json!({ "session_id": "s1" }))
			.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["status"], "ok");
	assert_eq!(json["session_id"], "s1");

	let (_, json) = post_json(
		app.clone(),
		"/api/chat",
		serde_json::json!({ "query": "more", "session_id": "s1" }),
	)
	.await;

	assert_eq!(json["response"], NO_PRIOR_SESSION_TEXT);

	let (status, json) = post_json(app, "/api/session/reset", serde_json::json!({})).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["session_id"], "default");
}

#[tokio::test]
async fn blank_query_is_rejected() {
	let (status, json) =
		post_json(app(5), "/api/chat", serde_json::json!({ "query": "   " })).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "invalid_request");
}

#[tokio::test]
async fn slow_pipeline_returns_gateway_timeout() {
	let app = app_with(5, 100, Some(Duration::from_secs(5)));
	let (status, json) =
		post_json(app, "/api/chat", serde_json::json!({ "query": "mouse cortex" })).await;

	assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
	assert_eq!(json["error_code"], "timeout");
}
