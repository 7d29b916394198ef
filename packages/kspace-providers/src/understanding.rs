use color_eyre::{Result, eyre};
use serde_json::Value;

use kspace_domain::{QueryIntent, QueryUnderstanding, intent::normalize_intents};

pub const MAX_KEYWORDS: usize = 20;
pub const MAX_INTENTS: usize = 6;

const SYSTEM_PROMPT: &str = "You analyze questions about neuroscience datasets. Return JSON only, \
with keys: canonical_query (a self-contained rewrite of the latest message using the \
conversation for context), keywords (verbatim terms and phrases from the message, case \
preserved, at most 20), intents (any of data_discovery, access_download, metadata_query, \
quality_check, tooling_format, institution, greeting).";

pub async fn understand(
	cfg: &kspace_config::LlmProviderConfig,
	query: &str,
	history: &[String],
) -> Result<QueryUnderstanding> {
	let messages = build_messages(query, history);
	let content = crate::chat::complete(cfg, &messages, true).await?;
	let json = crate::chat::parse_json_content(&content)?;

	parse_understanding(&json, query)
}

pub(crate) fn build_messages(query: &str, history: &[String]) -> Vec<Value> {
	let mut user = String::new();

	if !history.is_empty() {
		user.push_str("Conversation so far:\n");

		for line in history {
			user.push_str(line);
			user.push('\n');
		}

		user.push('\n');
	}

	user.push_str("Latest message: ");
	user.push_str(query);

	vec![
		serde_json::json!({ "role": "system", "content": SYSTEM_PROMPT }),
		serde_json::json!({ "role": "user", "content": user }),
	]
}

pub(crate) fn parse_understanding(json: &Value, query: &str) -> Result<QueryUnderstanding> {
	if !json.is_object() {
		return Err(eyre::eyre!("Understanding response must be a JSON object."));
	}

	let canonical_query = json
		.get("canonical_query")
		.and_then(Value::as_str)
		.map(str::trim)
		.filter(|text| !text.is_empty())
		.unwrap_or(query.trim())
		.to_string();
	let keywords = normalize_keywords(
		json.get("keywords")
			.and_then(Value::as_array)
			.into_iter()
			.flatten()
			.filter_map(Value::as_str),
	);
	let intents = json
		.get("intents")
		.and_then(Value::as_array)
		.into_iter()
		.flatten()
		.filter_map(Value::as_str)
		.filter_map(QueryIntent::parse);
	let mut intents = normalize_intents(intents);

	intents.truncate(MAX_INTENTS);

	Ok(QueryUnderstanding { canonical_query, keywords, intents })
}

/// Trims, drops `label:` prefixes, removes exact duplicates and caps the list.
pub fn normalize_keywords<'a>(raw: impl IntoIterator<Item = &'a str>) -> Vec<String> {
	let mut out: Vec<String> = Vec::new();

	for keyword in raw {
		let keyword = keyword.trim();
		let keyword = match keyword.split_once(':') {
			Some((label, rest))
				if !label.is_empty()
					&& !label.contains(char::is_whitespace)
					&& !rest.starts_with("//")
					&& !rest.trim().is_empty() =>
				rest.trim(),
			_ => keyword,
		};

		if keyword.is_empty() || out.iter().any(|seen| seen == keyword) {
			continue;
		}

		out.push(keyword.to_string());

		if out.len() == MAX_KEYWORDS {
			break;
		}
	}

	out
}
