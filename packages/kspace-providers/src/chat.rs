use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

/// Sends an OpenAI-compatible chat completion and returns the first choice's text.
pub async fn complete(
	cfg: &kspace_config::LlmProviderConfig,
	messages: &[Value],
	json_mode: bool,
) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let mut body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages,
	});

	if json_mode {
		body["response_format"] = serde_json::json!({ "type": "json_object" });
	}

	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_choice_content(&json)
}

pub(crate) fn parse_choice_content(json: &Value) -> Result<String> {
	json.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.map(|content| content.trim().to_string())
		.ok_or_else(|| eyre::eyre!("Chat response is missing choice content."))
}

/// Parses model output as JSON, tolerating a surrounding Markdown code fence.
pub(crate) fn parse_json_content(content: &str) -> Result<Value> {
	let trimmed = content.trim();
	let unfenced = trimmed
		.strip_prefix("```json")
		.or_else(|| trimmed.strip_prefix("```"))
		.and_then(|rest| rest.strip_suffix("```"))
		.unwrap_or(trimmed);

	serde_json::from_str(unfenced.trim())
		.map_err(|_| eyre::eyre!("Chat content is not valid JSON."))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_choice_content() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "  ### Datasets\n" } }
			]
		});

		assert_eq!(parse_choice_content(&json).expect("parse failed"), "### Datasets");
	}

	#[test]
	fn parses_fenced_json() {
		let parsed = parse_json_content("```json\n{\"keywords\": [\"EEG\"]}\n```")
			.expect("parse failed");

		assert_eq!(parsed["keywords"][0], "EEG");
	}
}
