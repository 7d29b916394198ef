use color_eyre::{Result, eyre};
use serde_json::Value;

use kspace_domain::{FusedRecord, RenderRequest};

const SYSTEM_PROMPT: &str = "You present neuroscience dataset search results. Number every \
dataset starting from the given start number, give its title as a Markdown link, the source, \
and a short description. Use only the facts provided. Do not invent datasets or links.";
/// Characters of earlier rendered output offered to the model for continuity.
const PREVIOUS_TEXT_TAIL: usize = 2_000;

pub async fn synthesize(
	cfg: &kspace_config::LlmProviderConfig,
	request: RenderRequest<'_>,
) -> Result<String> {
	let messages = build_messages(request);
	let text = crate::chat::complete(cfg, &messages, false).await?;

	if text.trim().is_empty() {
		return Err(eyre::eyre!("Synthesis response is empty."));
	}

	Ok(text)
}

pub(crate) fn build_messages(request: RenderRequest<'_>) -> Vec<Value> {
	let RenderRequest { query, intents, start_number, records, previous_text } = request;
	let mut user = format!("User query: {query}\n");
	let emphasis: Vec<&str> = intents.iter().filter_map(|intent| intent.emphasis()).collect();

	if !emphasis.is_empty() {
		user.push_str("\nEmphasis:\n");

		for line in emphasis {
			user.push_str("- ");
			user.push_str(line);
			user.push('\n');
		}
	}

	if let Some(previous) = previous_text.filter(|text| !text.trim().is_empty()) {
		let tail_start = previous
			.char_indices()
			.rev()
			.nth(PREVIOUS_TEXT_TAIL.saturating_sub(1))
			.map(|(index, _)| index)
			.unwrap_or(0);

		user.push_str("\nPreviously shown (do not repeat):\n");
		user.push_str(&previous[tail_start..]);
		user.push('\n');
	}

	user.push_str(&format!("\nNumber the datasets starting at {start_number}.\n\nDatasets:\n"));

	for (offset, record) in records.iter().enumerate() {
		user.push_str(&format!("{}. {}\n", start_number + offset, record_json(record)));
	}

	vec![
		serde_json::json!({ "role": "system", "content": SYSTEM_PROMPT }),
		serde_json::json!({ "role": "user", "content": user }),
	]
}

fn record_json(record: &FusedRecord) -> Value {
	serde_json::json!({
		"id": record.id,
		"score": record.composite_score,
		"payload": record.payload,
	})
}
