use std::{cmp::Ordering, time::Duration};

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

use kspace_domain::{CandidateRecord, Payload, SourceKind, payload::map_from_json};

const MAX_NEIGHBORS: u32 = 100;
const WELL_KNOWN_KEYS: [&str; 4] = ["title", "description", "link", "datasource"];

/// Neighbors requested for a result budget of `top_k`: twice the budget, within `1..=100`.
pub fn neighbor_count(top_k: u32) -> u32 {
	top_k.saturating_mul(2).clamp(1, MAX_NEIGHBORS)
}

pub async fn search(
	cfg: &kspace_config::Vector,
	query: &str,
	top_k: u32,
) -> Result<Vec<CandidateRecord>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"query": query,
		"top_k": neighbor_count(top_k),
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_neighbors(&json, top_k as usize)
}

pub(crate) fn parse_neighbors(json: &Value, top_k: usize) -> Result<Vec<CandidateRecord>> {
	let neighbors = json
		.get("neighbors")
		.and_then(|v| v.as_array())
		.ok_or_else(|| eyre::eyre!("Vector response is missing neighbors array."))?;
	let mut out: Vec<CandidateRecord> = Vec::with_capacity(neighbors.len());

	for neighbor in neighbors {
		let metadata = neighbor.get("metadata").unwrap_or(neighbor);
		let similarity = neighbor
			.get("similarity")
			.or_else(|| neighbor.get("score"))
			.and_then(Value::as_f64)
			.or_else(|| neighbor.get("distance").and_then(Value::as_f64).map(|d| -d));
		let mut record = CandidateRecord::new(SourceKind::Vector, payload_from_metadata(metadata));

		record.source_score = similarity.map(|value| value as f32);
		record.external_id = crate::id_text(neighbor.get("id")).or_else(|| crate::id_text(metadata.get("id")));
		record.secondary_id =
			crate::id_text(neighbor.get("_id")).or_else(|| crate::id_text(metadata.get("_id")));

		out.push(record);
	}

	out.sort_by(|left, right| {
		right.score_or_zero().partial_cmp(&left.score_or_zero()).unwrap_or(Ordering::Equal)
	});
	out.truncate(top_k);

	Ok(out)
}

fn payload_from_metadata(metadata: &Value) -> Payload {
	let mut extra = match metadata {
		Value::Object(map) => map_from_json(map),
		_ => Default::default(),
	};

	for key in WELL_KNOWN_KEYS {
		extra.remove(key);
	}

	Payload {
		title: crate::dc_str(metadata, "title")
			.or_else(|| crate::first_str(metadata, &["title", "name"])),
		description: crate::first_str(metadata, &["chunk", "description"]),
		link: crate::first_str(metadata, &["primary_link", "url", "link", "identifier"])
			.or_else(|| crate::dc_str(metadata, "identifier")),
		datasource: crate::first_str(metadata, &["datasource", "source"]),
		extra,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn neighbor_count_is_bounded() {
		assert_eq!(neighbor_count(0), 1);
		assert_eq!(neighbor_count(30), 60);
		assert_eq!(neighbor_count(80), 100);
	}

	#[test]
	fn parses_neighbors_sorted_by_similarity() {
		let json = serde_json::json!({
			"neighbors": [
				{ "id": "a", "distance": 0.4, "metadata": { "name": "Far", "chunk": "text a" } },
				{ "id": "b", "similarity": 0.9, "metadata": {
					"dc": { "title": "Near", "identifier": "https://openneuro.org/datasets/ds000001" },
					"species": "human"
				} },
				{ "_id": "c", "score": 0.5, "metadata": { "title": "Middle" } }
			]
		});
		let records = parse_neighbors(&json, 2).expect("parse failed");

		assert_eq!(records.len(), 2);
		assert_eq!(records[0].external_id.as_deref(), Some("b"));
		assert_eq!(records[0].payload.title.as_deref(), Some("Near"));
		assert_eq!(
			records[0].payload.link.as_deref(),
			Some("https://openneuro.org/datasets/ds000001")
		);
		assert_eq!(records[1].external_id, None);
		assert_eq!(records[1].secondary_id.as_deref(), Some("c"));
	}

	#[test]
	fn missing_neighbors_is_an_error() {
		assert!(parse_neighbors(&serde_json::json!({}), 5).is_err());
	}
}
