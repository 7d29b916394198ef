//! Lexical catalog backend: global dataset search, per-source filtered entity search and
//! dataset detail lookups.

use std::{sync::LazyLock, time::Duration};

use color_eyre::{Result, eyre};
use regex::Regex;
use reqwest::{Client, Url};
use serde_json::Value;

use kspace_domain::{
	CandidateRecord, Payload, PayloadValue, SourceKind, StructuredFilter, payload::map_from_json,
};

pub const DEFAULT_LINK: &str = "https://knowledge-space.org";
pub const ENTITY_SEARCH_SIZE: u32 = 20;

/// Display name to datasource id for every catalog source that exposes dataset details.
pub const DATASOURCES: [(&str, &str); 17] = [
	("Allen Brain Atlas Mouse Brain - Expression", "scr_002978_aba_expression"),
	("GENSAT", "scr_002721_gensat_geneexpression"),
	("NeuroMorpho", "scr_002145_neuromorpho_modelimage"),
	("Cell Image Library", "scr_003510_cil_images"),
	("Human Brain Atlas", "scr_006131_hba_atlas"),
	("IonChannelGenealogy", "scr_014194_icg_ionchannels"),
	("NeuroML Database", "scr_013705_neuroml_models"),
	("EBRAINS", "scr_017612_ebrains"),
	("ModelDB", "scr_007271_modeldb_models"),
	("Blue Brain Project Cell Morphology", "scr_014306_bbp_cellmorphology"),
	("OpenNEURO", "scr_005031_openneuro"),
	("DANDI Archive", "scr_017571_dandi"),
	("NeuronDB", "scr_003105_neurondb_currents"),
	("SPARC", "scr_017041_sparc"),
	("CONP Portal", "scr_016433_conp"),
	("NeuroElectro", "scr_006274_neuroelectro_ephys"),
	("Brain/MINDS", "scr_005069_brainminds"),
];

const LINK_PATTERNS: [(&str, &str); 6] = [
	(r"(?i)neuromorpho\.org.*neuron_id=(\d+)", "scr_002145_neuromorpho_modelimage"),
	(r"(?i)dandiarchive\.org/dandiset/(\d+)", "scr_017571_dandi"),
	(r"(?i)openneuro\.org/datasets/(ds\d+)", "scr_005031_openneuro"),
	(r"(?i)modeldb\.science/(\d+)", "scr_007271_modeldb_models"),
	(r"(?i)ebi\.ac\.uk/ebrains/.*?/([^/]+)$", "scr_017612_ebrains"),
	(r"(?i)sparc\.science/datasets/(\d+)", "scr_017041_sparc"),
];
const HOST_FALLBACKS: [(&str, &str); 6] = [
	("neuromorpho", "scr_002145_neuromorpho_modelimage"),
	("dandi", "scr_017571_dandi"),
	("openneuro", "scr_005031_openneuro"),
	("modeldb", "scr_007271_modeldb_models"),
	("ebrains", "scr_017612_ebrains"),
	("sparc", "scr_017041_sparc"),
];
const ENTITY_PATH: &str = r"(?i)/entity/source:([^/]+)/([^/?#]+)";

static LINK_RES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
	LINK_PATTERNS
		.iter()
		.filter_map(|(pattern, source_id)| Regex::new(pattern).ok().map(|re| (re, *source_id)))
		.collect()
});
static ENTITY_PATH_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(ENTITY_PATH).ok());
const WELL_KNOWN_KEYS: [&str; 4] = ["title", "description", "link", "datasource"];

/// A dataset located in a specific catalog source, as recovered from its link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetRef {
	pub source_id: String,
	/// Absent when only the hosting site could be recognized.
	pub dataset_id: Option<String>,
}

pub fn datasource_id(name: &str) -> Option<&'static str> {
	let name = name.trim();

	DATASOURCES.iter().find(|(known, _)| known.eq_ignore_ascii_case(name)).map(|(_, id)| *id)
}

pub fn datasource_name(id: &str) -> Option<&'static str> {
	DATASOURCES.iter().find(|(_, known)| *known == id).map(|(name, _)| *name)
}

/// Recovers the source and dataset id from a dataset link. Known URL shapes are tried first,
/// then catalog entity paths, then the link's hostname alone.
pub fn extract_dataset_ref(link: &str) -> Option<DatasetRef> {
	let link = link.trim();

	if link.is_empty() {
		return None;
	}

	for (re, source_id) in LINK_RES.iter() {
		if let Some(id) = re.captures(link).and_then(|captures| captures.get(1)) {
			return Some(DatasetRef {
				source_id: source_id.to_string(),
				dataset_id: Some(id.as_str().to_string()),
			});
		}
	}

	if let Some(re) = ENTITY_PATH_RE.as_ref()
		&& let Some(captures) = re.captures(link)
		&& let (Some(source), Some(id)) = (captures.get(1), captures.get(2))
		&& let Some((_, source_id)) =
			DATASOURCES.iter().find(|(_, known)| known.contains(source.as_str()))
	{
		return Some(DatasetRef {
			source_id: source_id.to_string(),
			dataset_id: Some(id.as_str().to_string()),
		});
	}

	let host = Url::parse(link).ok()?.host_str()?.to_lowercase();

	HOST_FALLBACKS.iter().find(|(marker, _)| host.contains(marker)).map(|(_, source_id)| {
		DatasetRef { source_id: source_id.to_string(), dataset_id: None }
	})
}

/// Builds the Elasticsearch-style body for a filtered per-source search.
pub fn entity_query_body(filter: &StructuredFilter, query: &str, size: u32) -> Value {
	let query = query.trim();
	let query = if query.is_empty() { "*" } else { query };

	serde_json::json!({
		"query": {
			"bool": {
				"must": { "query_string": { "query": query } },
				"filter": [
					{ "term": { (filter.field_path.clone()): filter.value.clone() } }
				]
			}
		},
		"size": size,
	})
}

pub async fn general_search(
	cfg: &kspace_config::Catalog,
	query: &str,
	top_k: u32,
) -> Result<Vec<CandidateRecord>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}/datasets/search", cfg.api_base);
	let per_page = top_k.saturating_mul(2).clamp(1, cfg.per_page);
	let res = client
		.get(url)
		.query(&[("q", query.to_string()), ("per_page", per_page.to_string())])
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	Ok(parse_general_search(&json, top_k as usize))
}

pub async fn source_search(
	cfg: &kspace_config::Catalog,
	filter: &StructuredFilter,
	query: &str,
	size: u32,
) -> Result<Vec<CandidateRecord>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let body = entity_query_body(filter, query, size);
	let res = client
		.get(&cfg.entity_search_url)
		.query(&[("body", body.to_string()), ("source", filter.source_id.clone())])
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_entity_hits(&json, &filter.source_id)
}

pub async fn dataset_details(
	cfg: &kspace_config::Catalog,
	source_id: &str,
	dataset_id: &str,
) -> Result<Value> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}/datasources/{source_id}/datasets/{dataset_id}", cfg.api_base);
	let res = client.get(url).send().await?;

	Ok(res.error_for_status()?.json().await?)
}

/// Attaches dataset details to the first `enrich_top_k` records whose link identifies a dataset.
/// Lookup failures leave the record as it was.
pub async fn enrich(cfg: &kspace_config::Catalog, records: &mut [CandidateRecord]) {
	let limit = (cfg.enrich_top_k as usize).min(records.len());

	for record in &mut records[..limit] {
		let Some(link) = record.payload.link.clone() else { continue };
		let Some(DatasetRef { source_id, dataset_id: Some(dataset_id) }) =
			extract_dataset_ref(&link)
		else {
			continue;
		};

		match dataset_details(cfg, &source_id, &dataset_id).await {
			Ok(Value::Object(details)) => {
				record.payload.insert("detailed_info", PayloadValue::Map(map_from_json(&details)));
				record.payload.insert("datasource_id", PayloadValue::Text(source_id.clone()));

				if let Some(name) = datasource_name(&source_id) {
					record.payload.insert("datasource_name", PayloadValue::Text(name.to_string()));
				}
			},
			Ok(_) => {
				tracing::warn!(
					source = %source_id,
					dataset = %dataset_id,
					"Dataset details are not an object."
				);
			},
			Err(err) => {
				tracing::warn!(
					source = %source_id,
					dataset = %dataset_id,
					error = %err,
					"Dataset detail lookup failed."
				);
			},
		}
	}
}

pub(crate) fn parse_general_search(json: &Value, top_k: usize) -> Vec<CandidateRecord> {
	let Some(items) = json.get("results").and_then(|v| v.as_array()) else { return Vec::new() };

	items
		.iter()
		.filter(|item| item.is_object())
		.take(top_k)
		.map(|item| {
			let mut record = CandidateRecord::new(SourceKind::Lexical, payload_from_source(item))
				.with_score(1.0);

			record.external_id = crate::id_text(item.get("id"));

			record
		})
		.collect()
}

pub(crate) fn parse_entity_hits(json: &Value, source_id: &str) -> Result<Vec<CandidateRecord>> {
	let root = match json {
		Value::Array(items) => items.first(),
		other => Some(other),
	};
	let Some(root) = root else { return Ok(Vec::new()) };
	let Some(hits) = root.get("hits").and_then(|hits| hits.get("hits")) else {
		return Err(eyre::eyre!("Entity search response is missing hits."));
	};
	let Some(hits) = hits.as_array() else {
		return Err(eyre::eyre!("Entity search hits must be an array."));
	};
	let mut out = Vec::with_capacity(hits.len());

	for hit in hits {
		let source = hit.get("_source").cloned().unwrap_or(Value::Object(Default::default()));
		let mut payload = payload_from_source(&source);

		if payload.datasource.is_none() {
			payload.datasource = Some(source_id.to_string());
		}

		let score = hit.get("_score").and_then(Value::as_f64).unwrap_or(1.0) as f32;
		let mut record = CandidateRecord::new(SourceKind::Lexical, payload).with_score(score);

		record.external_id = crate::id_text(hit.get("_id"));
		record.secondary_id = crate::id_text(source.get("id"));

		out.push(record);
	}

	Ok(out)
}

fn payload_from_source(source: &Value) -> Payload {
	let mut extra = match source {
		Value::Object(map) => map_from_json(map),
		_ => Default::default(),
	};

	for key in WELL_KNOWN_KEYS {
		extra.remove(key);
	}

	let link = crate::first_str(source, &["url", "link", "access_url", "identifier"])
		.or_else(|| crate::dc_str(source, "identifier"))
		.unwrap_or_else(|| DEFAULT_LINK.to_string());
	let datasource = crate::first_str(source, &["datasource", "source"])
		.or_else(|| extract_dataset_ref(&link).map(|found| found.source_id));

	Payload {
		title: crate::first_str(source, &["title", "name"])
			.or_else(|| crate::dc_str(source, "title")),
		description: crate::first_str(source, &["description", "abstract", "summary"]),
		link: Some(link),
		datasource,
		extra,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn every_link_pattern_compiles() {
		assert_eq!(LINK_RES.len(), LINK_PATTERNS.len());
		assert!(ENTITY_PATH_RE.is_some());
		assert_eq!(
			extract_dataset_ref("https://openneuro.org/datasets/ds000117"),
			Some(DatasetRef {
				source_id: "scr_005031_openneuro".to_string(),
				dataset_id: Some("ds000117".to_string()),
			})
		);
	}

	#[test]
	fn general_results_get_unit_score_and_fallback_fields() {
		let json = serde_json::json!({
			"results": [
				{ "id": 42, "name": "Rat CA1 recordings", "abstract": "Tetrode data.", "dc": { "identifier": "https://dandiarchive.org/dandiset/000042" } },
				{ "id": "ks-2", "title": "Mouse cortex", "url": "https://example.org/ds" },
				{ "id": "ks-3", "title": "Dropped by top_k" }
			]
		});
		let records = parse_general_search(&json, 2);

		assert_eq!(records.len(), 2);
		assert_eq!(records[0].external_id.as_deref(), Some("42"));
		assert_eq!(records[0].source_score, Some(1.0));
		assert_eq!(records[0].payload.title.as_deref(), Some("Rat CA1 recordings"));
		assert_eq!(records[0].payload.description.as_deref(), Some("Tetrode data."));
		assert_eq!(
			records[0].payload.link.as_deref(),
			Some("https://dandiarchive.org/dandiset/000042")
		);
		assert_eq!(records[0].payload.datasource.as_deref(), Some("scr_017571_dandi"));
		assert!(records[1].payload.get("title").is_none());
	}

	#[test]
	fn entity_hits_accept_list_wrapped_responses() {
		let json = serde_json::json!([
			{
				"hits": {
					"hits": [
						{ "_id": "e-1", "_score": 3.5, "_source": { "title": "EEG set", "species": ["human"] } },
						{ "_id": "e-2", "_source": { "id": "inner-2" } }
					]
				}
			}
		]);
		let records = parse_entity_hits(&json, "scr_005031_openneuro").expect("parse failed");

		assert_eq!(records.len(), 2);
		assert_eq!(records[0].external_id.as_deref(), Some("e-1"));
		assert_eq!(records[0].source_score, Some(3.5));
		assert_eq!(records[0].payload.datasource.as_deref(), Some("scr_005031_openneuro"));
		assert_eq!(records[0].payload.link.as_deref(), Some(DEFAULT_LINK));
		assert_eq!(records[1].source_score, Some(1.0));
		assert_eq!(records[1].secondary_id.as_deref(), Some("inner-2"));
	}

	#[test]
	fn entity_body_uses_wildcard_for_blank_query() {
		let filter = StructuredFilter {
			source_id: "scr_017571_dandi".to_string(),
			field_path: "species.keyword".to_string(),
			value: "Rat".to_string(),
		};
		let body = entity_query_body(&filter, "  ", ENTITY_SEARCH_SIZE);

		assert_eq!(body["query"]["bool"]["must"]["query_string"]["query"], "*");
		assert_eq!(body["query"]["bool"]["filter"][0]["term"]["species.keyword"], "Rat");
		assert_eq!(body["size"], 20);
	}
}
