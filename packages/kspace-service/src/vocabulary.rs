//! Per-source filter vocabularies used by the fuzzy keyword scan.
//!
//! The file is a JSON object keyed by source id:
//! `{"<source>": {"description": "...", "available_filters": {"<name>": {"field": "<path>",
//! "values": [...]}}}}`. Malformed sources and fields are skipped with a warning.

use std::{fs, io::ErrorKind, path::Path};

use serde_json::Value;

use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq)]
pub struct FieldVocabulary {
	pub field_name: String,
	/// Concrete queryable path on the backend, e.g. `species.keyword`.
	pub field_path: String,
	/// Allowed values, in the order observed from the backend.
	pub values: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SourceVocabulary {
	pub source_id: String,
	pub description: Option<String>,
	pub fields: Vec<FieldVocabulary>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Vocabulary {
	pub sources: Vec<SourceVocabulary>,
}
impl Vocabulary {
	/// Loads the vocabulary file. A missing file yields an empty vocabulary, which disables the
	/// keyword scan.
	pub fn load(path: &Path) -> Result<Self> {
		let raw = match fs::read_to_string(path) {
			Ok(raw) => raw,
			Err(err) if err.kind() == ErrorKind::NotFound => {
				tracing::warn!(
					path = %path.display(),
					"Vocabulary file not found. Keyword scan is disabled."
				);

				return Ok(Self::default());
			},
			Err(err) => {
				return Err(Error::Vocabulary {
					message: format!("Failed to read {}: {err}", path.display()),
				});
			},
		};
		let json: Value = serde_json::from_str(&raw).map_err(|err| Error::Vocabulary {
			message: format!("Failed to parse {}: {err}", path.display()),
		})?;

		Self::from_json(&json)
	}

	pub fn from_json(json: &Value) -> Result<Self> {
		let Some(sources) = json.as_object() else {
			return Err(Error::Vocabulary {
				message: "Vocabulary root must be an object keyed by source id.".to_string(),
			});
		};
		let mut out = Vec::with_capacity(sources.len());

		for (source_id, config) in sources {
			match parse_source(source_id, config) {
				Some(source) => out.push(source),
				None => {
					tracing::warn!(source = %source_id, "Skipping malformed vocabulary source.");
				},
			}
		}

		Ok(Self { sources: out })
	}

	pub fn is_empty(&self) -> bool {
		self.sources.iter().all(|source| source.fields.is_empty())
	}
}

fn parse_source(source_id: &str, config: &Value) -> Option<SourceVocabulary> {
	let config = config.as_object()?;
	let filters = match config.get("available_filters") {
		None => return Some(empty_source(source_id, config.get("description"))),
		Some(filters) => filters.as_object()?,
	};
	let mut fields = Vec::with_capacity(filters.len());

	for (field_name, field) in filters {
		let path = field.get("field").and_then(Value::as_str).map(str::trim);
		let values = field.get("values").and_then(Value::as_array);
		let (Some(path), Some(values)) = (path.filter(|path| !path.is_empty()), values) else {
			tracing::warn!(
				source = %source_id,
				field = %field_name,
				"Skipping malformed vocabulary field."
			);

			continue;
		};

		fields.push(FieldVocabulary {
			field_name: field_name.clone(),
			field_path: path.to_string(),
			values: values.iter().filter_map(value_text).collect(),
		});
	}

	Some(SourceVocabulary {
		source_id: source_id.to_string(),
		description: config.get("description").and_then(Value::as_str).map(str::to_string),
		fields,
	})
}

fn empty_source(source_id: &str, description: Option<&Value>) -> SourceVocabulary {
	SourceVocabulary {
		source_id: source_id.to_string(),
		description: description.and_then(Value::as_str).map(str::to_string),
		fields: Vec::new(),
	}
}

fn value_text(value: &Value) -> Option<String> {
	match value {
		Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
		Value::Number(number) => Some(number.to_string()),
		_ => None,
	}
}
