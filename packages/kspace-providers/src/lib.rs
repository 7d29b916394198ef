pub mod catalog;
pub mod chat;
pub mod synthesis;
pub mod understanding;
pub mod vector;

use color_eyre::{Result, eyre};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName};
use serde_json::{Map, Value};

pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();
	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);
	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(eyre::eyre!("Default header values must be strings."));
		};
		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}
	Ok(headers)
}

/// First non-empty string found under any of `keys`, in order.
pub(crate) fn first_str(value: &Value, keys: &[&str]) -> Option<String> {
	keys.iter()
		.filter_map(|key| value.get(*key))
		.filter_map(Value::as_str)
		.map(str::trim)
		.find(|text| !text.is_empty())
		.map(str::to_string)
}

/// `dc.identifier` style lookup inside a nested Dublin Core object.
pub(crate) fn dc_str(value: &Value, key: &str) -> Option<String> {
	value
		.get("dc")
		.and_then(|dc| dc.get(key))
		.and_then(Value::as_str)
		.map(str::trim)
		.filter(|text| !text.is_empty())
		.map(str::to_string)
}

/// Backend ids arrive as strings or numbers; blank strings count as absent.
pub(crate) fn id_text(value: Option<&Value>) -> Option<String> {
	match value? {
		Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
		Value::Number(number) => Some(number.to_string()),
		_ => None,
	}
}
