use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single value in a record payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
	Text(String),
	Number(f64),
	List(Vec<String>),
	Map(BTreeMap<String, PayloadValue>),
}
impl PayloadValue {
	/// Converts backend JSON into a payload value. `null` has no representation and yields
	/// `None`; booleans become text; array items that are not strings are rendered as JSON text.
	pub fn from_json(value: &Value) -> Option<Self> {
		match value {
			Value::Null => None,
			Value::Bool(flag) => Some(Self::Text(flag.to_string())),
			Value::Number(number) => number.as_f64().map(Self::Number),
			Value::String(text) => Some(Self::Text(text.clone())),
			Value::Array(items) => Some(Self::List(
				items
					.iter()
					.filter_map(|item| match item {
						Value::Null => None,
						Value::String(text) => Some(text.clone()),
						other => Some(other.to_string()),
					})
					.collect(),
			)),
			Value::Object(map) => Some(Self::Map(map_from_json(map))),
		}
	}

	pub fn as_text(&self) -> Option<&str> {
		match self {
			Self::Text(text) => Some(text.as_str()),
			_ => None,
		}
	}

	pub fn as_map(&self) -> Option<&BTreeMap<String, PayloadValue>> {
		match self {
			Self::Map(map) => Some(map),
			_ => None,
		}
	}
}

/// Open record payload: well-known fields plus an overflow map for everything else.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub link: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub datasource: Option<String>,
	#[serde(flatten)]
	pub extra: BTreeMap<String, PayloadValue>,
}
impl Payload {
	pub fn with_extra(extra: BTreeMap<String, PayloadValue>) -> Self {
		Self { extra, ..Self::default() }
	}

	/// Overlays `other` onto `self`: every field present in `other` wins.
	pub fn merge_from(&mut self, other: Payload) {
		let Payload { title, description, link, datasource, extra } = other;

		if title.is_some() {
			self.title = title;
		}
		if description.is_some() {
			self.description = description;
		}
		if link.is_some() {
			self.link = link;
		}
		if datasource.is_some() {
			self.datasource = datasource;
		}

		self.extra.extend(extra);
	}

	pub fn get(&self, key: &str) -> Option<&PayloadValue> {
		self.extra.get(key)
	}

	pub fn insert(&mut self, key: impl Into<String>, value: PayloadValue) {
		self.extra.insert(key.into(), value);
	}
}

pub fn map_from_json(map: &Map<String, Value>) -> BTreeMap<String, PayloadValue> {
	let mut out = BTreeMap::new();

	for (key, value) in map {
		if let Some(value) = PayloadValue::from_json(value) {
			out.insert(key.clone(), value);
		}
	}

	out
}
