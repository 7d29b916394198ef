use std::sync::LazyLock;

use regex::Regex;

const CONTINUATION_PHRASES: [&str; 6] =
	["more", "next", "continue", "more please", "show more", "keep going"];
const COUNTED_CONTINUATION: &str = r"^(?:next|more|show)\s+(\d{1,3})\b";

static COUNTED_CONTINUATION_RE: LazyLock<Option<Regex>> =
	LazyLock::new(|| Regex::new(COUNTED_CONTINUATION).ok());

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryKind {
	/// A request for another page of the stored results. `count` overrides the stored page size.
	Continuation { count: Option<u32> },
	Fresh,
}

/// Classifies a raw user message. Only the bare phrases and the `more N` / `next N` /
/// `show N` prefixes continue a session; any other text, including longer sentences that
/// mention "more", starts a new query. A count of zero is treated as no count.
pub fn classify(text: &str) -> QueryKind {
	let normalized = text.trim().to_lowercase();

	if normalized.is_empty() {
		return QueryKind::Fresh;
	}
	if CONTINUATION_PHRASES.contains(&normalized.as_str()) {
		return QueryKind::Continuation { count: None };
	}

	let Some(re) = COUNTED_CONTINUATION_RE.as_ref() else { return QueryKind::Fresh };
	let Some(captures) = re.captures(&normalized) else { return QueryKind::Fresh };
	let count = captures
		.get(1)
		.and_then(|digits| digits.as_str().parse::<u32>().ok())
		.filter(|count| *count > 0);

	QueryKind::Continuation { count }
}
