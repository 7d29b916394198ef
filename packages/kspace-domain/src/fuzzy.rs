//! Approximate string matching for filter vocabularies.
//!
//! Similarity is the normalized Levenshtein ratio over lowercased characters:
//! `1 - distance / max(len_a, len_b)`. It is symmetric and lies in `[0, 1]`.

use std::cmp::Ordering;

pub const DEFAULT_THRESHOLD: f32 = 0.8;
pub const DEFAULT_MAX_MATCHES: usize = 5;

pub fn similarity(a: &str, b: &str) -> f32 {
	let a: Vec<char> = a.chars().flat_map(char::to_lowercase).collect();
	let b: Vec<char> = b.chars().flat_map(char::to_lowercase).collect();
	let max_len = a.len().max(b.len());

	if max_len == 0 {
		return 0.0;
	}
	if a == b {
		return 1.0;
	}

	let distance = levenshtein(&a, &b);

	1.0 - distance as f32 / max_len as f32
}

pub fn is_match(token: &str, candidate: &str, threshold: f32) -> bool {
	if token.trim().is_empty() || candidate.trim().is_empty() {
		return false;
	}

	similarity(token, candidate) >= threshold
}

/// Up to `max_matches` candidates scoring at least `threshold`, best first. Equal scores keep
/// vocabulary order.
pub fn best_matches<'a, S>(
	token: &str,
	candidates: &'a [S],
	threshold: f32,
	max_matches: usize,
) -> Vec<&'a str>
where
	S: AsRef<str>,
{
	if token.trim().is_empty() || max_matches == 0 {
		return Vec::new();
	}

	let mut scored: Vec<(&str, f32)> = Vec::new();

	for candidate in candidates {
		let candidate = candidate.as_ref();

		if candidate.trim().is_empty() {
			continue;
		}

		let ratio = similarity(token, candidate);

		if ratio >= threshold {
			scored.push((candidate, ratio));
		}
	}

	scored.sort_by(|left, right| right.1.partial_cmp(&left.1).unwrap_or(Ordering::Equal));
	scored.truncate(max_matches);

	scored.into_iter().map(|(candidate, _)| candidate).collect()
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
	let mut prev: Vec<usize> = (0..=b.len()).collect();
	let mut curr = vec![0_usize; b.len() + 1];

	for (i, left) in a.iter().enumerate() {
		curr[0] = i + 1;

		for (j, right) in b.iter().enumerate() {
			let cost = usize::from(left != right);

			curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
		}

		std::mem::swap(&mut prev, &mut curr);
	}

	prev[b.len()]
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn levenshtein_counts_edits() {
		let kitten: Vec<char> = "kitten".chars().collect();
		let sitting: Vec<char> = "sitting".chars().collect();

		assert_eq!(levenshtein(&kitten, &sitting), 3);
		assert_eq!(levenshtein(&[], &sitting), 7);
		assert_eq!(levenshtein(&kitten, &kitten), 0);
	}
}
