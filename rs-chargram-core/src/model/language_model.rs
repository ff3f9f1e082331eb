use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use super::builder::ModelBuilder;

/// Accepted deviation of a probability vector sum from 1.0.
const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Serializable form of a model: the gram width and the retained
/// `(gram, probability)` pairs, most frequent first.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GramTable {
	pub n: usize,
	pub entries: Vec<(String, f64)>,
}

/// A character-level n-gram language model.
///
/// The model stores the retained grams (all exactly `n` characters long),
/// a parallel probability vector, and an index from each `(n-1)`-character
/// prefix to the grams that start with it.
///
/// # Responsibilities
/// - Expose the gram table and its probabilities
/// - Find the grams continuing a generation context
///
/// # Invariants
/// - `n` is always >= 2
/// - `grams`, `probabilities` and `next_chars` have the same, non-zero length
/// - Probabilities are strictly positive and sum to 1.0
/// - The model is never mutated after construction, so it can be shared
///   across threads without locking
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(try_from = "GramTable", into = "GramTable")]
pub struct LanguageModel {
	/// The order of the model (number of characters in a gram)
	n: usize,

	/// Retained grams, by descending frequency
	grams: Vec<String>,

	/// Probability of each gram, parallel to `grams`
	probabilities: Vec<f64>,

	/// Last character of each gram, parallel to `grams`
	next_chars: Vec<char>,

	/// Mapping from a prefix (length n-1) to the indices of the grams starting with it
	prefixes: HashMap<String, Vec<usize>>,
}

impl LanguageModel {
	/// Builds a model from a corpus, keeping the `top_k` most frequent grams of width `n`.
	///
	/// Shortcut for [`ModelBuilder::new`] followed by [`ModelBuilder::build`].
	pub fn build(corpus: &str, n: usize, top_k: usize) -> Result<Self> {
		ModelBuilder::new(n, top_k)?.build(corpus)
	}

	/// Creates a model from ranked `(gram, count)` pairs.
	///
	/// Probabilities are normalized over the retained counts only.
	pub(crate) fn from_counts(n: usize, ranked: Vec<(String, usize)>) -> Result<Self> {
		let total: usize = ranked.iter().map(|(_, count)| count).sum();
		if ranked.is_empty() || total == 0 {
			return Err(ModelError::EmptyModel);
		}

		let entries = ranked
			.into_iter()
			.map(|(gram, count)| (gram, count as f64 / total as f64))
			.collect();
		Self::from_table(GramTable { n, entries })
	}

	/// Creates a model from a gram table, validating it.
	///
	/// # Errors
	/// - [`ModelError::InvalidOrder`] if `n < 2`
	/// - [`ModelError::EmptyModel`] if the table has no entry
	/// - [`ModelError::CorruptedModel`] if a gram has the wrong width or is
	///   duplicated, or if the probabilities are not a distribution
	pub fn from_table(table: GramTable) -> Result<Self> {
		let GramTable { n, entries } = table;
		if n < 2 {
			return Err(ModelError::InvalidOrder { n });
		}
		if entries.is_empty() {
			return Err(ModelError::EmptyModel);
		}

		let mut grams = Vec::with_capacity(entries.len());
		let mut probabilities = Vec::with_capacity(entries.len());
		let mut next_chars = Vec::with_capacity(entries.len());
		let mut prefixes: HashMap<String, Vec<usize>> = HashMap::new();
		let mut seen = HashSet::with_capacity(entries.len());

		for (index, (gram, probability)) in entries.into_iter().enumerate() {
			let chars: Vec<char> = gram.chars().collect();
			let Some(&last) = chars.last().filter(|_| chars.len() == n) else {
				return Err(ModelError::corrupted(format!(
					"gram {gram:?} has {} characters, expected {n}",
					chars.len()
				)));
			};
			if !probability.is_finite() || probability <= 0.0 {
				return Err(ModelError::corrupted(format!(
					"gram {gram:?} has invalid probability {probability}"
				)));
			}
			if !seen.insert(gram.clone()) {
				return Err(ModelError::corrupted(format!("gram {gram:?} appears twice")));
			}

			prefixes.entry(chars[..n - 1].iter().collect()).or_default().push(index);
			grams.push(gram);
			probabilities.push(probability);
			next_chars.push(last);
		}

		let sum: f64 = probabilities.iter().sum();
		if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
			return Err(ModelError::corrupted(format!("probabilities sum to {sum}, expected 1.0")));
		}

		Ok(Self { n, grams, probabilities, next_chars, prefixes })
	}

	/// Returns the serializable gram table of this model.
	pub fn to_table(&self) -> GramTable {
		GramTable {
			n: self.n,
			entries: self.grams().map(|(gram, p)| (gram.to_owned(), p)).collect(),
		}
	}

	/// Width of the grams.
	pub fn n(&self) -> usize {
		self.n
	}

	/// Number of retained grams.
	pub fn len(&self) -> usize {
		self.grams.len()
	}

	/// Always false: a model holds at least one gram.
	pub fn is_empty(&self) -> bool {
		self.grams.is_empty()
	}

	/// Iterates over `(gram, probability)` pairs, most frequent first.
	pub fn grams(&self) -> impl Iterator<Item = (&str, f64)> {
		self.grams.iter().map(String::as_str).zip(self.probabilities.iter().copied())
	}

	/// Probability of `gram`, `None` if it was not retained.
	pub fn probability(&self, gram: &str) -> Option<f64> {
		let prefix: String = gram.chars().take(self.n - 1).collect();
		self.prefixes
			.get(&prefix)?
			.iter()
			.find(|&&index| self.grams[index] == gram)
			.map(|&index| self.probabilities[index])
	}

	/// Returns the generation context of `text`.
	///
	/// The context is the trailing `n - 1` characters of `text`, lower-cased
	/// to match the table. If `text` is shorter, the whole text is used.
	pub fn context(&self, text: &str) -> String {
		let width = self.n - 1;
		let lowered = last_n_chars(text, width).to_lowercase();
		// Lower-casing may expand a character into several
		last_n_chars(&lowered, width).to_owned()
	}

	/// Indices of the grams whose leading characters equal `context`,
	/// in table order.
	///
	/// # Notes
	/// - A full `(n-1)`-character context is resolved through the prefix index.
	/// - A shorter context matches every gram starting with it; an empty
	///   context matches the whole table.
	/// - A context longer than `n - 1` characters matches nothing.
	pub fn candidates(&self, context: &str) -> Cow<'_, [usize]> {
		let width = self.n - 1;
		let len = context.chars().count();
		if len == width {
			let indices = self.prefixes.get(context).map_or(&[][..], Vec::as_slice);
			return Cow::Borrowed(indices);
		}
		if len > width {
			return Cow::Borrowed(&[]);
		}

		Cow::Owned(
			self.grams
				.iter()
				.enumerate()
				.filter(|(_, gram)| gram.starts_with(context))
				.map(|(index, _)| index)
				.collect(),
		)
	}

	/// Probability of the gram at `index` in table order.
	pub(crate) fn probability_at(&self, index: usize) -> f64 {
		self.probabilities[index]
	}

	/// Last character of the gram at `index` in table order.
	pub(crate) fn next_char_at(&self, index: usize) -> char {
		self.next_chars[index]
	}
}

impl TryFrom<GramTable> for LanguageModel {
	type Error = ModelError;

	fn try_from(table: GramTable) -> Result<Self> {
		Self::from_table(table)
	}
}

impl From<LanguageModel> for GramTable {
	fn from(model: LanguageModel) -> Self {
		let LanguageModel { n, grams, probabilities, .. } = model;
		GramTable { n, entries: grams.into_iter().zip(probabilities).collect() }
	}
}

/// Returns the last `n` characters of a string (the whole string if shorter).
///
/// UTF-8 aware: counts characters, not bytes.
fn last_n_chars(s: &str, n: usize) -> &str {
	if n == 0 {
		return "";
	}
	match s.char_indices().rev().nth(n - 1) {
		Some((start, _)) => &s[start..],
		None => s,
	}
}
