use std::collections::HashMap;
use std::ops::Range;

/// Occurrence counts of every distinct n-character window of a corpus.
///
/// Windows are borrowed from the normalized corpus so counting does not
/// allocate one string per window. Grams only become owned `String`s once
/// they are selected by [`GramCounts::top`].
///
/// # Invariants
/// - Every key has exactly `n` characters
/// - Every count is strictly positive
/// - `total` is the sum of all counts
#[derive(Clone, Debug)]
pub struct GramCounts<'c> {
	/// Width of the counted windows.
	n: usize,
	/// Occurrences indexed by window content.
	windows: HashMap<&'c [char], usize>,
	/// Number of windows scanned.
	total: usize,
}

impl<'c> GramCounts<'c> {
	/// Creates empty counts for windows of width `n`.
	pub(crate) fn new(n: usize) -> Self {
		Self { n, windows: HashMap::new(), total: 0 }
	}

	/// Counts the windows of `chars` whose start position lies in `starts`.
	///
	/// A window starting at the last position of the range reads `n - 1`
	/// characters past it, so adjacent ranges never miss a window.
	/// The caller guarantees `starts.end + n - 1 <= chars.len()`.
	pub(crate) fn count_range(chars: &'c [char], n: usize, starts: Range<usize>) -> Self {
		let mut counts = Self::new(n);
		let end = starts.end + n - 1;
		if starts.start >= starts.end || end > chars.len() {
			return counts;
		}

		for window in chars[starts.start..end].windows(n) {
			*counts.windows.entry(window).or_insert(0) += 1;
			counts.total += 1;
		}
		counts
	}

	/// Merges partial counts into this one.
	///
	/// Occurrence counts of identical windows are summed.
	pub(crate) fn merge(&mut self, other: GramCounts<'c>) {
		debug_assert_eq!(self.n, other.n, "merging counts of different widths");
		for (window, occurrence) in other.windows {
			*self.windows.entry(window).or_insert(0) += occurrence;
		}
		self.total += other.total;
	}

	/// Width of the counted windows.
	pub fn n(&self) -> usize {
		self.n
	}

	/// Number of occurrences of `gram`, 0 if never seen.
	///
	/// The gram is matched as-is; pass lower-case text.
	pub fn count(&self, gram: &str) -> usize {
		let key: Vec<char> = gram.chars().collect();
		self.windows.get(key.as_slice()).copied().unwrap_or(0)
	}

	/// Number of distinct windows.
	pub fn distinct(&self) -> usize {
		self.windows.len()
	}

	/// Number of windows scanned (`len(corpus) - n + 1`).
	pub fn total_windows(&self) -> usize {
		self.total
	}

	/// Returns the `k` most frequent grams with their counts.
	///
	/// Ordered by descending count; equal counts are ordered
	/// lexicographically so the selection is stable across runs.
	pub fn top(&self, k: usize) -> Vec<(String, usize)> {
		let mut ranked: Vec<(&'c [char], usize)> =
			self.windows.iter().map(|(window, occurrence)| (*window, *occurrence)).collect();
		ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

		ranked
			.into_iter()
			.take(k)
			.map(|(window, occurrence)| (window.iter().collect(), occurrence))
			.collect()
	}
}
