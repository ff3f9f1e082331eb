use std::sync::mpsc;
use std::thread;

use crate::error::{ModelError, Result};
use super::language_model::LanguageModel;

pub use super::gram_counts::GramCounts;

/// Below this many windows per worker, automatic parallelism is not worth
/// the thread start-up cost.
const MIN_WINDOWS_PER_WORKER: usize = 64 * 1024;

/// Builds a [`LanguageModel`] from a raw corpus.
///
/// # Responsibilities
/// - Lower-case the corpus
/// - Count every contiguous window of `n` characters (whitespace and
///   punctuation included)
/// - Keep the `top_k` most frequent grams
/// - Normalize the retained counts into probabilities
///
/// # Invariants
/// - `n` is always >= 2
#[derive(Clone, Debug)]
pub struct ModelBuilder {
	/// Gram width in characters.
	n: usize,
	/// Maximum number of retained grams.
	top_k: usize,
	/// Number of counting workers, 0 = derived from the CPU count.
	threads: usize,
}

impl ModelBuilder {
	/// Creates a builder for grams of width `n`, retaining at most `top_k` of them.
	///
	/// # Errors
	/// Returns [`ModelError::InvalidOrder`] if `n < 2`.
	/// A `top_k` of 0 is rejected later by [`ModelBuilder::build`].
	pub fn new(n: usize, top_k: usize) -> Result<Self> {
		if n < 2 {
			return Err(ModelError::InvalidOrder { n });
		}
		Ok(Self { n, top_k, threads: 0 })
	}

	/// Sets the number of counting workers (0 = one per CPU).
	pub fn with_threads(mut self, threads: usize) -> Self {
		self.threads = threads;
		self
	}

	pub fn n(&self) -> usize {
		self.n
	}

	pub fn top_k(&self) -> usize {
		self.top_k
	}

	/// Lower-cases a corpus and splits it into characters.
	///
	/// This is the normalized form expected by [`ModelBuilder::count`].
	pub fn normalize(corpus: &str) -> Vec<char> {
		corpus.to_lowercase().chars().collect()
	}

	/// Builds the model.
	///
	/// # Errors
	/// - [`ModelError::InsufficientData`] if the lower-cased corpus has fewer
	///   than `n` characters.
	/// - [`ModelError::EmptyModel`] if `top_k` is 0.
	pub fn build(&self, corpus: &str) -> Result<LanguageModel> {
		let chars = Self::normalize(corpus);
		if chars.len() < self.n {
			return Err(ModelError::InsufficientData { required: self.n, actual: chars.len() });
		}
		if self.top_k == 0 {
			return Err(ModelError::EmptyModel);
		}

		let counts = self.count(&chars);
		let retained = counts.top(self.top_k);
		log::debug!(
			"counted {} windows of width {}: {} distinct, {} retained",
			counts.total_windows(),
			self.n,
			counts.distinct(),
			retained.len()
		);

		LanguageModel::from_counts(self.n, retained)
	}

	/// Counts all windows of width `n` in an already normalized corpus.
	///
	/// # Behavior
	/// - Splits the window start positions into one contiguous range per worker.
	/// - Spawns scoped threads counting their range into partial counts.
	/// - Merges partial counts as they arrive.
	///
	/// The result does not depend on the number of workers.
	pub fn count<'c>(&self, chars: &'c [char]) -> GramCounts<'c> {
		let n = self.n;
		if chars.len() < n {
			return GramCounts::new(n);
		}

		let windows = chars.len() - n + 1;
		let workers = self.workers(windows);
		if workers == 1 {
			return GramCounts::count_range(chars, n, 0..windows);
		}

		let chunk_size = windows.div_ceil(workers);
		let mut counts = GramCounts::new(n);
		thread::scope(|scope| {
			let (tx, rx) = mpsc::channel();
			for start in (0..windows).step_by(chunk_size) {
				let tx = tx.clone();
				let end = (start + chunk_size).min(windows);
				scope.spawn(move || {
					let partial = GramCounts::count_range(chars, n, start..end);
					if tx.send(partial).is_err() {
						log::warn!("count receiver dropped before windows {start}..{end} were merged");
					}
				});
			}
			drop(tx);

			for partial in rx.iter() {
				counts.merge(partial);
			}
		});

		counts
	}

	/// Resolves the number of workers for `windows` windows.
	fn workers(&self, windows: usize) -> usize {
		let requested = if self.threads == 0 {
			num_cpus::get().min(windows / MIN_WINDOWS_PER_WORKER)
		} else {
			self.threads
		};
		requested.clamp(1, windows.max(1))
	}
}
