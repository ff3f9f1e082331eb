use rand::Rng;

use super::language_model::LanguageModel;

/// Letters drawn from when no retained gram continues the context.
const FALLBACK_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Generates text one character at a time from a [`LanguageModel`].
///
/// The generator only borrows the model and holds no random state:
/// every call takes the random source explicitly, so a seeded RNG gives
/// reproducible output and concurrent callers each bring their own.
///
/// # Responsibilities
/// - Select the grams continuing the trailing `n - 1` characters of a text
/// - Sample one of them using their renormalized probabilities
/// - Fall back to a uniformly random letter when nothing matches
#[derive(Clone, Copy, Debug)]
pub struct Generator<'m> {
	model: &'m LanguageModel,
}

impl<'m> Generator<'m> {
	pub fn new(model: &'m LanguageModel) -> Self {
		Self { model }
	}

	pub fn model(&self) -> &'m LanguageModel {
		self.model
	}

	/// Picks the character following `text`.
	///
	/// # Behavior
	/// - The context is the lower-cased last `n - 1` characters of `text`
	///   (the whole text if shorter).
	/// - Matching grams are sampled proportionally to their probability.
	/// - With no matching gram, a letter of `a..=z` is drawn uniformly.
	pub fn next_char<R: Rng>(&self, text: &str, rng: &mut R) -> char {
		let context = self.model.context(text);
		match self.sample(&self.model.candidates(&context), rng) {
			Some(index) => self.model.next_char_at(index),
			None => {
				log::trace!("no gram continues {context:?}, drawing a random letter");
				fallback_letter(rng)
			}
		}
	}

	/// Appends the next character to `text` and returns it.
	pub fn step<R: Rng>(&self, text: &mut String, rng: &mut R) -> char {
		let c = self.next_char(text, rng);
		text.push(c);
		c
	}

	/// Extends `seed` by exactly `count` characters.
	///
	/// The seed is kept verbatim; the result has
	/// `seed.chars().count() + count` characters.
	pub fn generate<R: Rng>(&self, seed: &str, count: usize, rng: &mut R) -> String {
		let mut text = String::with_capacity(seed.len() + count);
		text.push_str(seed);
		for _ in 0..count {
			self.step(&mut text, rng);
		}
		text
	}

	/// Returns an endless iterator of characters generated after `seed`.
	///
	/// Bound it with `take`, or simply drop it to stop generating.
	pub fn stream<'r, R: Rng>(&self, seed: &str, rng: &'r mut R) -> Steps<'m, 'r, R> {
		Steps { generator: *self, text: seed.to_owned(), rng }
	}

	/// Samples a candidate index using renormalized probabilities.
	///
	/// This method performs:
	/// - an O(k) sum of the candidate probabilities
	/// - a cumulative subtraction to select a bucket
	///
	/// Returns `None` if there is no candidate.
	fn sample<R: Rng>(&self, candidates: &[usize], rng: &mut R) -> Option<usize> {
		let total: f64 = candidates.iter().map(|&index| self.model.probability_at(index)).sum();
		if total <= 0.0 {
			return None;
		}

		let mut r: f64 = rng.random();
		let mut fallback = None;
		for &index in candidates {
			let p = self.model.probability_at(index) / total;
			if r < p {
				return Some(index);
			}
			r -= p;
			fallback = Some(index);
		}

		// Rounding residue lands on the last candidate
		fallback
	}
}

/// Draws a letter of `a..=z` uniformly.
fn fallback_letter<R: Rng>(rng: &mut R) -> char {
	char::from(FALLBACK_ALPHABET[rng.random_range(0..FALLBACK_ALPHABET.len())])
}

/// Endless generation iterator returned by [`Generator::stream`].
///
/// Owns the growing text buffer and borrows the caller's random source.
pub struct Steps<'m, 'r, R> {
	generator: Generator<'m>,
	text: String,
	rng: &'r mut R,
}

impl<R> Steps<'_, '_, R> {
	/// The seed followed by everything generated so far.
	pub fn text(&self) -> &str {
		&self.text
	}

	pub fn into_text(self) -> String {
		self.text
	}
}

impl<R: Rng> Iterator for Steps<'_, '_, R> {
	type Item = char;

	fn next(&mut self) -> Option<char> {
		Some(self.generator.step(&mut self.text, &mut *self.rng))
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use rand::SeedableRng;
	use rand::rngs::StdRng;

	use super::*;

	fn pattern_model() -> LanguageModel {
		LanguageModel::build("aaaabaaaabaaaab", 2, 10).unwrap()
	}

	#[test]
	fn single_candidate_is_always_chosen() {
		let model = pattern_model();
		let generator = Generator::new(&model);

		for seed in 0..100 {
			let mut rng = StdRng::seed_from_u64(seed);
			assert_eq!(generator.next_char("b", &mut rng), 'a');
			assert_eq!(generator.next_char("aaab", &mut rng), 'a');
		}
	}

	#[test]
	fn unknown_context_falls_back_to_letters() {
		let model = pattern_model();
		let generator = Generator::new(&model);
		let mut rng = StdRng::seed_from_u64(7);

		let mut seen = HashSet::new();
		for _ in 0..2600 {
			let c = generator.next_char("z", &mut rng);
			assert!(c.is_ascii_lowercase(), "unexpected fallback {c:?}");
			seen.insert(c);
		}
		assert_eq!(seen.len(), 26);
	}

	#[test]
	fn candidates_are_renormalized() {
		// From "a": "aa" (9/14) and "ab" (3/14) renormalize to 0.75 / 0.25
		let model = pattern_model();
		let generator = Generator::new(&model);
		let mut rng = StdRng::seed_from_u64(42);

		let draws = 4000;
		let a = (0..draws).filter(|_| generator.next_char("a", &mut rng) == 'a').count();
		let ratio = a as f64 / draws as f64;
		assert!((0.72..0.78).contains(&ratio), "ratio = {ratio}");
	}

	#[test]
	fn lookup_is_case_insensitive() {
		let model = pattern_model();
		let generator = Generator::new(&model);
		let mut rng = StdRng::seed_from_u64(1);

		assert_eq!(generator.generate("B", 1, &mut rng), "Ba");
	}

	#[test]
	fn empty_seed_samples_the_whole_table() {
		let model = LanguageModel::build("xyz", 2, 10).unwrap();
		let generator = Generator::new(&model);

		for seed in 0..50 {
			let mut rng = StdRng::seed_from_u64(seed);
			let c = generator.next_char("", &mut rng);
			assert!(c == 'y' || c == 'z', "unexpected {c:?}");
		}
	}

	#[test]
	fn generate_appends_exactly_count_characters() {
		let model = LanguageModel::build("the quick brown fox jumps over the lazy dog", 3, 100).unwrap();
		let generator = Generator::new(&model);
		let mut rng = StdRng::seed_from_u64(3);

		let text = generator.generate("Thé", 250, &mut rng);
		assert_eq!(text.chars().count(), 3 + 250);
		assert!(text.starts_with("Thé"));

		assert_eq!(generator.generate("seed", 0, &mut rng), "seed");
		assert_eq!(generator.generate("", 5, &mut rng).chars().count(), 5);
	}

	#[test]
	fn seeded_generation_is_reproducible() {
		let model = LanguageModel::build("she sells sea shells by the sea shore", 3, 50).unwrap();
		let generator = Generator::new(&model);

		let first = generator.generate("s", 100, &mut StdRng::seed_from_u64(99));
		let second = generator.generate("s", 100, &mut StdRng::seed_from_u64(99));
		assert_eq!(first, second);
	}

	#[test]
	fn stream_matches_generate() {
		let model = LanguageModel::build("she sells sea shells by the sea shore", 3, 50).unwrap();
		let generator = Generator::new(&model);

		let generated = generator.generate("se", 40, &mut StdRng::seed_from_u64(5));

		let mut rng = StdRng::seed_from_u64(5);
		let mut steps = generator.stream("se", &mut rng);
		let streamed: String = steps.by_ref().take(40).collect();
		assert_eq!(format!("se{streamed}"), generated);
		assert_eq!(steps.text(), generated);
	}
}
