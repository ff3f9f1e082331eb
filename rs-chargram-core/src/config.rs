use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::model::builder::ModelBuilder;

/// Model construction options.
///
/// Missing fields take their default value when deserialized.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct ModelConfig {
	/// Gram width in characters (>= 2). Larger values are more specific
	/// but sparser, so generation falls back more often.
	pub n: usize,

	/// Maximum number of retained grams.
	pub top_k: usize,

	/// Counting workers, 0 = one per CPU.
	pub threads: usize,
}

impl Default for ModelConfig {
	fn default() -> Self {
		Self { n: 5, top_k: 10_000, threads: 0 }
	}
}

impl ModelConfig {
	/// Checks the option ranges.
	///
	/// # Errors
	/// Returns [`ModelError::InvalidConfig`] if `n < 2` or `top_k == 0`.
	pub fn validate(&self) -> Result<()> {
		if self.n < 2 {
			return Err(ModelError::invalid_config(format!("n must be >= 2, got {}", self.n)));
		}
		if self.top_k == 0 {
			return Err(ModelError::invalid_config("top_k must be > 0"));
		}
		Ok(())
	}

	/// Creates a builder from these options.
	pub fn builder(&self) -> Result<ModelBuilder> {
		self.validate()?;
		Ok(ModelBuilder::new(self.n, self.top_k)?.with_threads(self.threads))
	}
}

/// Generation options.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct GenerationConfig {
	/// Number of characters to generate.
	pub length: usize,

	/// Seed of the random source; `None` draws one from the thread RNG.
	pub rng_seed: Option<u64>,
}

impl Default for GenerationConfig {
	fn default() -> Self {
		Self { length: 1000, rng_seed: None }
	}
}

impl GenerationConfig {
	/// Creates the random source for a generation run.
	///
	/// A fixed `rng_seed` makes the run reproducible.
	pub fn rng(&self) -> StdRng {
		match self.rng_seed {
			Some(seed) => StdRng::seed_from_u64(seed),
			None => StdRng::from_rng(&mut rand::rng()),
		}
	}
}

#[cfg(test)]
mod tests {
	use rand::Rng;

	use super::*;

	#[test]
	fn defaults() {
		let config = ModelConfig::default();
		assert_eq!((config.n, config.top_k, config.threads), (5, 10_000, 0));
		assert!(config.validate().is_ok());
		assert_eq!(GenerationConfig::default().length, 1000);
	}

	#[test]
	fn invalid_ranges_are_rejected() {
		let config = ModelConfig { n: 1, ..ModelConfig::default() };
		assert!(matches!(config.validate(), Err(ModelError::InvalidConfig { .. })));

		let config = ModelConfig { top_k: 0, ..ModelConfig::default() };
		assert!(matches!(config.builder(), Err(ModelError::InvalidConfig { .. })));
	}

	#[test]
	fn builder_carries_the_options() {
		let config = ModelConfig { n: 3, top_k: 7, threads: 2 };
		let builder = config.builder().unwrap();
		assert_eq!((builder.n(), builder.top_k()), (3, 7));
	}

	#[test]
	fn seeded_rng_is_reproducible() {
		let config = GenerationConfig { length: 10, rng_seed: Some(11) };
		let a: u64 = config.rng().random();
		let b: u64 = config.rng().random();
		assert_eq!(a, b);
	}
}
