use std::path::{Path, PathBuf};
use std::{fs, io};

use crate::config::ModelConfig;
use crate::error::Result;
use crate::model::language_model::{GramTable, LanguageModel};

/// Reads a whole text file as the training corpus.
pub fn read_corpus<P: AsRef<Path>>(path: P) -> Result<String> {
	Ok(fs::read_to_string(path)?)
}

/// Writes the gram table of `model` to `path` (postcard encoding).
pub fn save_model<P: AsRef<Path>>(model: &LanguageModel, path: P) -> Result<()> {
	let bytes = postcard::to_stdvec(&model.to_table())?;
	fs::write(path, bytes)?;
	Ok(())
}

/// Reads a model written by [`save_model`].
///
/// # Errors
/// Returns [`crate::ModelError::CorruptedModel`] if the decoded table is not
/// a valid model.
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<LanguageModel> {
	let bytes = fs::read(path)?;
	let table: GramTable = postcard::from_bytes(&bytes)?;
	LanguageModel::from_table(table)
}

/// Builds the cache path of a model built from `corpus_path`.
///
/// Example:
/// `data/input.txt`, n = 5, top_k = 100 → `data/input.5-100.bin`
pub fn cache_path<P: AsRef<Path>>(corpus_path: P, n: usize, top_k: usize) -> Result<PathBuf> {
	let corpus_path = corpus_path.as_ref();

	let parent = corpus_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = corpus_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Corpus path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(format!("{}.{n}-{top_k}.bin", file_stem.to_string_lossy()));
	Ok(output)
}

/// Loads the cached model of a corpus if it exists,
/// otherwise builds it from the corpus file and writes the cache.
///
/// An unreadable or mismatching cache is rebuilt.
pub fn load_or_build<P: AsRef<Path>>(corpus_path: P, config: &ModelConfig) -> Result<LanguageModel> {
	config.validate()?;
	let cache = cache_path(&corpus_path, config.n, config.top_k)?;

	if cache.exists() {
		match load_model(&cache) {
			Ok(model) if model.n() == config.n && model.len() <= config.top_k => {
				log::info!("loaded cached model from {}", cache.display());
				return Ok(model);
			}
			Ok(_) => log::warn!("cached model {} does not match the configuration, rebuilding", cache.display()),
			Err(e) => log::warn!("ignoring unreadable cache {}: {e}", cache.display()),
		}
	}

	let corpus = read_corpus(&corpus_path)?;
	let model = config.builder()?.build(&corpus)?;
	save_model(&model, &cache)?;
	log::info!("wrote model cache to {}", cache.display());

	Ok(model)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ModelError;

	#[test]
	fn cache_path_keeps_the_folder() {
		let path = cache_path("data/input.txt", 5, 100).unwrap();
		assert_eq!(path, Path::new("data").join("input.5-100.bin"));
		assert!(cache_path("/", 5, 100).is_err());
	}

	#[test]
	fn saved_model_loads_back() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("model.bin");
		let model = LanguageModel::build("abracadabra", 3, 4).unwrap();

		save_model(&model, &path).unwrap();
		let loaded = load_model(&path).unwrap();

		assert_eq!(loaded.to_table(), model.to_table());
	}

	#[test]
	fn corrupted_tables_are_reported() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("model.bin");
		let table = GramTable { n: 3, entries: vec![("ab".to_owned(), 1.0)] };
		fs::write(&path, postcard::to_stdvec(&table).unwrap()).unwrap();

		assert!(matches!(load_model(&path), Err(ModelError::CorruptedModel { .. })));
	}

	#[test]
	fn missing_corpus_is_an_io_error() {
		let dir = tempfile::tempdir().unwrap();
		assert!(matches!(read_corpus(dir.path().join("missing.txt")), Err(ModelError::Io(_))));
	}

	#[test]
	fn load_or_build_writes_then_reuses_the_cache() {
		let dir = tempfile::tempdir().unwrap();
		let corpus = dir.path().join("corpus.txt");
		fs::write(&corpus, "to be or not to be").unwrap();
		let config = ModelConfig { n: 2, top_k: 5, threads: 1 };

		let built = load_or_build(&corpus, &config).unwrap();
		let cache = cache_path(&corpus, 2, 5).unwrap();
		assert!(cache.exists());

		// The cache is used even once the corpus is gone
		fs::remove_file(&corpus).unwrap();
		let cached = load_or_build(&corpus, &config).unwrap();
		assert_eq!(cached.to_table(), built.to_table());
	}
}
