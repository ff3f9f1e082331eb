use thiserror::Error;

/// Result type alias for model construction and persistence.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised while building, loading or configuring a model.
///
/// Generation never fails: an unknown context degrades to the uniform
/// letter fallback instead of surfacing an error.
#[derive(Debug, Error)]
pub enum ModelError {
	/// The requested gram width is too small to hold a context and a next character.
	#[error("n must be >= 2, got {n}")]
	InvalidOrder { n: usize },

	/// The corpus is shorter than a single n-gram.
	#[error("insufficient data: need at least {required} characters, got {actual}")]
	InsufficientData { required: usize, actual: usize },

	/// No gram would be retained (`top_k` is zero).
	#[error("empty model: no n-gram retained")]
	EmptyModel,

	/// A persisted gram table failed validation.
	#[error("corrupted model: {reason}")]
	CorruptedModel { reason: String },

	/// A configuration value is out of range.
	#[error("invalid configuration: {reason}")]
	InvalidConfig { reason: String },

	#[error("io error: {0}")]
	Io(#[from] std::io::Error),

	#[error("serialization error: {0}")]
	Serialization(#[from] postcard::Error),
}

impl ModelError {
	/// Creates a corrupted model error.
	pub fn corrupted(reason: impl Into<String>) -> Self {
		Self::CorruptedModel { reason: reason.into() }
	}

	/// Creates an invalid configuration error.
	pub fn invalid_config(reason: impl Into<String>) -> Self {
		Self::InvalidConfig { reason: reason.into() }
	}
}
