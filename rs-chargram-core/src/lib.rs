//! Character-level n-gram text generation library.
//!
//! This crate provides a fixed-order n-gram language model including:
//! - Construction of a top-K gram table from a raw corpus
//! - Normalization of gram frequencies into a probability vector
//! - Prefix-conditioned, character-by-character stochastic generation
//! - Configuration, persistence and corpus loading helpers
//!
//! Randomness is always supplied by the caller, so a seeded RNG
//! makes generation reproducible.

/// Core n-gram model, builder and generator.
pub mod model;

/// Error taxonomy shared by construction and persistence.
pub mod error;

/// Construction and generation options.
pub mod config;

/// I/O utilities (corpus loading, model persistence, build cache).
pub mod io;

pub use config::{GenerationConfig, ModelConfig};
pub use error::{ModelError, Result};
pub use model::builder::{GramCounts, ModelBuilder};
pub use model::generator::{Generator, Steps};
pub use model::language_model::{GramTable, LanguageModel};
