//! Top-level module for the character n-gram system.
//!
//! This module provides a fixed-order n-gram text generator, including:
//! - Window counting and top-K selection (`ModelBuilder`, `GramCounts`)
//! - The immutable gram table and probability vector (`LanguageModel`)
//! - Prefix-conditioned sampling (`Generator`)

/// Corpus scanning, ranking and truncation.
///
/// Counting can be spread over several worker threads; the resulting
/// table does not depend on the number of workers.
pub mod builder;

/// Occurrence counts of n-character windows.
///
/// Supports merging of partial counts produced by parallel workers.
mod gram_counts;

/// Immutable n-gram model (`n >= 2`).
///
/// Holds the retained grams, their probabilities and a prefix index
/// used to find the grams continuing a given context.
pub mod language_model;

/// Character-by-character generation driven by a caller-supplied RNG.
pub mod generator;
