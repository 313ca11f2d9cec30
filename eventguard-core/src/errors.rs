//! errors.rs - Custom error types for the eventguard-core library.
//!
//! License: MIT OR APACHE 2.0

use thiserror::Error;

/// This enum represents all possible error types in the `eventguard-core` library.
///
/// Marked `#[non_exhaustive]` so new variants can be added without breaking
/// downstream matches.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ValidatorError {
    #[error("Failed to parse rule descriptor document: {0}")]
    DescriptorParse(#[from] serde_json::Error),

    #[error("Failed to parse validation rule '{rule}': {reason}")]
    RuleParse { rule: String, reason: String },

    #[error("Failed to compile pattern for rule '{0}': {1}")]
    PatternCompile(String, regex::Error),
}
