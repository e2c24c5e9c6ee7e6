//! Error types for transcript extraction

use thiserror::Error;

/// Error type for the external extraction call and its post-processing.
///
/// A failed call is always a reported failure; none of these variants is
/// ever downgraded to an empty finding set.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractionError {
    /// Transport or provider failure from the model call
    #[error("extraction call failed: {0}")]
    Provider(String),

    /// The response body was not parseable JSON
    #[error("extraction returned non-JSON response: {detail} (sample: {sample:?})")]
    InvalidJson { detail: String, sample: String },

    /// The response parsed but carried no `findings` array
    #[error("extraction response is missing a 'findings' list (sample: {sample:?})")]
    MissingFindings { sample: String },
}
