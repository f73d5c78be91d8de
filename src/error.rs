//! Error types for the external collaborators.
//!
//! Stage functions in this crate return `Box<dyn Error>`; [`ApiError`] names
//! the failures that come from a collaborator answering with something other
//! than what the pipeline can use.

use thiserror::Error;

/// Failures reported by the search, article, summarization or sentiment
/// collaborators.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-success status code.
    #[error("unexpected response status {status} from {url}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The URL that produced it.
        url: String,
    },

    /// The completion API returned no usable text.
    #[error("completion response contained no text")]
    EmptyCompletion,

    /// A server-sent event in a streamed completion could not be decoded.
    #[error("malformed stream frame: {0}")]
    StreamFrame(String),

    /// The classifier returned a different number of results than inputs sent.
    #[error("sentiment response had {got} results for {expected} inputs")]
    SentimentCount {
        /// Number of summaries sent.
        expected: usize,
        /// Number of results received.
        got: usize,
    },

    /// The classifier returned an input with no candidate labels.
    #[error("sentiment response had no label for input {0}")]
    MissingLabel(usize),
}
