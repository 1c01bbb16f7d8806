//! Error taxonomy shared by every pipeline stage.

use thiserror::Error;

/// Errors surfaced by the scrape-and-chat pipeline.
///
/// Each variant maps to the stage that produced it; nothing here is
/// retried internally. The first failing stage aborts the rest of the
/// sequence and the error string is what the UI shows.
#[derive(Debug, Error)]
pub enum RagError {
    /// The target URL could not be loaded (DNS, connect, or HTTP status).
    #[error("failed to load {url}: {reason}")]
    Navigation { url: String, reason: String },

    /// The page body never became available within the fetch deadline.
    #[error("timed out waiting for page body: {0}")]
    Timeout(String),

    /// Chunker configuration is unusable.
    #[error("invalid chunker parameters: {0}")]
    InvalidParameter(String),

    /// Embedding or appending chunk rows failed.
    #[error("vector store write failed: {0}")]
    Write(String),

    /// Query embedding or similarity search failed.
    #[error("retrieval failed: {0}")]
    Retrieval(String),

    /// The completion model call failed.
    #[error("answer generation failed: {0}")]
    Generation(String),

    /// Opening or maintaining the store itself failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Startup configuration is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
