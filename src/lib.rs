//! ```text
//! URL ──► fetcher::PageFetcher ──► chunker::TextChunker ──┐
//!                                                         │
//!                      embeddings::embed_all ◄────────────┘
//!                                │
//!                                ▼
//!                 store::SqliteChunkStore (sqlite-vec)
//!                                ▲
//! query ──► retriever::Retriever ┘
//!                │
//!                ▼
//! generator::AnswerGenerator ──► served reply (server::router)
//! ```

pub mod chunker;
pub mod config;
pub mod embeddings;
pub mod fetcher;
pub mod generator;
pub mod pipeline;
pub mod retriever;
pub mod server;
pub mod store;
pub mod types;

pub use chunker::{Chunk, ChunkMetadata, TextChunker};
pub use config::Config;
pub use fetcher::{PageFetcher, ScrapedPage};
pub use generator::{AnswerGenerator, CompletionProvider, GeminiCompletion, build_prompt};
pub use pipeline::{ChatReply, IngestReport, RagPipeline};
pub use retriever::Retriever;
pub use store::{ChunkDocument, ScoredChunk, SqliteChunkStore};
pub use types::RagError;
