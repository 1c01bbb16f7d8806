//! The two pipeline sequences: ingest (fetch, chunk, embed, store) and
//! chat (retrieve, generate).
//!
//! Both are plain sequential async functions; the first failing stage
//! aborts the rest of the call and the error propagates to the HTTP
//! layer untouched.

use rig::embeddings::EmbeddingModel;
use url::Url;
use uuid::Uuid;

use crate::chunker::TextChunker;
use crate::embeddings::embed_all;
use crate::fetcher::PageFetcher;
use crate::generator::{AnswerGenerator, CompletionProvider};
use crate::retriever::Retriever;
use crate::store::{ChunkDocument, ScoredChunk, SqliteChunkStore};
use crate::types::RagError;

/// Outcome of one ingest call.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub url: String,
    pub chunks_stored: usize,
    pub bytes_fetched: usize,
}

impl IngestReport {
    /// Status line shown in the ingest panel.
    pub fn status_line(&self) -> String {
        format!(
            "Data processed and stored successfully ({} chunks from {} bytes)",
            self.chunks_stored, self.bytes_fetched
        )
    }
}

/// Outcome of one chat call. Context is ephemeral: it is returned for
/// display and testing but never persisted.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub answer: String,
    pub context: Vec<ScoredChunk>,
}

/// Orchestrates the whole scrape-and-chat pipeline.
pub struct RagPipeline<E, G>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
    G: CompletionProvider,
{
    fetcher: PageFetcher,
    chunker: TextChunker,
    embedder: E,
    store: SqliteChunkStore<E>,
    retriever: Retriever<E>,
    generator: AnswerGenerator<G>,
}

impl<E, G> RagPipeline<E, G>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
    G: CompletionProvider,
{
    pub fn new(
        fetcher: PageFetcher,
        chunker: TextChunker,
        embedder: E,
        store: SqliteChunkStore<E>,
        generator: AnswerGenerator<G>,
        top_k: usize,
    ) -> Self {
        let retriever = Retriever::new(embedder.clone(), store.clone(), top_k);
        Self {
            fetcher,
            chunker,
            embedder,
            store,
            retriever,
            generator,
        }
    }

    /// Fetch, chunk, embed, and append. Strictly in order; a failure in
    /// any stage leaves no partial-success bookkeeping behind.
    pub async fn ingest(&self, url: &Url) -> Result<IngestReport, RagError> {
        let page = self.fetcher.fetch(url).await?;
        tracing::debug!(url = %url, bytes = page.bytes, "page fetched");

        let chunks = self.chunker.chunk(&page.text);
        if chunks.is_empty() {
            return Ok(IngestReport {
                url: url.to_string(),
                chunks_stored: 0,
                bytes_fetched: page.bytes,
            });
        }

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let vectors = embed_all(&self.embedder, &texts)
            .await
            .map_err(RagError::Write)?;

        let mut rows = Vec::with_capacity(chunks.len());
        for (chunk, vector) in chunks.into_iter().zip(vectors) {
            let metadata = serde_json::to_value(&chunk.metadata)
                .map_err(|err| RagError::Write(err.to_string()))?;
            rows.push((
                ChunkDocument {
                    id: Uuid::new_v4().to_string(),
                    url: url.to_string(),
                    chunk_index: chunk.metadata.index,
                    content: chunk.text,
                    metadata,
                },
                vector,
            ));
        }

        let stored = rows.len();
        self.store.add_chunks(rows).await?;
        tracing::info!(url = %url, chunks = stored, "ingest complete");

        Ok(IngestReport {
            url: url.to_string(),
            chunks_stored: stored,
            bytes_fetched: page.bytes,
        })
    }

    /// Retrieve, then generate. Retrieval failures are fatal for the
    /// query; an empty store produces an answer from an empty context.
    pub async fn answer(&self, query: &str) -> Result<ChatReply, RagError> {
        let context = self.retriever.retrieve(query).await?;
        let texts: Vec<String> = context
            .iter()
            .map(|scored| scored.document.content.clone())
            .collect();
        let answer = self.generator.answer(query, &texts).await?;
        Ok(ChatReply { answer, context })
    }

    /// Store handle for liveness checks and tests.
    pub fn store(&self) -> &SqliteChunkStore<E> {
        &self.store
    }
}
