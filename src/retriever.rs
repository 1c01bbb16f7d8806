//! Query-side half of the pipeline: embed, then nearest-neighbor lookup.

use rig::embeddings::EmbeddingModel;

use crate::embeddings::embed_query;
use crate::store::{ScoredChunk, SqliteChunkStore};
use crate::types::RagError;

/// Finds the stored chunks most similar to a query.
///
/// The embedding model handle is a clone of the one used at write time;
/// mixing models between write and read would make the vectors
/// incomparable. A failed lookup is fatal for the query and surfaces to
/// the caller; an empty store is simply an empty result.
#[derive(Clone)]
pub struct Retriever<E>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
{
    embedder: E,
    store: SqliteChunkStore<E>,
    top_k: usize,
}

impl<E> Retriever<E>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
{
    pub fn new(embedder: E, store: SqliteChunkStore<E>, top_k: usize) -> Self {
        Self {
            embedder,
            store,
            top_k,
        }
    }

    /// Returns up to `top_k` chunks ordered most similar first.
    ///
    /// Every query goes through the search path, including the empty
    /// string; there is no special-casing before the store.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredChunk>, RagError> {
        let vector = embed_query(&self.embedder, query)
            .await
            .map_err(RagError::Retrieval)?;
        self.store.search_similar(&vector, self.top_k).await
    }
}
