//! SQLite-backed vector store for scraped chunks.
//!
//! Rows live in a `chunks` table managed by `rig-sqlite`; embeddings go
//! into the companion `chunks_embeddings` virtual table provided by the
//! `sqlite-vec` extension. Appends go through rig-sqlite, similarity
//! search uses `vec_distance_cosine` directly on a second connection
//! handle. The store is append-only: nothing in this service updates or
//! deletes rows, and re-ingesting a URL simply adds more of them.

use std::mem::transmute;
use std::os::raw::c_char;
use std::path::Path;
use std::sync::OnceLock;

use rig::OneOrMany;
use rig::embeddings::{Embedding, EmbeddingModel};
use rig_sqlite::{Column, ColumnValue, SqliteVectorStore, SqliteVectorStoreTable};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::{Connection, ffi};

use crate::types::RagError;

/// One stored chunk row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkDocument {
    pub id: String,
    pub url: String,
    pub chunk_index: usize,
    pub content: String,
    pub metadata: serde_json::Value,
}

impl SqliteVectorStoreTable for ChunkDocument {
    fn name() -> &'static str {
        "chunks"
    }

    fn schema() -> Vec<Column> {
        vec![
            Column::new("id", "TEXT PRIMARY KEY"),
            Column::new("url", "TEXT").indexed(),
            Column::new("chunk_index", "TEXT"),
            Column::new("metadata", "TEXT"),
            Column::new("content", "TEXT"),
        ]
    }

    fn id(&self) -> String {
        self.id.clone()
    }

    fn column_values(&self) -> Vec<(&'static str, Box<dyn ColumnValue>)> {
        vec![
            ("id", Box::new(self.id.clone())),
            ("url", Box::new(self.url.clone())),
            ("chunk_index", Box::new(self.chunk_index.to_string())),
            ("metadata", Box::new(self.metadata.to_string())),
            ("content", Box::new(self.content.clone())),
        ]
    }
}

/// A chunk returned from similarity search, most similar first.
#[derive(Clone, Debug)]
pub struct ScoredChunk {
    pub document: ChunkDocument,
    /// Cosine similarity in `[-1, 1]`; higher is closer.
    pub score: f32,
}

/// Vector store client over a local SQLite database.
#[derive(Clone)]
pub struct SqliteChunkStore<E>
where
    E: EmbeddingModel + 'static,
{
    inner: SqliteVectorStore<E, ChunkDocument>,
    /// Second handle to the same connection for queries rig-sqlite does
    /// not cover (similarity SQL, counts, URL readback).
    conn: Connection,
}

impl<E> SqliteChunkStore<E>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
{
    /// Opens (creating if needed) the database at `path` and verifies the
    /// sqlite-vec extension is live.
    pub async fn open(path: impl AsRef<Path>, model: &E) -> Result<Self, RagError> {
        register_sqlite_vec()?;
        let conn = Connection::open(path.as_ref().to_path_buf())
            .await
            .map_err(|err| RagError::Storage(err.to_string()))?;
        conn.call(|conn| {
            conn.query_row("select vec_version()", [], |row| row.get::<_, String>(0))
                .map_err(tokio_rusqlite::Error::Rusqlite)
        })
        .await
        .map_err(|err| RagError::Storage(format!("sqlite-vec unavailable: {err}")))?;

        let conn_for_queries = conn.clone();
        let inner = SqliteVectorStore::new(conn, model)
            .await
            .map_err(|err| RagError::Storage(err.to_string()))?;
        Ok(Self {
            inner,
            conn: conn_for_queries,
        })
    }

    /// Appends chunk rows with their embedding vectors. Duplicate content
    /// is appended as-is; there is no uniqueness constraint beyond the id.
    pub async fn add_chunks(
        &self,
        documents: Vec<(ChunkDocument, Vec<f32>)>,
    ) -> Result<(), RagError> {
        if documents.is_empty() {
            return Ok(());
        }
        let mut rows = Vec::with_capacity(documents.len());
        for (document, vector) in documents {
            let embedding = Embedding {
                document: document.content.clone(),
                vec: vector.into_iter().map(f64::from).collect(),
            };
            rows.push((document, OneOrMany::one(embedding)));
        }
        self.inner
            .add_rows(rows)
            .await
            .map_err(|err| RagError::Write(err.to_string()))?;
        Ok(())
    }

    /// Returns the `top_k` chunks closest to `query_vector` by cosine
    /// distance, most similar first.
    pub async fn search_similar(
        &self,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, RagError> {
        let vector_json = serde_json::to_string(query_vector)
            .map_err(|err| RagError::Retrieval(err.to_string()))?;

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT c.id, c.url, c.chunk_index, c.content, c.metadata, \
                         vec_distance_cosine(e.embedding, vec_f32(?)) AS distance \
                         FROM chunks c \
                         JOIN chunks_embeddings e ON c.id = e.id \
                         ORDER BY distance ASC \
                         LIMIT {top_k}"
                    ))
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                let rows = stmt
                    .query_map([&vector_json], |row| {
                        let document = ChunkDocument {
                            id: row.get(0)?,
                            url: row.get(1)?,
                            chunk_index: row.get::<_, String>(2)?.parse().unwrap_or(0),
                            content: row.get(3)?,
                            metadata: row
                                .get::<_, String>(4)
                                .map(|raw| serde_json::from_str(&raw).unwrap_or_default())
                                .unwrap_or_default(),
                        };
                        let distance: f32 = row.get(5)?;
                        Ok(ScoredChunk {
                            document,
                            score: 1.0 - distance,
                        })
                    })
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                let mut results = Vec::new();
                for row in rows {
                    results.push(row.map_err(tokio_rusqlite::Error::Rusqlite)?);
                }
                Ok(results)
            })
            .await
            .map_err(|err| RagError::Retrieval(err.to_string()))
    }

    /// All rows stored for a URL, in chunk order. Re-ingested pages show
    /// up as additional rows with repeating indexes.
    pub async fn chunks_for_url(&self, url: &str) -> Result<Vec<ChunkDocument>, RagError> {
        let url = url.to_string();
        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(
                        "SELECT id, url, chunk_index, content, metadata \
                         FROM chunks WHERE url = ? \
                         ORDER BY CAST(chunk_index AS INTEGER) ASC",
                    )
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                let rows = stmt
                    .query_map([&url], |row| {
                        Ok(ChunkDocument {
                            id: row.get(0)?,
                            url: row.get(1)?,
                            chunk_index: row.get::<_, String>(2)?.parse().unwrap_or(0),
                            content: row.get(3)?,
                            metadata: row
                                .get::<_, String>(4)
                                .map(|raw| serde_json::from_str(&raw).unwrap_or_default())
                                .unwrap_or_default(),
                        })
                    })
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                let mut results = Vec::new();
                for row in rows {
                    results.push(row.map_err(tokio_rusqlite::Error::Rusqlite)?);
                }
                Ok(results)
            })
            .await
            .map_err(|err| RagError::Storage(err.to_string()))
    }

    /// Total number of stored chunks.
    pub async fn count(&self) -> Result<usize, RagError> {
        self.conn
            .call(|conn| {
                let count: i64 = conn
                    .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(count as usize)
            })
            .await
            .map_err(|err| RagError::Storage(err.to_string()))
    }
}

/// Registers sqlite-vec as an auto-loaded extension, once per process.
fn register_sqlite_vec() -> Result<(), RagError> {
    static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();

    REGISTERED
        .get_or_init(|| unsafe {
            type SqliteExtensionInit = unsafe extern "C" fn(
                *mut ffi::sqlite3,
                *mut *mut c_char,
                *const ffi::sqlite3_api_routines,
            ) -> i32;

            let init: unsafe extern "C" fn() = sqlite_vec::sqlite3_vec_init;
            let init_fn: SqliteExtensionInit =
                transmute::<unsafe extern "C" fn(), SqliteExtensionInit>(init);
            let rc = ffi::sqlite3_auto_extension(Some(init_fn));
            if rc == ffi::SQLITE_OK {
                Ok(())
            } else {
                Err(format!("failed to register sqlite-vec (code {rc})"))
            }
        })
        .clone()
        .map_err(RagError::Storage)
}
