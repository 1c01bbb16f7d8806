//! Startup configuration, loaded once from the environment.

use std::env;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::types::RagError;

/// Everything the service needs, resolved once in `main` and handed into
/// component constructors. No ambient globals.
#[derive(Debug, Clone)]
pub struct Config {
    /// Credential routing all hosted-model calls (embeddings and completions).
    pub api_key: String,
    /// Directory holding the vector store database.
    pub dataset: String,
    /// Database name within the dataset directory.
    pub table: String,
    /// Embedding model identifier; must match between write and read time.
    pub embedding_model: String,
    /// Completion model identifier.
    pub generation_model: String,
    /// Maximum chunk size in characters.
    pub chunk_max_chars: usize,
    /// Overlap between consecutive chunks in characters.
    pub chunk_overlap_chars: usize,
    /// Number of chunks retrieved per chat query.
    pub top_k: usize,
    /// Address the HTTP server binds to.
    pub bind: String,
    /// Scratch directory ensured to exist by the fetcher.
    pub scratch_dir: PathBuf,
    /// Deadline for a single page fetch.
    pub fetch_timeout: Duration,
}

impl Config {
    /// Loads configuration from the environment, applying defaults for
    /// everything except the API key.
    pub fn from_env() -> Result<Self, RagError> {
        let api_key = env::var("GEMINI_API_KEY")
            .map_err(|_| RagError::Config("GEMINI_API_KEY must be set".into()))?;

        Ok(Self {
            api_key,
            dataset: env_or("SITECHAT_DATASET", "scrape"),
            table: env_or("SITECHAT_TABLE", "scrapewebpage"),
            embedding_model: env_or("SITECHAT_EMBEDDING_MODEL", "embedding-001"),
            generation_model: env_or("SITECHAT_GENERATION_MODEL", "gemini-2.0-flash"),
            chunk_max_chars: env_parse("SITECHAT_CHUNK_MAX_CHARS", 1500)?,
            chunk_overlap_chars: env_parse("SITECHAT_CHUNK_OVERLAP", 150)?,
            top_k: env_parse("SITECHAT_TOP_K", 4)?,
            bind: env_or("SITECHAT_BIND", "127.0.0.1:7860"),
            scratch_dir: PathBuf::from(env_or("SITECHAT_SCRATCH_DIR", "scraped_data")),
            fetch_timeout: Duration::from_secs(env_parse("SITECHAT_FETCH_TIMEOUT_SECS", 30)?),
        })
    }

    /// Location of the SQLite vector store database.
    pub fn store_path(&self) -> PathBuf {
        Path::new(&self.dataset).join(format!("{}.sqlite3", self.table))
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(key: &str, default: T) -> Result<T, RagError>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| RagError::Config(format!("{key} is invalid: {err}"))),
        Err(_) => Ok(default),
    }
}
