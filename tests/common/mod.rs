//! Shared test doubles: a deterministic embedding model and scripted
//! completion providers, so pipeline tests run without network access.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rig::embeddings::embedding::{Embedding, EmbeddingError, EmbeddingModel};

use sitechat::generator::CompletionProvider;
use sitechat::types::RagError;

/// Deterministic hash-based embedding model. Identical text embeds to
/// identical vectors, which is all similarity search needs in tests.
#[derive(Clone)]
pub struct HashEmbedding;

impl EmbeddingModel for HashEmbedding {
    const MAX_DOCUMENTS: usize = 64;

    type Client = ();

    fn make(_client: &Self::Client, _model: impl Into<String>, _dims: Option<usize>) -> Self {
        HashEmbedding
    }

    fn ndims(&self) -> usize {
        8
    }

    fn embed_texts(
        &self,
        texts: impl IntoIterator<Item = String> + Send,
    ) -> impl std::future::Future<Output = Result<Vec<Embedding>, EmbeddingError>> + Send {
        let documents: Vec<String> = texts.into_iter().collect();
        async move {
            Ok(documents
                .into_iter()
                .map(|document| Embedding {
                    vec: hash_to_vec(&document),
                    document,
                })
                .collect())
        }
    }
}

fn hash_to_vec(text: &str) -> Vec<f64> {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    let seed = hasher.finish();
    (0..8)
        .map(|i| {
            let bits = seed.rotate_left((i * 8) as u32) ^ ((i as u64) << 24);
            (bits as f64) / u32::MAX as f64
        })
        .collect()
}

/// Completion provider that records every prompt and returns a fixed
/// reply.
pub struct ScriptedCompletion {
    reply: String,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedCompletion {
    pub fn new(reply: &str) -> (Self, Arc<Mutex<Vec<String>>>) {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                reply: reply.to_string(),
                prompts: prompts.clone(),
            },
            prompts,
        )
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, RagError> {
        self.prompts
            .lock()
            .expect("prompt log poisoned")
            .push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

/// Completion provider that always fails, for error-surface tests.
pub struct FailingCompletion;

#[async_trait]
impl CompletionProvider for FailingCompletion {
    async fn complete(&self, _prompt: &str) -> Result<String, RagError> {
        Err(RagError::Generation("model unavailable".into()))
    }
}
