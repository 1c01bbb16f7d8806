//! Thin helpers over rig's [`EmbeddingModel`] trait.
//!
//! The same model handle is used at write time and query time; vectors
//! from different models are not comparable, so callers hold exactly one
//! `E` and clone it where both halves of the pipeline need it.

use rig::embeddings::EmbeddingModel;

/// Embeds every text, batching by the model's document limit.
///
/// Errors are returned as plain strings so the caller can wrap them in
/// the stage-appropriate [`crate::types::RagError`] variant.
pub async fn embed_all<E>(model: &E, texts: &[String]) -> Result<Vec<Vec<f32>>, String>
where
    E: EmbeddingModel,
{
    let mut vectors = Vec::with_capacity(texts.len());
    let batch_size = E::MAX_DOCUMENTS.max(1);
    for batch in texts.chunks(batch_size) {
        let embedded = model
            .embed_texts(batch.to_vec())
            .await
            .map_err(|err| err.to_string())?;
        if embedded.len() != batch.len() {
            return Err(format!(
                "embedding model returned {} vectors for {} texts",
                embedded.len(),
                batch.len()
            ));
        }
        vectors.extend(
            embedded
                .into_iter()
                .map(|embedding| embedding.vec.into_iter().map(|v| v as f32).collect()),
        );
    }
    Ok(vectors)
}

/// Embeds a single query string.
pub async fn embed_query<E>(model: &E, text: &str) -> Result<Vec<f32>, String>
where
    E: EmbeddingModel,
{
    let texts = [text.to_string()];
    let mut vectors = embed_all(model, &texts).await?;
    vectors
        .pop()
        .ok_or_else(|| "embedding model returned no vector".to_string())
}
