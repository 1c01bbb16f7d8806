//! Prompt construction and completion-model access.

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::gemini;

use crate::types::RagError;

/// Seam over the hosted completion model so the pipeline can be exercised
/// without network access.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, RagError>;
}

/// Production provider backed by a rig Gemini agent.
pub struct GeminiCompletion {
    agent: rig::agent::Agent<gemini::completion::CompletionModel>,
}

impl GeminiCompletion {
    pub fn new(client: &gemini::Client, model: &str) -> Self {
        Self {
            agent: client.agent(model).build(),
        }
    }
}

#[async_trait]
impl CompletionProvider for GeminiCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, RagError> {
        self.agent
            .prompt(prompt)
            .await
            .map_err(|err| RagError::Generation(err.to_string()))
    }
}

/// Builds the single prompt handed to the completion model.
///
/// Context chunks are joined with newlines; an empty context yields an
/// empty `Information:` section rather than a different prompt shape.
pub fn build_prompt(query: &str, contexts: &[String]) -> String {
    format!(
        "Based on the following information, answer this query: {query}\n\nInformation: {}",
        contexts.join("\n")
    )
}

/// Turns a query plus retrieved context into a free-text answer.
pub struct AnswerGenerator<G> {
    provider: G,
}

impl<G> AnswerGenerator<G>
where
    G: CompletionProvider,
{
    pub fn new(provider: G) -> Self {
        Self { provider }
    }

    /// One stateless completion call; prior turns are not fed back in.
    pub async fn answer(&self, query: &str, contexts: &[String]) -> Result<String, RagError> {
        let prompt = build_prompt(query, contexts);
        self.provider.complete(&prompt).await
    }
}
