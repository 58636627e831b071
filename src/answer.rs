//! Retrieval-augmented answering over the persisted index.

use async_trait::async_trait;
use rig::completion::Prompt;
use rig::embeddings::EmbeddingModel;
use rig::prelude::*;
use rig::providers::gemini;
use tracing::{info, warn};

use crate::index::VectorIndex;
use crate::types::RagError;

/// Low temperature biases the model toward grounded, repeatable answers.
const ANSWER_TEMPERATURE: f64 = 0.6;

const PREAMBLE: &str = "You are a careful assistant. Answer using only the provided context. \
If the context does not contain the answer, say that you do not know.";

/// Chat-completion seam. The production implementation wraps a hosted
/// model; tests substitute deterministic fakes.
#[async_trait]
pub trait AnswerModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, RagError>;
}

/// Gemini-backed [`AnswerModel`].
pub struct GeminiAnswerer {
    agent: rig::agent::Agent<gemini::completion::CompletionModel>,
}

impl GeminiAnswerer {
    pub fn new(client: &gemini::Client, model: &str) -> Self {
        let agent = client
            .agent(model)
            .preamble(PREAMBLE)
            .temperature(ANSWER_TEMPERATURE)
            .build();
        Self { agent }
    }
}

#[async_trait]
impl AnswerModel for GeminiAnswerer {
    async fn complete(&self, prompt: &str) -> Result<String, RagError> {
        self.agent
            .prompt(prompt)
            .await
            .map_err(|err| RagError::Completion(err.to_string()))
    }
}

/// Builds the grounded prompt from ranked context chunks.
pub fn build_prompt(context: &[String], question: &str) -> String {
    format!(
        "Use the following context to answer the question. Answer only from this context.\n\n\
         Context:\n{}\n\nQuestion: {}",
        context.join("\n\n"),
        question
    )
}

/// Retrieves the `top_k` chunks nearest to `question` and asks the chat
/// model.
///
/// Chat-service failures are folded into the returned text so callers can
/// always display the result directly. Retrieval failures (a missing or
/// unreadable index) still surface as errors.
pub async fn answer_question<E>(
    index: &VectorIndex<E>,
    model: &dyn AnswerModel,
    question: &str,
    top_k: usize,
) -> Result<String, RagError>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
{
    let hits = index.search(question, top_k).await?;
    let context: Vec<String> = hits
        .iter()
        .map(|hit| hit.document.content.clone())
        .collect();
    info!(question = %question, retrieved = context.len(), "retrieved context chunks");

    let prompt = build_prompt(&context, question);
    match model.complete(&prompt).await {
        Ok(answer) => Ok(answer),
        Err(err) => {
            warn!(error = %err, "chat completion failed");
            Ok(format!("Unable to generate an answer: {err}"))
        }
    }
}
