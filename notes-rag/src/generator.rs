//! Answer generation through an OpenAI-compatible chat-completion API.
//!
//! [`AnswerGenerator::generate`] never returns an error. Any failure of the
//! hosted call (network, quota, authentication, timeout, malformed reply)
//! becomes an answer of the form `Response generation error: <reason>` so
//! the conversation can continue.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::GenerationConfig;
use crate::error::{RagError, Result};
use crate::http::describe_failure;

/// System instruction sent with every request.
pub const SYSTEM_PROMPT: &str = "You are an educational assistant helping students study.";

/// Prefix of the inline message returned when generation fails.
pub const GENERATION_ERROR_PREFIX: &str = "Response generation error:";

/// Build the user prompt that grounds the model in the retrieved context.
pub fn build_prompt(query: &str, context: &str) -> String {
    format!(
        "You are an assistant helping university students study.\n\
         Answer the question based ONLY on the context provided from the course notes.\n\
         \n\
         CONTEXT:\n\
         {context}\n\
         \n\
         QUESTION: {query}\n\
         \n\
         INSTRUCTIONS:\n\
         - Answer in English clearly and concisely\n\
         - If the answer is not in the context, say so honestly\n\
         - Use examples from the context when possible\n\
         - Do not make up information\n\
         - If the user greets you, greet back and ask how you can help\n\
         \n\
         ANSWER:"
    )
}

/// One message of a chat-completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `system`, `user` or `assistant`.
    pub role: String,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// A system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".into(), content: content.into() }
    }

    /// A user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".into(), content: content.into() }
    }
}

/// A single non-streaming chat-completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation sent to the model.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
}

/// A chat-completion backend.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send `request` and return the text of the first choice.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::GenerationError`] on any transport or API failure.
    async fn complete(&self, request: &ChatRequest) -> Result<String>;
}

/// A [`ChatModel`] speaking the OpenAI `/chat/completions` protocol, such as
/// the Groq API.
pub struct OpenAiCompatibleChat {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiCompatibleChat {
    /// Create a client for `config.base_url` with `config.timeout()` applied
    /// to every request.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the API key is empty or the HTTP
    /// client cannot be built.
    pub fn new(api_key: impl Into<String>, config: &GenerationConfig) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(RagError::ConfigError("API key must not be empty".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| RagError::ConfigError(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client, api_key, base_url: config.base_url.trim_end_matches('/').to_string() })
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl ChatModel for OpenAiCompatibleChat {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let fail = |message: String| RagError::GenerationError {
            model: request.model.clone(),
            message,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    fail(format!("request timed out: {e}"))
                } else {
                    fail(format!("request failed: {e}"))
                }
            })?;

        if !response.status().is_success() {
            return Err(fail(describe_failure(response).await));
        }

        let parsed: CompletionResponse =
            response.json().await.map_err(|e| fail(format!("failed to parse response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| fail("response contained no choices".to_string()))
    }
}

/// Produces grounded answers from retrieved context.
#[derive(Clone)]
pub struct AnswerGenerator {
    chat: Arc<dyn ChatModel>,
    config: GenerationConfig,
}

impl AnswerGenerator {
    /// Create a generator using `chat` with the sampling settings in `config`.
    pub fn new(chat: Arc<dyn ChatModel>, config: GenerationConfig) -> Self {
        Self { chat, config }
    }

    /// The configured default model identifier.
    pub fn default_model(&self) -> &str {
        &self.config.model
    }

    /// Build the request sent for `query` against `context`.
    pub fn request(&self, query: &str, context: &str, model_id: &str) -> ChatRequest {
        ChatRequest {
            model: model_id.to_string(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(build_prompt(query, context)),
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }

    /// Answer `query` from `context` with `model_id`, propagating failures.
    ///
    /// # Errors
    ///
    /// Returns the [`ChatModel`] error unchanged.
    pub async fn try_generate(&self, query: &str, context: &str, model_id: &str) -> Result<String> {
        let request = self.request(query, context, model_id);
        debug!(model = model_id, context_len = context.len(), "requesting completion");

        let answer = self.chat.complete(&request).await.map_err(|e| {
            error!(model = model_id, error = %e, "generation failed");
            e
        })?;
        info!(model = model_id, answer_len = answer.len(), "answer generated");
        Ok(answer)
    }

    /// Answer `query` from `context` with `model_id`.
    ///
    /// Failures are returned as an answer starting with
    /// [`GENERATION_ERROR_PREFIX`].
    pub async fn generate(&self, query: &str, context: &str, model_id: &str) -> String {
        self.try_generate(query, context, model_id).await.unwrap_or_else(failure_message)
    }
}

/// The inline answer reported for a failed generation.
pub fn failure_message(error: RagError) -> String {
    let reason = match error {
        RagError::GenerationError { message, .. } => message,
        other => other.to_string(),
    };
    format!("{GENERATION_ERROR_PREFIX} {reason}")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingChat;

    #[async_trait]
    impl ChatModel for FailingChat {
        async fn complete(&self, request: &ChatRequest) -> Result<String> {
            Err(RagError::GenerationError {
                model: request.model.clone(),
                message: "quota exceeded".into(),
            })
        }
    }

    #[test]
    fn prompt_embeds_context_and_question() {
        let prompt = build_prompt("What is beta?", "Beta measures systematic risk.");
        assert!(prompt.contains("CONTEXT:\nBeta measures systematic risk.\n"));
        assert!(prompt.contains("QUESTION: What is beta?"));
        assert!(prompt.contains("based ONLY on the context"));
        assert!(prompt.ends_with("ANSWER:"));
    }

    #[test]
    fn request_uses_configured_sampling() {
        let generator = AnswerGenerator::new(Arc::new(FailingChat), GenerationConfig::default());
        let request = generator.request("q", "c", "llama-3.1-8b-instant");
        assert_eq!(request.model, "llama-3.1-8b-instant");
        assert_eq!(request.messages[0], ChatMessage::system(SYSTEM_PROMPT));
        assert_eq!(request.messages[1].role, "user");
        assert!((request.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(request.max_tokens, 1024);
    }

    #[tokio::test]
    async fn failure_degrades_to_message() {
        let generator = AnswerGenerator::new(Arc::new(FailingChat), GenerationConfig::default());
        let answer = generator.generate("q", "c", "llama-3.3-70b-versatile").await;
        assert_eq!(answer, "Response generation error: quota exceeded");
    }

    #[test]
    fn empty_api_key_is_rejected() {
        assert!(OpenAiCompatibleChat::new("  ", &GenerationConfig::default()).is_err());
    }
}
