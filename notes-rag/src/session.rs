//! Conversation state and the per-turn retrieve-then-generate flow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::AVAILABLE_MODELS;
use crate::error::{RagError, Result};
use crate::generator::{AnswerGenerator, failure_message};
use crate::retriever::{Retrieval, Retriever};

/// Answer given when retrieval finds nothing to ground a response in.
pub const NO_CONTEXT_ANSWER: &str =
    "I couldn't find relevant information in the notes to answer this question.";

/// Author of a [`ConversationTurn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
    /// Documents cited by an assistant turn. `None` for user turns.
    pub sources: Option<Vec<String>>,
    pub at: DateTime<Utc>,
}

impl ConversationTurn {
    fn user(text: &str) -> Self {
        Self { role: Role::User, text: text.to_string(), sources: None, at: Utc::now() }
    }

    fn assistant(text: String, sources: Vec<String>) -> Self {
        Self { role: Role::Assistant, text, sources: Some(sources), at: Utc::now() }
    }
}

/// What a turn does after retrieval.
#[derive(Debug, Clone)]
pub enum TurnPlan {
    /// Nothing relevant was found; answer with [`NO_CONTEXT_ANSWER`] and
    /// skip generation.
    NoContext,
    /// Generate an answer grounded in the retrieved context.
    Generate(Retrieval),
}

impl TurnPlan {
    /// Decide how to continue from a retrieval result.
    pub fn from_retrieval(retrieval: Retrieval) -> Self {
        if retrieval.context.trim().is_empty() {
            Self::NoContext
        } else {
            Self::Generate(retrieval)
        }
    }
}

/// The result of one handled user message.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub answer: String,
    /// Cited document names, sorted and distinct.
    pub sources: Vec<String>,
    /// Whether the generator was called.
    pub generated: bool,
}

/// Owns the conversation history and drives one retrieve-then-generate
/// cycle per user message.
///
/// Turns are processed one at a time; `handle` takes `&mut self`.
pub struct SessionController {
    retriever: Retriever,
    generator: AnswerGenerator,
    model: String,
    history: Vec<ConversationTurn>,
}

impl SessionController {
    /// Create a session that answers with the generator's default model.
    pub fn new(retriever: Retriever, generator: AnswerGenerator) -> Self {
        let model = generator.default_model().to_string();
        Self { retriever, generator, model, history: Vec::new() }
    }

    /// Handle one user message.
    ///
    /// The user turn is recorded before retrieval. Generation failures do not
    /// surface here; they arrive as the answer text with no sources.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] for a blank message, and propagates
    /// embedding or vector store errors from retrieval.
    pub async fn handle(&mut self, message: &str) -> Result<TurnOutcome> {
        let message = message.trim();
        if message.is_empty() {
            return Err(RagError::PipelineError("message must not be empty".to_string()));
        }
        self.history.push(ConversationTurn::user(message));

        let retrieval = self.retriever.retrieve(message).await?;
        let outcome = match TurnPlan::from_retrieval(retrieval) {
            TurnPlan::NoContext => {
                info!("no relevant context found");
                TurnOutcome {
                    answer: NO_CONTEXT_ANSWER.to_string(),
                    sources: Vec::new(),
                    generated: false,
                }
            }
            TurnPlan::Generate(retrieval) => {
                match self.generator.try_generate(message, &retrieval.context, &self.model).await {
                    Ok(answer) => TurnOutcome {
                        answer,
                        sources: retrieval.sources.into_iter().collect(),
                        generated: true,
                    },
                    // The answer explains the failure, so it cites nothing.
                    Err(e) => TurnOutcome {
                        answer: failure_message(e),
                        sources: Vec::new(),
                        generated: true,
                    },
                }
            }
        };

        self.history.push(ConversationTurn::assistant(
            outcome.answer.clone(),
            outcome.sources.clone(),
        ));
        Ok(outcome)
    }

    /// Replace the retriever, keeping the history. Used after the shared
    /// resources have been reloaded.
    pub fn set_retriever(&mut self, retriever: Retriever) {
        self.retriever = retriever;
    }

    /// Clear the conversation history.
    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Switch the model used for subsequent turns.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] for an empty model id.
    pub fn set_model(&mut self, model: &str) -> Result<()> {
        let model = model.trim();
        if model.is_empty() {
            return Err(RagError::ConfigError("model id must not be empty".to_string()));
        }
        if !AVAILABLE_MODELS.contains(&model) {
            warn!(model, "model is not in the list of known models");
        }
        self.model = model.to_string();
        Ok(())
    }

    /// The model used for the next turn.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// All turns so far, oldest first.
    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }
}
