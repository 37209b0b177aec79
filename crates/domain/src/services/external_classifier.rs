//! Optional external prompt classifier.
//!
//! Consulted only when rule-based classification finds nothing relevant.
//! Every answer is advisory: callers fall back to the rule result on error.

use std::time::Duration;
use thiserror::Error;

use crate::models::PromptClassification;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("External classifier is disabled")]
    Disabled,

    #[error("External classifier timed out after {0}ms")]
    Timeout(u64),

    #[error("External classifier rate limited")]
    RateLimited,

    #[error("External classifier unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed classifier response: {0}")]
    Malformed(String),
}

/// External classification collaborator.
#[async_trait::async_trait]
pub trait ExternalClassifier: Send + Sync {
    /// Classify a prompt. Focus hints must already be restricted to known types.
    async fn classify(&self, prompt: &str) -> Result<PromptClassification, ClassifierError>;
}

/// Mock classifier for development and testing.
#[derive(Debug, Clone, Default)]
pub struct MockExternalClassifier {
    /// Answer returned on success; `None` simulates an unreachable service.
    pub answer: Option<PromptClassification>,
    /// Delay before answering.
    pub delay: Option<Duration>,
}

impl MockExternalClassifier {
    /// A classifier that always returns `answer`.
    pub fn returning(answer: PromptClassification) -> Self {
        Self {
            answer: Some(answer),
            delay: None,
        }
    }

    /// A classifier that always fails.
    pub fn failing() -> Self {
        Self {
            answer: None,
            delay: None,
        }
    }

    /// Delay every answer.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait::async_trait]
impl ExternalClassifier for MockExternalClassifier {
    async fn classify(&self, prompt: &str) -> Result<PromptClassification, ClassifierError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.answer {
            Some(answer) => {
                tracing::debug!(prompt = %prompt, "Mock classifier answering");
                Ok(answer.clone())
            }
            None => {
                tracing::warn!(prompt = %prompt, "Mock classifier simulating failure");
                Err(ClassifierError::Unavailable("Simulated failure".to_string()))
            }
        }
    }
}
