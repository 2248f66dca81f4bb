pub mod openai;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::{
    config::Config,
    types::{ClassificationContext, Res, SummaryContext},
};

// Traits.

/// Generic LLM client trait that clients must implement.
///
/// This trait defines the core functionality for interacting with large language models.
/// Implementing this trait allows different LLM providers to be used for routing.
/// Implementations make exactly one request per call; callers own timeouts and fallbacks.
#[async_trait]
pub trait GenericLlmClient: Send + Sync + 'static {
    /// Ask the model to classify a ticket.
    ///
    /// Returns the raw text of the model's answer, which should be a JSON object with
    /// `department`, `priority`, `category` and `confidence`.
    async fn get_classification_response(&self, context: &ClassificationContext) -> Res<String>;

    /// Ask the model for a short plain-text summary.
    async fn get_summary_response(&self, context: &SummaryContext) -> Res<String>;
}

// Structs.

/// LLM client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct LlmClient {
    inner: Arc<dyn GenericLlmClient>,
}

impl Deref for LlmClient {
    type Target = dyn GenericLlmClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl LlmClient {
    pub fn new(inner: Arc<dyn GenericLlmClient>) -> Self {
        Self { inner }
    }

    /// Build the configured LLM client, or `None` when no credential is set.
    pub fn from_config(config: &Config) -> Option<Self> {
        let api_key = config.openai_api_key()?;

        Some(Self::openai(api_key, config))
    }
}
