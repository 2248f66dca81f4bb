//! Library root for `helpdesk-router`.
//!
//! Helpdesk-router routes university helpdesk tickets:
//! - Classifies each ticket into a department, priority and category
//! - Uses an LLM when one is configured, with keyword scoring as the guaranteed fallback
//! - Assigns tickets to the least-loaded eligible staff member of the department
//! - Summarizes tickets and conversations
//!
//! The router exposes a JSON HTTP API (axum), keeps tickets and staff in SurrealDB,
//! and talks to OpenAI for AI classification. The architecture is built around
//! extensible traits that allow for different implementations of each service.

pub mod base;
pub mod interaction;
pub mod routing;
pub mod runtime;
pub mod service;

use std::sync::Arc;

use base::{
    config::Config,
    types::{ClassificationRequest, ClassificationResult, Res, SummaryRequest, Void},
};
use interaction::summarize::Summarizer;
use routing::classify::Classifier;
use rustls::crypto;
use service::llm::LlmClient;
use tracing::{debug, info};

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the helpdesk router:
/// - Initializes the crypto provider
/// - Creates the runtime context with store, LLM, and routing services
/// - Serves the HTTP API until shutdown
pub async fn start(config: Config) -> Void {
    info!("Starting helpdesk-router ...");

    install_crypto_provider();

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}

/// Classify a single request without touching the store.
pub async fn classify_once(config: Config, request: ClassificationRequest) -> Res<ClassificationResult> {
    install_crypto_provider();

    let catalog = Arc::new(runtime::load_catalog(&config)?);
    let classifier = Classifier::from_config(&config, catalog, LlmClient::from_config(&config));

    Ok(classifier.classify(&request).await)
}

/// Summarize a single request without touching the store.
pub async fn summarize_once(config: Config, request: SummaryRequest) -> Res<String> {
    install_crypto_provider();

    let summarizer = Summarizer::from_config(&config, LlmClient::from_config(&config));

    Ok(summarizer.summarize(&request).await)
}

fn install_crypto_provider() {
    if crypto::ring::default_provider().install_default().is_err() {
        debug!("Crypto provider already installed.");
    }
}
