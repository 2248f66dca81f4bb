//! Runtime services and shared state for the helpdesk router.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::{
    base::{
        catalog::Catalog,
        config::Config,
        types::{Res, Void},
    },
    interaction::summarize::Summarizer,
    routing::{assign::AutoAssigner, classify::Classifier},
    service::{api, llm::LlmClient, store::StoreClient},
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the configuration, catalog, store and LLM clients, and the
/// routing services built on them. It is designed to be trivially cloneable,
/// allowing it to be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The routing catalog.
    pub catalog: Arc<Catalog>,
    /// The store client instance.
    pub store: StoreClient,
    /// The LLM client instance, when a credential is configured.
    pub llm: Option<LlmClient>,
    /// Classification pipeline.
    pub classifier: Classifier,
    /// Auto-assigner.
    pub assigner: AutoAssigner,
    /// Summarizer.
    pub summarizer: Summarizer,
}

impl Runtime {
    /// Create a new runtime instance.
    #[instrument(skip_all)]
    pub async fn new(config: Config) -> Res<Self> {
        // Initialize the store.
        let store = StoreClient::from_config(&config).await?;

        // Initialize the LLM client.
        let llm = LlmClient::from_config(&config);

        Self::with_services(config, store, llm)
    }

    /// Create a runtime around already-constructed clients.
    pub fn with_services(config: Config, store: StoreClient, llm: Option<LlmClient>) -> Res<Self> {
        let catalog = Arc::new(load_catalog(&config)?);

        let classifier = Classifier::from_config(&config, catalog.clone(), llm.clone());
        let assigner = AutoAssigner::new(store.clone(), config.assignment_strategy);
        let summarizer = Summarizer::from_config(&config, llm.clone());

        info!("Runtime ready with {} departments and `{:?}` assignment.", catalog.departments().len(), assigner.strategy());

        Ok(Self {
            config,
            catalog,
            store,
            llm,
            classifier,
            assigner,
            summarizer,
        })
    }

    pub async fn start(&self) -> Void {
        api::serve(self.clone()).await
    }
}

/// Load the configured catalog and apply the default-department override.
pub fn load_catalog(config: &Config) -> Res<Catalog> {
    let mut catalog = Catalog::load(config.catalog_path.as_deref())?;

    if let Some(department) = &config.default_department {
        catalog.set_default_department(department)?;
    }

    Ok(catalog)
}

// Tests.
