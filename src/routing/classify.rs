//! Classification pipeline.
//!
//! The keyword classifier always runs first and its result is the guaranteed answer.
//! Override strategies (currently the LLM) are tried in order; the first one that
//! produces a result wins, and any strategy that abstains or fails is skipped.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::{
    base::{
        catalog::Catalog,
        config::Config,
        types::{ClassificationContext, ClassificationRequest, ClassificationResult, ClassificationSource, LlmClassification, Priority, Res},
    },
    routing::keyword::KeywordClassifier,
    service::llm::LlmClient,
};

// Traits.

/// A way of classifying a request that may decline to answer.
#[async_trait]
pub trait ClassificationStrategy: Send + Sync + 'static {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Classify `request`.
    ///
    /// `Ok(None)` means the strategy abstains; `Err` means it tried and failed.
    /// Either way the pipeline moves on to the next strategy.
    async fn classify(&self, request: &ClassificationRequest) -> Res<Option<ClassificationResult>>;
}

// Structs.

/// Classifier for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Classifier {
    fallback: KeywordClassifier,
    strategies: Vec<Arc<dyn ClassificationStrategy>>,
}

impl Classifier {
    /// A classifier that only uses the keyword tables.
    pub fn local(catalog: Arc<Catalog>) -> Self {
        Self {
            fallback: KeywordClassifier::new(catalog),
            strategies: Vec::new(),
        }
    }

    /// The keyword classifier, with the LLM in front of it when one is configured.
    pub fn from_config(config: &Config, catalog: Arc<Catalog>, llm: Option<LlmClient>) -> Self {
        let classifier = Self::local(catalog.clone());

        match llm {
            Some(llm) => {
                info!("AI classification enabled with model `{}`.", config.openai_model);
                classifier.with_strategy(LlmStrategy::new(llm, catalog, Duration::from_secs(config.classification_timeout_secs)))
            }
            None => {
                info!("No LLM credential configured; classification is local-only.");
                classifier
            }
        }
    }

    /// Append an override strategy; earlier strategies take precedence.
    pub fn with_strategy(mut self, strategy: impl ClassificationStrategy) -> Self {
        self.strategies.push(Arc::new(strategy));
        self
    }

    pub fn has_overrides(&self) -> bool {
        !self.strategies.is_empty()
    }

    pub fn catalog(&self) -> &Catalog {
        self.fallback.catalog()
    }

    /// Classify a request. Never fails: the keyword result is returned when no override succeeds.
    #[instrument(skip_all)]
    pub async fn classify(&self, request: &ClassificationRequest) -> ClassificationResult {
        let fallback = self.fallback.classify(request);

        for strategy in &self.strategies {
            match strategy.classify(request).await {
                Ok(Some(result)) => {
                    info!("Classified by `{}` as `{}` ({}).", strategy.name(), result.department, result.priority);
                    return result;
                }
                Ok(None) => debug!("Strategy `{}` abstained.", strategy.name()),
                Err(err) => warn!("Strategy `{}` failed, falling back: {err}", strategy.name()),
            }
        }

        info!("Classified locally as `{}` ({}).", fallback.department, fallback.priority);

        fallback
    }
}

/// Classification by a single LLM call, validated against the catalog.
pub struct LlmStrategy {
    llm: LlmClient,
    catalog: Arc<Catalog>,
    timeout: Duration,
}

impl LlmStrategy {
    pub fn new(llm: LlmClient, catalog: Arc<Catalog>, timeout: Duration) -> Self {
        Self { llm, catalog, timeout }
    }
}

#[async_trait]
impl ClassificationStrategy for LlmStrategy {
    fn name(&self) -> &'static str {
        "llm"
    }

    #[instrument(name = "LlmStrategy::classify", skip_all)]
    async fn classify(&self, request: &ClassificationRequest) -> Res<Option<ClassificationResult>> {
        if request.is_blank() {
            return Ok(None);
        }

        let context = ClassificationContext {
            title: request.title.clone(),
            description: request.description.clone(),
            department_names: self.catalog.department_names(),
            department_listing: self.catalog.prompt_listing(),
        };

        let raw = timeout(self.timeout, self.llm.get_classification_response(&context))
            .await
            .map_err(|_| anyhow::anyhow!("LLM classification timed out after {:?}", self.timeout))??;

        let result = validate_llm_classification(&self.catalog, &raw)?;

        Ok(Some(result))
    }
}

/// Parse a model answer and check it against the catalog.
pub fn validate_llm_classification(catalog: &Catalog, raw: &str) -> Res<ClassificationResult> {
    let parsed: LlmClassification = serde_json::from_str(strip_code_fence(raw))?;

    let rule = catalog
        .department(&parsed.department)
        .ok_or_else(|| anyhow::anyhow!("LLM returned unknown department `{}`", parsed.department))?;

    let priority: Priority = parsed.priority.parse()?;

    let category = match parsed.category.trim() {
        "" => rule.category.clone(),
        category => category.to_string(),
    };

    Ok(ClassificationResult {
        department: rule.name.clone(),
        priority,
        category,
        confidence: parsed.confidence.clamp(0.0, 1.0),
        source: ClassificationSource::Ai,
    })
}

/// Unwrap a Markdown code fence (with or without a language tag) if the text is one.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();

    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let body = body.strip_suffix("```").unwrap_or(body);

    // Drop the info string, e.g. `json`.
    match body.split_once('\n') {
        Some((info, rest)) if !info.trim_start().starts_with('{') => rest.trim(),
        _ => body.trim(),
    }
}

// Tests.
