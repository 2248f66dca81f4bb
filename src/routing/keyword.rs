//! Deterministic keyword classifier.
//!
//! Lowercases the ticket text and counts catalog keywords that occur in it as plain
//! substrings. There is no tokenization or stemming, so a keyword embedded in a longer
//! word still counts as a hit.

use std::sync::Arc;

use crate::base::{
    catalog::Catalog,
    types::{ClassificationRequest, ClassificationResult, ClassificationSource, Priority},
};

/// Confidence reported when nothing matched.
pub const BASE_CONFIDENCE: f64 = 0.3;
/// Confidence added for each keyword hit in the winning department.
pub const CONFIDENCE_PER_HIT: f64 = 0.15;
/// Upper bound on local confidence.
pub const MAX_CONFIDENCE: f64 = 0.9;

/// Keyword classifier over a shared catalog.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    catalog: Arc<Catalog>,
}

impl KeywordClassifier {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Classify a request from its text alone.
    pub fn classify(&self, request: &ClassificationRequest) -> ClassificationResult {
        classify_locally(&self.catalog, request)
    }
}

/// Pick a department, priority, category and confidence for `request` using only `catalog`.
pub fn classify_locally(catalog: &Catalog, request: &ClassificationRequest) -> ClassificationResult {
    let text = format!("{} {}", request.title, request.description).to_lowercase();

    // Strictly greater wins, so the earliest rule keeps a tie.
    let mut best: Option<(usize, usize)> = None;

    for (index, rule) in catalog.departments().iter().enumerate() {
        let hits = count_hits(&text, &rule.keywords);

        if hits > 0 && best.is_none_or(|(_, best_hits)| hits > best_hits) {
            best = Some((index, hits));
        }
    }

    let (department, category, hits) = match best {
        Some((index, hits)) => {
            let rule = &catalog.departments()[index];
            (rule.name.clone(), rule.category.clone(), hits)
        }
        None => (catalog.default_department().to_string(), catalog.fallback_category().to_string(), 0),
    };

    ClassificationResult {
        department,
        priority: detect_priority(catalog, &text),
        category,
        confidence: confidence_for_hits(hits),
        source: ClassificationSource::Local,
    }
}

/// First tier (most urgent first) with any keyword in `text`; `medium` otherwise.
///
/// `text` must already be lowercased.
pub fn detect_priority(catalog: &Catalog, text: &str) -> Priority {
    catalog
        .priorities()
        .iter()
        .find(|rule| rule.keywords.iter().any(|keyword| text.contains(keyword.as_str())))
        .map(|rule| rule.level)
        .unwrap_or_default()
}

/// `0.3 + 0.15 * hits`, capped at `0.9`.
// TODO: recalibrate against labelled tickets once routing outcomes are recorded.
pub fn confidence_for_hits(hits: usize) -> f64 {
    if hits == 0 {
        return BASE_CONFIDENCE;
    }

    (BASE_CONFIDENCE + CONFIDENCE_PER_HIT * hits as f64).min(MAX_CONFIDENCE)
}

fn count_hits(text: &str, keywords: &[String]) -> usize {
    keywords.iter().filter(|keyword| text.contains(keyword.as_str())).count()
}

// Tests.
