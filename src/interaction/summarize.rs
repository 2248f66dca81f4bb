//! Ticket and conversation summaries, with a local digest when the LLM is unavailable.

use std::time::Duration;

use tokio::time::timeout;
use tracing::{info, instrument, warn};

use crate::{
    base::{
        config::Config,
        types::{ChatMessage, Res, SummaryContext, SummaryRequest},
    },
    service::llm::LlmClient,
};

/// Longest digest produced without the LLM.
pub const MAX_DIGEST_CHARS: usize = 200;

/// Summarizes tickets and conversations.
///
/// Uses the LLM when one is configured and falls back to a local digest otherwise.
#[derive(Clone)]
pub struct Summarizer {
    llm: Option<LlmClient>,
    timeout: Duration,
}

impl Summarizer {
    pub fn new(llm: Option<LlmClient>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    pub fn from_config(config: &Config, llm: Option<LlmClient>) -> Self {
        Self::new(llm, Duration::from_secs(config.summary_timeout_secs))
    }

    pub fn uses_llm(&self) -> bool {
        self.llm.is_some()
    }

    /// Summarize `request`. Never fails; LLM problems degrade to the local digest.
    #[instrument(skip_all)]
    pub async fn summarize(&self, request: &SummaryRequest) -> String {
        let Some(llm) = &self.llm else {
            return local_digest(request);
        };

        match self.summarize_remote(llm, request).await {
            Ok(summary) => summary,
            Err(err) => {
                warn!("LLM summary failed, using local digest: {err}");
                local_digest(request)
            }
        }
    }

    async fn summarize_remote(&self, llm: &LlmClient, request: &SummaryRequest) -> Res<String> {
        let context = SummaryContext { content: render(request) };

        let summary = timeout(self.timeout, llm.get_summary_response(&context))
            .await
            .map_err(|_| anyhow::anyhow!("LLM summary timed out after {:?}", self.timeout))??;

        let summary = summary.trim();

        if summary.is_empty() {
            return Err(anyhow::anyhow!("LLM returned an empty summary"));
        }

        info!("Summarized with the LLM.");

        Ok(summary.to_string())
    }
}

/// The text handed to the model.
fn render(request: &SummaryRequest) -> String {
    match request {
        SummaryRequest::Conversation { messages } => messages.iter().map(|m| format!("{}: {}", m.role, m.content.trim())).collect::<Vec<_>>().join("\n"),
        SummaryRequest::Ticket { title, description } => match title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(title) => format!("Title: {title}\n\nDescription: {}", description.trim()),
            None => format!("Description: {}", description.trim()),
        },
    }
}

/// Deterministic summary used when the LLM is unavailable.
pub fn local_digest(request: &SummaryRequest) -> String {
    match request {
        SummaryRequest::Conversation { messages } => conversation_digest(messages),
        SummaryRequest::Ticket { title, description } => {
            let text = match title.as_deref().map(str::trim) {
                Some(title) if !title.is_empty() => title,
                _ => first_sentence(description),
            };

            truncate(text, MAX_DIGEST_CHARS)
        }
    }
}

fn conversation_digest(messages: &[ChatMessage]) -> String {
    let count = match messages.len() {
        1 => "1 message".to_string(),
        n => format!("{n} messages"),
    };

    let digest = match messages.last() {
        Some(last) => format!("{count}. Last from {}: {}", last.role, last.content.trim()),
        None => format!("{count}."),
    };

    truncate(&digest, MAX_DIGEST_CHARS)
}

/// Text up to and including the first `.`, `!` or `?` that ends a sentence.
fn first_sentence(text: &str) -> &str {
    let text = text.trim();

    let mut chars = text.char_indices().peekable();

    while let Some((index, c)) = chars.next() {
        let ends_sentence = matches!(c, '.' | '!' | '?') && chars.peek().is_none_or(|(_, next)| next.is_whitespace());

        if ends_sentence {
            return &text[..index + c.len_utf8()];
        }
    }

    text
}

/// Cut `text` to at most `max` chars, marking the cut with `...`.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }

    let kept = text.chars().take(max.saturating_sub(3)).collect::<String>();

    format!("{}...", kept.trim_end())
}

// Tests.
