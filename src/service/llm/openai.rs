//! OpenAI implementation of the LLM client.
//!
//! Uses the Responses API with developer/user input items. Classification requests carry
//! a strict JSON schema whose `department` enum is built from the catalog, so the model
//! can only name departments the router knows about.

use std::sync::Arc;

use async_openai::{
    Client,
    config::OpenAIConfig,
    types::responses::{
        Content, CreateResponseArgs, Input, InputItem, InputMessageArgs, OutputContent, Response, ResponseFormatJsonSchema, Role, TextConfig, TextResponseFormat,
    },
};
use async_trait::async_trait;
use tracing::{info, instrument, warn};

use crate::base::{
    config::Config,
    types::{ClassificationContext, Res, SummaryContext},
};

use super::{GenericLlmClient, LlmClient};

// Extra methods on `LlmClient` applied by the openai implementation.

impl LlmClient {
    pub fn openai(api_key: &str, config: &Config) -> Self {
        let client = OpenAiLlmClient::new(api_key, config);
        Self { inner: Arc::new(client) }
    }
}

// Specific implementations.

/// OpenAI LLM client implementation.
#[derive(Clone)]
pub struct OpenAiLlmClient {
    client: Client<OpenAIConfig>,
    config: Config,
}

impl OpenAiLlmClient {
    /// Create a new OpenAI LLM client.
    #[instrument(name = "OpenAiLlmClient::new", skip_all)]
    pub fn new(api_key: &str, config: &Config) -> Self {
        let cfg = OpenAIConfig::new().with_api_key(api_key.to_string());

        Self {
            client: Client::with_config(cfg),
            config: config.clone(),
        }
    }

    /// Build the classification input.
    #[instrument(name = "OpenAiLlmClient::build_classification_input", skip_all)]
    fn build_classification_input(&self, context: &ClassificationContext) -> Res<Input> {
        Ok(Input::Items(vec![
            InputItem::Message(
                InputMessageArgs::default()
                    .role(Role::Developer)
                    .content(format!("## Department Catalog\n\n{}\n\n", context.department_listing))
                    .build()?,
            ),
            InputItem::Message(
                InputMessageArgs::default()
                    .role(Role::User)
                    .content(format!("# Ticket\n\n## Title\n\n{}\n\n## Description\n\n{}\n\n", context.title, context.description))
                    .build()?,
            ),
        ]))
    }

    /// Build the summary input.
    #[instrument(name = "OpenAiLlmClient::build_summary_input", skip_all)]
    fn build_summary_input(&self, context: &SummaryContext) -> Res<Input> {
        Ok(Input::Items(vec![InputItem::Message(
            InputMessageArgs::default()
                .role(Role::User)
                .content(format!("# Content To Summarize\n\n{}\n\n", context.content))
                .build()?,
        )]))
    }

    /// Prepare a request with the shared model settings.
    fn base_request(&self, instructions: &str, text: TextConfig, input: Input) -> CreateResponseArgs {
        let mut request = CreateResponseArgs::default();
        request
            .instructions(instructions.to_string())
            .max_output_tokens(self.config.openai_max_tokens)
            .model(&self.config.openai_model)
            .text(text)
            .input(input);

        // Add the temperature for the non-reasoning models.
        if self.config.openai_model.starts_with("gpt") {
            request.temperature(self.config.openai_temperature);
        }

        request
    }

    /// Send a single request; there are no retries.
    async fn call_openai_api(&self, request: CreateResponseArgs) -> Res<Response> {
        let request = request.build()?;

        let response = self
            .client
            .responses()
            .create(request)
            .await
            .map_err(|err| anyhow::anyhow!("OpenAI API call failed: {err}"))?;

        info!("OpenAI API call succeeded.");

        Ok(response)
    }
}

#[async_trait]
impl GenericLlmClient for OpenAiLlmClient {
    #[instrument(name = "OpenAiLlmClient::get_classification_response", skip_all)]
    async fn get_classification_response(&self, context: &ClassificationContext) -> Res<String> {
        let input = self.build_classification_input(context)?;
        let text_config = classification_text_config(&context.department_names);
        let request = self.base_request(&self.config.classification_directive, text_config, input);

        let response = self.call_openai_api(request).await?;

        Ok(parse_openai_response(&response)?.join(""))
    }

    #[instrument(name = "OpenAiLlmClient::get_summary_response", skip_all)]
    async fn get_summary_response(&self, context: &SummaryContext) -> Res<String> {
        let input = self.build_summary_input(context)?;
        let text_config = TextConfig { format: TextResponseFormat::Text };
        let request = self.base_request(&self.config.summary_directive, text_config, input);

        let response = self.call_openai_api(request).await?;

        Ok(parse_openai_response(&response)?.join("\n\n"))
    }
}

/// Collect the output text of an OpenAI response.
#[instrument(skip_all)]
pub fn parse_openai_response(response: &Response) -> Res<Vec<String>> {
    let mut result = Vec::new();

    info!("LLM response has {} outputs.", response.output.len());
    for output in &response.output {
        match output {
            OutputContent::Message(message) => {
                for message_content in &message.content {
                    match message_content {
                        Content::OutputText(text) => result.push(text.text.clone()),
                        Content::Refusal(reason) => {
                            return Err(anyhow::anyhow!("Request refused: {reason:#?}"));
                        }
                    }
                }
            }
            _ => {
                warn!("Unexpected output: {output:#?}");
            }
        }
    }

    if result.is_empty() {
        return Err(anyhow::anyhow!("LLM response contained no text."));
    }

    Ok(result)
}

/// Strict JSON schema for classification answers.
fn classification_text_config(department_names: &[String]) -> TextConfig {
    TextConfig {
        format: TextResponseFormat::JsonSchema(ResponseFormatJsonSchema {
            name: "TicketClassification".to_string(),
            description: Some("Routing decision for a helpdesk ticket.".to_string()),
            schema: Some(serde_json::json!({
                "type": "object",
                "properties": {
                    "department": { "type": "string", "enum": department_names },
                    "priority": { "type": "string", "enum": ["low", "medium", "high", "urgent"] },
                    "category": { "type": "string" },
                    "confidence": { "type": "number" }
                },
                "required": ["department", "priority", "category", "confidence"],
                "additionalProperties": false
            })),
            strict: Some(true),
        }),
    }
}

// Tests.
