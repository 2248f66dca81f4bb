//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, path::PathBuf, sync::Arc};

use serde::Deserialize;

use crate::{base::prompts, routing::assign::AssignmentStrategy};

use super::types::{Res, Void};

/// Default OpenAI model to use.
fn default_openai_model() -> String {
    "gpt-4.1-mini".to_string()
}

/// Default sampling temperature; classification should be deterministic.
fn default_openai_temperature() -> f32 {
    0.0
}

/// Default max output tokens for OpenAI model.
fn default_openai_max_tokens() -> u32 {
    1024
}

/// Default bound on a single classification call.
fn default_classification_timeout_secs() -> u64 {
    8
}

/// Default bound on a single summarization call.
fn default_summary_timeout_secs() -> u64 {
    30
}

/// Default system directive for the classification model.
fn default_classification_directive() -> String {
    prompts::CLASSIFICATION_DIRECTIVE.to_string()
}

/// Default system directive for the summarization model.
fn default_summary_directive() -> String {
    prompts::SUMMARY_DIRECTIVE.to_string()
}

/// Default store endpoint (embedded in-memory SurrealDB).
fn default_db_endpoint() -> String {
    "mem://".to_string()
}

fn default_db_namespace() -> String {
    "helpdesk".to_string()
}

fn default_db_database() -> String {
    "routing".to_string()
}

fn default_listen_address() -> String {
    "127.0.0.1:8080".to_string()
}

/// Configuration for the helpdesk router.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl From<ConfigInner> for Config {
    fn from(inner: ConfigInner) -> Self {
        Self { inner: Arc::new(inner) }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConfigInner {
    /// OpenAI API key (`HELPDESK_OPENAI_API_KEY`).
    /// When absent, classification and summaries run locally only.
    #[serde(default)]
    pub openai_api_key: Option<String>,
    /// OpenAI model to use (`HELPDESK_OPENAI_MODEL`).
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    /// Sampling temperature (`HELPDESK_OPENAI_TEMPERATURE`).
    /// Value between 0 and 2. Only sent to `gpt` models.
    #[serde(default = "default_openai_temperature")]
    pub openai_temperature: f32,
    /// Max output tokens for OpenAI model (`HELPDESK_OPENAI_MAX_TOKENS`).
    #[serde(default = "default_openai_max_tokens")]
    pub openai_max_tokens: u32,
    /// Seconds before a classification call is abandoned (`HELPDESK_CLASSIFICATION_TIMEOUT_SECS`).
    #[serde(default = "default_classification_timeout_secs")]
    pub classification_timeout_secs: u64,
    /// Seconds before a summarization call is abandoned (`HELPDESK_SUMMARY_TIMEOUT_SECS`).
    #[serde(default = "default_summary_timeout_secs")]
    pub summary_timeout_secs: u64,
    /// Optional custom classification directive (`HELPDESK_CLASSIFICATION_DIRECTIVE`).
    #[serde(default = "default_classification_directive")]
    pub classification_directive: String,
    /// Optional custom summarization directive (`HELPDESK_SUMMARY_DIRECTIVE`).
    #[serde(default = "default_summary_directive")]
    pub summary_directive: String,
    /// Path to a routing catalog; the built-in catalog is used when unset (`HELPDESK_CATALOG_PATH`).
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
    /// Overrides the catalog's default department (`HELPDESK_DEFAULT_DEPARTMENT`).
    #[serde(default)]
    pub default_department: Option<String>,
    /// How tickets are handed to staff (`HELPDESK_ASSIGNMENT_STRATEGY`).
    #[serde(default)]
    pub assignment_strategy: AssignmentStrategy,
    /// Store endpoint: `mem://`, `ws://…`, `wss://…`, or `memory` for the in-process store (`HELPDESK_DB_ENDPOINT`).
    #[serde(default = "default_db_endpoint")]
    pub db_endpoint: String,
    /// Database namespace (`HELPDESK_DB_NAMESPACE`).
    #[serde(default = "default_db_namespace")]
    pub db_namespace: String,
    /// Database name (`HELPDESK_DB_DATABASE`).
    #[serde(default = "default_db_database")]
    pub db_database: String,
    /// Database username (`HELPDESK_DB_USERNAME`).
    #[serde(default)]
    pub db_username: Option<String>,
    /// Database password (`HELPDESK_DB_PASSWORD`).
    #[serde(default)]
    pub db_password: Option<String>,
    /// Address the HTTP API binds to (`HELPDESK_LISTEN_ADDRESS`).
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
}

impl Default for ConfigInner {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_model: default_openai_model(),
            openai_temperature: default_openai_temperature(),
            openai_max_tokens: default_openai_max_tokens(),
            classification_timeout_secs: default_classification_timeout_secs(),
            summary_timeout_secs: default_summary_timeout_secs(),
            classification_directive: default_classification_directive(),
            summary_directive: default_summary_directive(),
            catalog_path: None,
            default_department: None,
            assignment_strategy: AssignmentStrategy::default(),
            db_endpoint: default_db_endpoint(),
            db_namespace: default_db_namespace(),
            db_database: default_db_database(),
            db_username: None,
            db_password: None,
            listen_address: default_listen_address(),
        }
    }
}

impl Config {
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("HELPDESK"));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        result.validate()?;

        Ok(result)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Void {
        if self.openai_temperature < 0.0 || self.openai_temperature > 2.0 {
            return Err(anyhow::anyhow!("OpenAI temperature must be between 0 and 2."));
        }

        if self.openai_max_tokens < 1 || self.openai_max_tokens > 128000 {
            return Err(anyhow::anyhow!("OpenAI max tokens must be between 1 and 128000."));
        }

        if self.classification_timeout_secs == 0 {
            return Err(anyhow::anyhow!("Classification timeout must be at least one second."));
        }

        if self.summary_timeout_secs == 0 {
            return Err(anyhow::anyhow!("Summary timeout must be at least one second."));
        }

        Ok(())
    }

    /// The OpenAI key, if one is configured and non-blank.
    pub fn openai_api_key(&self) -> Option<&str> {
        self.openai_api_key.as_deref().map(str::trim).filter(|key| !key.is_empty())
    }
}

// Tests.
