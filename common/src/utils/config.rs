use std::fmt;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Runtime configuration, read once at startup from an optional `config.*`
/// file overlaid with environment variables. Required values without a
/// default fail deserialization, which aborts startup with the offending
/// key in the diagnostic.
#[derive(Clone, Deserialize)]
pub struct AppConfig {
    pub telegram_token: String,
    pub openai_api_key: String,
    /// Base URL the document references are resolved against. Must end
    /// with a trailing slash for relative joins to behave.
    pub docs_base_url: String,
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_query_model")]
    pub query_model: String,
    #[serde(default = "default_manifest_file")]
    pub manifest_file: String,
    /// Static document list used when the remote manifest is unavailable.
    #[serde(default)]
    pub documents: Vec<String>,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_query_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_manifest_file() -> String {
    "listado.txt".to_string()
}

fn default_http_port() -> u16 {
    3000
}

fn default_max_output_tokens() -> u32 {
    512
}

fn default_temperature() -> f32 {
    0.2
}

// Credentials must never end up in logs, so Debug redacts them.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("telegram_token", &"<redacted>")
            .field("openai_api_key", &"<redacted>")
            .field("docs_base_url", &self.docs_base_url)
            .field("openai_base_url", &self.openai_base_url)
            .field("query_model", &self.query_model)
            .field("manifest_file", &self.manifest_file)
            .field("documents", &self.documents)
            .field("http_port", &self.http_port)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}
