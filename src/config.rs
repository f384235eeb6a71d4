use std::env;

pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://api.bing.microsoft.com/v7.0/search";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";
pub const DEFAULT_MAX_TOKENS: u32 = 8000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),

    #[error("{name} is not a valid number: {value}")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub api_key: ApiKey,
    pub endpoint: String,
}

impl SearchSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: required_key("BING_API_KEY")?,
            endpoint: optional_var("BING_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_SEARCH_ENDPOINT.to_string()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: ApiKey,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
}

impl LlmSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let max_tokens = match optional_var("LLM_MAX_TOKENS") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidNumber {
                name: "LLM_MAX_TOKENS",
                value,
            })?,
            None => DEFAULT_MAX_TOKENS,
        };
        Ok(Self {
            api_key: required_key("GROQ_API_KEY")?,
            base_url: optional_var("LLM_BASE_URL")
                .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            model: optional_var("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens,
        })
    }
}

fn required_key(name: &'static str) -> Result<ApiKey, ConfigError> {
    optional_var(name)
        .map(ApiKey::new)
        .ok_or(ConfigError::Missing(name))
}

/// Reads a variable, treating blank values as unset.
fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
