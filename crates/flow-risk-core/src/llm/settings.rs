/// Model used when no identifier is configured.
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
/// Value of the `anthropic-version` header when none is configured.
pub const DEFAULT_API_VERSION: &str = "2023-06-01";
/// Reply size cap sent with every request.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com";

/// Connection settings for the model API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmSettings {
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
    pub api_version: String,
    pub max_tokens: u32,
}

impl LlmSettings {
    /// Settings with every optional value at its default.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}
