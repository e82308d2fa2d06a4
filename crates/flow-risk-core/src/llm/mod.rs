mod anthropic;
mod settings;

use anyhow::Result;
use async_trait::async_trait;

pub use anthropic::AnthropicClient;
pub use settings::{
    LlmSettings, DEFAULT_API_VERSION, DEFAULT_ENDPOINT, DEFAULT_MAX_TOKENS, DEFAULT_MODEL,
};

/// Client abstraction for sending a single prompt to a language model.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send `prompt` as one user message and return the reply text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
