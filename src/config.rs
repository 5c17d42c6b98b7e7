//! Environment-driven configuration.

use derive_getters::Getters;
use tracing::{debug, info, instrument, warn};

use crate::llm_client::{LlmConfig, LlmProvider};

/// Default OpenAI model for move suggestions.
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Default Anthropic model for move suggestions.
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-20241022";

/// The reply is a single digit, so the budget stays small.
const DEFAULT_MAX_TOKENS: u32 = 16;

/// Settings for the AI move provider, resolved from the environment.
///
/// A missing API key is not an error here: the provider treats it as
/// "remote capability unavailable" and falls back without a remote attempt.
#[derive(Debug, Clone, Getters)]
pub struct AiSettings {
    /// Which provider to call.
    provider: LlmProvider,
    /// API key, when present in the environment.
    api_key: Option<String>,
    /// Model name.
    model: String,
    /// Maximum tokens for the completion.
    max_tokens: u32,
}

impl AiSettings {
    /// Resolves settings from the environment (and `.env` when present).
    ///
    /// `LLM_PROVIDER` selects `openai` (default) or `anthropic`; the key is
    /// read from `OPENAI_API_KEY` or `ANTHROPIC_API_KEY` accordingly, the
    /// model from `LLM_MODEL`, the token budget from `LLM_MAX_TOKENS`.
    #[instrument]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let provider = match std::env::var("LLM_PROVIDER").as_deref() {
            Ok("anthropic") => LlmProvider::Anthropic,
            Ok("openai") | Err(_) => LlmProvider::OpenAI,
            Ok(other) => {
                warn!(provider = %other, "Unknown LLM_PROVIDER, defaulting to openai");
                LlmProvider::OpenAI
            }
        };

        let key_var = match provider {
            LlmProvider::OpenAI => "OPENAI_API_KEY",
            LlmProvider::Anthropic => "ANTHROPIC_API_KEY",
        };
        let api_key = std::env::var(key_var).ok();
        if api_key.is_none() {
            warn!(key_var, "API key not set, AI provider will run fallback-only");
        }

        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| {
            match provider {
                LlmProvider::OpenAI => DEFAULT_OPENAI_MODEL,
                LlmProvider::Anthropic => DEFAULT_ANTHROPIC_MODEL,
            }
            .to_string()
        });

        let max_tokens = std::env::var("LLM_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);

        info!(provider = ?provider, model = %model, has_key = api_key.is_some(), "AI settings resolved");
        Self {
            provider,
            api_key,
            model,
            max_tokens,
        }
    }

    /// Creates settings directly; used by tests and embedding callers.
    pub fn new(
        provider: LlmProvider,
        api_key: Option<String>,
        model: String,
        max_tokens: u32,
    ) -> Self {
        Self {
            provider,
            api_key,
            model,
            max_tokens,
        }
    }

    /// Builds an [`LlmConfig`] when credentials are available.
    #[instrument(skip(self), fields(provider = ?self.provider, model = %self.model))]
    pub fn to_llm_config(&self) -> Option<LlmConfig> {
        debug!("Building LLM config");
        self.api_key.as_ref().map(|key| {
            LlmConfig::new(
                self.provider,
                key.clone(),
                self.model.clone(),
                self.max_tokens,
            )
        })
    }
}

/// Resolves the sqlite database path from `DATABASE_URL`.
#[instrument]
pub fn database_url() -> String {
    dotenvy::dotenv().ok();
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "tictactoe.db".to_string())
}
