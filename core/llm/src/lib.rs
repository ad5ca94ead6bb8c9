use anyhow::{Context, Result};
use async_trait::async_trait;
use fraudgraph_schemas::UsageSnapshot;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

mod providers;

pub use providers::{AzureOpenAiModel, OpenAiModel};

/// Single-turn, stateless completion. Prompt in, text out; any transport or
/// provider failure comes back as an error for the caller's own degradation
/// path.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn call(
        &self,
        prompt: &str,
        system: Option<&str>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String>;
}

/// Running call count and rough token estimate for the session cost display.
/// Tokens are estimated at four characters each; close enough for a sidebar
/// figure, not billing.
#[derive(Debug, Default)]
pub struct UsageMeter {
    calls: AtomicU64,
    token_estimate: AtomicU64,
}

impl UsageMeter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record(&self, prompt_chars: usize, completion_chars: usize) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.token_estimate
            .fetch_add(((prompt_chars + completion_chars) / 4) as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot {
            llm_calls: self.calls.load(Ordering::Relaxed),
            token_estimate: self.token_estimate.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.calls.store(0, Ordering::Relaxed);
        self.token_estimate.store(0, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    AzureOpenAi,
    OpenAi,
    Groq,
}

/// Configuration for the language model provider
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: String,
    pub base_url: String,
    /// Model name, or deployment name for Azure.
    pub model: String,
    /// Azure only.
    pub api_version: String,
    pub timeout_secs: u64,
}

impl LlmConfig {
    /// Create config from environment variables. With no explicit
    /// `LLM_PROVIDER`, prefers Azure OpenAI, then Groq, matching the
    /// platform's provider ordering.
    pub fn from_env() -> Result<Self> {
        let provider = match std::env::var("LLM_PROVIDER").ok().as_deref() {
            Some("azure") => LlmProvider::AzureOpenAi,
            Some("openai") => LlmProvider::OpenAi,
            Some("groq") => LlmProvider::Groq,
            Some(other) => anyhow::bail!("unknown LLM_PROVIDER: {}", other),
            None => {
                if std::env::var("AZURE_OPENAI_API_KEY").is_ok() {
                    LlmProvider::AzureOpenAi
                } else {
                    LlmProvider::Groq
                }
            }
        };

        let config = match provider {
            LlmProvider::AzureOpenAi => Self {
                provider,
                api_key: std::env::var("AZURE_OPENAI_API_KEY")
                    .context("AZURE_OPENAI_API_KEY required for Azure OpenAI provider")?,
                base_url: std::env::var("AZURE_OPENAI_ENDPOINT")
                    .context("AZURE_OPENAI_ENDPOINT required for Azure OpenAI provider")?,
                model: std::env::var("AZURE_OPENAI_DEPLOYMENT")
                    .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
                api_version: std::env::var("AZURE_OPENAI_API_VERSION")
                    .unwrap_or_else(|_| "2024-12-01-preview".to_string()),
                timeout_secs: 60,
            },
            LlmProvider::OpenAi => Self {
                provider,
                api_key: std::env::var("OPENAI_API_KEY")
                    .context("OPENAI_API_KEY required for OpenAI provider")?,
                base_url: std::env::var("OPENAI_BASE_URL")
                    .unwrap_or_else(|_| "https://api.openai.com".to_string()),
                model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
                api_version: String::new(),
                timeout_secs: 60,
            },
            LlmProvider::Groq => Self {
                provider,
                api_key: std::env::var("GROQ_API_KEY")
                    .context("GROQ_API_KEY required for Groq provider")?,
                base_url: std::env::var("GROQ_BASE_URL")
                    .unwrap_or_else(|_| "https://api.groq.com/openai".to_string()),
                model: std::env::var("GROQ_MODEL")
                    .unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string()),
                api_version: String::new(),
                timeout_secs: 60,
            },
        };

        Ok(config)
    }

    pub fn provider_name(&self) -> &'static str {
        match self.provider {
            LlmProvider::AzureOpenAi => "azure_openai",
            LlmProvider::OpenAi => "openai",
            LlmProvider::Groq => "groq",
        }
    }

    /// Build the provider client, wired to the given usage meter.
    pub fn build(self, meter: Arc<UsageMeter>) -> Result<Arc<dyn LanguageModel>> {
        let model: Arc<dyn LanguageModel> = match self.provider {
            LlmProvider::AzureOpenAi => Arc::new(AzureOpenAiModel::new(self, meter)?),
            LlmProvider::OpenAi | LlmProvider::Groq => Arc::new(OpenAiModel::new(self, meter)?),
        };
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_meter_accumulates() {
        let meter = UsageMeter::new();
        meter.record(400, 100);
        meter.record(200, 60);

        let snapshot = meter.snapshot();
        assert_eq!(snapshot.llm_calls, 2);
        assert_eq!(snapshot.token_estimate, 125 + 65);

        meter.reset();
        assert_eq!(meter.snapshot().llm_calls, 0);
    }

    #[test]
    fn test_explicit_provider_selection() {
        std::env::set_var("LLM_PROVIDER", "groq");
        std::env::set_var("GROQ_API_KEY", "gsk_test_key_0123456789");

        let config = LlmConfig::from_env().unwrap();
        assert_eq!(config.provider, LlmProvider::Groq);
        assert_eq!(config.provider_name(), "groq");
        assert!(config.base_url.contains("groq"));

        std::env::remove_var("LLM_PROVIDER");
        std::env::remove_var("GROQ_API_KEY");
    }
}
