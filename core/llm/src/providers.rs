use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use crate::{LanguageModel, LlmConfig, UsageMeter};

fn chat_messages(prompt: &str, system: Option<&str>) -> Vec<Value> {
    let mut messages = Vec::with_capacity(2);
    if let Some(sys) = system {
        messages.push(json!({"role": "system", "content": sys}));
    }
    messages.push(json!({"role": "user", "content": prompt}));
    messages
}

fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .context("failed to build HTTP client for LLM provider")
}

/// OpenAI chat-completions provider. Also serves Groq, which exposes the
/// same request shape under its own base URL.
pub struct OpenAiModel {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    meter: Arc<UsageMeter>,
}

impl OpenAiModel {
    pub fn new(config: LlmConfig, meter: Arc<UsageMeter>) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            base_url: config.base_url,
            api_key: config.api_key,
            model: config.model,
            meter,
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    async fn call(
        &self,
        prompt: &str,
        system: Option<&str>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String> {
        let url = format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        );

        let request_body = json!({
            "model": self.model,
            "messages": chat_messages(prompt, system),
            "temperature": temperature,
            "max_tokens": max_tokens,
        });

        debug!("Calling chat completions at {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .context("failed to call chat completions API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("chat completions API error {}: {}", status, error_text);
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("failed to parse chat completions response")?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow::anyhow!("empty response from chat completions API"))?;

        let content = content.trim().to_string();
        self.meter.record(
            prompt.len() + system.map_or(0, str::len),
            content.len(),
        );

        Ok(content)
    }
}

/// Azure OpenAI provider. Addresses a deployment rather than a model name
/// and authenticates with the `api-key` header.
pub struct AzureOpenAiModel {
    client: Client,
    endpoint: String,
    api_key: String,
    deployment: String,
    api_version: String,
    meter: Arc<UsageMeter>,
}

impl AzureOpenAiModel {
    pub fn new(config: LlmConfig, meter: Arc<UsageMeter>) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            endpoint: config.base_url,
            api_key: config.api_key,
            deployment: config.model,
            api_version: config.api_version,
            meter,
        })
    }
}

#[async_trait]
impl LanguageModel for AzureOpenAiModel {
    async fn call(
        &self,
        prompt: &str,
        system: Option<&str>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String> {
        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        );

        let request_body = json!({
            "messages": chat_messages(prompt, system),
            "temperature": temperature,
            "max_tokens": max_tokens,
        });

        debug!("Calling Azure OpenAI deployment {}", self.deployment);

        let response = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await
            .context("failed to call Azure OpenAI API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Azure OpenAI API error {}: {}", status, error_text);
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("failed to parse Azure OpenAI response")?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow::anyhow!("empty response from Azure OpenAI"))?;

        let content = content.trim().to_string();
        self.meter.record(
            prompt.len() + system.map_or(0, str::len),
            content.len(),
        );

        Ok(content)
    }
}

// Response structures

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}
