//! OpenAI chat completions as a [`TextGenerator`].
//!
//! Works against the OpenAI API and any server exposing the same
//! `/v1/chat/completions` endpoint (Ollama, vLLM, llama.cpp server), which is
//! how a locally hosted model is plugged in.

use std::time::Instant;

use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use docqa_rag::TextGenerator;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{ModelError, Result};

/// Default sampling temperature; answers are extracted, not composed.
pub const DEFAULT_TEMPERATURE: f32 = 0.0;

/// Settings for [`OpenAIChatModel`].
///
/// The API key is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIChatConfig {
    /// API key; may be empty for local servers that do not check it.
    #[serde(skip_serializing, default)]
    pub api_key: String,
    /// Model name, e.g. `gpt-4o-mini` or `llama3.1:8b`.
    pub model: String,
    /// Base URL override for OpenAI-compatible servers.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Sampling temperature.
    #[serde(default)]
    pub temperature: f32,
    /// Completion token limit.
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Optional system message sent before the prompt.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl OpenAIChatConfig {
    /// Config for the hosted OpenAI API.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
            system_prompt: None,
        }
    }

    /// Config for an OpenAI-compatible server at `base_url`.
    pub fn compatible(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self { base_url: Some(base_url.into()), ..Self::new(api_key, model) }
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the completion token limit.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set a system message.
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }
}

/// A chat-completions model behind the single `generate(prompt)` call.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_model::{OpenAIChatConfig, OpenAIChatModel};
///
/// let model = OpenAIChatModel::new(OpenAIChatConfig::new(
///     std::env::var("OPENAI_API_KEY")?,
///     "gpt-4o-mini",
/// ))?;
/// let text = model.generate("Say hello").await?;
/// ```
pub struct OpenAIChatModel {
    client: Client<OpenAIConfig>,
    config: OpenAIChatConfig,
}

impl OpenAIChatModel {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidConfig`] if the model name is empty or the
    /// temperature lies outside `0.0..=2.0`, and
    /// [`ModelError::ModelUnavailable`] if the hosted API is targeted without a key.
    pub fn new(config: OpenAIChatConfig) -> Result<Self> {
        if config.model.trim().is_empty() {
            return Err(ModelError::InvalidConfig("model name must not be empty".to_string()));
        }
        if !(0.0..=2.0).contains(&config.temperature) {
            return Err(ModelError::InvalidConfig(format!(
                "temperature must be within 0.0..=2.0, got {}",
                config.temperature
            )));
        }
        if config.base_url.is_none() && config.api_key.trim().is_empty() {
            return Err(ModelError::ModelUnavailable {
                model: config.model.clone(),
                message: "OpenAI API key is empty".to_string(),
            });
        }

        let mut openai_config = OpenAIConfig::new().with_api_key(&config.api_key);
        if let Some(base_url) = &config.base_url {
            openai_config = openai_config.with_api_base(base_url);
        }

        Ok(Self { client: Client::with_config(openai_config), config })
    }

    /// Create a client for an OpenAI-compatible server.
    pub fn compatible(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        Self::new(OpenAIChatConfig::compatible(api_key, base_url, model))
    }

    /// The active configuration.
    pub fn config(&self) -> &OpenAIChatConfig {
        &self.config
    }

    fn messages(&self, prompt: &str) -> std::result::Result<Vec<ChatCompletionRequestMessage>, OpenAIError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.config.system_prompt {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default().content(system.as_str()).build()?.into(),
            );
        }
        messages.push(ChatCompletionRequestUserMessageArgs::default().content(prompt).build()?.into());
        Ok(messages)
    }

    fn map_error(&self, err: OpenAIError) -> ModelError {
        let model = self.config.model.clone();
        match err {
            OpenAIError::Reqwest(e) => ModelError::ModelUnavailable { model, message: e.to_string() },
            other => ModelError::Inference { model, message: other.to_string() },
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAIChatModel {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, prompt: &str) -> docqa_rag::Result<String> {
        let started = Instant::now();

        let messages = self.messages(prompt).map_err(|e| self.map_error(e))?;
        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(&self.config.model).messages(messages).temperature(self.config.temperature);
        if let Some(max_tokens) = self.config.max_tokens {
            builder.max_completion_tokens(max_tokens);
        }
        let request = builder.build().map_err(|e| self.map_error(e))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            error!(model = %self.config.model, error = %e, "chat completion failed");
            self.map_error(e)
        })?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ModelError::Inference {
                model: self.config.model.clone(),
                message: "response contained no content".to_string(),
            })?;

        debug!(
            model = %self.config.model,
            completion_chars = text.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "chat completion received"
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hosted_api_requires_key() {
        let err = OpenAIChatModel::new(OpenAIChatConfig::new("", "gpt-4o-mini")).err().unwrap();
        assert!(matches!(err, ModelError::ModelUnavailable { .. }));
    }

    #[test]
    fn test_compatible_server_allows_empty_key() {
        let model = OpenAIChatModel::compatible("", "http://localhost:11434/v1", "llama3.1:8b").unwrap();
        assert_eq!(model.name(), "llama3.1:8b");
        assert_eq!(model.config().base_url.as_deref(), Some("http://localhost:11434/v1"));
    }

    #[test]
    fn test_rejects_invalid_settings() {
        assert!(OpenAIChatModel::new(OpenAIChatConfig::new("sk-test", " ")).is_err());
        assert!(
            OpenAIChatModel::new(OpenAIChatConfig::new("sk-test", "gpt-4o").with_temperature(3.5))
                .is_err()
        );
    }

    #[test]
    fn test_messages_include_system_prompt() {
        let model = OpenAIChatModel::new(
            OpenAIChatConfig::new("sk-test", "gpt-4o-mini").with_system_prompt("Be brief."),
        )
        .unwrap();
        assert_eq!(model.messages("What is the fee?").unwrap().len(), 2);
    }

    #[test]
    fn test_config_serialization_omits_key() {
        let config = OpenAIChatConfig::new("sk-secret", "gpt-4o-mini").with_max_tokens(256);
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));

        let restored: OpenAIChatConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.api_key, "");
        assert_eq!(restored.max_tokens, Some(256));
    }
}
