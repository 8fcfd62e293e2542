use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::app_config::{LLMProvider, LlmConfig};
use crate::errors::GenerationError;
use crate::prompts::SYSTEM_PROMPT;

/// Anything that turns a prompt into generated text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

// Chat-completion response, shared by Azure OpenAI and OpenAI-compatible endpoints
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

// Client for the configured chat-completion endpoint
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn deployment(&self) -> Result<&str, GenerationError> {
        self.config
            .deployment
            .as_deref()
            .ok_or_else(|| GenerationError::NotConfigured("LLM_DEPLOYMENT is not set".to_string()))
    }

    fn endpoint(&self) -> Result<&str, GenerationError> {
        self.config
            .endpoint
            .as_deref()
            .ok_or_else(|| GenerationError::NotConfigured("LLM_ENDPOINT is not set".to_string()))
    }

    /// Full URL of the chat-completion call
    fn completions_url(&self) -> Result<String, GenerationError> {
        let endpoint = self.endpoint()?;

        Ok(match self.config.provider {
            LLMProvider::Azure => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                endpoint,
                self.deployment()?,
                self.config.api_version
            ),
            LLMProvider::OpenAI => format!("{}/chat/completions", endpoint),
        })
    }

    fn payload(&self, prompt: &str) -> Result<Value, GenerationError> {
        let mut payload = json!({
            "messages": [
                {
                    "role": "system",
                    "content": SYSTEM_PROMPT
                },
                {
                    "role": "user",
                    "content": prompt
                }
            ]
        });

        // Azure selects the model through the deployment in the URL
        if self.config.provider == LLMProvider::OpenAI {
            payload["model"] = json!(self.deployment()?);
        }

        Ok(payload)
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = self.completions_url()?;
        let payload = self.payload(prompt)?;
        let api_key = self.config.api_key.clone().unwrap_or_default();

        info!("Sending prompt to {:?} model endpoint", self.config.provider);
        debug!("Prompt: {}", prompt);

        let request = self.client.post(&url).json(&payload);
        let request = match self.config.provider {
            LLMProvider::Azure => request.header("api-key", api_key),
            LLMProvider::OpenAI => request.bearer_auth(api_key),
        };

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let response_body = response.json::<ChatCompletionResponse>().await?;

        // No choices means the model produced nothing
        Ok(response_body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}
