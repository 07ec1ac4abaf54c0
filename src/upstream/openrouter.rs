//! Model client backed by the OpenRouter chat-completions API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::OpenRouterConfig;
use crate::domain::Evidence;
use crate::error::{GateError, GateResult};

use super::ModelClient;

/// Request to OpenRouter API.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Response from OpenRouter API.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Model client calling OpenRouter.
pub struct OpenRouterModel {
    config: OpenRouterConfig,
    client: Client,
}

impl OpenRouterModel {
    pub fn new(config: OpenRouterConfig) -> GateResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GateError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Ground the model with the retrieved evidence and instruct it to
    /// answer from that evidence only.
    fn build_prompt(query: &str, evidence: &[Evidence]) -> String {
        let mut prompt = String::new();
        if !evidence.is_empty() {
            prompt.push_str("Answer the question using only the following evidence.\n\n");
            for (idx, snippet) in evidence.iter().enumerate() {
                prompt.push_str(&format!("[{}] ({}) {}\n", idx + 1, snippet.source, snippet.text));
            }
            prompt.push('\n');
        }
        prompt.push_str("Question: ");
        prompt.push_str(query);
        prompt
    }
}

#[async_trait]
impl ModelClient for OpenRouterModel {
    async fn complete(&self, query: &str, evidence: &[Evidence]) -> GateResult<String> {
        if self.config.api_key.is_empty() {
            return Err(GateError::Upstream("OpenRouter API key not set".to_string()));
        }

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Self::build_prompt(query, evidence),
            }],
            max_tokens: Some(1024),
        };

        let response = self
            .client
            .post("https://openrouter.ai/api/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| GateError::Upstream(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GateError::Upstream(format!("API error {}: {}", status, body)));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| GateError::Upstream(format!("Failed to parse response: {}", e)))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| GateError::Upstream("Empty completion response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_evidence() {
        let evidence = vec![
            Evidence::new("doc1", "Paris is the capital of France."),
            Evidence::new("doc2", "France is in Europe."),
        ];
        let prompt = OpenRouterModel::build_prompt("What is the capital of France?", &evidence);

        assert!(prompt.contains("[1] (doc1) Paris is the capital of France."));
        assert!(prompt.contains("[2] (doc2)"));
        assert!(prompt.ends_with("Question: What is the capital of France?"));
    }

    #[test]
    fn test_prompt_without_evidence_is_bare_question() {
        let prompt = OpenRouterModel::build_prompt("hello?", &[]);
        assert_eq!(prompt, "Question: hello?");
    }

    #[tokio::test]
    async fn test_missing_api_key_is_upstream_error() {
        let model = OpenRouterModel::new(OpenRouterConfig::default()).unwrap();
        let err = model.complete("q", &[]).await.unwrap_err();
        assert!(matches!(err, GateError::Upstream(_)));
    }
}
