use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::warn;

use telassist_core::config::LlmConfig;

/// One message on the chat-completions wire.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain("assistant", content)
    }

    pub fn assistant_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: None,
            tool_calls: Some(tool_calls),
            tool_call_id: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    fn plain(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionCall,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

/// The routing contract handed to the reasoning engine for one tool.
#[derive(Clone, Debug)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl ToolSpec {
    fn to_wire(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

/// One reasoning step: either the final reply text or a batch of
/// tool-call requests to satisfy first.
#[derive(Clone, Debug)]
pub enum ModelTurn {
    Final(String),
    ToolCalls(Vec<ToolCall>),
}

/// The external reasoning engine. It selects tools and synthesizes
/// the final reply; nothing here constrains how it reasons.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> Result<ModelTurn>;
}

/// Hosted OpenAI-compatible chat-completions endpoint (Groq in the
/// default configuration). Temperature is pinned to zero; the agent
/// wants routing decisions, not creativity.
pub struct HostedChatModel {
    http: reqwest::Client,
    url: String,
    model: String,
    api_key: SecretString,
    max_retries: u32,
}

impl HostedChatModel {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| anyhow!("llm.api_key is required for the hosted chat model"))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("building llm http client")?;

        Ok(Self {
            http,
            url: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key,
            max_retries: config.max_retries,
        })
    }

    async fn request_once(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<CompletionResponse> {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": 0,
        });
        if !tools.is_empty() {
            body["tools"] =
                serde_json::Value::Array(tools.iter().map(ToolSpec::to_wire).collect());
            body["tool_choice"] = serde_json::Value::String("auto".to_string());
        }

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .context("chat completion request failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("chat completion returned {status}: {detail}"));
        }

        response.json::<CompletionResponse>().await.context("decoding chat completion")
    }
}

#[async_trait]
impl ChatModel for HostedChatModel {
    async fn complete(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> Result<ModelTurn> {
        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            match self.request_once(messages, tools).await {
                Ok(completion) => {
                    let message = completion
                        .choices
                        .into_iter()
                        .next()
                        .ok_or_else(|| anyhow!("chat completion had no choices"))?
                        .message;

                    if let Some(tool_calls) = message.tool_calls.filter(|calls| !calls.is_empty())
                    {
                        return Ok(ModelTurn::ToolCalls(tool_calls));
                    }
                    return Ok(ModelTurn::Final(message.content.unwrap_or_default()));
                }
                Err(error) => {
                    warn!(attempt, error = %error, "chat completion attempt failed");
                    last_error = Some(error);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| anyhow!("chat completion failed")))
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCall>>,
}

#[cfg(test)]
mod tests {
    use super::{ChatMessage, FunctionCall, ToolCall, ToolSpec};

    #[test]
    fn tool_result_serializes_with_call_id() {
        let message = ChatMessage::tool_result("call-1", "No results.");
        let wire = serde_json::to_value(&message).expect("serialize");
        assert_eq!(wire["role"], "tool");
        assert_eq!(wire["tool_call_id"], "call-1");
        assert_eq!(wire["content"], "No results.");
        assert!(wire.get("tool_calls").is_none());
    }

    #[test]
    fn assistant_tool_calls_omit_content() {
        let message = ChatMessage::assistant_tool_calls(vec![ToolCall {
            id: "call-1".to_string(),
            kind: "function".to_string(),
            function: FunctionCall {
                name: "get_stats".to_string(),
                arguments: "{}".to_string(),
            },
        }]);
        let wire = serde_json::to_value(&message).expect("serialize");
        assert!(wire.get("content").is_none());
        assert_eq!(wire["tool_calls"][0]["function"]["name"], "get_stats");
    }

    #[test]
    fn tool_spec_wire_shape_matches_function_calling() {
        let spec = ToolSpec {
            name: "search_faq".to_string(),
            description: "Search the FAQ.".to_string(),
            parameters: serde_json::json!({"type": "object", "properties": {}}),
        };
        let wire = spec.to_wire();
        assert_eq!(wire["type"], "function");
        assert_eq!(wire["function"]["name"], "search_faq");
    }
}
