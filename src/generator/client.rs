use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, instrument};

use super::error::{GenerationError, RequestConfig};
use crate::config::OpenAiConfig;

/// Raw chat-completion envelope. `content` stays untyped: the model
/// sometimes answers with a JSON string and sometimes with an object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub model: Option<String>,
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Choice {
    pub message: ChoiceMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Value,
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<ChatCompletion, GenerationError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn failure(&self, message: String, status: Option<u16>, body: Option<Value>) -> GenerationError {
        GenerationError {
            message,
            request_data: json!({ "model": self.config.model }),
            response_data: body,
            status_code: status,
            request_config: Some(RequestConfig {
                url: self.endpoint(),
                method: "post".into(),
            }),
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    #[instrument(skip(self, prompt), fields(model = %self.config.model))]
    async fn complete(&self, prompt: &str) -> Result<ChatCompletion, GenerationError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
        };

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "completion request failed");
                self.failure(e.to_string(), e.status().map(|s| s.as_u16()), None)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!(error = %e, "failed to read completion response");
            self.failure(e.to_string(), Some(status.as_u16()), None)
        })?;

        if !status.is_success() {
            let data = serde_json::from_str::<Value>(&body).unwrap_or(Value::String(body));
            return Err(self.failure(
                format!("Request failed with status code {}", status.as_u16()),
                Some(status.as_u16()),
                Some(data),
            ));
        }

        let completion: ChatCompletion = serde_json::from_str(&body).map_err(|e| {
            self.failure(
                format!("Unexpected completion envelope: {e}"),
                Some(status.as_u16()),
                Some(Value::String(body.clone())),
            )
        })?;
        debug!(choices = completion.choices.len(), "completion received");
        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: String) -> OpenAiConfig {
        OpenAiConfig {
            api_key: "sk-test".into(),
            base_url,
            model: "ft:plan-model".into(),
            temperature: 0.2,
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn posts_prompt_and_decodes_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "ft:plan-model",
                "messages": [{ "role": "user", "content": "Archetype: Thor\nTraining_Days: 3" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "created": 1_700_000_000,
                "model": "ft:plan-model",
                "choices": [{ "message": { "role": "assistant", "content": "{}" }, "finish_reason": "stop" }]
            })))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(config(server.uri())).unwrap();
        let reply = client
            .complete("Archetype: Thor\nTraining_Days: 3")
            .await
            .unwrap();
        assert_eq!(reply.created, 1_700_000_000);
        assert_eq!(reply.choices[0].message.content, json!("{}"));
    }

    #[tokio::test]
    async fn upstream_error_keeps_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_json(json!({ "error": { "message": "rate limited" } })),
            )
            .mount(&server)
            .await;

        let client = OpenAiClient::new(config(format!("{}/", server.uri()))).unwrap();
        let err = client.complete("x").await.unwrap_err();
        assert_eq!(err.status_code, Some(429));
        assert_eq!(
            err.response_data.unwrap()["error"]["message"],
            "rate limited"
        );
        let cfg = err.request_config.unwrap();
        assert!(cfg.url.ends_with("/chat/completions"));
        assert!(!cfg.url.contains("//chat"));
        assert_eq!(cfg.method, "post");
    }
}
