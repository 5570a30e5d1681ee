use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::time::Duration;

const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// A chat model that answers with a JSON document.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete_json(&self, system: &str, user: &str) -> Result<JsonValue>;
}

#[derive(Clone)]
pub struct AIService {
    client: Client,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    base_url: String,
}

impl AIService {
    pub fn new(api_key: String, model: String, temperature: f32, client: Client) -> Self {
        Self {
            client,
            api_key,
            model,
            temperature,
            max_tokens: 4096,
            base_url: ANTHROPIC_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens.max(1);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn chat_anthropic(&self, payload: JsonValue) -> Result<String> {
        let res = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&payload)
            .timeout(Duration::from_secs(300))
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(Error::Pipeline(format!(
                "Anthropic API Error {}: {}",
                status, text
            )));
        }

        let body: JsonValue = res.json().await?;

        if body.get("stop_reason").and_then(|r| r.as_str()) == Some("max_tokens") {
            return Err(Error::Pipeline(format!(
                "Model reply truncated at max_tokens ({})",
                self.max_tokens
            )));
        }

        let text: String = body
            .get("content")
            .and_then(|c| c.as_array())
            .map(|blocks| {
                blocks
                    .iter()
                    .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
                    .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(Error::Pipeline(
                "Invalid Anthropic response format".to_string(),
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl LanguageModel for AIService {
    async fn complete_json(&self, system: &str, user: &str) -> Result<JsonValue> {
        let payload = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "system": system,
            "messages": [
                {"role": "user", "content": user}
            ]
        });

        let text = self.chat_anthropic(payload).await?;
        extract_json(&text)
    }
}

/// Parses the JSON document embedded in a model reply, tolerating code fences
/// and prose around the outermost object or array.
pub fn extract_json(text: &str) -> Result<JsonValue> {
    let trimmed = text.trim();
    if let Ok(v) = serde_json::from_str::<JsonValue>(trimmed) {
        return Ok(v);
    }

    let candidates = [('{', '}'), ('[', ']')];
    for (open, close) in candidates {
        if let (Some(start), Some(end)) = (trimmed.find(open), trimmed.rfind(close)) {
            if start < end {
                if let Ok(v) = serde_json::from_str::<JsonValue>(&trimmed[start..=end]) {
                    return Ok(v);
                }
            }
        }
    }

    let preview: String = trimmed.chars().take(120).collect();
    Err(Error::Pipeline(format!(
        "Model reply is not valid JSON: {}",
        preview
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, routing::post, Json, Router};
    use serde_json::json;

    #[test]
    fn extract_json_handles_fences_and_prose() {
        let fenced = "```json\n{\"opportunities\": []}\n```";
        assert_eq!(extract_json(fenced).unwrap(), json!({"opportunities": []}));

        let chatty = "Here is the list you asked for:\n{\"links\": [\"https://a.example\"]}\nGood luck!";
        assert_eq!(
            extract_json(chatty).unwrap()["links"][0],
            "https://a.example"
        );

        assert!(extract_json("I could not find anything.").is_err());
    }

    async fn fake_messages(headers: HeaderMap, Json(body): Json<JsonValue>) -> Json<JsonValue> {
        let key_ok = headers.get("x-api-key").and_then(|v| v.to_str().ok()) == Some("sk-ant-test");
        Json(json!({
            "content": [
                { "type": "text", "text": format!(
                    "{{\"key_ok\": {}, \"model\": \"{}\", \"system\": {}}}",
                    key_ok,
                    body["model"].as_str().unwrap_or_default(),
                    body["system"]
                ) }
            ]
        }))
    }

    async fn fake_truncated(Json(body): Json<JsonValue>) -> Json<JsonValue> {
        Json(json!({
            "stop_reason": "max_tokens",
            "usage": { "output_tokens": body["max_tokens"] },
            "content": [
                { "type": "text", "text": "{\"opportunities\": [{\"title\": \"Grant\"}, {\"title\": \"x" }
            ]
        }))
    }

    #[tokio::test]
    async fn truncated_reply_is_reported_as_such() {
        let app = Router::new().route("/v1/messages", post(fake_truncated));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let ai = AIService::new(
            "sk-ant-test".into(),
            "claude-3-opus-20240229".into(),
            0.7,
            Client::new(),
        )
        .with_base_url(format!("http://{addr}"))
        .with_max_tokens(256);

        let err = ai.complete_json("be terse", "list everything").await.unwrap_err();
        assert!(matches!(err, Error::Pipeline(ref m) if m.contains("truncated") && m.contains("256")));
    }

    #[tokio::test]
    async fn complete_json_sends_system_prompt_and_parses_reply() {
        let app = Router::new().route("/v1/messages", post(fake_messages));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let ai = AIService::new(
            "sk-ant-test".into(),
            "claude-3-opus-20240229".into(),
            0.7,
            Client::new(),
        )
        .with_base_url(format!("http://{addr}"));

        let out = ai.complete_json("be terse", "hello").await.unwrap();
        assert_eq!(out["key_ok"], true);
        assert_eq!(out["model"], "claude-3-opus-20240229");
        assert_eq!(out["system"], "be terse");
    }
}
