//! OpenAI client struct, request building, and stream chunk parsing.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};

use crate::{AiError, Message};

use super::config::OpenAiConfig;

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// OpenAI API client.
pub struct OpenAiClient {
    pub(crate) config: OpenAiConfig,
    pub(crate) http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AiError::NetworkError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    pub(crate) fn endpoint(&self) -> String {
        format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            CHAT_COMPLETIONS_PATH
        )
    }

    pub(crate) fn auth_headers(&self) -> Result<HeaderMap, AiError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.config.api_key))
            .map_err(|_| AiError::ApiError("API key contains invalid header characters".into()))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Build the JSON request body. Every message is sent, in order, with
    /// its role unchanged.
    pub(crate) fn build_request_body(&self, messages: &[Message]) -> serde_json::Value {
        let msgs: Vec<_> = messages
            .iter()
            .map(|msg| {
                serde_json::json!({
                    "role": msg.role.as_str(),
                    "content": msg.content,
                })
            })
            .collect();

        let mut body = serde_json::json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "stream": true,
            "messages": msgs,
        });

        if let Some(max_tokens) = self.config.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        body
    }
}

/// What one `data:` payload of the completion stream means.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Chunk {
    /// `[DONE]` sentinel: the reply is complete.
    Done,
    Delta {
        content: Option<String>,
        finished: bool,
    },
}

pub(crate) fn parse_chunk(data: &str) -> Result<Chunk, AiError> {
    let data = data.trim();
    if data == "[DONE]" {
        return Ok(Chunk::Done);
    }

    let json: serde_json::Value =
        serde_json::from_str(data).map_err(|e| AiError::ParseError(e.to_string()))?;

    if let Some(error) = json.get("error") {
        let message = error["message"]
            .as_str()
            .map(String::from)
            .unwrap_or_else(|| error.to_string());
        return Err(AiError::ApiError(message));
    }

    let choice = &json["choices"][0];
    Ok(Chunk::Delta {
        content: choice["delta"]["content"].as_str().map(String::from),
        finished: choice["finish_reason"].is_string(),
    })
}
