//! HTTP backends for the three hosted models.
//!
//! Each backend posts a single user message and extracts the first text part
//! of the reply. Non-2xx responses and missing text are reported as errors.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use super::{Oracle, OracleError};

pub const GPT_DEFAULT_MODEL: &str = "gpt-4o";
pub const COHERE_DEFAULT_MODEL: &str = "command-r-plus";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.0-flash";

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const COHERE_BASE_URL: &str = "https://api.cohere.com/v2";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Transport-level HTTP timeout for every backend.
const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

fn http_client() -> Result<reqwest::Client, OracleError> {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| OracleError::RequestFailed(format!("failed to create HTTP client: {e}")))
}

fn require_key(backend: &str, api_key: String) -> Result<String, OracleError> {
    if api_key.trim().is_empty() {
        return Err(OracleError::MissingApiKey(backend.to_string()));
    }
    Ok(api_key)
}

async fn send(
    backend: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<Value, OracleError> {
    let response = request
        .send()
        .await
        .map_err(|e| OracleError::RequestFailed(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(OracleError::Status {
            backend,
            status,
            body,
        });
    }

    response
        .json()
        .await
        .map_err(|e| OracleError::ParseError(e.to_string()))
}

fn text_at(body: &Value, pointer: &str) -> Result<String, OracleError> {
    body.pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| OracleError::ParseError(format!("response has no text at {pointer}")))
}

/// OpenAI chat-completions backend
pub struct GptOracle {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GptOracle {
    pub const ID: &'static str = "gpt";

    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, OracleError> {
        Ok(Self {
            api_key: require_key("openai", api_key.into())?,
            model: model.into(),
            base_url: OPENAI_BASE_URL.to_string(),
            client: http_client()?,
        })
    }

    /// Point at an OpenAI-compatible server instead of api.openai.com.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}]
        })
    }
}

#[async_trait]
impl Oracle for GptOracle {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        let request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt));
        let body = send("OpenAI", request).await?;
        text_at(&body, "/choices/0/message/content")
    }
}

/// Cohere v2 chat backend
pub struct CohereOracle {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl CohereOracle {
    pub const ID: &'static str = "cohere";

    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, OracleError> {
        Ok(Self {
            api_key: require_key("cohere", api_key.into())?,
            model: model.into(),
            base_url: COHERE_BASE_URL.to_string(),
            client: http_client()?,
        })
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}]
        })
    }
}

#[async_trait]
impl Oracle for CohereOracle {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        let request = self
            .client
            .post(format!("{}/chat", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt));
        let body = send("Cohere", request).await?;
        text_at(&body, "/message/content/0/text")
    }
}

/// Gemini generateContent backend
pub struct GeminiOracle {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiOracle {
    pub const ID: &'static str = "gemini";

    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, OracleError> {
        Ok(Self {
            api_key: require_key("gemini", api_key.into())?,
            model: model.into(),
            base_url: GEMINI_BASE_URL.to_string(),
            client: http_client()?,
        })
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "contents": [{
                "parts": [{"text": prompt}]
            }]
        })
    }
}

#[async_trait]
impl Oracle for GeminiOracle {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let request = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&self.request_body(prompt));
        let body = send("Gemini", request).await?;
        text_at(&body, "/candidates/0/content/parts/0/text")
    }
}
