use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::config::GeminiConfig;
use crate::error::{Result, StorefrontError};
use crate::models::{GenerateContentRequest, GenerateContentResponse};

/// Outbound seam to the text-generation service. One call, no retries.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        req: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse>;
}

pub struct GeminiTransport {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiTransport {
    pub fn new(cfg: &GeminiConfig) -> Result<Self> {
        if cfg.api_key.trim().is_empty() {
            tracing::warn!("Gemini API key is empty; librarian calls will fail");
        }
        let client = Client::builder().timeout(cfg.timeout()).build()?;
        Ok(Self {
            client,
            api_key: cfg.api_key.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/{model}:generateContent", self.base_url)
    }
}

#[async_trait]
impl Transport for GeminiTransport {
    async fn generate(
        &self,
        model: &str,
        req: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(req)
            .send()
            .await
            .map_err(|e| StorefrontError::Http(e.without_url()))?;

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(_) if !status.is_success() => "Failed to read Gemini error body".to_string(),
            Err(e) => return Err(StorefrontError::Http(e.without_url())),
        };
        decode_body(status, &body)
    }
}

/// Turn a status and raw body into a response or a typed error
fn decode_body(status: StatusCode, body: &str) -> Result<GenerateContentResponse> {
    if !status.is_success() {
        return Err(service_error(status, body));
    }
    Ok(serde_json::from_str(body)?)
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Decode Gemini's `{"error": {...}}` envelope, falling back to the raw body
fn service_error(status: StatusCode, body: &str) -> StorefrontError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.to_string());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.to_string());

    StorefrontError::Service {
        status: status.as_u16(),
        message,
    }
}
