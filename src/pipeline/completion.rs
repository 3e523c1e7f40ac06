//! Remote completion: one `generateContent` POST per send.
//!
//! This module is intentionally thin. It issues the request, reads the body
//! and hands back the parsed response; deciding what the user sees lives in
//! [`crate::replies`], so the fallback wording can change without touching
//! HTTP code here.
//!
//! No retries, no batching, no streaming: a send is exactly one request.
//! The HTTP status is logged but not treated as a failure on its own. Error
//! bodies from the endpoint are valid JSON without `candidates`, which the
//! session reports as "no response" rather than "something went wrong".

use crate::config::ChatConfig;
use crate::error::{ChatError, CompletionError};
use crate::pipeline::request::{GenerateContentRequest, GenerateContentResponse};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Something that can answer a `generateContent` request.
///
/// [`GeminiClient`] is the live implementation; tests substitute fakes to
/// control timing and replies.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, CompletionError>;
}

/// reqwest client for the Generative Language API.
pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout_secs: Option<u64>,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Build a client from config. Fails without an API key.
    pub fn from_config(config: &ChatConfig) -> Result<Self, ChatError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ChatError::MissingApiKey)?;

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ChatError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint_url(),
            api_key,
            timeout_secs: config.request_timeout_secs,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionBackend for GeminiClient {
    async fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, CompletionError> {
        let start = Instant::now();
        debug!(
            "POST {} with {} turns",
            self.endpoint,
            request.contents.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Model endpoint answered HTTP {}", status);
        }

        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;
        let parsed: GenerateContentResponse =
            serde_json::from_slice(&body).map_err(|e| CompletionError::InvalidBody {
                status: status.as_u16(),
                detail: e.to_string(),
            })?;

        debug!(
            "Reply received in {:?} ({} bytes)",
            start.elapsed(),
            body.len()
        );
        Ok(parsed)
    }
}

impl GeminiClient {
    fn transport_error(&self, e: reqwest::Error) -> CompletionError {
        match self.timeout_secs {
            Some(secs) if e.is_timeout() => CompletionError::Timeout { secs },
            // reqwest's Display includes the URL, and the URL carries the key.
            _ => CompletionError::Transport(e.without_url().to_string()),
        }
    }
}
