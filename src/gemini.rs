//! Minimal client for the Gemini `generateContent` endpoint.
//!
//! Both the summarizer and the speech synthesizer go through here; they
//! differ only in model name and request body.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::GeminiConfig;
use crate::error::{PipelineError, Result};

pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or(PipelineError::MissingConfig("GEMINI_API_KEY"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// POST `body` to `models/{model}:generateContent` and return the JSON.
    ///
    /// `service` labels errors ("Gemini", "TTS").
    pub async fn generate_content(
        &self,
        service: &'static str,
        model: &str,
        body: &Value,
    ) -> Result<Value> {
        let url = format!("{}/models/{model}:generateContent", self.base_url);
        debug!("POST {url}");

        let resp = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if status.as_u16() != 200 {
            return Err(PipelineError::Api {
                service,
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|_| PipelineError::UnexpectedResponse {
            service,
            what: "a JSON body",
            body: text,
        })
    }
}

/// `candidates[0].content.parts[0]`, or `Null` when any step is missing.
pub fn first_part(response: &Value) -> &Value {
    &response["candidates"][0]["content"]["parts"][0]
}
