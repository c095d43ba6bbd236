//! Telegram Bot API client: audio uploads and HTML text messages.

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::podcast::tts::AudioAsset;

/// Telegram API errors
#[derive(Debug, Error)]
pub enum TelegramError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Telegram API returned an error
    #[error("Telegram API error ({status}): {body}")]
    Api { status: u16, body: String },
}

/// Title, performer and caption attached to an audio upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioMetadata {
    pub title: String,
    pub performer: String,
    pub caption: String,
}

pub struct TelegramClient {
    client: Client,
    api_base: String,
    bot_token: String,
}

impl TelegramClient {
    /// `client` carries the connect/read timeouts; no total request cap is set.
    pub fn new(
        client: Client,
        api_base: impl Into<String>,
        bot_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.bot_token)
    }

    /// Send a text message with HTML formatting and no link preview.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), TelegramError> {
        let resp = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "HTML",
                "disable_web_page_preview": true
            }))
            .send()
            .await?;

        check(resp).await
    }

    /// Upload an audio file with title/performer/caption.
    pub async fn send_audio(
        &self,
        chat_id: &str,
        audio: &AudioAsset,
        meta: &AudioMetadata,
    ) -> Result<(), TelegramError> {
        let part = Part::bytes(audio.data.clone())
            .file_name(audio.file_name.clone())
            .mime_str(audio.mime_type)?;

        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("title", meta.title.clone())
            .text("performer", meta.performer.clone())
            .text("caption", meta.caption.clone())
            .part("audio", part);

        debug!("Uploading {} bytes to chat {chat_id}", audio.data.len());
        let resp = self
            .client
            .post(self.method_url("sendAudio"))
            .multipart(form)
            .send()
            .await?;

        check(resp).await
    }
}

async fn check(resp: reqwest::Response) -> Result<(), TelegramError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(TelegramError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(())
}
