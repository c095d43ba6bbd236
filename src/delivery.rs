//! Per-recipient delivery of the audio (and optionally the digest).
//!
//! Each recipient is attempted in turn. A failure is logged and recorded
//! in the report; it never stops the remaining recipients.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;
use tracing::{error, info};

use crate::config::{PodcastConfig, TelegramConfig};
use crate::error::{PipelineError, Result};
use crate::podcast::digest::long_date;
use crate::podcast::tts::AudioAsset;
use crate::telegram::{AudioMetadata, TelegramClient, TelegramError};

#[derive(Debug)]
pub struct RecipientOutcome {
    pub chat_id: String,
    pub result: std::result::Result<(), TelegramError>,
}

#[derive(Debug, Default)]
pub struct DeliveryReport {
    pub outcomes: Vec<RecipientOutcome>,
}

impl DeliveryReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }
}

/// Metadata for the day's upload.
pub fn audio_metadata(podcast: &PodcastConfig, date: NaiveDate) -> AudioMetadata {
    AudioMetadata {
        title: format!("{} Update", long_date(date)),
        performer: podcast.show.clone(),
        caption: format!("🎙️ Here's your daily news update from {}!", podcast.host),
    }
}

pub struct Delivery {
    telegram: TelegramClient,
    podcast: PodcastConfig,
    send_digest: bool,
}

impl Delivery {
    pub fn new(config: &TelegramConfig, podcast: &PodcastConfig) -> Result<Self> {
        let bot_token = config
            .bot_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or(PipelineError::MissingConfig("TELEGRAM_BOT_TOKEN"))?;

        // Connect and read timeouts only; uploads have no total cap.
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()?;

        Ok(Self {
            telegram: TelegramClient::new(client, config.api_base.clone(), bot_token),
            podcast: podcast.clone(),
            send_digest: config.send_digest,
        })
    }

    /// Send `audio` to every recipient, in order.
    ///
    /// When `send_digest` is on, `digest` goes out first.
    pub async fn deliver(
        &self,
        audio: &AudioAsset,
        digest: &str,
        chat_ids: &[String],
        date: NaiveDate,
    ) -> DeliveryReport {
        info!("Text digest ({} characters):\n{digest}", digest.chars().count());

        let meta = audio_metadata(&self.podcast, date);
        let mut report = DeliveryReport::default();

        for chat_id in chat_ids {
            let result = self.deliver_one(chat_id, audio, &meta, digest).await;
            match &result {
                Ok(()) => info!("✅ Audio sent successfully to chat ID: {chat_id}"),
                Err(e) => error!("❌ Failed to send to {chat_id}: {e}"),
            }
            report.outcomes.push(RecipientOutcome {
                chat_id: chat_id.clone(),
                result,
            });
        }

        info!(
            "Delivery finished: {} succeeded, {} failed",
            report.succeeded(),
            report.failed()
        );
        report
    }

    async fn deliver_one(
        &self,
        chat_id: &str,
        audio: &AudioAsset,
        meta: &AudioMetadata,
        digest: &str,
    ) -> std::result::Result<(), TelegramError> {
        if self.send_digest {
            self.telegram.send_message(chat_id, digest).await?;
            info!("✅ News text sent to chat ID: {chat_id}");
        }
        self.telegram.send_audio(chat_id, audio, meta).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::HeadlineRecord;
    use crate::podcast::digest::format_digest;
    use chrono::Utc;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer, send_digest: bool) -> TelegramConfig {
        TelegramConfig {
            bot_token: Some("123:abc".into()),
            api_base: server.uri(),
            send_digest,
            timeout_secs: 5,
            ..TelegramConfig::default()
        }
    }

    fn digest() -> String {
        let items = vec![HeadlineRecord {
            title: "Rain expected".into(),
            link: "https://a.example/1".into(),
            published: Utc::now(),
        }];
        format_digest(&items, "Justin Time News", date())
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn metadata_uses_show_host_and_date() {
        let meta = audio_metadata(&PodcastConfig::default(), date());
        assert_eq!(meta.title, "March 10, 2025 Update");
        assert_eq!(meta.performer, "Justin Time News");
        assert_eq!(meta.caption, "🎙️ Here's your daily news update from Justin!");
    }

    #[test]
    fn requires_bot_token() {
        let err = Delivery::new(&TelegramConfig::default(), &PodcastConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, PipelineError::MissingConfig("TELEGRAM_BOT_TOKEN")));
    }

    #[tokio::test]
    async fn one_failing_recipient_does_not_stop_the_rest() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendAudio"))
            .and(body_string_contains("chat-bad"))
            .respond_with(ResponseTemplate::new(403).set_body_string("bot was kicked"))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendAudio"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(2)
            .mount(&server)
            .await;

        let delivery = Delivery::new(&config_for(&server, false), &PodcastConfig::default()).unwrap();
        let audio = AudioAsset::mp3(vec![1, 2, 3]);
        let report = delivery
            .deliver(&audio, &digest(), &ids(&["chat-1", "chat-bad", "chat-3"]), date())
            .await;

        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert!(!report.all_succeeded());
        assert_eq!(report.outcomes[1].chat_id, "chat-bad");
        assert!(matches!(
            report.outcomes[1].result,
            Err(TelegramError::Api { status: 403, .. })
        ));
        assert!(report.outcomes[0].result.is_ok());
        assert!(report.outcomes[2].result.is_ok());
    }

    #[tokio::test]
    async fn digest_is_not_sent_unless_enabled() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendAudio"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let delivery = Delivery::new(&config_for(&server, false), &PodcastConfig::default()).unwrap();
        let report = delivery
            .deliver(&AudioAsset::mp3(vec![1]), &digest(), &ids(&["chat-1"]), date())
            .await;
        assert!(report.all_succeeded());
    }

    #[tokio::test]
    async fn digest_goes_out_before_audio_when_enabled() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_string_contains("Rain expected"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendAudio"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(2)
            .mount(&server)
            .await;

        let delivery = Delivery::new(&config_for(&server, true), &PodcastConfig::default()).unwrap();
        let report = delivery
            .deliver(&AudioAsset::mp3(vec![1]), &digest(), &ids(&["chat-1", "chat-2"]), date())
            .await;
        assert_eq!(report.succeeded(), 2);

        let requests = server.received_requests().await.unwrap();
        let order: Vec<_> = requests.iter().map(|r| r.url.path().to_string()).collect();
        assert_eq!(
            order,
            vec![
                "/bot123:abc/sendMessage",
                "/bot123:abc/sendAudio",
                "/bot123:abc/sendMessage",
                "/bot123:abc/sendAudio",
            ]
        );
    }

    #[tokio::test]
    async fn failed_digest_skips_that_recipients_audio() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_string_contains("chat-bad"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Bad Request: can't parse entities"))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendAudio"))
            .and(body_string_contains("chat-bad"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .with_priority(1)
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendAudio"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let delivery = Delivery::new(&config_for(&server, true), &PodcastConfig::default()).unwrap();
        let report = delivery
            .deliver(&AudioAsset::mp3(vec![1]), &digest(), &ids(&["chat-bad", "chat-2"]), date())
            .await;

        assert_eq!(report.succeeded(), 1);
        assert!(matches!(
            report.outcomes[0].result,
            Err(TelegramError::Api { status: 400, .. })
        ));
        assert!(report.outcomes[1].result.is_ok());
    }
}
