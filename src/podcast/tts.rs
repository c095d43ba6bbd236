//! Gemini speech synthesis: monologue text → MP3 audio asset.
//!
//! Pipeline:
//! 1. Text → `generateContent` on the TTS model with audio-only output
//! 2. `inlineData.data` → base64 decode → raw 16-bit PCM (24kHz mono)
//! 3. PCM → WAV → MP3 via `encoder`

use std::time::Instant;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::json;
use tracing::info;

use super::encoder::AudioEncoder;
use crate::config::{AudioConfig, GeminiConfig};
use crate::error::{PipelineError, Result};
use crate::gemini::{first_part, GeminiClient};

/// Compressed audio ready for upload or saving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioAsset {
    pub data: Vec<u8>,
    pub file_name: String,
    pub mime_type: &'static str,
}

impl AudioAsset {
    pub fn mp3(data: Vec<u8>) -> Self {
        Self {
            data,
            file_name: "news_update.mp3".into(),
            mime_type: "audio/mpeg",
        }
    }

    pub fn size_mb(&self) -> f64 {
        self.data.len() as f64 / (1024.0 * 1024.0)
    }
}

pub struct SpeechSynthesizer {
    gemini: GeminiClient,
    model: String,
    voice: String,
    encoder: AudioEncoder,
}

impl SpeechSynthesizer {
    pub fn new(config: &GeminiConfig, audio: &AudioConfig) -> Result<Self> {
        Ok(Self {
            gemini: GeminiClient::new(config)?,
            model: config.tts_model.clone(),
            voice: config.voice.clone(),
            encoder: AudioEncoder::new(audio.sample_rate, audio.bitrate_kbps),
        })
    }

    pub fn voice(&self) -> &str {
        &self.voice
    }

    /// Speak the whole monologue in one request and return it as MP3.
    pub async fn synthesize(&self, text: &str) -> Result<AudioAsset> {
        let body = json!({
            "contents": [
                { "parts": [ { "text": text } ] }
            ],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": self.voice }
                    }
                }
            }
        });

        info!("Sending request to Gemini TTS API (voice: {})...", self.voice);
        let t_gen = Instant::now();
        let data = self.gemini.generate_content("TTS", &self.model, &body).await?;

        let Some(audio_b64) = first_part(&data)["inlineData"]["data"].as_str() else {
            return Err(PipelineError::UnexpectedResponse {
                service: "TTS",
                what: "audio content",
                body: data.to_string(),
            });
        };
        let gen_ms = t_gen.elapsed().as_secs_f64() * 1000.0;

        let raw = STANDARD.decode(audio_b64)?;
        let mp3 = self.encoder.encode(&raw)?;

        let asset = AudioAsset::mp3(mp3);
        info!(
            "Audio generated successfully ({:.2} MB MP3, gen={gen_ms:.0}ms)",
            asset.size_mb()
        );
        Ok(asset)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::gemini::tests::config_for;
    use crate::podcast::encoder::tests::tone_pcm;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Gemini TTS response carrying `pcm` as inline audio.
    pub(crate) fn tts_response(pcm: &[u8]) -> serde_json::Value {
        json!({
            "candidates": [{
                "content": {
                    "parts": [{
                        "inlineData": {
                            "mimeType": "audio/L16;codec=pcm;rate=24000",
                            "data": STANDARD.encode(pcm)
                        }
                    }]
                }
            }]
        })
    }

    #[tokio::test]
    async fn requests_audio_with_configured_voice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash-preview-tts:generateContent"))
            .and(body_partial_json(json!({
                "generationConfig": {
                    "responseModalities": ["AUDIO"],
                    "speechConfig": {"voiceConfig": {"prebuiltVoiceConfig": {"voiceName": "Laomedeia"}}}
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(tts_response(&tone_pcm(24000))))
            .expect(1)
            .mount(&server)
            .await;

        let config = GeminiConfig {
            voice: "Laomedeia".into(),
            ..config_for(&server)
        };
        let synth = SpeechSynthesizer::new(&config, &AudioConfig::default()).unwrap();
        let asset = synth.synthesize("Hello and welcome.").await.unwrap();

        assert_eq!(asset.mime_type, "audio/mpeg");
        assert_eq!(asset.file_name, "news_update.mp3");
        assert!(!asset.data.is_empty());
    }

    #[tokio::test]
    async fn missing_audio_field_is_an_error_not_a_panic() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "I cannot speak"}]}}]
            })))
            .mount(&server)
            .await;

        let synth = SpeechSynthesizer::new(&config_for(&server), &AudioConfig::default()).unwrap();
        let err = synth.synthesize("Hello").await.unwrap_err();
        match err {
            PipelineError::UnexpectedResponse { service, what, .. } => {
                assert_eq!(service, "TTS");
                assert_eq!(what, "audio content");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn non_200_is_fatal_with_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
            .mount(&server)
            .await;

        let synth = SpeechSynthesizer::new(&config_for(&server), &AudioConfig::default()).unwrap();
        let err = synth.synthesize("Hello").await.unwrap_err();
        assert_eq!(err.to_string(), "TTS API error (500): internal");
    }

    #[tokio::test]
    async fn bad_base64_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"inlineData": {"data": "!!not base64!!"}}]}}]
            })))
            .mount(&server)
            .await;

        let synth = SpeechSynthesizer::new(&config_for(&server), &AudioConfig::default()).unwrap();
        let err = synth.synthesize("Hello").await.unwrap_err();
        assert!(matches!(err, PipelineError::Base64(_)));
    }
}
