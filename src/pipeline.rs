//! Main pipeline orchestration.
//!
//! START → COLLECT → SUMMARIZE → SYNTHESIZE → FORMAT → DELIVER → END
//!
//! An empty headline list ends the run right after COLLECT. Debug mode
//! ends it after SYNTHESIZE with the MP3 written to disk.

use std::path::PathBuf;

use chrono_tz::Tz;
use tracing::{info, warn};

use crate::config::Config;
use crate::delivery::{Delivery, DeliveryReport};
use crate::error::Result;
use crate::feed::{today_in, FeedCollector};
use crate::podcast::digest::format_digest;
use crate::podcast::summarizer::Summarizer;
use crate::podcast::tts::{AudioAsset, SpeechSynthesizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Collect,
    Summarize,
    Synthesize,
    Format,
    Deliver,
    End,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => write!(f, "START"),
            Self::Collect => write!(f, "COLLECT"),
            Self::Summarize => write!(f, "SUMMARIZE"),
            Self::Synthesize => write!(f, "SYNTHESIZE"),
            Self::Format => write!(f, "FORMAT"),
            Self::Deliver => write!(f, "DELIVER"),
            Self::End => write!(f, "END"),
        }
    }
}

/// How a successful run ended.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// Nothing from today or yesterday in the feed.
    NoRecentNews,
    /// Debug mode: audio written locally, nothing delivered.
    SavedLocally { path: PathBuf, audio: AudioAsset },
    /// No recipients configured.
    DeliverySkipped { digest: String },
    Delivered { digest: String, report: DeliveryReport },
}

pub struct Pipeline {
    config: Config,
    tz: Tz,
    stage: Stage,
    collector: FeedCollector,
    summarizer: Summarizer,
    synthesizer: SpeechSynthesizer,
    delivery: Option<Delivery>,
}

impl Pipeline {
    /// Validate config and build every stage up front.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let delivery = if config.debug.enabled || config.telegram.chat_ids.is_empty() {
            None
        } else {
            Some(Delivery::new(&config.telegram, &config.podcast)?)
        };

        Ok(Self {
            tz: config.feed.tz()?,
            stage: Stage::Start,
            collector: FeedCollector::new(&config.feed)?,
            summarizer: Summarizer::new(&config.gemini, &config.podcast)?,
            synthesizer: SpeechSynthesizer::new(&config.gemini, &config.audio)?,
            delivery,
            config,
        })
    }

    fn advance(&mut self, next: Stage) {
        info!("Stage: {} → {}", self.stage, next);
        self.stage = next;
    }

    pub async fn run(&mut self) -> Result<PipelineOutcome> {
        self.advance(Stage::Collect);
        info!("Fetching recent news...");
        let items = self.collector.fetch_recent(&self.config.feed.url).await?;

        if items.is_empty() {
            info!("No recent news found to process.");
            self.advance(Stage::End);
            return Ok(PipelineOutcome::NoRecentNews);
        }

        self.advance(Stage::Summarize);
        let summary = self.summarizer.summarize(&items).await?;
        info!("Generated summary for TTS:\n\n{summary}\n");

        self.advance(Stage::Synthesize);
        info!(
            "Generating voiceover with Gemini TTS (voice: {})...",
            self.synthesizer.voice()
        );
        let audio = self.synthesizer.synthesize(&summary).await?;

        if self.config.debug.enabled {
            let path = self.config.debug.output_path.clone();
            tokio::fs::write(&path, &audio.data).await?;
            info!("✅ Debug mode: Audio saved to {}", path.display());
            self.advance(Stage::End);
            return Ok(PipelineOutcome::SavedLocally { path, audio });
        }

        self.advance(Stage::Format);
        let today = today_in(self.tz);
        let digest = format_digest(&items, &self.config.podcast.show, today);

        let Some(delivery) = &self.delivery else {
            warn!("⚠️ TELEGRAM_CHANNEL_ID is not set. Please set it in your environment variables.");
            self.advance(Stage::End);
            return Ok(PipelineOutcome::DeliverySkipped { digest });
        };

        // Field-level update; `delivery` still borrows `self.delivery`.
        info!("Stage: {} → {}", self.stage, Stage::Deliver);
        self.stage = Stage::Deliver;
        let chat_ids = &self.config.telegram.chat_ids;
        info!("Sending news to {} recipient(s): {}", chat_ids.len(), chat_ids.join(", "));
        let report = delivery.deliver(&audio, &digest, chat_ids, today).await;

        self.advance(Stage::End);
        Ok(PipelineOutcome::Delivered { digest, report })
    }
}
