//! Gemini monologue generation.
//!
//! Turns the day's headline titles into a spoken-word script in the
//! host's voice. Only titles go into the prompt.

use std::time::Instant;

use serde_json::json;
use tracing::info;

use crate::config::{GeminiConfig, PodcastConfig};
use crate::error::{PipelineError, Result};
use crate::feed::HeadlineRecord;
use crate::gemini::{first_part, GeminiClient};

/// Returned instead of calling the model when there is nothing to summarize.
pub const NO_UPDATES: &str = "There are no recent news updates to summarize.";

/// Line that precedes the headline bullets in the prompt.
pub const HEADLINES_MARKER: &str = "Here are today's headlines to summarize:";

const SCRIPT_RULES: &[&str] = &[
    "- Start with a warm and energetic welcome.",
    "- Transition smoothly between headlines, connecting them where possible.",
    "- Use a conversational, slightly informal tone. Think of how you would tell a friend about the news.",
    "- Do NOT include any text outside of the monologue itself. No 'Sure, here is the script:', no notes, no headers, just the pure script ready for recording.",
    "- Do NOT include any stage directions, sound effects, or music cues like '(Upbeat music)', '(laughs)', or '(pause)'. Only include the spoken words.",
    "- End with a friendly sign-off, like 'That's the latest for now. Catch you tomorrow!'",
];

/// Build the summarization prompt: persona, script rules, one bullet per title.
pub fn build_prompt(items: &[HeadlineRecord], podcast: &PodcastConfig) -> String {
    let mut lines = vec![
        format!(
            "Your role is to act as '{host}', the host of a daily news podcast called '{show}'. \
             Your persona is witty, friendly, and you make the news feel approachable and engaging for a general audience.",
            host = podcast.host,
            show = podcast.show,
        ),
        format!(
            "Your task is to create a short, conversational monologue summarizing today's top headlines for a voiceover script. \
             The total length should be under {} words to keep it brief and punchy.",
            podcast.max_words
        ),
        "\nHere are the instructions for the script:".to_string(),
    ];
    lines.extend(SCRIPT_RULES.iter().map(|s| s.to_string()));
    lines.push(format!("\n{HEADLINES_MARKER}"));
    lines.extend(items.iter().map(|item| format!("- {}", item.title)));

    lines.join("\n")
}

pub struct Summarizer {
    gemini: GeminiClient,
    model: String,
    podcast: PodcastConfig,
}

impl Summarizer {
    pub fn new(config: &GeminiConfig, podcast: &PodcastConfig) -> Result<Self> {
        Ok(Self {
            gemini: GeminiClient::new(config)?,
            model: config.text_model.clone(),
            podcast: podcast.clone(),
        })
    }

    /// Generate the monologue for `items`.
    pub async fn summarize(&self, items: &[HeadlineRecord]) -> Result<String> {
        if items.is_empty() {
            return Ok(NO_UPDATES.to_string());
        }

        let prompt = build_prompt(items, &self.podcast);
        let body = json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ]
        });

        info!("Sending request to {} for summarization...", self.model);
        let t_start = Instant::now();
        let data = self.gemini.generate_content("Gemini", &self.model, &body).await?;

        let Some(summary) = first_part(&data)["text"].as_str() else {
            return Err(PipelineError::UnexpectedResponse {
                service: "Gemini",
                what: "summary",
                body: data.to_string(),
            });
        };

        let latency_ms = t_start.elapsed().as_secs_f64() * 1000.0;
        info!(
            "Summarized {} headlines → {} chars ({latency_ms:.0}ms)",
            items.len(),
            summary.len()
        );
        Ok(summary.trim().to_string())
    }
}
