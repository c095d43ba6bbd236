//! Configuration management for justin-time-news.
//!
//! Loads config from YAML files in standard locations, then layers
//! secrets and toggles from the environment on top.

use chrono_tz::Tz;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{PipelineError, Result};

const DEFAULT_FEED_URL: &str = "https://news.google.com/rss/topics/CAAqKggKIiRDQkFTRlFvSUwyMHZNRFZxYUdjU0JXVnVMVWRDR2dKVFJ5Z0FQAQ?hl=en-SG&gl=SG&ceid=SG%3Aen";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub url: String,
    /// IANA zone used to decide what "today" and "yesterday" mean.
    pub timezone: String,
    pub timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_FEED_URL.into(),
            timezone: "Asia/Singapore".into(),
            timeout_secs: 30,
        }
    }
}

impl FeedConfig {
    pub fn tz(&self) -> Result<Tz> {
        self.timezone.parse::<Tz>().map_err(|e| {
            PipelineError::InvalidConfig(format!("unknown time zone '{}': {e}", self.timezone))
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub text_model: String,
    pub tts_model: String,
    /// Prebuilt voice name. "Laomedeia" is the female alternative.
    pub voice: String,
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            text_model: "gemini-2.5-pro".into(),
            tts_model: "gemini-2.5-flash-preview-tts".into(),
            voice: "Umbriel".into(),
            timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub bitrate_kbps: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 24000,
            bitrate_kbps: 64,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PodcastConfig {
    pub host: String,
    pub show: String,
    pub max_words: u32,
}

impl Default for PodcastConfig {
    fn default() -> Self {
        Self {
            host: "Justin".into(),
            show: "Justin Time News".into(),
            max_words: 700,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub chat_ids: Vec<String>,
    pub api_base: String,
    /// Send the HTML digest as a text message before each audio upload.
    pub send_digest: bool,
    pub timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_ids: vec![],
            api_base: "https://api.telegram.org".into(),
            send_digest: false,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
    pub output_path: PathBuf,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            output_path: PathBuf::from("news_update_debug.mp3"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub feed: FeedConfig,
    pub gemini: GeminiConfig,
    pub audio: AudioConfig,
    pub podcast: PodcastConfig,
    pub telegram: TelegramConfig,
    pub debug: DebugConfig,
}

impl Config {
    /// Load configuration from YAML file.
    ///
    /// An explicit `path` wins. Otherwise the first existing file among
    /// [`search_locations`] is used. Unreadable or malformed files fall back
    /// to defaults so secrets from the environment can still drive a run.
    pub fn load(path: Option<&Path>) -> Self {
        let found = match path {
            Some(p) => Some(ConfigSource::new("--config", p.to_path_buf())),
            None => search_locations().into_iter().find(|s| s.path.exists()),
        };

        let Some(source) = found else {
            info!("No config file in the working directory, user config or /etc; using defaults");
            return Self::default();
        };

        match source.read() {
            Ok(config) => {
                info!("Loaded config from {} ({})", source.path.display(), source.origin);
                config
            }
            Err(e) => {
                warn!("{} ({}): {e}, using defaults", source.path.display(), source.origin);
                Self::default()
            }
        }
    }

    /// Overlay values from environment-style variables.
    ///
    /// `lookup` is `std::env::var` in production; tests pass a map.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(key) = non_empty("GEMINI_API_KEY") {
            self.gemini.api_key = Some(key);
        }
        if let Some(token) = non_empty("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = Some(token);
        }
        if let Some(ids) = non_empty("TELEGRAM_CHANNEL_ID") {
            self.telegram.chat_ids = ids
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(url) = non_empty("NEWS_FEED_URL") {
            self.feed.url = url;
        }
        if let Some(flag) = non_empty("DEBUG_MODE") {
            self.debug.enabled = parse_flag(&flag);
        }
        if let Some(flag) = non_empty("SEND_DIGEST_TEXT") {
            self.telegram.send_digest = parse_flag(&flag);
        }
    }

    /// Startup gate: everything a run needs before the first network call.
    pub fn validate(&self) -> Result<()> {
        if self.gemini.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(PipelineError::MissingConfig("GEMINI_API_KEY"));
        }
        self.feed.tz()?;

        let will_deliver = !self.debug.enabled && !self.telegram.chat_ids.is_empty();
        if will_deliver && self.telegram.bot_token.as_deref().map_or(true, str::is_empty) {
            return Err(PipelineError::MissingConfig("TELEGRAM_BOT_TOKEN"));
        }
        Ok(())
    }
}

/// A candidate config file and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub origin: &'static str,
    pub path: PathBuf,
}

impl ConfigSource {
    fn new(origin: &'static str, path: PathBuf) -> Self {
        Self { origin, path }
    }

    fn read(&self) -> std::result::Result<Config, String> {
        let contents = std::fs::read_to_string(&self.path).map_err(|e| format!("read failed: {e}"))?;
        serde_yml::from_str(&contents).map_err(|e| format!("parse failed: {e}"))
    }
}

/// Search order when no `--config` is given.
pub fn search_locations() -> Vec<ConfigSource> {
    let mut locations = Vec::with_capacity(3);
    if let Ok(cwd) = std::env::current_dir() {
        locations.push(ConfigSource::new("working directory", cwd.join("config.yaml")));
    }
    if let Some(dir) = dirs::config_dir() {
        locations.push(ConfigSource::new(
            "user config",
            dir.join("justin-time-news").join("config.yaml"),
        ));
    }
    locations.push(ConfigSource::new(
        "system",
        PathBuf::from("/etc/justin-time-news/config.yaml"),
    ));
    locations
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
