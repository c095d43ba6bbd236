//! Fatal pipeline errors.
//!
//! Anything in here aborts the run. Per-recipient delivery failures are
//! not errors at this level; see `telegram::TelegramError`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0} is not set. Please set it in your environment or config file.")]
    MissingConfig(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from one of the upstream services.
    #[error("{service} API error ({status}): {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// Success status but the expected field was not in the body.
    #[error("Could not find {what} in the {service} API response: {body}")]
    UnexpectedResponse {
        service: &'static str,
        what: &'static str,
        body: String,
    },

    #[error("failed to parse feed: {0}")]
    Feed(#[from] feed_rs::parser::ParseFeedError),

    #[error("invalid base64 audio payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("audio encoding failed: {0}")]
    Audio(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<hound::Error> for PipelineError {
    fn from(e: hound::Error) -> Self {
        Self::Audio(format!("WAV: {e}"))
    }
}
