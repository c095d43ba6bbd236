//! Podcast production: headlines → monologue → MP3, plus the text digest.
//!
//! Components:
//! - `summarizer`: Gemini prompt building and monologue generation
//! - `tts`: Gemini speech generation
//! - `encoder`: raw PCM → WAV → MP3
//! - `digest`: HTML headline digest for Telegram

pub mod digest;
pub mod encoder;
pub mod summarizer;
pub mod tts;
