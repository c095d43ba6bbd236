//! justin-time-news: daily news-to-podcast pipeline.

mod config;
mod delivery;
mod error;
mod feed;
mod gemini;
mod pipeline;
mod podcast;
mod telegram;

use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use pipeline::PipelineOutcome;

#[derive(Parser, Debug)]
#[command(name = "justin-time-news", about = "Turn today's headlines into a podcast episode")]
struct Args {
    /// Path to config.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the RSS feed URL
    #[arg(long)]
    feed_url: Option<String>,

    /// Save the MP3 locally instead of sending it (same as DEBUG_MODE=1)
    #[arg(long)]
    debug: bool,

    /// Also send the HTML headline digest before the audio
    #[arg(long)]
    send_digest: bool,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging (suppress noisy HTTP internals)
    let filter = if args.verbose {
        EnvFilter::new("debug,hyper=info,reqwest=info")
    } else {
        EnvFilter::new("info,hyper=warn,reqwest=warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("justin-time-news starting");

    if let Ok(path) = dotenvy::dotenv() {
        info!("Loaded environment from {}", path.display());
    }

    let mut config = config::Config::load(args.config.as_deref());
    config.apply_env(|key| std::env::var(key).ok());
    if let Some(url) = args.feed_url {
        config.feed.url = url;
    }
    if args.debug {
        config.debug.enabled = true;
    }
    if args.send_digest {
        config.telegram.send_digest = true;
    }
    info!(
        "Config loaded: feed tz={}, text model={}, tts model={}, debug={}",
        config.feed.timezone, config.gemini.text_model, config.gemini.tts_model, config.debug.enabled
    );

    let mut news = pipeline::Pipeline::new(config)?;
    let outcome = match news.run().await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Pipeline failed: {e}");
            return Err(e.into());
        }
    };

    match outcome {
        PipelineOutcome::NoRecentNews => {}
        PipelineOutcome::SavedLocally { path, audio } => {
            info!("Run finished: {} bytes written to {}", audio.data.len(), path.display());
        }
        PipelineOutcome::DeliverySkipped { digest } => {
            info!("Run finished without delivery. Digest:\n{digest}");
        }
        PipelineOutcome::Delivered { digest, report } => {
            tracing::debug!("Digest for this run:\n{digest}");
            if !report.all_succeeded() {
                for failed in report.outcomes.iter().filter(|o| o.result.is_err()) {
                    warn!("Delivery to {} did not go through", failed.chat_id);
                }
            }
            info!(
                "Run finished: delivered to {}/{} recipients",
                report.succeeded(),
                report.outcomes.len()
            );
        }
    }

    Ok(())
}
