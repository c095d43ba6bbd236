//! Feed collector: RSS/Atom feed → recent headline records.
//!
//! Keeps a rolling two-day window (today and yesterday) computed in a
//! fixed time zone. Entries whose publication date is missing or
//! unparseable are dropped.

use std::time::Duration;

use chrono::{DateTime, Days, NaiveDate, Utc};
use chrono_tz::Tz;
use feed_rs::model::Feed;
use reqwest::Client;
use tracing::{debug, info};

use crate::config::FeedConfig;
use crate::error::{PipelineError, Result};

/// One parsed feed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlineRecord {
    pub title: String,
    pub link: String,
    pub published: DateTime<Utc>,
}

pub struct FeedCollector {
    client: Client,
    tz: Tz,
}

impl FeedCollector {
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("justin-time-news/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            tz: config.tz()?,
        })
    }

    /// Fetch the feed and keep entries from today and yesterday.
    pub async fn fetch_recent(&self, url: &str) -> Result<Vec<HeadlineRecord>> {
        debug!("Fetching feed from {url}");
        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PipelineError::Api {
                service: "Feed",
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await?;
        let feed = feed_rs::parser::parse(bytes.as_ref())?;
        let total = feed.entries.len();

        let items = recent_headlines(feed, self.tz, today_in(self.tz));
        info!("Feed returned {total} entries, {} within the last two days", items.len());
        Ok(items)
    }
}

/// Current calendar date in `tz`.
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Keep entries published on `today` or the day before, in feed order.
pub fn recent_headlines(feed: Feed, tz: Tz, today: NaiveDate) -> Vec<HeadlineRecord> {
    let yesterday = today - Days::new(1);

    feed.entries
        .into_iter()
        .filter_map(|entry| {
            let published = entry.published?;
            if published.with_timezone(&tz).date_naive() < yesterday {
                return None;
            }
            let title = entry
                .title
                .map(|t| t.content.trim().to_string())
                .unwrap_or_default();
            let link = entry
                .links
                .into_iter()
                .next()
                .map(|l| l.href)
                .unwrap_or_default();
            Some(HeadlineRecord {
                title,
                link,
                published,
            })
        })
        .collect()
}
