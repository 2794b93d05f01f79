//! RSS feed fetcher.
//!
//! Fetches an RSS 2.0 channel over HTTP, converts its entries into
//! [`FeedItem`]s, and derives the next refresh time from the channel's
//! `<ttl>` element.  Use it as a template when adding support for Atom,
//! JSON Feed, or any other format.

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{Batch, FeedItem, FetchResult, Fetcher};

/// Refresh interval used when a feed does not advertise a `<ttl>`.
pub const DEFAULT_REFRESH: Duration = Duration::from_secs(10 * 60);

/// An RSS feed fetcher.
#[derive(Debug, Clone)]
pub struct RssFetcher {
    /// The feed URL to poll.
    pub url: String,
    /// Short label attached to every item from this feed.
    pub label: String,
    /// Fallback refresh interval for feeds without a `<ttl>`.
    pub default_refresh: Duration,
}

impl RssFetcher {
    /// Create a new RSS fetcher.
    ///
    /// # Arguments
    ///
    /// * `url` — full URL of the RSS feed (e.g.
    ///   `https://feeds.bbci.co.uk/news/rss.xml`).
    /// * `label` — short name recorded as each item's `source_name`.
    pub fn new(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
            default_refresh: DEFAULT_REFRESH,
        }
    }

    /// Override the interval used when the feed carries no `<ttl>`.
    pub fn with_default_refresh(mut self, interval: Duration) -> Self {
        self.default_refresh = interval;
        self
    }

    /// Parse an already-fetched [`rss::Channel`] into [`FeedItem`]s,
    /// preserving document order.
    pub fn parse_channel(channel: &rss::Channel, label: &str) -> Vec<FeedItem> {
        channel
            .items()
            .iter()
            .map(|item| {
                // Prefer <guid>, fall back to <link>, then empty string.
                let id = item
                    .guid()
                    .map(|g| g.value().to_string())
                    .or_else(|| item.link().map(String::from))
                    .unwrap_or_default();

                let published = item
                    .pub_date()
                    .and_then(|d| DateTime::parse_from_rfc2822(d).ok())
                    .map(|dt| dt.with_timezone(&Utc));

                FeedItem {
                    id,
                    title: item.title().unwrap_or("(untitled)").to_string(),
                    description: item.description().map(String::from),
                    link: item.link().map(String::from),
                    published,
                    source_name: label.to_string(),
                }
            })
            .collect()
    }

    /// When to poll `channel` again, counted from `now`.
    ///
    /// A positive `<ttl>` (minutes) wins; anything else falls back to
    /// `default_refresh`.
    pub fn next_refresh(
        channel: &rss::Channel,
        default_refresh: Duration,
        now: DateTime<Utc>,
    ) -> DateTime<Utc> {
        let ttl = channel
            .ttl()
            .and_then(|t| t.trim().parse::<u32>().ok())
            .filter(|&minutes| minutes > 0);

        let interval = match ttl {
            Some(minutes) => chrono::Duration::minutes(i64::from(minutes)),
            None => chrono::Duration::from_std(default_refresh)
                .unwrap_or_else(|_| chrono::Duration::minutes(10)),
        };
        now + interval
    }
}

impl Fetcher for RssFetcher {
    type Item = FeedItem;

    fn fetch(&self) -> FetchResult<FeedItem> {
        let body = reqwest::blocking::get(&self.url)?
            .error_for_status()?
            .bytes()?;
        let channel = rss::Channel::read_from(body.as_ref())?;

        let items = Self::parse_channel(&channel, &self.label);
        let next_refresh = Self::next_refresh(&channel, self.default_refresh, Utc::now());
        tracing::debug!(url = %self.url, items = items.len(), %next_refresh, "parsed feed");

        Ok(Batch::new(items, next_refresh))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
