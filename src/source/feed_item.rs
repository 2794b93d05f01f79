//! The item type produced by [`RssFetcher`](super::RssFetcher).
//!
//! The subscription core treats items as opaque; this struct only exists so
//! the RSS fetcher and the terminal view agree on what an entry looks like.

use chrono::{DateTime, Utc};

/// A single feed entry.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FeedItem {
    /// Stable identifier: the RSS `<guid>`, falling back to `<link>`.
    pub id: String,

    /// Human-readable headline.
    pub title: String,

    /// Optional longer description or summary text.
    pub description: Option<String>,

    /// URL to the full content.
    pub link: Option<String>,

    /// Publication timestamp, if the feed provided a parseable one.
    pub published: Option<DateTime<Utc>>,

    /// Label of the feed this came from (e.g. "BBC News").
    pub source_name: String,
}

impl FeedItem {
    /// Publication time formatted for a fixed-width column.
    pub fn date_label(&self) -> String {
        self.published
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "no date".into())
    }
}
