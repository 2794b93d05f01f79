//! The one failure kind a subscription knows about.
//!
//! Every error originates in a [`Fetcher`](crate::source::Fetcher).  The
//! coordinator records it and hands it back from
//! [`Subscription::unsubscribe`](crate::Subscription::unsubscribe), so the
//! type is cheap to clone and comparable.

use thiserror::Error;

/// A failed fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The transport failed (DNS, connect, non-UTF-8 body, ...).
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The response arrived but was not a readable feed.
    #[error("feed could not be parsed: {0}")]
    Parse(String),

    /// Any other failure reported by a fetcher.
    #[error("{0}")]
    Source(String),

    /// The fetch task ended without reporting a result.
    #[error("fetch aborted before producing a result")]
    Aborted,
}

impl FetchError {
    /// Wrap an arbitrary message as a fetch failure.
    pub fn msg(message: impl std::fmt::Display) -> Self {
        Self::Source(message.to_string())
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

impl From<rss::Error> for FetchError {
    fn from(e: rss::Error) -> Self {
        Self::Parse(e.to_string())
    }
}
