//! Fetcher abstraction layer.
//!
//! This module defines the [`Fetcher`] trait consumed by the subscription
//! coordinator, the [`FetchResult`] it produces, and the [`FeedItem`] type
//! used by the bundled RSS implementation (see [`RssFetcher`]).
//!
//! ## For contributors — adding a new fetcher
//!
//! 1. Create a new file in this directory (e.g. `atom.rs`).
//! 2. Define a struct holding its configuration and implement [`Fetcher`].
//! 3. Add `mod atom;` below and re-export your struct in the `pub use` block.
//! 4. Pass an instance to [`Subscription::new`](crate::Subscription::new).
//!
//! The coordinator never looks inside items, so `Fetcher::Item` can be any
//! `Send` type.

mod feed_item;
mod rss;

pub use feed_item::FeedItem;
pub use self::rss::{RssFetcher, DEFAULT_REFRESH};

use chrono::{DateTime, Utc};

use crate::error::FetchError;

/// The outcome of one [`Fetcher::fetch`] call.
pub type FetchResult<T> = Result<Batch<T>, FetchError>;

/// Items returned by a successful fetch, plus when to fetch again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch<T> {
    /// Items in the order the source listed them.
    pub items: Vec<T>,
    /// Earliest instant the next fetch should start.  A time in the past
    /// means "immediately".
    pub next_refresh: DateTime<Utc>,
}

impl<T> Batch<T> {
    pub fn new(items: Vec<T>, next_refresh: DateTime<Utc>) -> Self {
        Self {
            items,
            next_refresh,
        }
    }

    /// A successful fetch that produced nothing new.
    pub fn empty(next_refresh: DateTime<Utc>) -> Self {
        Self::new(Vec::new(), next_refresh)
    }
}

/// Trait that every fetcher must implement.
///
/// The coordinator calls [`fetch()`](Fetcher::fetch) on a short-lived
/// background thread, never more than one at a time, so implementations
/// must be [`Send`] + [`Sync`] and may block for as long as they like.
///
/// ## Implementing a new fetcher
///
/// ```ignore
/// pub struct MyFetcher { /* config fields */ }
///
/// impl Fetcher for MyFetcher {
///     type Item = String;
///
///     fn fetch(&self) -> FetchResult<String> {
///         // Perform HTTP / IO, then report the items and next refresh time.
///         todo!()
///     }
/// }
/// ```
pub trait Fetcher: Send + Sync + 'static {
    /// The unit of content this fetcher produces.
    type Item: Send + 'static;

    /// Perform one blocking fetch.
    fn fetch(&self) -> FetchResult<Self::Item>;
}
