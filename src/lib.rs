//! feedsub — subscribe to a periodically refreshed feed and read its items
//! as one ordered, blocking stream.
//!
//! ## Architecture overview
//!
//! ```text
//!                 fetch() on its own thread
//!  ┌──────────┐  ───────────────────────►  ┌──────────────┐
//!  │  poll.rs │   FetchResult (channel)    │  source/     │
//!  │ (thread) │  ◄───────────────────────  │  (Fetcher)   │
//!  └──────────┘                            └──────────────┘
//!     │     ▲
//!     │     │ shutdown request + reply slot
//!     ▼     │
//!  ┌─────────────────┐
//!  │ subscription.rs │  updates() / unsubscribe()
//!  └─────────────────┘
//! ```
//!
//! * **`source/`** — the [`Fetcher`] trait, [`FetchResult`], and the bundled
//!   [`RssFetcher`].
//! * **`poll`** — the coordinator loop: schedules fetches (at most one at a
//!   time), queues their items and hands them out one by one.
//! * **`subscription`** — the [`Subscription`] handle and its [`Updates`]
//!   stream.
//! * **`error`** — [`FetchError`], the only error a subscription reports.
//!
//! ```no_run
//! use feedsub::{subscribe, RssFetcher};
//!
//! let sub = subscribe(RssFetcher::new("https://feeds.bbci.co.uk/news/rss.xml", "BBC"));
//! for item in sub.updates().take(5) {
//!     println!("{}", item.title);
//! }
//! if let Err(e) = sub.unsubscribe() {
//!     eprintln!("last fetch failed: {e}");
//! }
//! ```

pub mod error;
mod poll;
pub mod source;
mod subscription;

pub use error::FetchError;
pub use source::{Batch, FeedItem, FetchResult, Fetcher, RssFetcher};
pub use subscription::{subscribe, Subscription, Updates};
