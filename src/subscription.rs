//! The consumer-facing subscription handle.

use std::sync::OnceLock;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::error::FetchError;
use crate::poll::{self, Reply};
use crate::source::Fetcher;

/// A live subscription to one [`Fetcher`].
///
/// Creating a subscription starts a background coordinator that fetches on
/// the schedule the fetcher reports and hands items to [`updates()`]
/// readers in arrival order.  [`unsubscribe()`] stops it and reports the
/// outcome of the most recent completed fetch.
///
/// Dropping the handle unsubscribes implicitly.
///
/// [`updates()`]: Subscription::updates
/// [`unsubscribe()`]: Subscription::unsubscribe
pub struct Subscription<T> {
    updates: Receiver<T>,
    closing: Sender<Reply>,
    outcome: OnceLock<Result<(), FetchError>>,
}

/// Subscribe to `fetcher`.  Shorthand for [`Subscription::new`].
pub fn subscribe<F: Fetcher>(fetcher: F) -> Subscription<F::Item> {
    Subscription::new(fetcher)
}

impl<T: Send + 'static> Subscription<T> {
    pub fn new<F: Fetcher<Item = T>>(fetcher: F) -> Self {
        let (updates, closing) = poll::spawn(fetcher);
        tracing::debug!("subscription started");
        Self {
            updates,
            closing,
            outcome: OnceLock::new(),
        }
    }
}

impl<T> Subscription<T> {
    /// The item stream.  Every call returns a handle onto the same stream;
    /// each item goes to exactly one reader.
    pub fn updates(&self) -> Updates<T> {
        Updates {
            receiver: self.updates.clone(),
        }
    }

    /// Stop the subscription.
    ///
    /// Blocks until the coordinator acknowledges, by which point the item
    /// stream is closed.  Returns the error of the most recent completed
    /// fetch, or `Ok(())` if it succeeded or none has completed.  Later
    /// calls return the same value without contacting the coordinator.
    pub fn unsubscribe(&self) -> Result<(), FetchError> {
        self.outcome.get_or_init(|| self.shutdown()).clone()
    }

    /// Whether [`unsubscribe()`](Subscription::unsubscribe) has completed.
    pub fn is_closed(&self) -> bool {
        self.outcome.get().is_some()
    }

    fn shutdown(&self) -> Result<(), FetchError> {
        let (reply_tx, reply_rx) = bounded(1);
        if self.closing.send(reply_tx).is_err() {
            tracing::debug!("coordinator already stopped");
            return Ok(());
        }
        reply_rx.recv().unwrap_or(Ok(()))
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        let _ = self.unsubscribe();
    }
}

/// Read side of a subscription's item stream.
///
/// Reads block until an item is handed over or the subscription closes;
/// after that the stream is exhausted.  Fetch failures never appear here.
pub struct Updates<T> {
    receiver: Receiver<T>,
}

impl<T> Updates<T> {
    /// Receive the next item (blocking).  `None` once the subscription is
    /// closed.
    pub fn recv(&self) -> Option<T> {
        self.receiver.recv().ok()
    }

    /// Take an item only if the coordinator is offering one right now.
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

impl<T> Clone for Updates<T> {
    fn clone(&self) -> Self {
        Self {
            receiver: self.receiver.clone(),
        }
    }
}

impl<T> Iterator for Updates<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.recv()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
