//! The coordinator loop behind every [`Subscription`](crate::Subscription).
//!
//! Runs on a dedicated thread and owns all mutable subscription state: the
//! pending item queue, the next refresh time, the last fetch error and the
//! handle of the fetch currently in flight.  Nothing else touches that state;
//! the outside world talks to the loop over three [`crossbeam_channel`]
//! channels:
//!
//! * `updates` — zero-capacity, one item handed to a waiting reader at a time;
//! * the per-fetch completion channel — capacity one, so a fetch that
//!   finishes after the loop has exited drops its result without blocking;
//! * `closing` — zero-capacity, carries the reply sender for the shutdown
//!   handshake.
//!
//! ## For contributors
//!
//! Each iteration builds a [`Select`] over whichever operations are currently
//! allowed and services exactly one of them.  The deliver branch is only
//! registered while the queue is non-empty, and the timer branch only while
//! no fetch is in flight, so an empty queue never offers an item and a second
//! fetch can never start before the first reports back.
//!
//! Failures are not backed off: if the refresh time is already overdue the
//! next fetch starts as soon as the failed one has been recorded.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossbeam_channel::{after, bounded, Receiver, Select, SendError, Sender};

use crate::error::FetchError;
use crate::source::{FetchResult, Fetcher};

/// Reply slot sent with a shutdown request.
pub(crate) type Reply = Sender<Result<(), FetchError>>;

/// Start the coordinator for `fetcher`.
///
/// Returns the item stream receiver and the shutdown request sender.
pub(crate) fn spawn<F: Fetcher>(fetcher: F) -> (Receiver<F::Item>, Sender<Reply>) {
    let (updates_tx, updates_rx) = bounded(0);
    let (closing_tx, closing_rx) = bounded(0);

    let coordinator = Coordinator {
        fetcher: Arc::new(fetcher),
        updates: updates_tx,
        closing: closing_rx,
        queue: VecDeque::new(),
        refresh_at: None,
        last_error: None,
        in_flight: None,
    };
    thread::spawn(move || coordinator.run());

    (updates_rx, closing_tx)
}

/// How long to wait before the next fetch may start.  `None` means overdue.
pub(crate) fn delay_until(refresh_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Duration {
    refresh_at
        .and_then(|at| (at - now).to_std().ok())
        .unwrap_or(Duration::ZERO)
}

/// What one loop iteration ended up doing.
enum Step<T> {
    FetchDue,
    Delivered,
    Fetched(FetchResult<T>),
    Shutdown(Option<Reply>),
    ConsumerGone,
}

struct Coordinator<F: Fetcher> {
    fetcher: Arc<F>,
    updates: Sender<F::Item>,
    closing: Receiver<Reply>,
    queue: VecDeque<F::Item>,
    refresh_at: Option<DateTime<Utc>>,
    last_error: Option<FetchError>,
    in_flight: Option<Receiver<FetchResult<F::Item>>>,
}

impl<F: Fetcher> Coordinator<F> {
    fn run(mut self) {
        loop {
            match self.next_step() {
                Step::FetchDue => self.start_fetch(),
                Step::Delivered => {}
                Step::Fetched(result) => self.complete(result),
                Step::Shutdown(reply) => return self.shutdown(reply),
                Step::ConsumerGone => {
                    tracing::debug!("item stream has no readers left, stopping");
                    return;
                }
            }
        }
    }

    /// Block until one allowed operation is ready and perform it.
    fn next_step(&mut self) -> Step<F::Item> {
        let timer = match self.in_flight {
            Some(_) => None,
            None => Some(after(delay_until(self.refresh_at, Utc::now()))),
        };

        let mut sel = Select::new();
        let timer_op = timer.as_ref().map(|t| (sel.recv(t), t));
        let done_op = self.in_flight.as_ref().map(|rx| (sel.recv(rx), rx));
        let deliver_idx = if self.queue.is_empty() {
            None
        } else {
            Some(sel.send(&self.updates))
        };
        let closing_idx = sel.recv(&self.closing);

        let oper = sel.select();
        let index = oper.index();

        if let Some((_, t)) = timer_op.filter(|(i, _)| *i == index) {
            let _ = oper.recv(t);
            return Step::FetchDue;
        }

        if let Some((_, rx)) = done_op.filter(|(i, _)| *i == index) {
            // A disconnect means the fetch thread died before sending.
            return Step::Fetched(oper.recv(rx).unwrap_or(Err(FetchError::Aborted)));
        }

        if deliver_idx == Some(index) {
            let Some(item) = self.queue.pop_front() else {
                unreachable!("deliver branch registered with an empty queue");
            };
            return match oper.send(&self.updates, item) {
                Ok(()) => {
                    tracing::trace!(pending = self.queue.len(), "item delivered");
                    Step::Delivered
                }
                Err(SendError(item)) => {
                    self.queue.push_front(item);
                    Step::ConsumerGone
                }
            };
        }

        debug_assert_eq!(index, closing_idx);
        Step::Shutdown(oper.recv(&self.closing).ok())
    }

    fn start_fetch(&mut self) {
        let (done_tx, done_rx) = bounded(1);
        let fetcher = Arc::clone(&self.fetcher);

        thread::spawn(move || {
            // The loop may have exited meanwhile; the result is then dropped.
            let _ = done_tx.send(fetcher.fetch());
        });

        self.in_flight = Some(done_rx);
        tracing::debug!("fetch started");
    }

    fn complete(&mut self, result: FetchResult<F::Item>) {
        self.in_flight = None;

        match result {
            Ok(batch) => {
                tracing::debug!(
                    items = batch.items.len(),
                    next_refresh = %batch.next_refresh,
                    "fetch finished"
                );
                self.queue.extend(batch.items);
                self.refresh_at = Some(batch.next_refresh);
                self.last_error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "fetch failed");
                self.last_error = Some(e);
            }
        }
    }

    /// Close the item stream, then acknowledge with the last fetch outcome.
    fn shutdown(self, reply: Option<Reply>) {
        let Coordinator {
            updates,
            queue,
            last_error,
            in_flight,
            ..
        } = self;
        drop(updates);

        tracing::info!(
            undelivered = queue.len(),
            fetch_in_flight = in_flight.is_some(),
            "subscription closed"
        );

        if let Some(reply) = reply {
            let _ = reply.send(last_error.map_or(Ok(()), Err));
        }
    }
}
