//! End-to-end behaviour of a subscription, driven through the public API with
//! scripted fetchers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use crossbeam_channel::{bounded, RecvTimeoutError};
use feedsub::{subscribe, Batch, FetchError, FetchResult, Fetcher};

const WAIT: Duration = Duration::from_secs(5);

// ============================================================================
// Test fetchers
// ============================================================================

/// Runs a closure per call, passing the zero-based call number.
struct Scripted<T> {
    calls: Arc<AtomicUsize>,
    script: Box<dyn Fn(usize) -> FetchResult<T> + Send + Sync>,
}

fn scripted<T>(
    script: impl Fn(usize) -> FetchResult<T> + Send + Sync + 'static,
) -> (Scripted<T>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let fetcher = Scripted {
        calls: Arc::clone(&calls),
        script: Box::new(script),
    };
    (fetcher, calls)
}

impl<T: Send + 'static> Fetcher for Scripted<T> {
    type Item = T;

    fn fetch(&self) -> FetchResult<T> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        (self.script)(n)
    }
}

/// Blocks every call until the returned sender is dropped.
fn never_completes<T: Send + 'static>() -> (Scripted<T>, crossbeam_channel::Sender<()>) {
    let (gate_tx, gate_rx) = bounded::<()>(0);
    let (fetcher, _) = scripted(move |_| {
        let _ = gate_rx.recv();
        Err(FetchError::Aborted)
    });
    (fetcher, gate_tx)
}

fn overdue() -> chrono::DateTime<Utc> {
    Utc::now() - chrono::Duration::seconds(1)
}

fn far_future() -> chrono::DateTime<Utc> {
    Utc::now() + chrono::Duration::hours(1)
}

fn wait_for(cond: impl Fn() -> bool) {
    let deadline = Instant::now() + WAIT;
    while !cond() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(5));
    }
}

// ============================================================================
// Delivery
// ============================================================================

#[test]
fn nothing_is_delivered_while_the_queue_is_empty() {
    let (fetcher, _gate) = never_completes::<String>();
    let sub = subscribe(fetcher);

    let got = sub.updates().recv_timeout(Duration::from_millis(200));
    assert_eq!(got, Err(RecvTimeoutError::Timeout));
    assert_eq!(sub.unsubscribe(), Ok(()));
}

#[test]
fn items_arrive_in_fetch_order() {
    let (gate_tx, gate_rx) = bounded::<()>(0);
    let (fetcher, _) = scripted(move |n| {
        if n == 0 {
            return Ok(Batch::new(vec!["a", "b", "c"], overdue()));
        }
        let _ = gate_rx.recv();
        Err(FetchError::Aborted)
    });
    let sub = subscribe(fetcher);
    let updates = sub.updates();

    let got: Vec<_> = (0..3).map(|_| updates.recv_timeout(WAIT).unwrap()).collect();
    assert_eq!(got, ["a", "b", "c"]);

    sub.unsubscribe().unwrap();
    drop(gate_tx);
}

#[test]
fn successive_fetches_append_to_the_tail() {
    let (fetcher, _) = scripted(|n| match n {
        0 => Ok(Batch::new(vec![1, 2], overdue())),
        1 => Ok(Batch::new(vec![3], overdue())),
        2 => Ok(Batch::new(vec![4, 5], far_future())),
        _ => Ok(Batch::empty(far_future())),
    });
    let sub = subscribe(fetcher);

    // Start reading only after every fetch has been queued.
    thread::sleep(Duration::from_millis(100));
    let got: Vec<_> = sub.updates().take(5).collect();
    assert_eq!(got, [1, 2, 3, 4, 5]);
}

#[test]
fn items_survive_a_later_failure() {
    let (fetcher, calls) = scripted(|n| match n {
        0 => Ok(Batch::new(vec!["kept"], overdue())),
        _ => Err(FetchError::msg("down")),
    });
    let sub = subscribe(fetcher);
    wait_for(|| calls.load(Ordering::SeqCst) >= 3);

    assert_eq!(sub.updates().recv_timeout(WAIT), Ok("kept"));
    assert_eq!(sub.unsubscribe(), Err(FetchError::msg("down")));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn fetch_error_is_relayed_on_unsubscribe() {
    let err = FetchError::msg("Fetch error");
    let expected = err.clone();
    let (fetcher, calls) = scripted::<u8>(move |_| Err(err.clone()));
    let sub = subscribe(fetcher);

    wait_for(|| calls.load(Ordering::SeqCst) >= 2);
    assert_eq!(sub.unsubscribe(), Err(expected));
}

#[test]
fn clean_fetch_reports_no_error_and_no_items() {
    let (fetcher, calls) = scripted::<u8>(|_| Ok(Batch::empty(overdue())));
    let sub = subscribe(fetcher);
    let updates = sub.updates();

    wait_for(|| calls.load(Ordering::SeqCst) >= 2);
    assert_eq!(sub.unsubscribe(), Ok(()));
    assert_eq!(updates.count(), 0);
}

#[test]
fn later_success_clears_earlier_error() {
    let (fetcher, calls) = scripted::<u8>(|n| match n {
        0 => Err(FetchError::msg("transient")),
        _ => Ok(Batch::empty(far_future())),
    });
    let sub = subscribe(fetcher);

    wait_for(|| calls.load(Ordering::SeqCst) >= 2);
    // The second call has started; give it time to be recorded.
    thread::sleep(Duration::from_millis(50));
    assert_eq!(sub.unsubscribe(), Ok(()));
}

#[test]
fn panicking_fetcher_is_recorded_as_aborted() {
    let (fetcher, calls) = scripted::<u8>(|n| match n {
        0 => panic!("fetcher bug"),
        _ => {
            thread::sleep(Duration::from_secs(60));
            Ok(Batch::empty(far_future()))
        }
    });
    let sub = subscribe(fetcher);

    wait_for(|| calls.load(Ordering::SeqCst) >= 2);
    assert_eq!(sub.unsubscribe(), Err(FetchError::Aborted));
}

// ============================================================================
// Scheduling
// ============================================================================

#[test]
fn at_most_one_fetch_in_flight() {
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let (a, p) = (Arc::clone(&active), Arc::clone(&peak));

    let (fetcher, calls) = scripted::<u8>(move |_| {
        let now = a.fetch_add(1, Ordering::SeqCst) + 1;
        p.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(10));
        a.fetch_sub(1, Ordering::SeqCst);
        Ok(Batch::empty(overdue()))
    });
    let sub = subscribe(fetcher);

    wait_for(|| calls.load(Ordering::SeqCst) >= 10);
    sub.unsubscribe().unwrap();
    assert_eq!(peak.load(Ordering::SeqCst), 1);
}

#[test]
fn refresh_time_is_honoured() {
    let (fetcher, calls) = scripted::<u8>(|_| Ok(Batch::empty(far_future())));
    let sub = subscribe(fetcher);

    wait_for(|| calls.load(Ordering::SeqCst) >= 1);
    thread::sleep(Duration::from_millis(200));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    sub.unsubscribe().unwrap();
}

#[test]
fn no_fetch_starts_after_unsubscribe() {
    let (fetcher, calls) = scripted::<u8>(|_| {
        thread::sleep(Duration::from_millis(5));
        Ok(Batch::empty(overdue()))
    });
    let sub = subscribe(fetcher);
    wait_for(|| calls.load(Ordering::SeqCst) >= 1);

    sub.unsubscribe().unwrap();
    thread::sleep(Duration::from_millis(50));
    let settled = calls.load(Ordering::SeqCst);
    thread::sleep(Duration::from_millis(100));
    assert_eq!(calls.load(Ordering::SeqCst), settled);
}

// ============================================================================
// Shutdown
// ============================================================================

#[test]
fn unsubscribe_twice_returns_the_same_error() {
    let (fetcher, calls) = scripted::<u8>(|_| Err(FetchError::msg("gone")));
    let sub = subscribe(fetcher);
    wait_for(|| calls.load(Ordering::SeqCst) >= 2);

    let first = sub.unsubscribe();
    let second = sub.unsubscribe();
    assert_eq!(first, Err(FetchError::msg("gone")));
    assert_eq!(first, second);
}

#[test]
fn concurrent_unsubscribes_agree() {
    let (fetcher, calls) = scripted::<u8>(|_| Err(FetchError::msg("gone")));
    let sub = Arc::new(subscribe(fetcher));
    wait_for(|| calls.load(Ordering::SeqCst) >= 2);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let sub = Arc::clone(&sub);
            thread::spawn(move || sub.unsubscribe())
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), Err(FetchError::msg("gone")));
    }
}

#[test]
fn blocked_reader_sees_end_of_stream() {
    let (fetcher, _gate) = never_completes::<u8>();
    let sub = subscribe(fetcher);
    let updates = sub.updates();

    let reader = thread::spawn(move || updates.recv());
    thread::sleep(Duration::from_millis(50));
    sub.unsubscribe().unwrap();

    assert_eq!(reader.join().unwrap(), None);
}
