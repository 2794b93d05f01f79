//! feedsub — a live-scrolling terminal view of one feed subscription.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────────┐  Updates   ┌──────────┐  draw()  ┌──────────┐
//! │ Subscription │ ─────────► │  app.rs  │ ───────► │  ui.rs   │
//! │  (library)   │  (stream)  │ (state)  │          │ (render) │
//! └──────────────┘            └──────────┘          └──────────┘
//!                                  ▲
//!                                  │ handle_key_event()
//!                             ┌──────────┐
//!                             │ input.rs │
//!                             └──────────┘
//! ```
//!
//! * **`app`** — items received so far, scroll position, follow mode.
//! * **`ui`** — pure rendering: reads `App` state and draws widgets.
//! * **`input`** — maps key events to `App` mutations.
//! * **`main`** — parses args, subscribes, sets up the terminal, runs the
//!   event loop and unsubscribes on exit.

mod app;
mod input;
mod ui;

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::EnvFilter;

use app::App;
use feedsub::{FeedItem, RssFetcher, Subscription, Updates};

const DEFAULT_FEED: &str = "https://feeds.bbci.co.uk/news/rss.xml";

/// Upper bound on time spent pulling items per tick, so input stays
/// responsive while a large batch is being handed over.
const DRAIN_BUDGET: Duration = Duration::from_millis(20);

#[derive(Parser, Debug)]
#[command(name = "feedsub", about = "Live-scrolling view of an RSS feed subscription")]
struct Args {
    /// Feed URL to subscribe to
    #[arg(default_value = DEFAULT_FEED)]
    url: String,

    /// Label shown in the title bar
    #[arg(long, default_value = "RSS")]
    label: String,

    /// Refresh interval (minutes) for feeds that do not advertise a <ttl>
    #[arg(long, value_name = "MINUTES", default_value_t = 10)]
    refresh_minutes: u64,

    /// UI tick interval in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 100)]
    tick_ms: u64,

    /// Write logs here (filtered by RUST_LOG, default "info"); off otherwise
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// RAII terminal guard
// ---------------------------------------------------------------------------

/// Enters raw mode + alternate screen on construction and restores the
/// terminal on [`Drop`], including during unwinding.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Restore the terminal before the default panic message is printed.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file '{}'", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Move whatever the subscription is handing over into `app`.
fn drain_updates(updates: &Updates<FeedItem>, app: &mut App) -> usize {
    let deadline = Instant::now() + DRAIN_BUDGET;
    let mut received = 0;

    while let Ok(item) = updates.recv_timeout(Duration::from_millis(1)) {
        app.push_item(item);
        received += 1;
        if Instant::now() >= deadline {
            break;
        }
    }
    received
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }
    install_panic_hook();

    let fetcher = RssFetcher::new(&args.url, &args.label)
        .with_default_refresh(Duration::from_secs(args.refresh_minutes * 60));
    tracing::info!(url = %args.url, "subscribing");
    let sub = Subscription::new(fetcher);
    let updates = sub.updates();

    let mut guard = TerminalGuard::new()?;
    let mut app = App::new();
    let tick_rate = Duration::from_millis(args.tick_ms);
    let mut total = 0usize;

    loop {
        let received = drain_updates(&updates, &mut app);
        if received > 0 {
            total += received;
            app.status = format!("Received {received} new, {total} total");
        }

        guard
            .terminal
            .draw(|f| ui::draw(&mut app, f, &args.label))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                input::handle_key_event(&mut app, key);
            }
        }

        if app.quit {
            break;
        }
    }

    drop(guard);

    if let Err(e) = sub.unsubscribe() {
        tracing::warn!(error = %e, "last fetch before exit failed");
        eprintln!("Last fetch failed: {e}");
    }
    Ok(())
}
