//! State of the live-scrolling view.

use ratatui::widgets::ListState;

use feedsub::FeedItem;

pub struct App {
    /// Every item received so far, oldest first.
    pub items: Vec<FeedItem>,
    /// List selection state for scrolling.
    pub list_state: ListState,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Last status message.
    pub status: String,
    /// Keep the newest item selected as new ones arrive.
    pub follow: bool,
}

impl App {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            list_state: ListState::default(),
            quit: false,
            status: "Waiting for first fetch…".into(),
            follow: true,
        }
    }

    /// Append an item in arrival order.
    pub fn push_item(&mut self, item: FeedItem) {
        self.items.push(item);
        if self.follow {
            self.list_state.select(Some(self.items.len() - 1));
        }
    }

    // -- navigation ----------------------------------------------------------

    pub fn select_next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1).min(self.items.len() - 1),
            None => 0,
        };
        self.select(i);
    }

    pub fn select_previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = self
            .list_state
            .selected()
            .map_or(0, |i| i.saturating_sub(1));
        self.select(i);
    }

    pub fn select_first(&mut self) {
        if !self.items.is_empty() {
            self.select(0);
        }
    }

    pub fn select_last(&mut self) {
        if !self.items.is_empty() {
            self.select(self.items.len() - 1);
        }
    }

    /// Scrolling away from the newest item pauses following; scrolling back
    /// to it resumes.
    fn select(&mut self, i: usize) {
        self.list_state.select(Some(i));
        self.follow = i + 1 == self.items.len();
    }
}
