use flume::{Receiver, Sender, unbounded};
use log::debug;

use crate::backend::{SearchBackend, SearchDirection};
use crate::engine::SearchOptions;
use crate::matcher::Match;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Closed,
    /// Open with no query.
    Empty,
    /// Open with a query whose results are stored.
    Searching,
}

/// Externally observable state of a search session.
///
/// `current_match` is 1-based and 0 exactly when `total_matches` is 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationState {
    pub is_open: bool,
    pub query: String,
    pub current_match: usize,
    pub total_matches: usize,
    pub case_sensitive: bool,
    pub whole_word: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchAction {
    Open,
    Close,
    Next,
    Previous,
    ToggleCaseSensitive,
    ToggleWholeWord,
}

#[derive(Debug)]
struct PendingSearch {
    generation: u64,
    query: String,
}

/// Manages the search session lifecycle over one backend.
pub struct SearchSession<B> {
    backend: B,
    phase: SearchPhase,
    query: String,
    options: SearchOptions,
    default_options: SearchOptions,
    matches: Vec<Match>,
    current_match: usize,
    generation: u64,
    pending_tx: Sender<PendingSearch>,
    pending_rx: Receiver<PendingSearch>,
}

impl<B: SearchBackend> SearchSession<B> {
    pub fn new(backend: B) -> Self {
        Self::with_options(backend, SearchOptions::default())
    }

    /// Creates a session whose options start at, and reset to, `defaults`.
    pub fn with_options(backend: B, defaults: SearchOptions) -> Self {
        let (pending_tx, pending_rx) = unbounded();
        Self {
            backend,
            phase: SearchPhase::Closed,
            query: String::new(),
            options: defaults,
            default_options: defaults,
            matches: Vec::new(),
            current_match: 0,
            generation: 0,
            pending_tx,
            pending_rx,
        }
    }

    /// Activate search mode. Returns true when the session was closed, in
    /// which case the caller should focus the query input.
    pub fn open(&mut self) -> bool {
        if self.phase != SearchPhase::Closed {
            return false;
        }
        self.phase = SearchPhase::Empty;
        true
    }

    /// Deactivate search mode, clear results and release the backend's
    /// decorations.
    pub fn close(&mut self) {
        if self.phase == SearchPhase::Closed {
            return;
        }
        self.phase = SearchPhase::Closed;
        self.bump_generation();
        self.discard_pending();
        self.query.clear();
        self.clear_results();
        self.options = self.default_options;
        self.backend.close();
    }

    pub fn is_open(&self) -> bool {
        self.phase != SearchPhase::Closed
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn options(&self) -> SearchOptions {
        self.options
    }

    /// Update the query and recompute matches synchronously.
    ///
    /// Any search still queued by an option toggle is superseded.
    pub fn set_query(&mut self, query: &str) {
        if self.phase == SearchPhase::Closed {
            debug!("Ignoring query update on a closed search session");
            return;
        }
        self.bump_generation();
        self.run_search(query);
    }

    fn run_search(&mut self, query: &str) {
        self.query = query.to_string();

        if query.trim().is_empty() {
            self.phase = SearchPhase::Empty;
            self.clear_results();
            self.backend.reset();
            return;
        }

        self.phase = SearchPhase::Searching;
        self.matches = self.backend.search(query, self.options);
        self.current_match = if self.matches.is_empty() { 0 } else { 1 };
        debug!("Query `{}` produced {} matches", query, self.matches.len());

        if let Some(first) = self.matches.first() {
            self.backend.navigate(Some(first), SearchDirection::Next);
        }
    }

    fn clear_results(&mut self) {
        self.matches.clear();
        self.current_match = 0;
    }

    /// Step to the next or previous match, wrapping at either end.
    pub fn navigate(&mut self, direction: SearchDirection) {
        let total = self.matches.len();
        if total == 0 {
            return;
        }

        let next = match direction {
            SearchDirection::Next => {
                if self.current_match >= total {
                    1
                } else {
                    self.current_match + 1
                }
            }
            SearchDirection::Previous => {
                if self.current_match <= 1 {
                    total
                } else {
                    self.current_match - 1
                }
            }
        };

        self.backend.navigate(self.matches.get(next - 1), direction);
        self.current_match = next;
    }

    pub fn next_match(&mut self) {
        self.navigate(SearchDirection::Next);
    }

    pub fn previous_match(&mut self) {
        self.navigate(SearchDirection::Previous);
    }

    /// Toggle case sensitivity. An active query is re-searched on the next
    /// [`run_pending`](Self::run_pending).
    pub fn toggle_case_sensitive(&mut self) {
        if self.phase == SearchPhase::Closed {
            return;
        }
        self.options.case_sensitive = !self.options.case_sensitive;
        self.schedule_research();
    }

    /// Toggle whole-word matching. An active query is re-searched on the next
    /// [`run_pending`](Self::run_pending).
    pub fn toggle_whole_word(&mut self) {
        if self.phase == SearchPhase::Closed {
            return;
        }
        self.options.whole_word = !self.options.whole_word;
        self.schedule_research();
    }

    fn schedule_research(&mut self) {
        self.bump_generation();
        if self.query.trim().is_empty() {
            return;
        }
        let _ = self.pending_tx.send(PendingSearch {
            generation: self.generation,
            query: self.query.clone(),
        });
    }

    /// Apply the most recent scheduled search, discarding stale ones.
    /// Returns true if a search ran.
    pub fn run_pending(&mut self) -> bool {
        let mut latest = None;
        while let Ok(pending) = self.pending_rx.try_recv() {
            if pending.generation == self.generation {
                latest = Some(pending);
            } else {
                debug!(
                    "Discarding stale search for `{}` (generation {} < {})",
                    pending.query, pending.generation, self.generation
                );
            }
        }

        let Some(pending) = latest else {
            return false;
        };
        self.run_search(&pending.query);
        true
    }

    pub fn has_pending(&self) -> bool {
        !self.pending_rx.is_empty()
    }

    fn discard_pending(&mut self) {
        while self.pending_rx.try_recv().is_ok() {}
    }

    fn bump_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn apply(&mut self, action: SearchAction) {
        match action {
            SearchAction::Open => {
                self.open();
            }
            SearchAction::Close => self.close(),
            SearchAction::Next => self.next_match(),
            SearchAction::Previous => self.previous_match(),
            SearchAction::ToggleCaseSensitive => self.toggle_case_sensitive(),
            SearchAction::ToggleWholeWord => self.toggle_whole_word(),
        }
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn current(&self) -> Option<&Match> {
        self.current_match
            .checked_sub(1)
            .and_then(|index| self.matches.get(index))
    }

    pub fn current_match(&self) -> usize {
        self.current_match
    }

    pub fn total_matches(&self) -> usize {
        self.matches.len()
    }

    pub fn snapshot(&self) -> NavigationState {
        NavigationState {
            is_open: self.is_open(),
            query: self.query.clone(),
            current_match: self.current_match,
            total_matches: self.matches.len(),
            case_sensitive: self.options.case_sensitive,
            whole_word: self.options.whole_word,
        }
    }

    /// Text for the overlay's match counter.
    pub fn counter_label(&self) -> String {
        if self.matches.is_empty() {
            if self.query.trim().is_empty() {
                String::new()
            } else {
                "No matches".to_string()
            }
        } else {
            format!("{} of {}", self.current_match, self.matches.len())
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
