//! Search backend that delegates to alacritty's built-in regex search.
//!
//! The native search only walks from one match to the next, so this backend
//! reports a single synthetic match per query. Navigation steps the native
//! search instead of indexing into a match list.

use alacritty_terminal::{
    grid::{Dimensions, Scroll},
    index::{Boundary, Column, Direction, Point, Side},
    selection::{Selection, SelectionType},
    term::{
        Term,
        search::{Match as TermMatch, RegexSearch},
    },
};
use findmark_search::{Match, SearchBackend, SearchDirection, SearchOptions};
use log::{debug, warn};

use crate::runtime::{SurfaceEventListener, TerminalSurface};

pub const TERMINAL_MATCH_GROUP: &str = "terminal";

/// Builds the native search pattern for a literal query.
pub fn terminal_pattern(query: &str, options: SearchOptions) -> String {
    let case_flag = if options.case_sensitive { "(?-i)" } else { "(?i)" };
    let escaped = regex::escape(query);
    if options.whole_word {
        format!(r"{}(?-u:\b){}(?-u:\b)", case_flag, escaped)
    } else {
        format!("{}{}", case_flag, escaped)
    }
}

pub struct TerminalBackend {
    surface: Option<TerminalSurface>,
    regex: Option<RegexSearch>,
    focused: Option<TermMatch>,
    /// Set by `search`; the next navigation reveals the found match instead
    /// of stepping past it.
    pending_reveal: bool,
}

impl TerminalBackend {
    pub fn new(surface: TerminalSurface) -> Self {
        Self {
            surface: Some(surface),
            regex: None,
            focused: None,
            pending_reveal: false,
        }
    }

    /// A backend whose terminal is not mounted yet.
    pub fn unmounted() -> Self {
        Self {
            surface: None,
            regex: None,
            focused: None,
            pending_reveal: false,
        }
    }

    pub fn mount(&mut self, surface: TerminalSurface) {
        self.clear_native_state();
        self.surface = Some(surface);
    }

    pub fn surface(&self) -> Option<&TerminalSurface> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut TerminalSurface> {
        self.surface.as_mut()
    }

    /// Grid range of the native search's focused match.
    pub fn focused_match(&self) -> Option<&TermMatch> {
        self.focused.as_ref()
    }

    fn clear_native_state(&mut self) {
        self.regex = None;
        self.focused = None;
        self.pending_reveal = false;
        if let Some(surface) = self.surface.as_mut() {
            surface.with_term_mut(|term| term.selection = None);
        }
    }
}

fn step(
    term: &Term<SurfaceEventListener>,
    regex: &mut RegexSearch,
    from: Option<&TermMatch>,
    direction: SearchDirection,
) -> Option<TermMatch> {
    let (origin, native_direction, side) = match (direction, from) {
        (SearchDirection::Next, Some(current)) => (
            current.end().add(term, Boundary::None, 1),
            Direction::Right,
            Side::Left,
        ),
        (SearchDirection::Previous, Some(current)) => (
            current.start().sub(term, Boundary::None, 1),
            Direction::Left,
            Side::Right,
        ),
        (SearchDirection::Next, None) => (
            Point::new(term.topmost_line(), Column(0)),
            Direction::Right,
            Side::Left,
        ),
        (SearchDirection::Previous, None) => (
            Point::new(term.bottommost_line(), term.last_column()),
            Direction::Left,
            Side::Right,
        ),
    };
    term.search_next(regex, origin, native_direction, side, None)
}

fn select(term: &mut Term<SurfaceEventListener>, found: &TermMatch) {
    let mut selection = Selection::new(SelectionType::Simple, *found.start(), Side::Left);
    selection.update(*found.end(), Side::Right);
    term.selection = Some(selection);
}

/// Scrolls just enough history to put the match's first line on screen.
fn reveal(term: &mut Term<SurfaceEventListener>, found: &TermMatch) {
    let rows = term.screen_lines() as i32;
    let display_offset = term.grid().display_offset() as i32;
    let line = found.start().line.0;

    let viewport_row = line + display_offset;
    if viewport_row >= 0 && viewport_row < rows {
        return;
    }

    let history_size = term.grid().history_size() as i32;
    let target_offset = if line < 0 { (-line).min(history_size) } else { 0 };
    let delta = target_offset - display_offset;
    if delta != 0 {
        term.scroll_display(Scroll::Delta(delta));
    }
}

impl SearchBackend for TerminalBackend {
    fn search(&mut self, query: &str, options: SearchOptions) -> Vec<Match> {
        self.clear_native_state();
        let Some(surface) = self.surface.as_ref() else {
            warn!("Terminal surface is not mounted; search skipped");
            return Vec::new();
        };
        if query.trim().is_empty() {
            return Vec::new();
        }

        let pattern = terminal_pattern(query, options);
        let mut regex = match RegexSearch::new(&pattern) {
            Ok(regex) => regex,
            Err(error) => {
                warn!("Failed to compile terminal search for `{}`: {}", query, error);
                return Vec::new();
            }
        };

        // Start from the newest output match.
        let found = surface.with_term(|term| step(term, &mut regex, None, SearchDirection::Previous));
        let Some(found) = found else {
            self.regex = Some(regex);
            return Vec::new();
        };

        let text = surface.with_term(|term| term.bounds_to_string(*found.start(), *found.end()));
        debug!(
            "Terminal search for `{}` focused line {}",
            query,
            found.start().line.0
        );
        self.regex = Some(regex);
        self.focused = Some(found);
        self.pending_reveal = true;

        vec![Match::new(TERMINAL_MATCH_GROUP, 0, &text, 0, text.len())]
    }

    fn navigate(&mut self, target: Option<&Match>, direction: SearchDirection) {
        if target.is_some_and(|m| m.group != TERMINAL_MATCH_GROUP) {
            return;
        }
        let (Some(surface), Some(regex)) = (self.surface.as_mut(), self.regex.as_mut()) else {
            debug!("No active terminal search to navigate");
            return;
        };

        let next = if self.pending_reveal {
            self.pending_reveal = false;
            self.focused.clone()
        } else {
            let from = self.focused.as_ref();
            surface.with_term(|term| step(term, regex, from, direction))
        };
        let Some(next) = next else {
            return;
        };

        surface.with_term_mut(|term| {
            select(term, &next);
            reveal(term, &next);
        });
        self.focused = Some(next);
    }

    fn close(&mut self) {
        self.clear_native_state();
    }

    fn reset(&mut self) {
        self.clear_native_state();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::TerminalSize;
    use findmark_search::SearchSession;

    fn backend_with(text: &str, cols: u16, rows: u16) -> TerminalBackend {
        let mut surface = TerminalSurface::new(TerminalSize { cols, rows }, None).unwrap();
        surface.feed_text(text);
        TerminalBackend::new(surface)
    }

    fn focused_start(backend: &TerminalBackend) -> Option<(i32, usize)> {
        backend
            .focused_match()
            .map(|m| (m.start().line.0, m.start().column.0))
    }

    #[test]
    fn pattern_escapes_and_sets_flags() {
        let options = SearchOptions {
            case_sensitive: true,
            whole_word: true,
        };
        assert_eq!(terminal_pattern("a.b", options), r"(?-i)(?-u:\b)a\.b(?-u:\b)");
        assert_eq!(terminal_pattern("Foo", SearchOptions::default()), "(?i)Foo");
    }

    #[test]
    fn unmounted_backend_degrades_to_noop() {
        let mut backend = TerminalBackend::unmounted();
        assert!(backend.search("x", SearchOptions::default()).is_empty());
        backend.navigate(None, SearchDirection::Next);
        backend.close();
        assert!(backend.focused_match().is_none());
    }

    #[test]
    fn search_returns_single_synthetic_match_at_newest_output() {
        let mut backend = backend_with("needle one\nhay\nneedle two\n", 20, 5);
        let matches = backend.search("needle", SearchOptions::default());

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "terminal-0");
        assert_eq!(matches[0].text, "needle");
        assert_eq!(focused_start(&backend), Some((2, 0)));
    }

    #[test]
    fn navigation_steps_native_search_with_wraparound() {
        let mut backend = backend_with("needle one\nhay\nneedle two\n", 20, 5);
        let matches = backend.search("needle", SearchOptions::default());

        backend.navigate(matches.first(), SearchDirection::Next);
        assert_eq!(focused_start(&backend), Some((2, 0)));

        backend.navigate(matches.first(), SearchDirection::Next);
        assert_eq!(focused_start(&backend), Some((0, 0)));

        backend.navigate(matches.first(), SearchDirection::Previous);
        assert_eq!(focused_start(&backend), Some((2, 0)));
    }

    #[test]
    fn case_and_whole_word_options_apply() {
        let mut backend = backend_with("Needle needles needle\n", 30, 3);

        let sensitive = SearchOptions {
            case_sensitive: true,
            whole_word: false,
        };
        assert_eq!(backend.search("Needle", sensitive).len(), 1);
        assert_eq!(focused_start(&backend), Some((0, 0)));

        assert_eq!(backend.search("Needle", SearchOptions::default()).len(), 1);
        assert_eq!(focused_start(&backend), Some((0, 15)));

        let whole = SearchOptions {
            case_sensitive: false,
            whole_word: true,
        };
        backend.search("needle", whole);
        backend.navigate(None, SearchDirection::Next);
        backend.navigate(None, SearchDirection::Previous);
        assert_eq!(focused_start(&backend), Some((0, 0)));
    }

    #[test]
    fn metacharacters_match_literally() {
        let mut backend = backend_with("axb a.b\n", 20, 3);
        assert_eq!(backend.search("a.b", SearchOptions::default()).len(), 1);
        assert_eq!(focused_start(&backend), Some((0, 4)));
    }

    #[test]
    fn missing_query_text_yields_no_match() {
        let mut backend = backend_with("nothing here\n", 20, 3);
        assert!(backend.search("absent", SearchOptions::default()).is_empty());
        assert!(backend.focused_match().is_none());
    }

    #[test]
    fn session_reports_one_of_one() {
        let backend = backend_with("alpha\nbeta alpha\n", 20, 4);
        let mut session = SearchSession::new(backend);
        session.open();
        session.set_query("alpha");
        assert_eq!(session.counter_label(), "1 of 1");

        session.next_match();
        assert_eq!(session.current_match(), 1);
        assert_eq!(focused_start(session.backend()), Some((0, 0)));
    }

    #[test]
    fn navigation_scrolls_history_into_view() {
        let mut backend = backend_with("target\n1\n2\n3\n4\n", 10, 2);
        let matches = backend.search("target", SearchOptions::default());
        backend.navigate(matches.first(), SearchDirection::Next);

        let (display_offset, _) = backend.surface().unwrap().scroll_state();
        let line = focused_start(&backend).unwrap().0;
        assert!(line < 0);
        assert_eq!(display_offset as i32, -line);
    }

    #[test]
    fn close_clears_selection_and_focus() {
        let mut backend = backend_with("alpha\n", 20, 3);
        let matches = backend.search("alpha", SearchOptions::default());
        backend.navigate(matches.first(), SearchDirection::Next);
        assert!(
            backend
                .surface()
                .unwrap()
                .with_term(|term| term.selection.is_some())
        );

        backend.close();
        assert!(backend.focused_match().is_none());
        assert!(
            backend
                .surface()
                .unwrap()
                .with_term(|term| term.selection.is_none())
        );
    }

    #[test]
    fn mounting_recovers_from_unmounted_state() {
        let mut backend = TerminalBackend::unmounted();
        assert!(backend.search("alpha", SearchOptions::default()).is_empty());

        let mut surface = TerminalSurface::new(TerminalSize { cols: 20, rows: 3 }, None).unwrap();
        surface.feed_text("alpha\n");
        backend.mount(surface);
        let matches = backend.search("alpha", SearchOptions::default());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "terminal-0");
        assert!(backend.regex.is_some());
        assert!(backend.focused_match().is_some());

        let fresh = TerminalSurface::new(TerminalSize { cols: 20, rows: 3 }, None).unwrap();
        backend.mount(fresh);
        assert!(backend.regex.is_none());
        assert!(backend.focused_match().is_none());
        assert!(!backend.pending_reveal);
        backend.navigate(matches.first(), SearchDirection::Next);
        assert!(backend.focused_match().is_none());

        backend.surface_mut().unwrap().feed_text("beta alpha\n");
        assert_eq!(backend.search("alpha", SearchOptions::default()).len(), 1);
        assert_eq!(focused_start(&backend), Some((0, 5)));
    }
}
