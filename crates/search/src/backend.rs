use crate::engine::SearchOptions;
use crate::matcher::Match;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    Next,
    Previous,
}

/// A content surface the navigation state can search.
///
/// Implementations absorb their own failures: an unavailable surface returns
/// no matches and ignores navigation instead of erroring.
pub trait SearchBackend {
    /// Finds all matches for a non-empty query. May decorate them as a side
    /// effect.
    fn search(&mut self, query: &str, options: SearchOptions) -> Vec<Match>;

    /// Makes `target` the current match and brings it into view.
    fn navigate(&mut self, target: Option<&Match>, direction: SearchDirection);

    /// Releases all decorations and native search state.
    fn close(&mut self);

    /// Drops decorations left over from a previous query.
    fn reset(&mut self) {}
}
