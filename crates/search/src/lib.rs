//! Text search, match bookkeeping and navigation for Findmark.

mod backend;
mod engine;
mod matcher;
mod state;

pub use backend::{SearchBackend, SearchDirection};
pub use engine::{PatternError, SearchOptions, SearchPattern};
pub use matcher::{Match, find_matches, match_id};
pub use state::{NavigationState, SearchAction, SearchPhase, SearchSession};
