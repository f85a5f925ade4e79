mod runtime;
mod search;

pub use runtime::{
    SurfaceEventListener, TerminalEvent, TerminalRuntimeConfig, TerminalSize, TerminalSurface,
};
pub use search::{TERMINAL_MATCH_GROUP, TerminalBackend, terminal_pattern};
