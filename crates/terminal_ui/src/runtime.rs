use alacritty_terminal::{
    event::{Event as AlacEvent, EventListener},
    grid::{Dimensions, Scroll},
    index::{Column, Line},
    term::{Config as TermConfig, Term, cell::Flags},
    vte::ansi::Processor,
};
use anyhow::bail;
use flume::{Receiver, Sender, unbounded};

const DEFAULT_SCROLLBACK_HISTORY: usize = 2000;

#[derive(Debug, Clone)]
pub struct TerminalRuntimeConfig {
    pub scrollback_history: usize,
}

impl Default for TerminalRuntimeConfig {
    fn default() -> Self {
        Self {
            scrollback_history: DEFAULT_SCROLLBACK_HISTORY,
        }
    }
}

/// Events emitted by the terminal while it processes output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    /// Terminal title changed
    Title(String),
    /// Terminal title reset
    ResetTitle,
    /// Bell character received
    Bell,
}

/// Event listener that forwards alacritty events to our channel
#[derive(Clone)]
pub struct SurfaceEventListener {
    events_tx: Sender<AlacEvent>,
}

impl EventListener for SurfaceEventListener {
    fn send_event(&self, event: AlacEvent) {
        let _ = self.events_tx.send(event);
    }
}

/// Terminal dimensions in cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSize {
    pub cols: u16,
    pub rows: u16,
}

impl Default for TerminalSize {
    fn default() -> Self {
        Self { cols: 80, rows: 24 }
    }
}

impl Dimensions for TerminalSize {
    fn total_lines(&self) -> usize {
        self.rows as usize
    }

    fn screen_lines(&self) -> usize {
        self.rows as usize
    }

    fn columns(&self) -> usize {
        self.cols as usize
    }

    fn last_column(&self) -> Column {
        Column(self.cols.saturating_sub(1) as usize)
    }

    fn bottommost_line(&self) -> Line {
        Line((self.rows as i32) - 1)
    }

    fn topmost_line(&self) -> Line {
        Line(0)
    }
}

/// A terminal grid fed directly with output bytes, without a PTY.
pub struct TerminalSurface {
    term: Term<SurfaceEventListener>,
    parser: Processor,
    events_rx: Receiver<AlacEvent>,
    size: TerminalSize,
}

impl TerminalSurface {
    pub fn new(
        size: TerminalSize,
        runtime_config: Option<&TerminalRuntimeConfig>,
    ) -> anyhow::Result<Self> {
        if size.cols < 2 || size.rows == 0 {
            bail!(
                "terminal needs at least 2 columns and 1 row, got {}x{}",
                size.cols,
                size.rows
            );
        }

        let (events_tx, events_rx) = unbounded();
        let runtime_config = runtime_config.cloned().unwrap_or_default();

        let mut term_config = TermConfig::default();
        term_config.scrolling_history = runtime_config.scrollback_history;

        let term = Term::new(term_config, &size, SurfaceEventListener { events_tx });

        Ok(Self {
            term,
            parser: Processor::new(),
            events_rx,
            size,
        })
    }

    /// Run raw output bytes through the terminal parser
    pub fn feed(&mut self, bytes: &[u8]) {
        self.parser.advance(&mut self.term, bytes);
    }

    /// Feed plain text, turning bare line feeds into CRLF
    pub fn feed_text(&mut self, text: &str) {
        let mut bytes = Vec::with_capacity(text.len());
        let mut previous = None;
        for byte in text.bytes() {
            if byte == b'\n' && previous != Some(b'\r') {
                bytes.push(b'\r');
            }
            bytes.push(byte);
            previous = Some(byte);
        }
        self.feed(&bytes);
    }

    /// Get the current terminal size
    pub fn size(&self) -> TerminalSize {
        self.size
    }

    /// Drain events produced since the last call
    pub fn process_events(&self) -> Vec<TerminalEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                AlacEvent::Title(title) => events.push(TerminalEvent::Title(title)),
                AlacEvent::ResetTitle => events.push(TerminalEvent::ResetTitle),
                AlacEvent::Bell => events.push(TerminalEvent::Bell),
                _ => {}
            }
        }
        events
    }

    /// Access the terminal for reading cell content
    pub fn with_term<R>(&self, f: impl FnOnce(&Term<SurfaceEventListener>) -> R) -> R {
        f(&self.term)
    }

    pub fn with_term_mut<R>(&mut self, f: impl FnOnce(&mut Term<SurfaceEventListener>) -> R) -> R {
        f(&mut self.term)
    }

    /// Scroll the displayed viewport through scrollback history.
    /// Positive deltas move up into history, negative deltas move down toward live output.
    pub fn scroll_display(&mut self, delta_lines: i32) -> bool {
        if delta_lines == 0 {
            return false;
        }

        let old_offset = self.term.grid().display_offset();
        self.term.scroll_display(Scroll::Delta(delta_lines));
        self.term.grid().display_offset() != old_offset
    }

    /// Return `(display_offset, history_size)`.
    pub fn scroll_state(&self) -> (usize, usize) {
        let grid = self.term.grid();
        (grid.display_offset(), grid.history_size())
    }

    /// Text of one grid line; negative lines are scrollback history.
    pub fn line_text(&self, line_idx: i32) -> Option<String> {
        let grid = self.term.grid();
        let history = grid.history_size() as i32;
        if line_idx < -history || line_idx >= grid.screen_lines() as i32 {
            return None;
        }

        let line = Line(line_idx);
        let cols = grid.columns();
        let mut text = String::with_capacity(cols);
        for col in 0..cols {
            let cell = &grid[line][Column(col)];
            let c = cell.c;
            if c == '\0' || c.is_control() || cell.flags.contains(Flags::WIDE_CHAR_SPACER) {
                text.push(' ');
            } else {
                text.push(c);
            }
        }

        Some(text)
    }
}
