use std::path::Path;

use anyhow::Context;
use findmark_document::{DocumentBackend, inner_markup, parse_markup, parse_plain_text};
use findmark_search::{SearchBackend, SearchOptions, SearchSession};
use findmark_terminal_ui::{TerminalBackend, TerminalRuntimeConfig, TerminalSize, TerminalSurface};
use log::{debug, info};

use crate::config::AppConfig;
use crate::keybindings::ShortcutDispatcher;

/// One non-interactive search run: an optional query followed by replayed
/// keystrokes.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub query: Option<String>,
    pub keys: Vec<String>,
    pub options: SearchOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReport {
    pub counter: String,
    pub body: String,
}

fn drive<B: SearchBackend>(
    session: &mut SearchSession<B>,
    dispatcher: &ShortcutDispatcher,
    request: &SearchRequest,
) -> anyhow::Result<()> {
    let subscription = dispatcher
        .subscribe()
        .context("keyboard shortcuts are already claimed")?;

    session.open();
    if let Some(query) = &request.query {
        session.set_query(query);
    }

    for key in &request.keys {
        match subscription.dispatch(session, key) {
            Some(action) => debug!("Key `{}` -> {}", key, action.config_name()),
            None => debug!("Key `{}` has no active binding", key),
        }
        // Stand-in for the debounce tick between keystrokes.
        session.run_pending();
    }

    Ok(())
}

fn looks_like_markup(path: &Path, contents: &str) -> bool {
    let by_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ["html", "htm", "xhtml", "xml"]
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        });
    by_extension || contents.trim_start().starts_with('<')
}

pub fn run_document(
    config: &AppConfig,
    dispatcher: &ShortcutDispatcher,
    path: &Path,
    contents: &str,
    request: &SearchRequest,
) -> anyhow::Result<SearchReport> {
    let document = if looks_like_markup(path, contents) {
        parse_markup(contents)
            .with_context(|| format!("failed to parse markup in {}", path.display()))?
    } else {
        parse_plain_text(contents)
    };
    info!("Loaded document with {} nodes", document.len());

    let backend = DocumentBackend::new(document, &config.match_group);
    let mut session = SearchSession::with_options(backend, request.options);
    drive(&mut session, dispatcher, request)?;

    let backend = session.backend();
    Ok(SearchReport {
        counter: session.counter_label(),
        body: inner_markup(backend.document(), backend.root()),
    })
}

pub fn run_terminal(
    config: &AppConfig,
    dispatcher: &ShortcutDispatcher,
    contents: &str,
    request: &SearchRequest,
) -> anyhow::Result<SearchReport> {
    let size = TerminalSize {
        cols: config.terminal_columns,
        rows: config.terminal_rows,
    };
    let runtime_config = TerminalRuntimeConfig {
        scrollback_history: config.scrollback_history,
    };
    let mut surface = TerminalSurface::new(size, Some(&runtime_config))
        .context("failed to create terminal surface")?;
    surface.feed_text(contents);

    let mut session = SearchSession::with_options(TerminalBackend::new(surface), request.options);
    drive(&mut session, dispatcher, request)?;

    let backend = session.backend();
    let body = match (backend.focused_match(), backend.surface()) {
        (Some(found), Some(surface)) => {
            let start = found.start();
            let end = found.end();
            let line = surface.line_text(start.line.0).unwrap_or_default();
            format!(
                "line {}, columns {}-{}: {}",
                start.line.0,
                start.column.0,
                end.column.0,
                line.trim_end()
            )
        }
        _ => String::new(),
    };

    Ok(SearchReport {
        counter: session.counter_label(),
        body,
    })
}
