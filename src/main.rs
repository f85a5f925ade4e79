use std::{fs, path::PathBuf};

use anyhow::Context;
use clap::Parser;

mod app;
mod config;
mod keybindings;

use app::SearchRequest;
use config::AppConfig;
use keybindings::ShortcutDispatcher;
use keybindings::actions::KeybindAction;

#[derive(Parser)]
#[command(name = "findmark")]
#[command(about = "Find and highlight text in documents and terminal output", long_about = None)]
#[command(version)]
struct Cli {
    /// File to search (markup, plain text, or terminal output with --terminal)
    #[arg(required_unless_present = "list_keybinds")]
    file: Option<PathBuf>,

    /// Search query
    #[arg(short, long)]
    query: Option<String>,

    /// Match case exactly
    #[arg(long, overrides_with = "no_case_sensitive")]
    case_sensitive: bool,

    /// Ignore case even if the config enables case sensitivity
    #[arg(long, overrides_with = "case_sensitive")]
    no_case_sensitive: bool,

    /// Only match whole words
    #[arg(long, overrides_with = "no_whole_word")]
    whole_word: bool,

    /// Match inside words even if the config enables whole-word matching
    #[arg(long, overrides_with = "whole_word")]
    no_whole_word: bool,

    /// Load the file into a terminal surface and search its grid
    #[arg(long)]
    terminal: bool,

    /// Keystrokes to replay after the query is set, e.g. `enter alt-c`.
    /// Takes every following value, so put FILE first
    #[arg(long, num_args = 1..)]
    keys: Vec<String>,

    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// List the resolved keybindings and exit
    #[arg(long)]
    list_keybinds: bool,
}

fn list_keybinds(dispatcher: &ShortcutDispatcher) {
    println!("Keybindings:");
    for binding in dispatcher.bindings() {
        println!("  {:<20} {}", binding.trigger, binding.action.config_name());
    }
    println!();
    println!(
        "Actions: {}",
        KeybindAction::all_config_names().join(", ")
    );
}

/// A `--flag`/`--no-flag` pair on top of the config value.
fn flag_override(configured: bool, enable: bool, disable: bool) -> bool {
    if enable {
        true
    } else if disable {
        false
    } else {
        configured
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => AppConfig::load_or_create(),
    };
    let dispatcher = ShortcutDispatcher::from_config(&config);

    if cli.list_keybinds {
        list_keybinds(&dispatcher);
        return Ok(());
    }

    let Some(path) = cli.file else {
        anyhow::bail!("no input file given");
    };
    let contents =
        fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;

    let mut options = config.search_options();
    options.case_sensitive =
        flag_override(options.case_sensitive, cli.case_sensitive, cli.no_case_sensitive);
    options.whole_word = flag_override(options.whole_word, cli.whole_word, cli.no_whole_word);
    let request = SearchRequest {
        query: cli.query,
        keys: cli.keys,
        options,
    };

    let report = if cli.terminal {
        app::run_terminal(&config, &dispatcher, &contents, &request)?
    } else {
        app::run_document(&config, &dispatcher, &path, &contents, &request)?
    };

    if !report.counter.is_empty() {
        println!("{}", report.counter);
    }
    if !report.body.is_empty() {
        println!("{}", report.body);
    }
    Ok(())
}
