use std::{
    env, fs,
    path::{Path, PathBuf},
};

use findmark_search::SearchOptions;

const DEFAULT_MATCH_GROUP: &str = "match";
const DEFAULT_TERMINAL_COLUMNS: u16 = 80;
const DEFAULT_TERMINAL_ROWS: u16 = 24;
const MIN_TERMINAL_COLUMNS: u16 = 2;
const MAX_TERMINAL_DIMENSION: u16 = 1000;
const DEFAULT_SCROLLBACK_HISTORY: usize = 2000;
const MAX_SCROLLBACK_HISTORY: usize = 100_000;

const DEFAULT_CONFIG: &str = "# Search defaults (restored whenever the search bar closes)\n\
# case_sensitive = false\n\
# whole_word = false\n\
# Prefix for document match ids (<prefix>-<n>)\n\
# match_group = match\n\
\n\
# Terminal surface used with --terminal\n\
# terminal_columns = 80\n\
# terminal_rows = 24\n\
# Scrollback history lines (max 100000)\n\
# scrollback_history = 2000\n\
\n\
# Keybindings (trigger overrides on top of the defaults)\n\
# keybind = ctrl-f=open_search\n\
# keybind = f3=search_next\n\
# keybind = shift-f3=search_previous\n\
# keybind = alt-c=unbind\n\
# keybind = clear\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeybindConfigLine {
    pub line_number: usize,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub case_sensitive: bool,
    pub whole_word: bool,
    pub match_group: String,
    pub terminal_columns: u16,
    pub terminal_rows: u16,
    pub scrollback_history: usize,
    pub keybind_lines: Vec<KeybindConfigLine>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            whole_word: false,
            match_group: DEFAULT_MATCH_GROUP.to_string(),
            terminal_columns: DEFAULT_TERMINAL_COLUMNS,
            terminal_rows: DEFAULT_TERMINAL_ROWS,
            scrollback_history: DEFAULT_SCROLLBACK_HISTORY,
            keybind_lines: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn load_or_create() -> Self {
        let Some(path) = ensure_config_file() else {
            return Self::default();
        };

        match fs::read_to_string(&path) {
            Ok(contents) => Self::from_contents(&contents),
            Err(error) => {
                log::warn!("Failed to read config {}: {}", path.display(), error);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(Self::from_contents(&contents))
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            case_sensitive: self.case_sensitive,
            whole_word: self.whole_word,
        }
    }

    fn from_contents(contents: &str) -> Self {
        let mut config = Self::default();
        for (line_number, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.splitn(2, '=');
            let key = parts.next().unwrap_or("").trim();
            let value = parts.next().unwrap_or("").trim();

            if key.eq_ignore_ascii_case("case_sensitive") {
                if let Some(enabled) = parse_bool(value) {
                    config.case_sensitive = enabled;
                }
            }

            if key.eq_ignore_ascii_case("whole_word") {
                if let Some(enabled) = parse_bool(value) {
                    config.whole_word = enabled;
                }
            }

            if key.eq_ignore_ascii_case("match_group")
                && let Some(group) = parse_string_value(value)
            {
                config.match_group = group;
            }

            if key.eq_ignore_ascii_case("terminal_columns") {
                if let Ok(columns) = value.parse::<u16>() {
                    config.terminal_columns =
                        columns.clamp(MIN_TERMINAL_COLUMNS, MAX_TERMINAL_DIMENSION);
                }
            }

            if key.eq_ignore_ascii_case("terminal_rows") {
                if let Ok(rows) = value.parse::<u16>() {
                    config.terminal_rows = rows.clamp(1, MAX_TERMINAL_DIMENSION);
                }
            }

            if key.eq_ignore_ascii_case("scrollback_history")
                || key.eq_ignore_ascii_case("scrollback")
            {
                if let Ok(history) = value.parse::<usize>() {
                    config.scrollback_history = history.min(MAX_SCROLLBACK_HISTORY);
                }
            }

            if key.eq_ignore_ascii_case("keybind")
                && let Some(raw) = parse_string_value(value)
            {
                config.keybind_lines.push(KeybindConfigLine {
                    line_number: line_number + 1,
                    value: raw,
                });
            }
        }

        config
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_string_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    let unquoted = if trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
    {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };

    let unquoted = unquoted.trim();
    if unquoted.is_empty() {
        return None;
    }

    Some(unquoted.to_string())
}

pub fn ensure_config_file() -> Option<PathBuf> {
    let path = config_path()?;
    if !path.exists() {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let _ = fs::write(&path, DEFAULT_CONFIG);
    }
    Some(path)
}

pub fn config_path() -> Option<PathBuf> {
    if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME")
        && !xdg_config_home.trim().is_empty()
    {
        return Some(Path::new(&xdg_config_home).join("findmark/config.txt"));
    }

    #[cfg(target_os = "windows")]
    {
        dirs::config_dir().map(|p| p.join("findmark").join("config.txt"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        dirs::home_dir().map(|p| p.join(".config").join("findmark").join("config.txt"))
    }
}

#[cfg(test)]
mod tests {
    use super::AppConfig;

    #[test]
    fn defaults_apply_to_empty_config() {
        let config = AppConfig::from_contents("");
        assert!(!config.case_sensitive);
        assert!(!config.whole_word);
        assert_eq!(config.match_group, "match");
        assert_eq!(config.terminal_columns, 80);
        assert_eq!(config.terminal_rows, 24);
        assert_eq!(config.scrollback_history, 2000);
    }

    #[test]
    fn search_options_parse() {
        let config = AppConfig::from_contents(
            "case_sensitive = yes\n\
             WHOLE_WORD = on\n\
             match_group = \"page\"\n",
        );
        assert!(config.case_sensitive);
        assert!(config.whole_word);
        assert_eq!(config.match_group, "page");
        let options = config.search_options();
        assert!(options.case_sensitive && options.whole_word);
    }

    #[test]
    fn invalid_values_keep_defaults() {
        let config = AppConfig::from_contents(
            "case_sensitive = maybe\n\
             terminal_rows = lots\n\
             match_group = \"\"\n",
        );
        assert!(!config.case_sensitive);
        assert_eq!(config.terminal_rows, 24);
        assert_eq!(config.match_group, "match");
    }

    #[test]
    fn terminal_dimensions_clamp() {
        let config = AppConfig::from_contents(
            "terminal_columns = 1\n\
             terminal_rows = 5000\n\
             scrollback = 200000\n",
        );
        assert_eq!(config.terminal_columns, 2);
        assert_eq!(config.terminal_rows, 1000);
        assert_eq!(config.scrollback_history, 100_000);
    }

    #[test]
    fn keybind_lines_are_collected_in_order_with_line_numbers() {
        let config = AppConfig::from_contents(
            "# ignore comments\n\
             keybind = ctrl-f=open_search\n\
             keybind = alt-c=unbind\n\
             keybind = clear\n",
        );

        assert_eq!(config.keybind_lines.len(), 3);
        assert_eq!(config.keybind_lines[0].line_number, 2);
        assert_eq!(config.keybind_lines[0].value, "ctrl-f=open_search");
        assert_eq!(config.keybind_lines[1].line_number, 3);
        assert_eq!(config.keybind_lines[1].value, "alt-c=unbind");
        assert_eq!(config.keybind_lines[2].value, "clear");
    }
}
