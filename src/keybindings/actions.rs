use findmark_search::SearchAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeybindAction {
    OpenSearch,
    CloseSearch,
    SearchNext,
    SearchPrevious,
    ToggleCaseSensitive,
    ToggleWholeWord,
}

impl KeybindAction {
    pub fn from_config_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "open_search" => Some(Self::OpenSearch),
            "close_search" => Some(Self::CloseSearch),
            "search_next" => Some(Self::SearchNext),
            "search_previous" => Some(Self::SearchPrevious),
            "toggle_case_sensitive" => Some(Self::ToggleCaseSensitive),
            "toggle_whole_word" => Some(Self::ToggleWholeWord),
            _ => None,
        }
    }

    pub fn all_config_names() -> &'static [&'static str] {
        &[
            "open_search",
            "close_search",
            "search_next",
            "search_previous",
            "toggle_case_sensitive",
            "toggle_whole_word",
        ]
    }

    pub fn config_name(self) -> &'static str {
        match self {
            Self::OpenSearch => "open_search",
            Self::CloseSearch => "close_search",
            Self::SearchNext => "search_next",
            Self::SearchPrevious => "search_previous",
            Self::ToggleCaseSensitive => "toggle_case_sensitive",
            Self::ToggleWholeWord => "toggle_whole_word",
        }
    }

    /// Actions that resolve even while the search bar is closed.
    pub fn is_global(self) -> bool {
        matches!(self, Self::OpenSearch)
    }

    pub fn to_search_action(self) -> SearchAction {
        match self {
            Self::OpenSearch => SearchAction::Open,
            Self::CloseSearch => SearchAction::Close,
            Self::SearchNext => SearchAction::Next,
            Self::SearchPrevious => SearchAction::Previous,
            Self::ToggleCaseSensitive => SearchAction::ToggleCaseSensitive,
            Self::ToggleWholeWord => SearchAction::ToggleWholeWord,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::KeybindAction;

    #[test]
    fn config_names_round_trip() {
        for name in KeybindAction::all_config_names() {
            let action = KeybindAction::from_config_name(name).unwrap();
            assert_eq!(action.config_name(), *name);
        }
    }

    #[test]
    fn config_names_accept_dashes_and_case() {
        assert_eq!(
            KeybindAction::from_config_name("Search-Next"),
            Some(KeybindAction::SearchNext)
        );
        assert_eq!(KeybindAction::from_config_name("zoom_in"), None);
    }
}
