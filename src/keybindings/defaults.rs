use super::actions::KeybindAction;

#[derive(Debug, Clone, Copy)]
pub struct DefaultKeybind {
    pub trigger: &'static str,
    pub action: KeybindAction,
}

pub fn default_keybinds() -> Vec<DefaultKeybind> {
    vec![
        DefaultKeybind {
            trigger: "secondary-f",
            action: KeybindAction::OpenSearch,
        },
        DefaultKeybind {
            trigger: "escape",
            action: KeybindAction::CloseSearch,
        },
        DefaultKeybind {
            trigger: "enter",
            action: KeybindAction::SearchNext,
        },
        DefaultKeybind {
            trigger: "shift-enter",
            action: KeybindAction::SearchPrevious,
        },
        DefaultKeybind {
            trigger: "secondary-g",
            action: KeybindAction::SearchNext,
        },
        DefaultKeybind {
            trigger: "secondary-shift-g",
            action: KeybindAction::SearchPrevious,
        },
        DefaultKeybind {
            trigger: "alt-c",
            action: KeybindAction::ToggleCaseSensitive,
        },
        DefaultKeybind {
            trigger: "alt-w",
            action: KeybindAction::ToggleWholeWord,
        },
    ]
}
