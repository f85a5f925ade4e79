use crate::config::KeybindConfigLine;

use super::actions::KeybindAction;

const MODIFIER_ORDER: [&str; 4] = ["ctrl", "alt", "shift", "cmd"];

const NAMED_KEYS: &[&str] = &[
    "enter",
    "escape",
    "tab",
    "space",
    "backspace",
    "delete",
    "insert",
    "home",
    "end",
    "pageup",
    "pagedown",
    "up",
    "down",
    "left",
    "right",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeybindDirective {
    Clear,
    Bind {
        trigger: String,
        action: KeybindAction,
    },
    Unbind {
        trigger: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeybindWarning {
    pub line_number: usize,
    pub message: String,
}

pub fn parse_keybind_directives(
    lines: &[KeybindConfigLine],
) -> (Vec<KeybindDirective>, Vec<KeybindWarning>) {
    let mut directives = Vec::new();
    let mut warnings = Vec::new();

    for line in lines {
        let value = line.value.trim();
        if value.is_empty() {
            warnings.push(KeybindWarning {
                line_number: line.line_number,
                message: "empty keybind value".to_string(),
            });
            continue;
        }

        if value.eq_ignore_ascii_case("clear") {
            directives.push(KeybindDirective::Clear);
            continue;
        }

        let Some((trigger_raw, action_raw)) = value.rsplit_once('=') else {
            warnings.push(KeybindWarning {
                line_number: line.line_number,
                message: "expected `keybind = <trigger>=<action>` or `keybind = clear`".to_string(),
            });
            continue;
        };

        let mut trigger_raw = trigger_raw.trim().to_string();
        let action_raw = action_raw.trim();
        if trigger_raw.is_empty() || action_raw.is_empty() {
            warnings.push(KeybindWarning {
                line_number: line.line_number,
                message: "keybind trigger and action must both be non-empty".to_string(),
            });
            continue;
        }

        let action = if action_raw.eq_ignore_ascii_case("unbind") {
            None
        } else {
            match KeybindAction::from_config_name(action_raw) {
                Some(action) => Some(action),
                None => {
                    warnings.push(KeybindWarning {
                        line_number: line.line_number,
                        message: format!(
                            "unknown keybind action `{}`; expected one of: {}",
                            action_raw,
                            KeybindAction::all_config_names().join(", ")
                        ),
                    });
                    continue;
                }
            }
        };

        if should_treat_trailing_dash_as_equal_key(&trigger_raw) {
            trigger_raw.push('=');
        }
        let trigger = match canonicalize_trigger(&trigger_raw) {
            Ok(trigger) => trigger,
            Err(message) => {
                warnings.push(KeybindWarning {
                    line_number: line.line_number,
                    message,
                });
                continue;
            }
        };

        directives.push(match action {
            Some(action) => KeybindDirective::Bind { trigger, action },
            None => KeybindDirective::Unbind { trigger },
        });
    }

    (directives, warnings)
}

fn should_treat_trailing_dash_as_equal_key(trigger: &str) -> bool {
    // `=` separates trigger from action, so `alt-=search_next` means the equals
    // key. `alt--` stays the minus key.
    trigger.ends_with('-') && !trigger.ends_with("--")
}

fn secondary_modifier() -> &'static str {
    if cfg!(target_os = "macos") { "cmd" } else { "ctrl" }
}

fn canonical_modifier(name: &str) -> Option<&'static str> {
    match name {
        "ctrl" | "control" => Some("ctrl"),
        "alt" | "option" => Some("alt"),
        "shift" => Some("shift"),
        "cmd" | "command" | "super" | "meta" => Some("cmd"),
        "secondary" => Some(secondary_modifier()),
        _ => None,
    }
}

fn canonical_key(key: &str) -> Result<String, String> {
    let key = match key {
        "esc" => "escape",
        "return" => "enter",
        other => other,
    };

    if key.chars().count() == 1 {
        return Ok(key.to_string());
    }

    let is_function_key = key
        .strip_prefix('f')
        .and_then(|digits| digits.parse::<u8>().ok())
        .is_some_and(|number| (1..=24).contains(&number));
    if is_function_key || NAMED_KEYS.contains(&key) {
        return Ok(key.to_string());
    }

    Err(format!("unknown key `{key}`"))
}

fn canonicalize_component(component: &str) -> Result<String, String> {
    let lowered = component.to_ascii_lowercase();
    let mut remaining = lowered.as_str();
    let mut modifiers = Vec::new();

    while let Some((head, tail)) = remaining.split_once('-') {
        if tail.is_empty() && head.is_empty() {
            break;
        }
        let Some(modifier) = canonical_modifier(head) else {
            break;
        };
        if tail.is_empty() {
            return Err(format!("missing key after modifier `{head}`"));
        }
        if !modifiers.contains(&modifier) {
            modifiers.push(modifier);
        }
        remaining = tail;
    }

    if remaining.is_empty() {
        return Err("missing key".to_string());
    }
    let key = canonical_key(remaining)?;

    let mut parts = MODIFIER_ORDER
        .iter()
        .copied()
        .filter(|modifier| modifiers.contains(modifier))
        .map(str::to_string)
        .collect::<Vec<_>>();
    parts.push(key);
    Ok(parts.join("-"))
}

pub(crate) fn canonicalize_trigger(trigger: &str) -> Result<String, String> {
    let mut normalized_parts = Vec::new();
    for component in trigger.split_whitespace() {
        let normalized = canonicalize_component(component).map_err(|error| {
            format!(
                "invalid keybind trigger component `{}`: {}",
                component, error
            )
        })?;
        normalized_parts.push(normalized);
    }

    if normalized_parts.is_empty() {
        return Err("empty keybind trigger".to_string());
    }

    Ok(normalized_parts.join(" "))
}
