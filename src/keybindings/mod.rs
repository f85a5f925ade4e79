pub mod actions;
mod config;
mod defaults;

use std::{cell::Cell, rc::Rc};

use crate::config::AppConfig;
use findmark_search::{SearchBackend, SearchSession};
use log::{debug, warn};

use self::actions::KeybindAction;
use self::config::{KeybindDirective, canonicalize_trigger, parse_keybind_directives};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKeybind {
    pub trigger: String,
    pub action: KeybindAction,
}

/// Resolved shortcut table for the search bar.
///
/// Only one [`ShortcutSubscription`] may be live at a time; the keyboard has a
/// single consumer.
#[derive(Debug)]
pub struct ShortcutDispatcher {
    bindings: Rc<Vec<ResolvedKeybind>>,
    claimed: Rc<Cell<bool>>,
}

/// Exclusive handle for turning keystrokes into search actions. Dropping it
/// releases the dispatcher for the next subscriber.
#[derive(Debug)]
pub struct ShortcutSubscription {
    bindings: Rc<Vec<ResolvedKeybind>>,
    claimed: Rc<Cell<bool>>,
}

impl ShortcutDispatcher {
    pub fn from_config(config: &AppConfig) -> Self {
        let (directives, warnings) = parse_keybind_directives(&config.keybind_lines);
        for warning in &warnings {
            warn!(
                "Ignoring invalid keybind at config line {}: {}",
                warning.line_number, warning.message
            );
        }

        let default_bindings = defaults::default_keybinds()
            .into_iter()
            .filter_map(|binding| match canonicalize_trigger(binding.trigger) {
                Ok(trigger) => Some(ResolvedKeybind {
                    trigger,
                    action: binding.action,
                }),
                Err(error) => {
                    warn!(
                        "Skipping invalid built-in keybind `{}`: {}",
                        binding.trigger, error
                    );
                    None
                }
            })
            .collect::<Vec<_>>();

        Self::new(resolve_keybinds(default_bindings, &directives))
    }

    pub fn new(bindings: Vec<ResolvedKeybind>) -> Self {
        Self {
            bindings: Rc::new(bindings),
            claimed: Rc::new(Cell::new(false)),
        }
    }

    pub fn bindings(&self) -> &[ResolvedKeybind] {
        &self.bindings
    }

    pub fn is_subscribed(&self) -> bool {
        self.claimed.get()
    }

    /// Returns `None` while another subscription is still live.
    pub fn subscribe(&self) -> Option<ShortcutSubscription> {
        if self.claimed.replace(true) {
            debug!("Shortcut subscription refused: already claimed");
            return None;
        }
        Some(ShortcutSubscription {
            bindings: Rc::clone(&self.bindings),
            claimed: Rc::clone(&self.claimed),
        })
    }
}

impl ShortcutSubscription {
    pub fn resolve(&self, keystroke: &str, session_open: bool) -> Option<KeybindAction> {
        let trigger = match canonicalize_trigger(keystroke) {
            Ok(trigger) => trigger,
            Err(error) => {
                debug!("Ignoring keystroke `{}`: {}", keystroke, error);
                return None;
            }
        };

        // Later bindings win, matching the directive order.
        let action = self
            .bindings
            .iter()
            .rev()
            .find(|binding| binding.trigger == trigger)
            .map(|binding| binding.action)?;

        if !session_open && !action.is_global() {
            debug!("Keystroke `{}` inactive while search is closed", trigger);
            return None;
        }
        Some(action)
    }

    pub fn dispatch<B: SearchBackend>(
        &self,
        session: &mut SearchSession<B>,
        keystroke: &str,
    ) -> Option<KeybindAction> {
        let action = self.resolve(keystroke, session.is_open())?;
        session.apply(action.to_search_action());
        Some(action)
    }
}

impl Drop for ShortcutSubscription {
    fn drop(&mut self) {
        self.claimed.set(false);
    }
}

fn resolve_keybinds(
    mut bindings: Vec<ResolvedKeybind>,
    directives: &[KeybindDirective],
) -> Vec<ResolvedKeybind> {
    for directive in directives {
        match directive {
            KeybindDirective::Clear => bindings.clear(),
            KeybindDirective::Unbind { trigger } => {
                bindings.retain(|binding| binding.trigger != *trigger);
            }
            KeybindDirective::Bind { trigger, action } => {
                bindings.retain(|binding| binding.trigger != *trigger);
                bindings.push(ResolvedKeybind {
                    trigger: trigger.clone(),
                    action: *action,
                });
            }
        }
    }

    bindings
}
