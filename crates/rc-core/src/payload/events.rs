//! Event types whose default action the payload protects.

use crate::config::PayloadConfig;

bitflags::bitflags! {
    /// Restriction-related DOM event types.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BlockedEvents: u16 {
        const CONTEXT_MENU = 1 << 0;
        const SELECT_START = 1 << 1;
        const COPY = 1 << 2;
        const CUT = 1 << 3;
        const PASTE = 1 << 4;
        const DRAG_START = 1 << 5;
        const DRAG = 1 << 6;
        const KEY_DOWN = 1 << 7;
        const KEY_UP = 1 << 8;
        const KEY_PRESS = 1 << 9;

        /// Always intercepted
        const BASE = Self::CONTEXT_MENU.bits()
            | Self::SELECT_START.bits()
            | Self::COPY.bits()
            | Self::CUT.bits()
            | Self::PASTE.bits()
            | Self::DRAG_START.bits()
            | Self::DRAG.bits();
        /// Opt-in; intercepting keys breaks keyboard-driven pages
        const KEYBOARD = Self::KEY_DOWN.bits() | Self::KEY_UP.bits() | Self::KEY_PRESS.bits();
    }
}

const EVENT_NAMES: &[(BlockedEvents, &str)] = &[
    (BlockedEvents::CONTEXT_MENU, "contextmenu"),
    (BlockedEvents::SELECT_START, "selectstart"),
    (BlockedEvents::COPY, "copy"),
    (BlockedEvents::CUT, "cut"),
    (BlockedEvents::PASTE, "paste"),
    (BlockedEvents::DRAG_START, "dragstart"),
    (BlockedEvents::DRAG, "drag"),
    (BlockedEvents::KEY_DOWN, "keydown"),
    (BlockedEvents::KEY_UP, "keyup"),
    (BlockedEvents::KEY_PRESS, "keypress"),
];

/// Mouse-button events a page cancels to kill the right-click menu. Only the
/// secondary button's default is protected, and they are never intercepted:
/// the overlay rescue listens for `mousedown` itself.
const RIGHT_BUTTON_EVENTS: &[&str] = &["mousedown", "mouseup"];

/// `MouseEvent.button` of the secondary (context menu) button.
pub const RIGHT_BUTTON: i16 = 2;

impl BlockedEvents {
    pub fn for_config(config: &PayloadConfig) -> Self {
        if config.intercept_keyboard {
            Self::BASE | Self::KEYBOARD
        } else {
            Self::BASE
        }
    }

    pub fn from_event_name(name: &str) -> Option<Self> {
        EVENT_NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(flag, _)| *flag)
    }

    /// DOM event type names in the set.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        EVENT_NAMES
            .iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
    }

    /// Inline handler properties/attributes (`oncontextmenu`, ...).
    pub fn handler_attributes(self) -> Vec<String> {
        self.names().map(|name| format!("on{name}")).collect()
    }

    /// Whether a page call to `preventDefault` must be ignored for an event
    /// of `event_type`. `button` is the mouse button for mouse events.
    pub fn protects_default(self, event_type: &str, button: Option<i16>) -> bool {
        match Self::from_event_name(event_type) {
            Some(flag) => self.contains(flag),
            None => {
                button == Some(RIGHT_BUTTON)
                    && RIGHT_BUTTON_EVENTS.iter().any(|n| n.eq_ignore_ascii_case(event_type))
            }
        }
    }

    /// Whether page listener registration for this type is discarded.
    pub fn intercepts(self, event_type: &str) -> bool {
        Self::from_event_name(event_type).is_some_and(|flag| self.contains(flag))
    }
}
