//! User settings
//!
//! Settings live in the key-value service under [`SETTINGS_KEY`]. Every field
//! has a default so a partial or missing settings object is always usable.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::host::KeyValueStore;

pub const SETTINGS_KEY: &str = "settings";

const DEFAULT_PAYLOAD_SCRIPT: &str = "payload/main.js";
const DEFAULT_RESCUE_TIMEOUT_MS: u32 = 5_000;
const DEFAULT_POINTER_REVERT_MS: u32 = 500;

/// Class-name fragments that mark click-blocking overlays.
const DEFAULT_OVERLAY_HINTS: &[&str] = &[
    "no-right-click",
    "norightclick",
    "disable-right-click",
    "copy-protect",
    "copyprotect",
    "click-block",
    "clickblock",
    "anti-copy",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtensionConfig {
    pub payload: PayloadConfig,
    pub badge: BadgeConfig,
    /// Extension-relative script run in the page's main world.
    pub payload_script: String,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            payload: PayloadConfig::default(),
            badge: BadgeConfig::default(),
            payload_script: DEFAULT_PAYLOAD_SCRIPT.to_string(),
        }
    }
}

impl ExtensionConfig {
    /// Load settings, falling back to defaults when absent or unreadable.
    pub async fn load<S: KeyValueStore>(store: &S) -> Self {
        match store.get(SETTINGS_KEY).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("ignoring malformed settings: {}", e);
                    Self::default()
                }
            },
            Ok(None) => Self::default(),
            Err(e) => {
                log::warn!("failed to read settings, using defaults: {}", e);
                Self::default()
            }
        }
    }
}

/// Knobs handed to the page payload at injection time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default, rename_all = "camelCase")]
pub struct PayloadConfig {
    /// Also intercept keydown/keyup/keypress.
    pub intercept_keyboard: bool,
    /// Discard page attempts to register listeners for blocked event types.
    pub intercept_registration: bool,
    /// Null-clear inline `on<event>` handlers, including on added elements.
    pub clear_inline_handlers: bool,
    pub rescue_timeout_ms: u32,
    pub pointer_revert_ms: u32,
    pub overlay_class_hints: Vec<String>,
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            intercept_keyboard: false,
            intercept_registration: true,
            clear_inline_handlers: true,
            rescue_timeout_ms: DEFAULT_RESCUE_TIMEOUT_MS,
            pointer_revert_ms: DEFAULT_POINTER_REVERT_MS,
            overlay_class_hints: DEFAULT_OVERLAY_HINTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default, rename_all = "camelCase")]
pub struct BadgeConfig {
    pub on_text: String,
    pub on_color: String,
    pub off_text: String,
}

impl Default for BadgeConfig {
    fn default() -> Self {
        Self {
            on_text: "ON".to_string(),
            on_color: "#2e7d32".to_string(),
            off_text: String::new(),
        }
    }
}
