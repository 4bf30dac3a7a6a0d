//! Page-context override engine
//!
//! Runs inside the visited page's own JavaScript world. [`apply_overrides`]
//! is the single entry point; the page-global marker makes every call after
//! the first a no-op for the lifetime of the page context.

mod intercept;
mod neutralize;
mod overlay;
mod style;

use js_sys::Reflect;
use rc_core::payload::{BlockedEvents, CONFIG_GLOBAL, INJECTION_MARKER};
use rc_core::PayloadConfig;
use wasm_bindgen::prelude::*;
use web_sys::Window;

use crate::js;

/// Apply the overrides to the current page. Returns `false` when this page
/// context already has them.
#[wasm_bindgen]
pub fn apply_overrides() -> Result<bool, JsValue> {
    crate::logger::init(log::LevelFilter::Info);

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    // Check and set in one synchronous turn.
    let marker = JsValue::from_str(INJECTION_MARKER);
    if Reflect::get(&window, &marker)?.is_truthy() {
        log::debug!("overrides already applied");
        return Ok(false);
    }
    Reflect::set(&window, &marker, &JsValue::TRUE)?;

    let config = staged_config(&window);
    let events = BlockedEvents::for_config(&config);

    let patched = neutralize::install(&window, events);
    log::debug!("neutralized {} prototype members", patched);

    if let Err(e) = style::install(&document, &config) {
        log::warn!("stylesheet injection failed: {}", js::js_error_message(&e));
    }
    if let Err(e) = intercept::install_capture_listeners(&window, &document, events) {
        log::warn!("capture listeners failed: {}", js::js_error_message(&e));
    }
    if let Err(e) = overlay::install(&window, &config) {
        log::warn!("overlay rescue failed: {}", js::js_error_message(&e));
    }
    if config.clear_inline_handlers {
        if let Err(e) = intercept::watch_inline_handlers(&window, &document, events) {
            log::warn!("inline handler watch failed: {}", js::js_error_message(&e));
        }
    }
    // Last: our own listeners above are registered through the unpatched entry point.
    if config.intercept_registration {
        neutralize::install_registration_guard(&window, events);
    }

    log::info!("overrides applied");
    Ok(true)
}

fn staged_config(window: &Window) -> PayloadConfig {
    let staged = js::get(window, CONFIG_GLOBAL);
    let Some(text) = staged.as_string() else {
        return PayloadConfig::default();
    };
    serde_json::from_str(&text).unwrap_or_else(|e| {
        log::warn!("ignoring malformed payload config: {}", e);
        PayloadConfig::default()
    })
}
