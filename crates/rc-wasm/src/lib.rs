//! WebAssembly bindings for Reclaim
//!
//! The same module is loaded in three places. The background service worker
//! calls [`start_background`]. The popup and options pages call
//! [`handle_message`] directly, so a permission request made from a click
//! still runs inside that click's user gesture. The page payload calls
//! [`apply_overrides`].

use std::cell::Cell;

use js_sys::{Function, Promise};
use rc_core::{dispatch, resolve_origin, ActivationController, HostError, Response, Tab};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

mod host;
mod js;
mod logger;
mod payload;

pub use host::ChromeHost;
pub use payload::apply_overrides;

thread_local! {
    static READY: Cell<bool> = const { Cell::new(false) };
    static BACKGROUND_STARTED: Cell<bool> = const { Cell::new(false) };
}

/// Install the console logger. `level` is a `log` level name; default `info`.
#[wasm_bindgen]
pub fn init(level: Option<String>) {
    logger::init(logger::parse_level(level.as_deref()));
    READY.with(|ready| ready.set(true));
}

/// Whether `init` or `start_background` has run in this context.
#[wasm_bindgen]
pub fn is_ready() -> bool {
    READY.with(Cell::get)
}

#[wasm_bindgen]
pub fn resolve_origin_js(url: &str) -> Option<String> {
    resolve_origin(url).map(|origin| origin.as_str().to_string())
}

async fn respond(message: JsValue) -> JsValue {
    let response = match serve(&message).await {
        Ok(response) => response,
        Err(e) => Response::error(e.to_string()),
    };
    serde_json::to_value(&response)
        .map_err(HostError::from)
        .and_then(|value| js::json_to_js("runtime.onMessage", &value))
        .unwrap_or_else(|e| {
            log::error!("encoding response failed: {}", e);
            JsValue::NULL
        })
}

async fn serve(message: &JsValue) -> Result<Response, HostError> {
    let message = js::js_to_json("runtime.onMessage", message)?;
    let controller = ActivationController::from_storage(ChromeHost::new()?);
    Ok(dispatch(&controller, &message).await)
}

/// Serve one protocol message. Always resolves; failures resolve to `{error}`.
#[wasm_bindgen]
pub fn handle_message(message: JsValue) -> Promise {
    future_to_promise(async move { Ok(respond(message).await) })
}

async fn navigation_complete(tab: Tab) -> Result<bool, HostError> {
    let controller = ActivationController::from_storage(ChromeHost::new()?);
    Ok(controller.on_navigation_complete(&tab).await)
}

async fn tab_activated(tab_id: i32) -> Result<(), HostError> {
    let controller = ActivationController::from_storage(ChromeHost::new()?);
    controller.on_tab_activated(tab_id).await;
    Ok(())
}

fn host_error(e: HostError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Resolves to whether the payload was injected.
#[wasm_bindgen]
pub fn on_navigation_complete(tab_id: i32, url: Option<String>) -> Promise {
    future_to_promise(async move {
        let injected = navigation_complete(Tab { id: tab_id, url }).await.map_err(host_error)?;
        Ok(JsValue::from(injected))
    })
}

#[wasm_bindgen]
pub fn on_tab_activated(tab_id: i32) -> Promise {
    future_to_promise(async move {
        tab_activated(tab_id).await.map_err(host_error)?;
        Ok(JsValue::UNDEFINED)
    })
}

fn add_listener(event_path: &[&str], listener: &JsValue) -> Result<(), JsValue> {
    let mut target = js::get(&js_sys::global(), "chrome");
    for part in event_path {
        target = js::get(&target, part);
    }
    let add: Function = js::get(&target, "addListener")
        .dyn_into()
        .map_err(|_| JsValue::from_str(&format!("chrome.{} is unavailable", event_path.join("."))))?;
    add.call1(&target, listener)?;
    Ok(())
}

/// Register the background listeners: completed navigations, tab switches
/// and protocol messages from the options page.
#[wasm_bindgen]
pub fn start_background() -> Result<(), JsValue> {
    if BACKGROUND_STARTED.with(Cell::get) {
        return Ok(());
    }
    logger::init(log::max_level().max(log::LevelFilter::Info));

    let on_updated = Closure::wrap(Box::new(|tab_id: JsValue, change: JsValue, tab: JsValue| {
        if js::get(&change, "status").as_string().as_deref() != Some("complete") {
            return;
        }
        let Some(tab_id) = tab_id.as_f64() else { return };
        let url = js::get(&tab, "url").as_string();
        spawn_local(async move {
            if let Err(e) = navigation_complete(Tab { id: tab_id as i32, url }).await {
                log::warn!("navigation handling failed: {}", e);
            }
        });
    }) as Box<dyn FnMut(JsValue, JsValue, JsValue)>);
    add_listener(&["tabs", "onUpdated"], on_updated.as_ref())?;
    on_updated.forget();

    let on_activated = Closure::wrap(Box::new(|info: JsValue| {
        let Some(tab_id) = js::get(&info, "tabId").as_f64() else { return };
        spawn_local(async move {
            if let Err(e) = tab_activated(tab_id as i32).await {
                log::warn!("tab activation handling failed: {}", e);
            }
        });
    }) as Box<dyn FnMut(JsValue)>);
    add_listener(&["tabs", "onActivated"], on_activated.as_ref())?;
    on_activated.forget();

    let on_message = Closure::wrap(Box::new(|message: JsValue, _sender: JsValue, send_response: JsValue| -> JsValue {
        let Ok(send_response) = send_response.dyn_into::<Function>() else {
            return JsValue::FALSE;
        };
        spawn_local(async move {
            let response = respond(message).await;
            if let Err(e) = send_response.call1(&JsValue::NULL, &response) {
                log::debug!("message channel closed: {}", js::js_error_message(&e));
            }
        });
        // Keep the channel open for the async response.
        JsValue::TRUE
    }) as Box<dyn FnMut(JsValue, JsValue, JsValue) -> JsValue>);
    add_listener(&["runtime", "onMessage"], on_message.as_ref())?;
    on_message.forget();

    BACKGROUND_STARTED.with(|started| started.set(true));
    READY.with(|ready| ready.set(true));
    log::info!("background listeners registered");
    Ok(())
}
