//! `chrome.*` implementation of the core host traits.
//!
//! Every call goes through [`ChromeHost::call`], which resolves the API by
//! dotted path and awaits the returned promise (Manifest V3 APIs are
//! promise-based).

use js_sys::{Array, Function, Promise, Reflect};
use rc_core::host::{BadgeService, KeyValueStore, PermissionService, ScriptInjector, TabService};
use rc_core::payload::CONFIG_GLOBAL;
use rc_core::{BadgeConfig, BadgeState, HostError, PayloadConfig, Tab, TabId};
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::js::{self, js_error_message, js_to_json, json_to_js, object};

pub struct ChromeHost {
    chrome: JsValue,
}

impl ChromeHost {
    pub fn new() -> Result<Self, HostError> {
        let chrome = js::get(&js_sys::global(), "chrome");
        if !chrome.is_object() {
            return Err(HostError::Unavailable("chrome"));
        }
        Ok(Self { chrome })
    }

    /// Call `chrome.<api>(...args)` and await the result.
    pub async fn call(&self, api: &'static str, args: &[JsValue]) -> Result<JsValue, HostError> {
        let (path, method) = api.rsplit_once('.').ok_or(HostError::Unavailable(api))?;

        let mut namespace = self.chrome.clone();
        for part in path.split('.') {
            namespace = js::get(&namespace, part);
            if !namespace.is_object() {
                return Err(HostError::Unavailable(api));
            }
        }
        let function: Function = js::get(&namespace, method)
            .dyn_into()
            .map_err(|_| HostError::Unavailable(api))?;

        let arguments: Array = args.iter().collect();
        let result = Reflect::apply(&function, &namespace, &arguments).map_err(|e| HostError::Api {
            api,
            message: js_error_message(&e),
        })?;

        match result.dyn_into::<Promise>() {
            Ok(promise) => JsFuture::from(promise).await.map_err(|e| HostError::Api {
                api,
                message: js_error_message(&e),
            }),
            Err(value) => Ok(value),
        }
    }

    fn expect_bool(api: &'static str, value: JsValue) -> Result<bool, HostError> {
        value.as_bool().ok_or_else(|| HostError::Malformed {
            api,
            detail: format!("expected boolean, got {:?}", value),
        })
    }
}

fn origins_argument(pattern: &str) -> JsValue {
    let origins: Array = std::iter::once(JsValue::from_str(pattern)).collect();
    object(&[("origins", origins.into())]).into()
}

fn tab_from_js(value: &JsValue) -> Option<Tab> {
    let id = js::get(value, "id").as_f64()? as TabId;
    let url = js::get(value, "url").as_string();
    Some(Tab { id, url })
}

fn tab_target(tab_id: TabId) -> JsValue {
    object(&[("tabId", JsValue::from(tab_id))]).into()
}

impl KeyValueStore for ChromeHost {
    async fn get(&self, key: &str) -> Result<Option<Value>, HostError> {
        const API: &str = "storage.local.get";
        let items = self.call(API, &[JsValue::from_str(key)]).await?;
        let value = js::get(&items, key);
        if value.is_undefined() {
            return Ok(None);
        }
        js_to_json(API, &value).map(Some)
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), HostError> {
        const API: &str = "storage.local.set";
        let items = object(&[(key, json_to_js(API, &value)?)]);
        self.call(API, &[items.into()]).await?;
        Ok(())
    }
}

impl PermissionService for ChromeHost {
    async fn request(&self, pattern: &str) -> Result<bool, HostError> {
        const API: &str = "permissions.request";
        Self::expect_bool(API, self.call(API, &[origins_argument(pattern)]).await?)
    }

    async fn remove(&self, pattern: &str) -> Result<bool, HostError> {
        const API: &str = "permissions.remove";
        Self::expect_bool(API, self.call(API, &[origins_argument(pattern)]).await?)
    }

    async fn contains(&self, pattern: &str) -> Result<bool, HostError> {
        const API: &str = "permissions.contains";
        Self::expect_bool(API, self.call(API, &[origins_argument(pattern)]).await?)
    }
}

impl TabService for ChromeHost {
    async fn active_tab(&self) -> Result<Option<Tab>, HostError> {
        let query = object(&[
            ("active", JsValue::TRUE),
            ("lastFocusedWindow", JsValue::TRUE),
        ]);
        let tabs = self.call("tabs.query", &[query.into()]).await?;
        let tabs: Array = tabs.dyn_into().map_err(|v| HostError::Malformed {
            api: "tabs.query",
            detail: format!("expected array, got {:?}", v),
        })?;
        Ok(tabs.iter().find_map(|tab| tab_from_js(&tab)))
    }

    async fn get(&self, tab_id: TabId) -> Result<Option<Tab>, HostError> {
        let tab = self.call("tabs.get", &[JsValue::from(tab_id)]).await?;
        Ok(tab_from_js(&tab))
    }

    async fn reload(&self, tab_id: TabId) -> Result<(), HostError> {
        self.call("tabs.reload", &[JsValue::from(tab_id)]).await?;
        Ok(())
    }
}

impl ScriptInjector for ChromeHost {
    async fn inject_main_world(
        &self,
        tab_id: TabId,
        script: &str,
        config: &PayloadConfig,
    ) -> Result<(), HostError> {
        const API: &str = "scripting.executeScript";
        let config_json = serde_json::to_string(config)?;

        // Stage the config first; the payload reads it synchronously on start.
        let args: Array = [JsValue::from_str(CONFIG_GLOBAL), JsValue::from_str(&config_json)]
            .into_iter()
            .collect();
        let stage = object(&[
            ("target", tab_target(tab_id)),
            ("world", JsValue::from_str("MAIN")),
            ("func", js::stage_config_function().into()),
            ("args", args.into()),
        ]);
        self.call(API, &[stage.into()]).await?;

        let files: Array = std::iter::once(JsValue::from_str(script)).collect();
        let run = object(&[
            ("target", tab_target(tab_id)),
            ("world", JsValue::from_str("MAIN")),
            ("files", files.into()),
        ]);
        self.call(API, &[run.into()]).await?;
        Ok(())
    }
}

impl BadgeService for ChromeHost {
    async fn set_badge(
        &self,
        tab_id: TabId,
        state: BadgeState,
        config: &BadgeConfig,
    ) -> Result<(), HostError> {
        let text = match state {
            BadgeState::On => &config.on_text,
            BadgeState::Off => &config.off_text,
        };
        let details = object(&[
            ("tabId", JsValue::from(tab_id)),
            ("text", JsValue::from_str(text)),
        ]);
        self.call("action.setBadgeText", &[details.into()]).await?;

        if state == BadgeState::On {
            let details = object(&[
                ("tabId", JsValue::from(tab_id)),
                ("color", JsValue::from_str(&config.on_color)),
            ]);
            self.call("action.setBadgeBackgroundColor", &[details.into()]).await?;
        }
        Ok(())
    }
}
