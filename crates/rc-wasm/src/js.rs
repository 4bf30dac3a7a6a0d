//! Small bridges between Rust values and page/extension JavaScript.

use js_sys::{Function, Object, Reflect};
use rc_core::HostError;
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

#[wasm_bindgen(inline_js = r#"
export function guardMethod(original, skip) {
  return function (...args) {
    if (skip(this, args[0])) {
      return undefined;
    }
    return original.apply(this, args);
  };
}

export function guardSetter(original, skip) {
  return function (value) {
    if (skip(this, value)) {
      return;
    }
    original.call(this, value);
  };
}

export function stageConfigFunction() {
  return function (name, json) {
    globalThis[name] = json;
  };
}
"#)]
extern "C" {
    /// Wrap `original` so calls where `skip(this, firstArg)` is true do nothing.
    #[wasm_bindgen(js_name = guardMethod)]
    pub fn guard_method(original: &Function, skip: &Function) -> Function;

    /// Wrap an accessor setter so assignments where `skip(this, value)` is true are dropped.
    #[wasm_bindgen(js_name = guardSetter)]
    pub fn guard_setter(original: &Function, skip: &Function) -> Function;

    /// Self-contained function, serializable by `scripting.executeScript`,
    /// that stores a value on the page global.
    #[wasm_bindgen(js_name = stageConfigFunction)]
    pub fn stage_config_function() -> Function;
}

/// Leak a two-argument predicate as a JS function. Used for patches that
/// live as long as the page context.
pub fn predicate(f: impl Fn(&JsValue, &JsValue) -> bool + 'static) -> Function {
    let closure = Closure::wrap(
        Box::new(move |a: JsValue, b: JsValue| -> bool { f(&a, &b) })
            as Box<dyn FnMut(JsValue, JsValue) -> bool>,
    );
    closure.into_js_value().unchecked_into()
}

pub fn js_error_message(err: &JsValue) -> String {
    if let Some(error) = err.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    err.as_string().unwrap_or_else(|| format!("{:?}", err))
}

pub fn js_to_json(api: &'static str, value: &JsValue) -> Result<Value, HostError> {
    if value.is_undefined() {
        return Ok(Value::Null);
    }
    let text = js_sys::JSON::stringify(value).map_err(|e| HostError::Malformed {
        api,
        detail: js_error_message(&e),
    })?;
    Ok(serde_json::from_str(&String::from(text))?)
}

pub fn json_to_js(api: &'static str, value: &Value) -> Result<JsValue, HostError> {
    let text = serde_json::to_string(value)?;
    js_sys::JSON::parse(&text).map_err(|e| HostError::Malformed {
        api,
        detail: js_error_message(&e),
    })
}

/// Build a plain object from key/value pairs.
pub fn object(entries: &[(&str, JsValue)]) -> Object {
    let obj = Object::new();
    for (key, value) in entries {
        let _ = Reflect::set(&obj, &JsValue::from_str(key), value);
    }
    obj
}

pub fn get(target: &JsValue, key: &str) -> JsValue {
    Reflect::get(target, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED)
}
