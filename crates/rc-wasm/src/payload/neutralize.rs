//! Prototype-level neutralization of cancel-default and selection clearing.

use js_sys::{Function, Object, Reflect};
use rc_core::payload::patches::{PatchKind, PrototypePatch, CAPABILITY_PATCHES, REGISTRATION_PATCH};
use rc_core::payload::BlockedEvents;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Window;

use crate::js::{self, guard_method, guard_setter, predicate};

/// Apply every capability patch the page supports. Returns how many applied.
pub fn install(window: &Window, events: BlockedEvents) -> usize {
    CAPABILITY_PATCHES
        .iter()
        .filter(|patch| apply_logged(window, patch, events))
        .count()
}

pub fn install_registration_guard(window: &Window, events: BlockedEvents) {
    apply_logged(window, &REGISTRATION_PATCH, events);
}

fn apply_logged(window: &Window, patch: &PrototypePatch, events: BlockedEvents) -> bool {
    match apply(window, patch, events) {
        Ok(true) => true,
        Ok(false) => {
            log::debug!("{}.{} not present, skipped", patch.interface, patch.member);
            false
        }
        Err(e) => {
            log::warn!(
                "patching {}.{} failed: {}",
                patch.interface,
                patch.member,
                js::js_error_message(&e)
            );
            false
        }
    }
}

fn prototype_of(window: &Window, interface: &str) -> Option<Object> {
    let constructor = js::get(window, interface);
    if constructor.is_undefined() {
        return None;
    }
    js::get(&constructor, "prototype").dyn_into::<Object>().ok()
}

/// Whether `event`'s default must survive page cancellation.
fn is_protected(events: BlockedEvents, event: &JsValue) -> bool {
    let Some(event_type) = js::get(event, "type").as_string() else {
        return false;
    };
    let button = js::get(event, "button").as_f64().map(|b| b as i16);
    events.protects_default(&event_type, button)
}

fn apply(window: &Window, patch: &PrototypePatch, events: BlockedEvents) -> Result<bool, JsValue> {
    let Some(proto) = prototype_of(window, patch.interface) else {
        return Ok(false);
    };
    let member = JsValue::from_str(patch.member);

    match patch.kind {
        PatchKind::EventGuard => {
            // Subclasses without their own member inherit the patched base.
            if !Object::has_own(&proto, &member) {
                return Ok(false);
            }
            let Some(original) = Reflect::get(&proto, &member)?.dyn_into::<Function>().ok() else {
                return Ok(false);
            };
            let skip = predicate(move |this, _| is_protected(events, this));
            Reflect::set(&proto, &member, &guard_method(&original, &skip))
        }
        PatchKind::RegistrationGuard => {
            let Some(original) = Reflect::get(&proto, &member)?.dyn_into::<Function>().ok() else {
                return Ok(false);
            };
            let skip = predicate(move |_, event_type| {
                event_type.as_string().is_some_and(|t| events.intercepts(&t))
            });
            Reflect::set(&proto, &member, &guard_method(&original, &skip))
        }
        PatchKind::NoOp => {
            if Reflect::get(&proto, &member)?.is_undefined() {
                return Ok(false);
            }
            let noop = predicate(|_, _| true);
            let original: Function = Reflect::get(&proto, &member)?.unchecked_into();
            Reflect::set(&proto, &member, &guard_method(&original, &noop))
        }
        PatchKind::ReturnValueGuard => {
            let descriptor = Reflect::get_own_property_descriptor(&proto, &member)?;
            if descriptor.is_undefined() {
                return Ok(false);
            }
            let Some(setter) = js::get(&descriptor, "set").dyn_into::<Function>().ok() else {
                return Ok(false);
            };
            let skip = predicate(move |this, value| {
                value.as_bool() == Some(false) && is_protected(events, this)
            });
            Reflect::set(&descriptor, &JsValue::from_str("set"), &guard_setter(&setter, &skip))?;
            Reflect::define_property(&proto, &member, descriptor.unchecked_ref())
        }
    }
}
