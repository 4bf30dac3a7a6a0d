//! Capture-phase interception and inline handler clearing.

use js_sys::Array;
use rc_core::payload::BlockedEvents;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, MutationObserver, MutationObserverInit, MutationRecord, Window};

/// Stop blocked events at window and document before page listeners see them.
pub fn install_capture_listeners(
    window: &Window,
    document: &Document,
    events: BlockedEvents,
) -> Result<(), JsValue> {
    let stop = Closure::wrap(Box::new(|event: Event| {
        event.stop_immediate_propagation();
    }) as Box<dyn FnMut(Event)>);

    for name in events.names() {
        window.add_event_listener_with_callback_and_bool(name, stop.as_ref().unchecked_ref(), true)?;
        document.add_event_listener_with_callback_and_bool(name, stop.as_ref().unchecked_ref(), true)?;
    }
    stop.forget();
    Ok(())
}

/// Null-clear inline handlers now and on every element added or re-armed later.
pub fn watch_inline_handlers(
    window: &Window,
    document: &Document,
    events: BlockedEvents,
) -> Result<(), JsValue> {
    let attributes = events.handler_attributes();

    for name in &attributes {
        let _ = js_sys::Reflect::set(window, &JsValue::from_str(name), &JsValue::NULL);
        let _ = js_sys::Reflect::set(document, &JsValue::from_str(name), &JsValue::NULL);
    }

    let Some(root) = document.document_element() else {
        return Ok(());
    };
    clear_subtree(&root, &attributes);

    let filter: Array = attributes.iter().map(|a| JsValue::from_str(a)).collect();
    let callback = Closure::wrap(Box::new(move |records: Array, _observer: MutationObserver| {
        for record in records.iter() {
            let record: MutationRecord = record.unchecked_into();
            match record.type_().as_str() {
                "childList" => {
                    let added = record.added_nodes();
                    for i in 0..added.length() {
                        if let Some(element) = added.item(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                            clear_subtree(&element, &attributes);
                        }
                    }
                }
                "attributes" => {
                    if let Some(element) = record.target().and_then(|n| n.dyn_into::<Element>().ok()) {
                        clear_element(&element, &attributes);
                    }
                }
                _ => {}
            }
        }
    }) as Box<dyn FnMut(Array, MutationObserver)>);

    let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;
    let init = MutationObserverInit::new();
    init.set_child_list(true);
    init.set_subtree(true);
    init.set_attributes(true);
    init.set_attribute_filter(&filter);
    observer.observe_with_options(&root, &init)?;
    callback.forget();
    Ok(())
}

fn clear_subtree(root: &Element, attributes: &[String]) {
    clear_element(root, attributes);
    let Ok(descendants) = root.query_selector_all("*") else {
        return;
    };
    for i in 0..descendants.length() {
        if let Some(element) = descendants.item(i).and_then(|n| n.dyn_into::<Element>().ok()) {
            clear_element(&element, attributes);
        }
    }
}

fn clear_element(element: &Element, attributes: &[String]) {
    for name in attributes {
        if element.has_attribute(name) {
            let _ = element.remove_attribute(name);
        }
        let _ = js_sys::Reflect::set(element, &JsValue::from_str(name), &JsValue::NULL);
    }
}
