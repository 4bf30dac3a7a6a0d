//! Right-click rescue on the live DOM.

use std::cell::{Cell, RefCell};

use rc_core::payload::events::RIGHT_BUTTON;
use rc_core::payload::overlay::{
    decode_inline_value, encode_inline_value, plan_rescue, rescue_image_style, Rect, StackEntry,
    POINTER_BLOCK_ATTR, POINTER_PREV_ATTR, RESCUE_ATTR,
};
use rc_core::payload::DeferredRegistry;
use rc_core::PayloadConfig;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CssStyleDeclaration, Document, Element, HtmlImageElement, MouseEvent, Window};

thread_local! {
    static RESCUES: RefCell<DeferredRegistry<String, HtmlImageElement>> = RefCell::new(DeferredRegistry::new());
    static POINTER_GENERATION: Cell<u64> = const { Cell::new(0) };
}

pub fn install(window: &Window, config: &PayloadConfig) -> Result<(), JsValue> {
    let rescue_timeout = config.rescue_timeout_ms;
    let revert_delay = config.pointer_revert_ms;
    let win = window.clone();

    let on_mouse_down = Closure::wrap(Box::new(move |event: MouseEvent| {
        if event.button() != RIGHT_BUTTON {
            return;
        }
        let (x, y) = (event.client_x() as f32, event.client_y() as f32);
        if let Err(e) = rescue(&win, x, y, rescue_timeout, revert_delay) {
            log::debug!("rescue at ({}, {}) failed: {}", x, y, crate::js::js_error_message(&e));
        }
    }) as Box<dyn FnMut(MouseEvent)>);

    window.add_event_listener_with_callback_and_bool(
        "mousedown",
        on_mouse_down.as_ref().unchecked_ref(),
        true,
    )?;
    on_mouse_down.forget();
    Ok(())
}

fn rescue(window: &Window, x: f32, y: f32, rescue_timeout: u32, revert_delay: u32) -> Result<(), JsValue> {
    let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;

    let elements: Vec<Element> = document
        .elements_from_point(x, y)
        .iter()
        .filter_map(|value| value.dyn_into::<Element>().ok())
        .filter(|element| !element.has_attribute(RESCUE_ATTR))
        .collect();

    let mut stack = Vec::with_capacity(elements.len());
    for element in &elements {
        let background = window
            .get_computed_style(element)?
            .and_then(|style| style.get_property_value("background-image").ok())
            .filter(|value| !value.is_empty() && value != "none");
        stack.push(StackEntry::new(&element.tag_name(), background.as_deref()));
    }

    let plan = plan_rescue(&stack);
    if let Some(image) = &plan.image {
        rescue_image(window, &document, &elements[image.index], &image.url, rescue_timeout)?;
    }
    for index in plan.pointer_blocks.clone() {
        block_pointer(window, &elements[index], revert_delay)?;
    }
    Ok(())
}

/// Lay a transparent copy of `url` over `source`, reusing the image for a
/// repeated URL and restarting its removal timer.
fn rescue_image(
    window: &Window,
    document: &Document,
    source: &Element,
    url: &str,
    timeout_ms: u32,
) -> Result<(), JsValue> {
    let rect = source.get_bounding_client_rect();
    let style = rescue_image_style(
        Rect { left: rect.left(), top: rect.top(), width: rect.width(), height: rect.height() },
        window.scroll_x()?,
        window.scroll_y()?,
    );

    let key = url.to_string();
    let image = match RESCUES.with(|r| r.borrow().get(&key).cloned()) {
        Some(image) => image,
        None => {
            let image: HtmlImageElement = document.create_element("img")?.unchecked_into();
            image.set_src(url);
            image.set_attribute(RESCUE_ATTR, "")?;
            image
        }
    };
    image.set_attribute("style", &style)?;

    let scheduled = RESCUES.with(|r| r.borrow_mut().schedule(key.clone(), || image.clone()));
    if scheduled.created {
        let parent = document
            .document_element()
            .ok_or_else(|| JsValue::from_str("document has no root element"))?;
        parent.append_child(&image)?;
    }

    set_timeout(window, timeout_ms, move || {
        if let Some(image) = RESCUES.with(|r| r.borrow_mut().expire(&key, scheduled.generation)) {
            image.remove();
        }
    })
}

/// Inline style of any element that has one (HTML, SVG, MathML).
fn inline_style(element: &Element) -> Option<CssStyleDeclaration> {
    crate::js::get(element, "style").dyn_into::<CssStyleDeclaration>().ok()
}

/// Turn off pointer events on `element` until the revert timer fires.
fn block_pointer(window: &Window, element: &Element, delay_ms: u32) -> Result<(), JsValue> {
    let Some(style) = inline_style(element) else {
        return Ok(());
    };

    // Keep the page's own value from the first block in a series.
    if !element.has_attribute(POINTER_BLOCK_ATTR) {
        let previous = style.get_property_value("pointer-events")?;
        let priority = style.get_property_priority("pointer-events");
        element.set_attribute(POINTER_PREV_ATTR, &encode_inline_value(&previous, &priority))?;
    }
    style.set_property_with_priority("pointer-events", "none", "important")?;

    let generation = POINTER_GENERATION.with(|g| {
        g.set(g.get() + 1);
        g.get()
    })
    .to_string();
    element.set_attribute(POINTER_BLOCK_ATTR, &generation)?;

    let element = element.clone();
    set_timeout(window, delay_ms, move || {
        if element.get_attribute(POINTER_BLOCK_ATTR).as_deref() != Some(generation.as_str()) {
            return;
        }
        let previous = element.get_attribute(POINTER_PREV_ATTR).unwrap_or_default();
        let (value, priority) = decode_inline_value(&previous);
        let restored = if value.is_empty() {
            style.remove_property("pointer-events").map(|_| ())
        } else {
            style.set_property_with_priority("pointer-events", value, priority)
        };
        if restored.is_err() {
            log::debug!("restoring pointer-events failed");
        }
        let _ = element.remove_attribute(POINTER_BLOCK_ATTR);
        let _ = element.remove_attribute(POINTER_PREV_ATTR);
    })
}

fn set_timeout(window: &Window, delay_ms: u32, f: impl FnOnce() + 'static) -> Result<(), JsValue> {
    let callback = Closure::once_into_js(f);
    window.set_timeout_with_callback_and_timeout_and_arguments_0(
        callback.unchecked_ref(),
        delay_ms.min(i32::MAX as u32) as i32,
    )?;
    Ok(())
}
