use rc_core::payload::style::{build_stylesheet, STYLE_ELEMENT_ID};
use rc_core::PayloadConfig;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Node};

/// Append the forced stylesheet once. Returns `false` if already present.
pub fn install(document: &Document, config: &PayloadConfig) -> Result<bool, JsValue> {
    if document.get_element_by_id(STYLE_ELEMENT_ID).is_some() {
        return Ok(false);
    }

    let style = document.create_element("style")?;
    style.set_id(STYLE_ELEMENT_ID);
    style.set_text_content(Some(&build_stylesheet(config)));

    let parent: Node = match (document.head(), document.document_element()) {
        (Some(head), _) => head.into(),
        (None, Some(root)) => root.into(),
        (None, None) => return Err(JsValue::from_str("document has no root element")),
    };
    parent.append_child(&style)?;
    Ok(true)
}
