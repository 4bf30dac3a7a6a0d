//! Right-click rescue planning
//!
//! On a secondary-button press the payload collects every element under the
//! cursor, topmost first, and asks [`plan_rescue`] what to do:
//!
//! - the first element painting a `url(...)` background gets a near-invisible
//!   `<img>` of that image laid over it, so the native "save image" menu has
//!   something to act on;
//! - if a natively interactive element sits below the top of the stack, every
//!   element above it stops receiving pointer events for a moment so the
//!   press reaches the real target.

use std::fmt::Write;
use std::ops::Range;

/// Tags whose native context menu / interaction is worth restoring.
pub const INTERACTIVE_TAGS: &[&str] = &["img", "video", "audio", "input", "textarea", "select"];

pub const RESCUE_OPACITY: f64 = 0.01;
pub const RESCUE_Z_INDEX: u32 = 2_147_483_647;

/// Attribute tagging elements the payload has pointer-blocked.
pub const POINTER_BLOCK_ATTR: &str = "data-reclaim-pointer-block";
/// Attribute holding a blocked element's previous inline `pointer-events`.
pub const POINTER_PREV_ATTR: &str = "data-reclaim-pointer-prev";
/// Attribute marking rescue images.
pub const RESCUE_ATTR: &str = "data-reclaim-rescue";

/// One element of the hit-test stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackEntry {
    /// Lower-cased tag name.
    pub tag: String,
    /// Computed `background-image` value, `None` when `none`/unavailable.
    pub background_image: Option<String>,
}

impl StackEntry {
    pub fn new(tag: &str, background_image: Option<&str>) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            background_image: background_image.map(str::to_string),
        }
    }

    pub fn is_interactive(&self) -> bool {
        INTERACTIVE_TAGS.contains(&self.tag.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRescue {
    /// Stack index of the element whose background is rescued.
    pub index: usize,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RescuePlan {
    pub image: Option<ImageRescue>,
    /// Stack indices to pointer-block; empty when the target is already on top.
    pub pointer_blocks: Range<usize>,
}

impl RescuePlan {
    pub fn is_empty(&self) -> bool {
        self.image.is_none() && self.pointer_blocks.is_empty()
    }
}

/// Decide the rescue for a topmost-first element stack.
pub fn plan_rescue(stack: &[StackEntry]) -> RescuePlan {
    let image = stack.iter().enumerate().find_map(|(index, entry)| {
        let url = entry.background_image.as_deref().and_then(background_image_url)?;
        Some(ImageRescue { index, url })
    });

    let pointer_blocks = match stack.iter().position(StackEntry::is_interactive) {
        Some(target) => 0..target,
        None => 0..0,
    };

    RescuePlan { image, pointer_blocks }
}

/// First `url(...)` in a computed `background-image` value.
pub fn background_image_url(value: &str) -> Option<String> {
    let lower = value.to_ascii_lowercase();
    let start = lower.find("url(")? + 4;
    let rest = value[start..].trim_start();

    let url = match rest.chars().next()? {
        quote @ ('"' | '\'') => {
            let mut url = String::new();
            let mut chars = rest[1..].chars();
            loop {
                match chars.next()? {
                    '\\' => url.push(chars.next()?),
                    c if c == quote => break,
                    c => url.push(c),
                }
            }
            url
        }
        _ => rest[..rest.find(')')?].trim_end().to_string(),
    };

    if url.is_empty() { None } else { Some(url) }
}

/// Element box in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Inline style placing a rescue image over `rect`, in document coordinates.
pub fn rescue_image_style(rect: Rect, scroll_x: f64, scroll_y: f64) -> String {
    let mut style = String::with_capacity(192);
    let _ = write!(
        style,
        "position: absolute !important; left: {}px !important; top: {}px !important; \
         width: {}px !important; height: {}px !important; opacity: {} !important; \
         z-index: {} !important; pointer-events: auto !important; margin: 0 !important; \
         padding: 0 !important; border: 0 !important; display: block !important;",
        rect.left + scroll_x,
        rect.top + scroll_y,
        rect.width,
        rect.height,
        RESCUE_OPACITY,
        RESCUE_Z_INDEX,
    );
    style
}

/// Pack an inline style value and its priority into one attribute value.
pub fn encode_inline_value(value: &str, priority: &str) -> String {
    if priority.is_empty() {
        value.to_string()
    } else {
        format!("{value}!{priority}")
    }
}

/// Inverse of [`encode_inline_value`]: `(value, priority)`.
pub fn decode_inline_value(encoded: &str) -> (&str, &str) {
    encoded.rsplit_once('!').unwrap_or((encoded, ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_image_url() {
        assert_eq!(
            background_image_url("url(\"https://cdn.example/a.png\")").as_deref(),
            Some("https://cdn.example/a.png")
        );
        assert_eq!(background_image_url("url('b.jpg')").as_deref(), Some("b.jpg"));
        assert_eq!(background_image_url("URL( c.gif )").as_deref(), Some("c.gif"));
        assert_eq!(
            background_image_url("linear-gradient(red, blue), url(\"d.webp\")").as_deref(),
            Some("d.webp")
        );
        assert_eq!(background_image_url("url(\"e\\\"f.png\")").as_deref(), Some("e\"f.png"));
        assert_eq!(background_image_url("none"), None);
        assert_eq!(background_image_url("url(\"\")"), None);
        assert_eq!(background_image_url("url(\"unterminated"), None);
    }

    #[test]
    fn test_single_background_yields_one_rescue() {
        let stack = [
            StackEntry::new("DIV", Some("none")),
            StackEntry::new("div", Some("url(\"https://a.example/photo.jpg\")")),
            StackEntry::new("body", None),
            StackEntry::new("html", None),
        ];
        let plan = plan_rescue(&stack);
        assert_eq!(
            plan.image,
            Some(ImageRescue { index: 1, url: "https://a.example/photo.jpg".into() })
        );
        assert!(plan.pointer_blocks.is_empty());
    }

    #[test]
    fn test_first_background_wins() {
        let stack = [
            StackEntry::new("span", Some("url(top.png)")),
            StackEntry::new("div", Some("url(bottom.png)")),
        ];
        assert_eq!(plan_rescue(&stack).image.unwrap().url, "top.png");
    }

    #[test]
    fn test_covered_image_gets_overlays_blocked() {
        let stack = [
            StackEntry::new("div", None),
            StackEntry::new("span", None),
            StackEntry::new("img", None),
            StackEntry::new("body", None),
        ];
        let plan = plan_rescue(&stack);
        assert_eq!(plan.pointer_blocks, 0..2);
        assert!(plan.image.is_none());
    }

    #[test]
    fn test_topmost_target_needs_nothing() {
        let stack = [StackEntry::new("video", None), StackEntry::new("div", None)];
        assert!(plan_rescue(&stack).is_empty());
        assert!(plan_rescue(&[]).is_empty());
    }

    #[test]
    fn test_rescue_style_uses_document_coordinates() {
        let rect = Rect { left: 10.0, top: 20.0, width: 300.0, height: 150.0 };
        let style = rescue_image_style(rect, 0.0, 500.0);
        assert!(style.contains("left: 10px"));
        assert!(style.contains("top: 520px"));
        assert!(style.contains("width: 300px"));
        assert!(style.contains("height: 150px"));
        assert!(style.contains("z-index: 2147483647"));
        assert!(style.contains("opacity: 0.01"));
    }

    #[test]
    fn test_inline_value_encoding() {
        assert_eq!(encode_inline_value("auto", "important"), "auto!important");
        assert_eq!(decode_inline_value("auto!important"), ("auto", "important"));
        assert_eq!(decode_inline_value(&encode_inline_value("none", "")), ("none", ""));
        assert_eq!(decode_inline_value(""), ("", ""));
    }
}
