//! Forced stylesheet
//!
//! Appended as the last stylesheet so that, at equal specificity and
//! importance, it wins over the page's own rules.

use std::fmt::Write;

use crate::config::PayloadConfig;

pub const STYLE_ELEMENT_ID: &str = "reclaim-override-style";

/// Elements whose native interaction must stay reachable.
pub const INTERACTIVE_SELECTOR: &str = "img, video, audio, input, textarea, select, a";

const SELECTION_RULES: &str = "\
*, *::before, *::after {
  -webkit-user-select: text !important;
  -moz-user-select: text !important;
  user-select: text !important;
  -webkit-touch-callout: default !important;
}
::selection {
  background-color: Highlight !important;
  color: HighlightText !important;
}
";

/// Build the stylesheet text for `config`.
pub fn build_stylesheet(config: &PayloadConfig) -> String {
    let mut css = String::from(SELECTION_RULES);
    let _ = writeln!(css, "{INTERACTIVE_SELECTOR} {{\n  pointer-events: auto !important;\n}}");

    let hints: Vec<String> = config
        .overlay_class_hints
        .iter()
        .map(|hint| hint.trim())
        .filter(|hint| !hint.is_empty())
        .map(|hint| format!("[class*=\"{}\" i]", escape_css_string(hint)))
        .collect();
    if !hints.is_empty() {
        let _ = writeln!(css, "{} {{\n  display: none !important;\n}}", hints.join(",\n"));
    }
    css
}

/// Escape a value for use inside a double-quoted CSS string.
pub fn escape_css_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            // Newlines end a CSS string; emit them as hex escapes.
            '\n' | '\r' | '\u{c}' => {
                let _ = write!(out, "\\{:x} ", c as u32);
            }
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stylesheet_forces_selection() {
        let css = build_stylesheet(&PayloadConfig::default());
        assert!(css.contains("user-select: text !important"));
        assert!(css.contains("pointer-events: auto !important"));
        assert!(css.contains("[class*=\"no-right-click\" i]"));
        assert!(css.trim_end().ends_with('}'));
    }

    #[test]
    fn test_no_hint_rule_without_hints() {
        let config = PayloadConfig { overlay_class_hints: vec![" ".into()], ..Default::default() };
        assert!(!build_stylesheet(&config).contains("display: none"));
    }

    #[test]
    fn test_escape_css_string() {
        assert_eq!(escape_css_string("plain"), "plain");
        assert_eq!(escape_css_string("a\"b\\c"), "a\\\"b\\\\c");
        assert_eq!(escape_css_string("x\ny"), "x\\a y");
    }
}
