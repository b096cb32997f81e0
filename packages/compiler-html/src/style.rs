//! Inline style handling.
//!
//! [`Declarations`] makes the precedence between a block's own Style Map and
//! the fixed rules of its variant explicit: the Style Map is always emitted
//! first and fixed rules are appended after it. Within one inline `style`
//! attribute a later declaration of the same property wins, so fixed rules
//! override the Style Map wherever both declare a property.

use mailforge_model::StyleMap;

/// Convert a Style Map key to a CSS property name: every ASCII uppercase
/// letter becomes `-` followed by its lowercase form.
pub fn to_css_property(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Ordered list of CSS declarations for one inline `style` attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Declarations {
    entries: Vec<(String, String)>,
}

impl Declarations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a block's Style Map, in authoring order.
    pub fn from_style(style: &StyleMap) -> Self {
        Self {
            entries: style
                .iter()
                .map(|(key, value)| (to_css_property(key), value.to_string()))
                .collect(),
        }
    }

    /// Append a fixed rule. It comes after everything already present.
    pub fn rule(mut self, property: &str, value: impl Into<String>) -> Self {
        self.entries.push((property.to_string(), value.into()));
        self
    }

    /// The value a browser applies for `property`: the last declaration.
    pub fn effective(&self, property: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `prop: value; prop: value;`, escaped for a double-quoted attribute.
    pub fn to_attribute(&self) -> String {
        let text = self
            .entries
            .iter()
            .map(|(p, v)| format!("{}: {};", p, v))
            .collect::<Vec<_>>()
            .join(" ");
        escape_attr(&text)
    }
}

/// Escape text for use inside a double-quoted HTML attribute.
pub fn escape_attr(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
