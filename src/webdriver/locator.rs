//! Element locators and their W3C strategy mapping.

use serde_json::{json, Value};
use std::fmt;

/// How to find an element on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Element `id` attribute.
    Id(String),
    /// Form control `name` attribute.
    Name(String),
    /// CSS selector.
    Css(String),
    /// XPath expression.
    XPath(String),
    /// Tag name, e.g. `input`.
    Tag(String),
}

impl Locator {
    pub fn id(value: impl Into<String>) -> Self {
        Self::Id(value.into())
    }

    pub fn name(value: impl Into<String>) -> Self {
        Self::Name(value.into())
    }

    pub fn css(value: impl Into<String>) -> Self {
        Self::Css(value.into())
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Self::XPath(value.into())
    }

    pub fn tag(value: impl Into<String>) -> Self {
        Self::Tag(value.into())
    }

    /// The `(using, value)` pair of the W3C "find element" command.
    ///
    /// Everything but XPath goes through `css selector`: W3C dropped the
    /// `id` and `name` strategies, and a bare tag is a CSS type selector.
    pub fn strategy(&self) -> (&'static str, String) {
        match self {
            Self::Id(id) => ("css selector", format!("[id=\"{}\"]", css_escape(id))),
            Self::Name(name) => ("css selector", format!("[name=\"{}\"]", css_escape(name))),
            Self::Css(css) => ("css selector", css.clone()),
            Self::XPath(xpath) => ("xpath", xpath.clone()),
            Self::Tag(tag) => ("css selector", tag.clone()),
        }
    }

    /// Request body for a find command.
    pub fn to_body(&self) -> Value {
        let (using, value) = self.strategy();
        json!({ "using": using, "value": value })
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(v) => write!(f, "#{}", v),
            Self::Name(v) => write!(f, "[name={}]", v),
            Self::Css(v) => write!(f, "css `{}`", v),
            Self::XPath(v) => write!(f, "xpath `{}`", v),
            Self::Tag(v) => write!(f, "<{}>", v),
        }
    }
}

/// Escape a value for use inside a double-quoted CSS attribute selector.
fn css_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_and_name_map_to_css() {
        assert_eq!(
            Locator::id("secondaryDownload").strategy(),
            ("css selector", "[id=\"secondaryDownload\"]".to_string())
        );
        assert_eq!(
            Locator::name("email").strategy(),
            ("css selector", "[name=\"email\"]".to_string())
        );
    }

    #[test]
    fn test_attribute_values_are_escaped() {
        let (_, value) = Locator::id(r#"a"b\c"#).strategy();
        assert_eq!(value, r#"[id="a\"b\\c"]"#);
    }

    #[test]
    fn test_body_shape() {
        let body = Locator::xpath("//button[text()='Login']").to_body();
        assert_eq!(body["using"], "xpath");
        assert_eq!(body["value"], "//button[text()='Login']");

        let body = Locator::tag("input").to_body();
        assert_eq!(body["using"], "css selector");
        assert_eq!(body["value"], "input");
    }
}
