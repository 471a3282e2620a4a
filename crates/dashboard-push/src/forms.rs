//! Hidden form-field harvesting.
//!
//! The dashboard's compose page embeds a rotating anti-forgery field among
//! otherwise-static hidden inputs; its name changes per request, so nothing
//! here assumes any field name; every hidden input present in the markup is
//! harvested and echoed back on submit.
//!
//! Kept free of HTTP so it can be exercised against fixture markup.

use std::collections::HashMap;

use regex::Regex;

/// Scans markup for hidden-typed inputs.
pub struct HiddenInputParser {
    input_tag: Regex,
    name_attr: Regex,
    value_attr: Regex,
}

impl HiddenInputParser {
    pub fn new() -> Self {
        let input_tag = Regex::new(r#"(?i)<input[^>]+type=["']hidden["'][^>]*>"#)
            .expect("invalid hidden-input pattern");
        let name_attr =
            Regex::new(r#"(?i)name=["']([^"']+)["']"#).expect("invalid name-attribute pattern");
        let value_attr =
            Regex::new(r#"(?i)value=["']([^"']*)["']"#).expect("invalid value-attribute pattern");

        Self {
            input_tag,
            name_attr,
            value_attr,
        }
    }

    /// All hidden input name/value pairs in the markup.
    ///
    /// Inputs without a `name` are skipped; a missing `value` becomes the
    /// empty string.
    pub fn parse(&self, html: &str) -> HashMap<String, String> {
        let mut hidden = HashMap::new();
        for tag in self.input_tag.find_iter(html) {
            let tag = tag.as_str();
            let Some(name) = self.name_attr.captures(tag).and_then(|c| c.get(1)) else {
                continue;
            };
            let value = self
                .value_attr
                .captures(tag)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str())
                .unwrap_or("");
            hidden.insert(name.as_str().to_string(), value.to_string());
        }
        hidden
    }
}

impl Default for HiddenInputParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPOSE_FIXTURE: &str = r#"
        <form id="form-push" method="post">
            <input type="hidden" name="action" value="mod">
            <input type="hidden" name="k7f3q9x2" value="rotating-token-value">
            <input TYPE='hidden' NAME='csrf_epoch' VALUE='1754400000'>
            <input type="hidden" name="empty_marker">
            <input type="hidden" value="nameless">
            <input type="text" name="message" value="not hidden">
            <textarea id="zones"></textarea>
        </form>
    "#;

    #[test]
    fn test_harvests_every_hidden_input() {
        let hidden = HiddenInputParser::new().parse(COMPOSE_FIXTURE);
        assert_eq!(hidden.len(), 4);
        assert_eq!(hidden["action"], "mod");
        assert_eq!(hidden["k7f3q9x2"], "rotating-token-value");
        assert_eq!(hidden["csrf_epoch"], "1754400000");
        assert_eq!(hidden["empty_marker"], "");
    }

    #[test]
    fn test_visible_inputs_are_ignored() {
        let hidden = HiddenInputParser::new().parse(COMPOSE_FIXTURE);
        assert!(!hidden.contains_key("message"));
    }

    #[test]
    fn test_empty_markup_yields_nothing() {
        assert!(HiddenInputParser::new().parse("").is_empty());
    }
}
