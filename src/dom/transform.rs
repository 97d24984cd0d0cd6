//! CSS transform chain edits.
//!
//! A transform commit must not clobber sibling transform functions: the
//! element's `transform` style is parsed into an ordered name → arguments
//! list, one entry is updated (or appended), and the chain is re-serialized.

use crate::dom::Element;

/// Ordered list of `name(args)` entries of a transform chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformList {
    entries: Vec<(String, String)>,
}

impl TransformList {
    /// Parse a transform style value. Malformed trailing input is dropped.
    pub fn parse(value: &str) -> Self {
        let mut entries = Vec::new();
        let mut rest = value.trim();
        while !rest.is_empty() {
            let Some(open) = rest.find('(') else { break };
            let Some(close) = rest[open..].find(')') else { break };
            let name = rest[..open].trim();
            let args = rest[open + 1..open + close].trim();
            if !name.is_empty() {
                entries.push((name.to_string(), args.to_string()));
            }
            rest = rest[open + close + 1..].trim_start();
        }
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, args)| args.as_str())
    }

    /// Update an entry in place, or append it to the end of the chain.
    pub fn set(&mut self, name: &str, args: impl Into<String>) {
        let args = args.into();
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = args,
            None => self.entries.push((name.to_string(), args)),
        }
    }

    pub fn serialize(&self) -> String {
        self.entries
            .iter()
            .map(|(n, a)| format!("{}({})", n, a))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read one transform function's arguments from an element.
pub fn read_component(el: &Element, name: &str) -> Option<String> {
    let chain = el.style("transform")?;
    TransformList::parse(&chain).get(name).map(str::to_string)
}

/// Write one transform function, preserving its siblings.
pub fn write_component(el: &Element, name: &str, args: &str) {
    let mut list = el
        .style("transform")
        .map(|s| TransformList::parse(&s))
        .unwrap_or_default();
    list.set(name, args);
    el.set_style("transform", list.serialize());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{MemoryDocument, MemoryElement};

    #[test]
    fn test_parse_and_serialize() {
        let list = TransformList::parse("translateX(10px) scale(1.5) rotate(45deg)");
        assert_eq!(list.get("translateX"), Some("10px"));
        assert_eq!(list.get("scale"), Some("1.5"));
        assert_eq!(list.get("rotate"), Some("45deg"));
        assert_eq!(
            list.serialize(),
            "translateX(10px) scale(1.5) rotate(45deg)"
        );
    }

    #[test]
    fn test_update_preserves_sibling_order() {
        let mut list = TransformList::parse("translateX(10px) scale(1.5) rotate(45deg)");
        list.set("scale", "2");
        assert_eq!(list.serialize(), "translateX(10px) scale(2) rotate(45deg)");
    }

    #[test]
    fn test_append_new_function() {
        let mut list = TransformList::parse("rotate(10deg)");
        list.set("translateY", "4px");
        assert_eq!(list.serialize(), "rotate(10deg) translateY(4px)");
    }

    #[test]
    fn test_multi_argument_functions() {
        let list = TransformList::parse("translate(10px, 20px)");
        assert_eq!(list.get("translate"), Some("10px, 20px"));
    }

    #[test]
    fn test_parse_empty_and_garbage() {
        assert!(TransformList::parse("").is_empty());
        assert!(TransformList::parse("none").is_empty());
    }

    #[test]
    fn test_element_roundtrip() {
        let mut doc = MemoryDocument::new();
        let el = doc.add(MemoryElement::div("a").with_style("transform", "scale(1) rotate(5deg)"));

        write_component(&el, "scale", "2");
        assert_eq!(el.style("transform").as_deref(), Some("scale(2) rotate(5deg)"));
        assert_eq!(read_component(&el, "rotate").as_deref(), Some("5deg"));
        assert_eq!(read_component(&el, "translateX"), None);
    }
}
