//! Generic node tree produced by the document parser.
//!
//! The compiler never looks at raw text: it only asks an [`Element`] for an attribute by name,
//! its ordered children, or the children carrying a given tag.

use std::path::PathBuf;

use smallvec::SmallVec;

use super::diagnostic::SourceSpan;
use super::error::IsaError;

/// A fully parsed instruction-set document.
#[derive(Debug, Clone)]
pub struct IsaDocument {
    pub path: PathBuf,
    pub root: Element,
}

impl IsaDocument {
    pub fn new(path: PathBuf, root: Element) -> Self {
        Self { path, root }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// One tagged node with ordered attributes and ordered element children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: SmallVec<[Attribute; 4]>,
    pub children: Vec<Element>,
    /// Trimmed character data, `None` when the element only holds whitespace.
    pub text: Option<String>,
    pub span: Option<SourceSpan>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: SmallVec::new(),
            children: Vec::new(),
            text: None,
            span: None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn require_attr(&self, name: &str) -> Result<&str, IsaError> {
        self.attr(name)
            .ok_or_else(|| IsaError::schema(self, format!("missing required attribute '{name}'")))
    }

    /// Boolean attribute: set when present with any value other than `false` or `0`.
    pub fn flag(&self, name: &str) -> bool {
        match self.attr(name) {
            Some(value) => !matches!(value.trim(), "false" | "0"),
            None => false,
        }
    }

    pub fn integer_attr(&self, name: &str) -> Result<Option<u64>, IsaError> {
        let Some(raw) = self.attr(name) else {
            return Ok(None);
        };
        parse_integer(raw).map(Some).ok_or_else(|| {
            IsaError::schema(
                self,
                format!("attribute '{name}' is not a numeric literal: '{raw}'"),
            )
        })
    }

    pub fn require_integer(&self, name: &str) -> Result<u64, IsaError> {
        self.integer_attr(name)?
            .ok_or_else(|| IsaError::schema(self, format!("missing required attribute '{name}'")))
    }

    /// Like [`Element::require_integer`] but range-checked into a `u32`.
    pub fn require_u32(&self, name: &str) -> Result<u32, IsaError> {
        let value = self.require_integer(name)?;
        self.narrow(name, value)
    }

    pub fn u32_attr(&self, name: &str) -> Result<Option<u32>, IsaError> {
        self.integer_attr(name)?
            .map(|value| self.narrow(name, value))
            .transpose()
    }

    fn narrow(&self, name: &str, value: u64) -> Result<u32, IsaError> {
        u32::try_from(value).map_err(|_| {
            IsaError::schema(self, format!("attribute '{name}' out of range: {value}"))
        })
    }

    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter()
    }

    pub fn children_by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.tag == tag)
    }

    /// First element child whose tag is not one of `skip`.
    pub fn first_child_except(&self, skip: &[&str]) -> Option<&Element> {
        self.children
            .iter()
            .find(|child| !skip.contains(&child.tag.as_str()))
    }

    /// Display name used in error messages: the `name` attribute when present.
    pub fn label(&self) -> String {
        match self.attr("name") {
            Some(name) => format!("<{} name=\"{}\">", self.tag, name),
            None => format!("<{}>", self.tag),
        }
    }
}

/// Parses a numeric literal with optional `0x`/`0o`/`0b` radix prefix and `_` separators.
pub fn parse_integer(text: &str) -> Option<u64> {
    let cleaned: String = text.trim().replace('_', "");
    if cleaned.is_empty() {
        return None;
    }
    if let Some(hex) = cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = cleaned
        .strip_prefix("0b")
        .or_else(|| cleaned.strip_prefix("0B"))
    {
        u64::from_str_radix(bin, 2).ok()
    } else if let Some(oct) = cleaned
        .strip_prefix("0o")
        .or_else(|| cleaned.strip_prefix("0O"))
    {
        u64::from_str_radix(oct, 8).ok()
    } else {
        cleaned.parse::<u64>().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::builder::ElementBuilder;

    #[test]
    fn parses_all_radixes() {
        assert_eq!(parse_integer("0x1F"), Some(0x1f));
        assert_eq!(parse_integer("0b1010"), Some(10));
        assert_eq!(parse_integer("0o17"), Some(15));
        assert_eq!(parse_integer("1_000"), Some(1000));
        assert_eq!(parse_integer(" 42 "), Some(42));
        assert_eq!(parse_integer("0x"), None);
        assert_eq!(parse_integer("ten"), None);
    }

    #[test]
    fn flag_treats_false_and_zero_as_unset() {
        let node = ElementBuilder::new("ins")
            .attr("unused", "true")
            .attr("pseudo", "false")
            .attr("last", "0")
            .build();
        assert!(node.flag("unused"));
        assert!(!node.flag("pseudo"));
        assert!(!node.flag("last"));
        assert!(!node.flag("table"));
    }

    #[test]
    fn require_attr_reports_tag() {
        let node = ElementBuilder::new("mod").build();
        let err = node.require_attr("name").unwrap_err();
        assert!(matches!(
            err,
            IsaError::Schema { ref tag, ref message, .. }
                if tag == "mod" && message.contains("'name'")
        ));
    }

    #[test]
    fn integer_attr_rejects_garbage() {
        let node = ElementBuilder::new("src").attr("start", "r0").build();
        assert!(node.integer_attr("start").is_err());
        assert_eq!(node.integer_attr("mask").unwrap(), None);
    }

    #[test]
    fn filters_children_by_tag() {
        let node = ElementBuilder::new("ins")
            .child(ElementBuilder::new("src").attr("start", "0"))
            .child(ElementBuilder::new("mod").attr("name", "neg"))
            .child(ElementBuilder::new("src").attr("start", "3"))
            .build();
        let starts: Vec<_> = node
            .children_by_tag("src")
            .filter_map(|src| src.attr("start"))
            .collect();
        assert_eq!(starts, vec!["0", "3"]);
        assert_eq!(
            node.first_child_except(&["src"]).map(|child| child.tag.as_str()),
            Some("mod")
        );
    }
}
