//! Helpers for constructing element trees programmatically without routing through the parser.

use std::path::PathBuf;

use crate::isa::ast::{Attribute, Element};
use crate::isa::diagnostic::{SourcePosition, SourceSpan};

/// Fluent builder for a single [`Element`] and its subtree.
#[derive(Debug, Clone)]
pub struct ElementBuilder {
    element: Element,
}

impl ElementBuilder {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            element: Element::new(tag),
        }
    }

    /// Appends an attribute, replacing an earlier one with the same name.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self
            .element
            .attributes
            .iter_mut()
            .find(|attr| attr.name == name)
        {
            Some(existing) => existing.value = value,
            None => self.element.attributes.push(Attribute { name, value }),
        }
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.element.text = Some(text.into());
        self
    }

    pub fn child(mut self, child: impl Into<Element>) -> Self {
        self.element.children.push(child.into());
        self
    }

    pub fn children<I, E>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Element>,
    {
        self.element
            .children
            .extend(children.into_iter().map(Into::into));
        self
    }

    /// Pretends the element originated from `path`, so diagnostics still carry a location.
    pub fn located(mut self, path: impl Into<PathBuf>, line: usize, column: usize) -> Self {
        self.element.span = Some(SourceSpan::point(
            path.into(),
            SourcePosition::new(line, column),
        ));
        self
    }

    pub fn build(self) -> Element {
        self.element
    }
}

impl From<ElementBuilder> for Element {
    fn from(builder: ElementBuilder) -> Self {
        builder.build()
    }
}

/// Comparison leaf such as `<eq left="lane" right="#0"/>`.
pub fn range(tag: impl Into<String>, left: impl Into<String>, right: impl Into<String>) -> ElementBuilder {
    ElementBuilder::new(tag).attr("left", left).attr("right", right)
}

/// Literal modifier option `<opt>text</opt>`.
pub fn opt(text: impl Into<String>) -> ElementBuilder {
    ElementBuilder::new("opt").text(text)
}
