//! Selector expressions that guard encodings, derived-field slots and operand swaps.

use std::fmt;

use super::ast::Element;
use super::error::IsaError;

/// Tag that marks an encoding slot as unused/illegal.
pub const RESERVED_TAG: &str = "reserved";

/// Finite expression tree built from a selector subtree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Condition {
    /// Slot is unused or illegal.
    Reserved,
    /// Compares a field against bounds; both bounds are kept verbatim for the emitter.
    Range {
        tag: String,
        left: String,
        right: String,
    },
    /// The wrapped condition also matches a differently named canonical encoding.
    Alias(Box<Condition>),
    /// Boolean composition (`and`, `or`, `not`, ...) over ordered children.
    Tag {
        tag: String,
        children: Vec<Condition>,
    },
}

impl Condition {
    pub fn is_reserved(&self) -> bool {
        matches!(self, Condition::Reserved)
    }

    pub fn is_alias(&self) -> bool {
        matches!(self, Condition::Alias(_))
    }

    /// Strips the alias annotation, if any.
    pub fn unaliased(&self) -> &Condition {
        match self {
            Condition::Alias(inner) => inner,
            other => other,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self.unaliased() {
            Condition::Range { tag, .. } | Condition::Tag { tag, .. } => Some(tag),
            Condition::Reserved => Some(RESERVED_TAG),
            Condition::Alias(_) => None,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Reserved => write!(f, "reserved"),
            Condition::Range { tag, left, right } => write!(f, "({tag} {left} {right})"),
            Condition::Alias(inner) => write!(f, "(alias {inner})"),
            Condition::Tag { tag, children } => {
                write!(f, "({tag}")?;
                for child in children {
                    write!(f, " {child}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Builds a condition from a selector node.
pub fn build_condition(node: &Element) -> Result<Condition, IsaError> {
    build(node, false)
}

// `resolved` is set once the alias marker on `node` has been consumed, so the recursive call
// on the same node builds the plain shape instead of wrapping it again.
fn build(node: &Element, resolved: bool) -> Result<Condition, IsaError> {
    if node.tag == RESERVED_TAG {
        if !node.children.is_empty() {
            return Err(IsaError::schema(node, "reserved condition cannot have children"));
        }
        return Ok(Condition::Reserved);
    }

    if !resolved && node.flag("alias") {
        return Ok(Condition::Alias(Box::new(build(node, true)?)));
    }

    match (node.attr("left"), node.attr("right")) {
        (Some(_), Some(_)) if !node.children.is_empty() => {
            return Err(IsaError::schema(
                node,
                "condition with 'left'/'right' bounds cannot also have children",
            ));
        }
        (Some(left), Some(right)) => {
            return Ok(Condition::Range {
                tag: node.tag.clone(),
                left: left.to_string(),
                right: right.to_string(),
            });
        }
        (Some(_), None) => {
            return Err(IsaError::schema(node, "condition has 'left' but no 'right' bound"));
        }
        (None, Some(_)) => {
            return Err(IsaError::schema(node, "condition has 'right' but no 'left' bound"));
        }
        (None, None) => {}
    }

    if node.children.is_empty() {
        return Err(IsaError::schema(
            node,
            format!("unrecognized condition shape <{}>", node.tag),
        ));
    }

    let children = node
        .children()
        .map(build_condition)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Condition::Tag {
        tag: node.tag.clone(),
        children,
    })
}
