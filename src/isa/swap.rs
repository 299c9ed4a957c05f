//! Operand-commutativity rules and the modifier rewrites that keep a swap meaning-preserving.

use indexmap::IndexMap;

use super::ast::Element;
use super::condition::{Condition, build_condition};
use super::error::IsaError;

/// Old option → new option for a single modifier.
pub type OptionRewrite = IndexMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Swap {
    /// Operand indices that may be exchanged while `guard` holds.
    pub operands: (usize, usize),
    pub guard: Condition,
    /// Modifier name → option translation applied after the exchange.
    pub rewrites: IndexMap<String, OptionRewrite>,
}

impl Swap {
    /// Translates `option` of `modifier` through the rewrite map, or returns it unchanged.
    pub fn rewrite<'a>(&'a self, modifier: &str, option: &'a str) -> &'a str {
        self.rewrites
            .get(modifier)
            .and_then(|map| map.get(option))
            .map(String::as_str)
            .unwrap_or(option)
    }
}

pub fn parse_swaps(node: &Element) -> Result<Vec<Swap>, IsaError> {
    node.children_by_tag("swap").map(parse_swap).collect()
}

fn parse_swap(swap: &Element) -> Result<Swap, IsaError> {
    let left = operand_index(swap, "left")?;
    let right = operand_index(swap, "right")?;

    let guard_node = swap
        .first_child_except(&["rewrite"])
        .ok_or_else(|| IsaError::schema(swap, "swap declares no guard condition"))?;
    let guard = build_condition(guard_node)?;

    let mut rewrites = IndexMap::new();
    for rewrite in swap.children_by_tag("rewrite") {
        let name = rewrite.require_attr("name")?.to_string();
        let mut map = OptionRewrite::new();
        for entry in rewrite.children_by_tag("map") {
            map.insert(
                entry.require_attr("from")?.to_string(),
                entry.require_attr("to")?.to_string(),
            );
        }
        rewrites.insert(name, map);
    }

    Ok(Swap {
        operands: (left, right),
        guard,
        rewrites,
    })
}

fn operand_index(swap: &Element, name: &str) -> Result<usize, IsaError> {
    let value = swap.require_integer(name)?;
    usize::try_from(value)
        .map_err(|_| IsaError::schema(swap, format!("operand index '{name}' out of range")))
}
