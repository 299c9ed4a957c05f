//! Name-keyed table of every instruction kept after inclusion filtering.

use std::collections::BTreeMap;
use std::collections::btree_map;

use log::debug;

use super::ast::Element;
use super::error::IsaError;
use super::instruction::{Variant, parse_instruction};

/// Tags that introduce an instruction at the top level of the document.
const INSTRUCTION_TAGS: [&str; 2] = ["ins", "instruction"];

/// Inclusion toggles threaded through every extraction stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadOptions {
    /// Keep instructions only useful for disassembly.
    pub include_unused: bool,
    /// Keep IR-only instructions, modifiers and immediates.
    pub include_pseudo: bool,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include_unused(mut self, include: bool) -> Self {
        self.include_unused = include;
        self
    }

    pub fn include_pseudo(mut self, include: bool) -> Self {
        self.include_pseudo = include;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstructionSet {
    instructions: BTreeMap<String, Vec<Variant>>,
}

impl InstructionSet {
    /// Builds every instruction under `root`, dropping unused/pseudo ones unless requested.
    ///
    /// Only the first variant's flags decide inclusion; variants of one instruction are assumed
    /// to agree.
    pub fn load(root: &Element, options: &LoadOptions) -> Result<Self, IsaError> {
        let mut instructions = BTreeMap::new();
        for node in root
            .children()
            .filter(|child| INSTRUCTION_TAGS.contains(&child.tag.as_str()))
        {
            let name = node.require_attr("name")?;
            if name.is_empty() {
                return Err(IsaError::schema(node, "instruction name is empty"));
            }
            let variants = parse_instruction(node, options.include_pseudo)?;

            let first = &variants[0].descriptor;
            if first.is_unused() && !options.include_unused {
                debug!("skipping unused instruction '{name}'");
                continue;
            }
            if first.is_pseudo() && !options.include_pseudo {
                debug!("skipping pseudo instruction '{name}'");
                continue;
            }

            match instructions.entry(name.to_string()) {
                btree_map::Entry::Vacant(slot) => {
                    slot.insert(variants);
                }
                btree_map::Entry::Occupied(_) => {
                    return Err(IsaError::consistency(format!(
                        "instruction '{name}' defined multiple times"
                    )));
                }
            }
        }
        Ok(Self { instructions })
    }

    pub fn get(&self, name: &str) -> Option<&[Variant]> {
        self.instructions.get(name).map(Vec::as_slice)
    }

    /// Iterates instructions in lexicographic name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Variant])> {
        self.instructions
            .iter()
            .map(|(name, variants)| (name.as_str(), variants.as_slice()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.instructions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl FromIterator<(String, Vec<Variant>)> for InstructionSet {
    fn from_iter<I: IntoIterator<Item = (String, Vec<Variant>)>>(iter: I) -> Self {
        Self {
            instructions: iter.into_iter().collect(),
        }
    }
}
