//! Flattens multi-encoding instructions into uniquely named, guarded states.

use std::collections::BTreeMap;
use std::collections::btree_map;

use super::condition::Condition;
use super::error::IsaError;
use super::instruction::InstructionDescriptor;
use super::set::InstructionSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    /// Instruction name, suffixed with `.<index>` when the instruction has several variants.
    pub name: String,
    pub instruction: String,
    /// `None` for the single unconditional state of an instruction.
    pub guard: Option<Condition>,
    pub descriptor: InstructionDescriptor,
}

impl State {
    pub fn is_unconditional(&self) -> bool {
        self.guard.is_none()
    }
}

/// A suffixed state name may not shadow another instruction's own name (`+A` with two
/// encodings next to a declared `+A.0`).
pub fn expand_states(set: &InstructionSet) -> Result<BTreeMap<String, State>, IsaError> {
    let mut out = BTreeMap::new();
    for (instruction, variants) in set.iter() {
        let suffixed = variants.len() > 1;
        for (index, variant) in variants.iter().enumerate() {
            let name = if suffixed {
                format!("{instruction}.{index}")
            } else {
                instruction.to_string()
            };
            match out.entry(name.clone()) {
                btree_map::Entry::Vacant(slot) => {
                    slot.insert(State {
                        name,
                        instruction: instruction.to_string(),
                        guard: variant.guard.clone(),
                        descriptor: variant.descriptor.clone(),
                    });
                }
                btree_map::Entry::Occupied(existing) => {
                    return Err(IsaError::consistency(format!(
                        "state '{name}' produced by both '{}' and '{instruction}'",
                        existing.get().instruction
                    )));
                }
            }
        }
    }
    Ok(out)
}

/// Escapes an instruction or state name into a C identifier (`*FMA.f32` → `fma_fma_f32`).
pub fn c_identifier(name: &str) -> String {
    name.to_lowercase()
        .replace('*', "fma_")
        .replace('+', "add_")
        .replace('.', "_")
}
