//! Global, deterministic enumeration of modifier options.
//!
//! Every modifier family gets one canonical option ordering shared by all instructions, so the
//! generated enumerations stay identical between builds of the same description. Accumulation
//! walks mnemonic groups in key order and preserves first occurrences, which keeps the original
//! declaration orderings wherever possible.

use std::collections::BTreeMap;

use ahash::AHashSet;
use indexmap::IndexMap;
use sha2::{Digest, Sha256};

use super::error::IsaError;
use super::fields::NONE_OPTION;
use super::ir::{MnemonicGroup, partition_mnemonics};
use super::set::InstructionSet;

/// Family whose enumeration needs a zero sentinel.
pub const TABLE_FAMILY: &str = "table";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifierTable {
    families: IndexMap<String, Vec<String>>,
}

impl ModifierTable {
    pub fn from_instruction_set(set: &InstructionSet) -> Result<Self, IsaError> {
        Self::from_groups(&partition_mnemonics(set)?)
    }

    pub fn from_groups(groups: &BTreeMap<String, MnemonicGroup>) -> Result<Self, IsaError> {
        let mut accumulated: IndexMap<String, Vec<String>> = IndexMap::new();
        for group in groups.values() {
            for (name, options) in &group.modifiers {
                let family = family_name(name);
                match accumulated.get_mut(family) {
                    Some(list) => list.extend(options.iter().cloned()),
                    None => {
                        accumulated.insert(family.to_string(), options.clone());
                    }
                }
            }
        }

        let mut families = IndexMap::with_capacity(accumulated.len());
        for (family, options) in accumulated {
            let canonical = canonicalize(&family, dedup(options))?;
            families.insert(family, canonical);
        }
        Ok(Self { families })
    }

    pub fn get(&self, family: &str) -> Option<&[String]> {
        self.families.get(family).map(Vec::as_slice)
    }

    /// Encoded value of `option` within the family that `modifier` belongs to.
    pub fn index_of(&self, modifier: &str, option: &str) -> Option<usize> {
        self.get(family_name(modifier))?
            .iter()
            .position(|candidate| candidate == option)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.families
            .iter()
            .map(|(family, options)| (family.as_str(), options.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// SHA-256 over the canonical table, stable for identical enumerations.
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for (family, options) in &self.families {
            hasher.update(family.as_bytes());
            hasher.update([0u8]);
            for option in options {
                hasher.update(option.as_bytes());
                hasher.update([0u8]);
            }
            hasher.update([0xffu8]);
        }
        hasher.finalize().into()
    }
}

/// Strips one trailing repetition digit (`0`-`3`), e.g. `neg1` → `neg`.
pub fn family_name(name: &str) -> &str {
    match name.strip_suffix(['0', '1', '2', '3']) {
        Some(stem) if !stem.is_empty() => stem,
        _ => name,
    }
}

fn dedup(options: Vec<String>) -> Vec<String> {
    let mut seen = AHashSet::with_capacity(options.len());
    let mut out = Vec::with_capacity(options.len());
    for option in options {
        if seen.insert(option.clone()) {
            out.push(option);
        }
    }
    out
}

fn canonicalize(family: &str, mut options: Vec<String>) -> Result<Vec<String>, IsaError> {
    // Booleans keep the off state at index 0.
    if options.len() == 2 && options[1] == NONE_OPTION {
        options.reverse();
    } else if family == TABLE_FAMILY {
        if options.get(2).map(String::as_str) != Some(NONE_OPTION) {
            return Err(IsaError::consistency(format!(
                "modifier '{TABLE_FAMILY}' must list '{NONE_OPTION}' as its third option, found {options:?}"
            )));
        }
        options.swap(0, 2);
    }
    Ok(options)
}
