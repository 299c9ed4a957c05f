//! Shape-only view of instructions and the mnemonic partitioning built on top of it.
//!
//! Bit placement is discarded here: two descriptors are equivalent when they agree on operand
//! counts, staging, immediate names and modifier names. Instructions whose names differ only in
//! their first character (the execution-unit prefix) are grouped under one mnemonic and must
//! agree on that shape.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use super::diagnostic::{DiagnosticPhase, IsaDiagnostic};
use super::error::IsaError;
use super::instruction::{InstructionDescriptor, StagingMode};
use super::set::InstructionSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimplifiedDescriptor {
    pub staging: StagingMode,
    pub sources: usize,
    pub dests: u32,
    /// Modifier name and its padded option list, in declaration order.
    pub modifiers: Vec<(String, Vec<String>)>,
    pub immediates: Vec<String>,
}

pub fn simplify(descriptor: &InstructionDescriptor) -> SimplifiedDescriptor {
    SimplifiedDescriptor {
        staging: descriptor.staging.mode,
        sources: descriptor.sources.len(),
        dests: descriptor.dests,
        modifiers: descriptor
            .modifiers
            .iter()
            .map(|modifier| (modifier.name.clone(), modifier.options.clone()))
            .collect(),
        immediates: descriptor
            .immediates
            .iter()
            .map(|imm| imm.name.clone())
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MnemonicGroup {
    pub sources: usize,
    pub dests: u32,
    pub staging: StagingMode,
    /// Sorted immediate names.
    pub immediates: Vec<String>,
    /// Option lists concatenated across members; deduplication happens during enumeration.
    pub modifiers: IndexMap<String, Vec<String>>,
    /// Number of member descriptors.
    pub variants: usize,
    pub ir: Vec<SimplifiedDescriptor>,
}

impl MnemonicGroup {
    /// Collapses the group back into one descriptor so it can be partitioned again.
    pub fn as_ir(&self) -> SimplifiedDescriptor {
        SimplifiedDescriptor {
            staging: self.staging,
            sources: self.sources,
            dests: self.dests,
            modifiers: self
                .modifiers
                .iter()
                .map(|(name, options)| (name.clone(), options.clone()))
                .collect(),
            immediates: self.immediates.clone(),
        }
    }
}

/// Group key: the name without its execution-unit prefix character.
pub fn mnemonic_key(name: &str) -> &str {
    let mut chars = name.chars();
    chars.next();
    chars.as_str()
}

/// Partitions every loaded instruction, all variants included.
pub fn partition_mnemonics(set: &InstructionSet) -> Result<BTreeMap<String, MnemonicGroup>, IsaError> {
    let entries = set.iter().map(|(name, variants)| {
        let ir = variants
            .iter()
            .map(|variant| simplify(&variant.descriptor))
            .collect();
        (name.to_string(), ir)
    });
    partition_ir(entries)
}

/// Partitions arbitrary name → IR-list entries. Every shape mismatch in every group is
/// reported before failing.
pub fn partition_ir<I>(entries: I) -> Result<BTreeMap<String, MnemonicGroup>, IsaError>
where
    I: IntoIterator<Item = (String, Vec<SimplifiedDescriptor>)>,
{
    let sorted: BTreeMap<String, Vec<SimplifiedDescriptor>> = entries.into_iter().collect();

    let mut members: BTreeMap<String, Vec<(String, SimplifiedDescriptor)>> = BTreeMap::new();
    for (name, ir) in sorted {
        let slot = members.entry(mnemonic_key(&name).to_string()).or_default();
        slot.extend(ir.into_iter().map(|desc| (name.clone(), desc)));
    }

    let mut diagnostics = Vec::new();
    let mut groups = BTreeMap::new();
    for (key, members) in members {
        if let Some(group) = combine(&key, members, &mut diagnostics) {
            groups.insert(key, group);
        }
    }

    if diagnostics.is_empty() {
        Ok(groups)
    } else {
        Err(IsaError::Diagnostics {
            phase: DiagnosticPhase::Consistency,
            diagnostics,
        })
    }
}

fn combine(
    key: &str,
    members: Vec<(String, SimplifiedDescriptor)>,
    diagnostics: &mut Vec<IsaDiagnostic>,
) -> Option<MnemonicGroup> {
    let (first_name, first) = members.first()?;
    let before = diagnostics.len();

    let mut modifiers: IndexMap<String, Vec<String>> = IndexMap::new();
    for (name, member) in &members {
        check_shape(key, first_name, first, name, member, diagnostics);
        for (modifier, options) in &member.modifiers {
            modifiers
                .entry(modifier.clone())
                .or_default()
                .extend(options.iter().cloned());
        }
    }

    if diagnostics.len() != before {
        return None;
    }

    let mut immediates = first.immediates.clone();
    immediates.sort();
    Some(MnemonicGroup {
        sources: first.sources,
        dests: first.dests,
        staging: first.staging,
        immediates,
        modifiers,
        variants: members.len(),
        ir: members.into_iter().map(|(_, desc)| desc).collect(),
    })
}

fn check_shape(
    key: &str,
    first_name: &str,
    first: &SimplifiedDescriptor,
    name: &str,
    member: &SimplifiedDescriptor,
    diagnostics: &mut Vec<IsaDiagnostic>,
) {
    let mut mismatch = |code: &'static str, what: &str, ours: String, theirs: String| {
        diagnostics.push(IsaDiagnostic::error(
            DiagnosticPhase::Consistency,
            code,
            format!(
                "mnemonic '{key}': '{name}' has {what} {ours} but '{first_name}' has {theirs}"
            ),
            None,
        ));
    };

    if member.sources != first.sources {
        mismatch(
            "consistency.mnemonic.sources",
            "source count",
            member.sources.to_string(),
            first.sources.to_string(),
        );
    }
    if member.dests != first.dests {
        mismatch(
            "consistency.mnemonic.dests",
            "destination count",
            member.dests.to_string(),
            first.dests.to_string(),
        );
    }
    if member.immediates != first.immediates {
        mismatch(
            "consistency.mnemonic.immediates",
            "immediates",
            format!("{:?}", member.immediates),
            format!("{:?}", first.immediates),
        );
    }
    if member.staging != first.staging {
        mismatch(
            "consistency.mnemonic.staging",
            "staging mode",
            format!("'{}'", member.staging),
            format!("'{}'", first.staging),
        );
    }
}
