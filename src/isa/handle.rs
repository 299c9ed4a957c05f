//! Public entry point: the three structures a downstream emitter consumes.

use std::collections::BTreeMap;

use log::info;

use super::ast::IsaDocument;
use super::error::IsaError;
use super::ir::{MnemonicGroup, partition_mnemonics};
use super::modifiers::ModifierTable;
use super::set::{InstructionSet, LoadOptions};
use super::states::{State, expand_states};

#[derive(Debug, Clone)]
pub struct CompiledIsa {
    pub instructions: InstructionSet,
    pub states: BTreeMap<String, State>,
    pub mnemonics: BTreeMap<String, MnemonicGroup>,
    pub modifiers: ModifierTable,
}

impl CompiledIsa {
    /// Loads, expands and partitions every instruction, then enumerates modifiers globally.
    /// The enumeration only starts once every instruction has been loaded.
    pub fn compile(document: &IsaDocument, options: &LoadOptions) -> Result<Self, IsaError> {
        let instructions = InstructionSet::load(&document.root, options)?;
        let states = expand_states(&instructions)?;
        let mnemonics = partition_mnemonics(&instructions)?;

        let modifiers = ModifierTable::from_groups(&mnemonics)?;

        info!(
            "compiled {}: {} instructions, {} states, {} mnemonics, {} modifier families",
            document.path.display(),
            instructions.len(),
            states.len(),
            mnemonics.len(),
            modifiers.len()
        );
        Ok(Self {
            instructions,
            states,
            mnemonics,
            modifiers,
        })
    }

    pub fn state(&self, name: &str) -> Option<&State> {
        self.states.get(name)
    }

    pub fn mnemonic(&self, key: &str) -> Option<&MnemonicGroup> {
        self.mnemonics.get(key)
    }
}
