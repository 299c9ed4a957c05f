//! Instruction-set description compiler.
//!
//! The pipeline runs in stages: a loaded [`Element`](ast::Element) tree becomes an
//! [`InstructionSet`] of per-variant descriptors, which is expanded into states, partitioned
//! into mnemonic groups, and finally enumerated into a global [`ModifierTable`]. Only the
//! last stage looks at every instruction at once.

pub mod ast;
pub mod builder;
pub mod condition;
pub mod diagnostic;
pub mod error;
pub mod fields;
pub mod handle;
pub mod instruction;
pub mod ir;
pub mod modifiers;
pub mod operands;
pub mod set;
pub mod states;
pub mod swap;

#[cfg(test)]
mod tests;

pub use ast::{Element, IsaDocument};
pub use builder::ElementBuilder;
pub use condition::{Condition, build_condition};
pub use error::IsaError;
pub use handle::CompiledIsa;
pub use instruction::{InstructionDescriptor, InstructionFlags, StagingMode, Variant};
pub use ir::{MnemonicGroup, SimplifiedDescriptor, partition_ir, partition_mnemonics};
pub use modifiers::ModifierTable;
pub use operands::SourceCount;
pub use set::{InstructionSet, LoadOptions};
pub use states::{State, c_identifier, expand_states};
