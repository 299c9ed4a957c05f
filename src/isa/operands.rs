//! Source-operand counting that accounts for the implicit staging register.

use super::instruction::{InstructionDescriptor, StagingMode};
use super::ir::{MnemonicGroup, SimplifiedDescriptor};

pub trait SourceCount {
    /// Explicit `src` operands.
    fn source_count(&self) -> usize;

    fn staging_mode(&self) -> StagingMode;

    /// Explicit sources plus one when the staging register is read.
    fn effective_source_count(&self) -> usize {
        self.source_count() + usize::from(self.staging_mode().reads())
    }
}

impl SourceCount for InstructionDescriptor {
    fn source_count(&self) -> usize {
        self.sources.len()
    }

    fn staging_mode(&self) -> StagingMode {
        self.staging.mode
    }
}

impl SourceCount for SimplifiedDescriptor {
    fn source_count(&self) -> usize {
        self.sources
    }

    fn staging_mode(&self) -> StagingMode {
        self.staging
    }
}

impl SourceCount for MnemonicGroup {
    fn source_count(&self) -> usize {
        self.sources
    }

    fn staging_mode(&self) -> StagingMode {
        self.staging
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::builder::ElementBuilder;
    use crate::isa::instruction::parse_instruction;
    use crate::isa::ir::simplify;

    fn ir(staging: StagingMode, sources: usize) -> SimplifiedDescriptor {
        SimplifiedDescriptor {
            staging,
            sources,
            dests: 1,
            modifiers: Vec::new(),
            immediates: Vec::new(),
        }
    }

    #[test]
    fn staging_reads_add_a_source() {
        assert_eq!(ir(StagingMode::None, 2).effective_source_count(), 2);
        assert_eq!(ir(StagingMode::Write, 2).effective_source_count(), 2);
        assert_eq!(ir(StagingMode::Read, 2).effective_source_count(), 3);
        assert_eq!(ir(StagingMode::ReadWrite, 2).effective_source_count(), 3);
    }

    #[test]
    fn raw_and_simplified_agree() {
        let node = ElementBuilder::new("ins")
            .attr("name", "+ST_CVT")
            .attr("staging", "r=4")
            .child(ElementBuilder::new("src").attr("start", "0"))
            .child(ElementBuilder::new("src").attr("start", "3"))
            .build();
        let variants = parse_instruction(&node, false).unwrap();
        let raw = &variants[0].descriptor;
        assert_eq!(raw.effective_source_count(), 3);
        assert_eq!(simplify(raw).effective_source_count(), 3);
    }
}
