//! Per-instruction descriptors and their per-encoding variants.

use std::fmt;

use bitflags::bitflags;

use super::ast::Element;
use super::condition::{Condition, build_condition};
use super::error::IsaError;
use super::fields::{
    DerivedField, ExactEncoding, Immediate, Modifier, Source, apply_copies, parse_derived,
    parse_exact, parse_immediates, parse_modifiers, parse_sources,
};
use super::swap::{Swap, parse_swaps};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InstructionFlags: u8 {
        /// Disassembly-only; stripped from the compiler unless requested.
        const UNUSED = 1 << 0;
        /// IR-only; never encoded.
        const PSEUDO = 1 << 1;
        const LAST = 1 << 2;
        const TABLE = 1 << 3;
    }
}

/// How the implicit staging register participates in the instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StagingMode {
    #[default]
    None,
    Read,
    Write,
    ReadWrite,
}

impl StagingMode {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "" => Some(StagingMode::None),
            "r" | "read" => Some(StagingMode::Read),
            "w" | "write" => Some(StagingMode::Write),
            "rw" | "read-write" => Some(StagingMode::ReadWrite),
            _ => None,
        }
    }

    /// True when the staging register is consumed as a source.
    pub fn reads(self) -> bool {
        matches!(self, StagingMode::Read | StagingMode::ReadWrite)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StagingMode::None => "",
            StagingMode::Read => "r",
            StagingMode::Write => "w",
            StagingMode::ReadWrite => "rw",
        }
    }
}

impl fmt::Display for StagingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Register count of the staging operand: a literal or the name of the field that sizes it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StagingCount {
    Fixed(u32),
    Named(String),
}

impl Default for StagingCount {
    fn default() -> Self {
        StagingCount::Fixed(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Staging {
    pub mode: StagingMode,
    pub count: StagingCount,
}

impl Staging {
    /// Parses the `mode=count` form, e.g. `r=4` or `w=vecsize`.
    pub fn parse(node: &Element) -> Result<Self, IsaError> {
        let Some(raw) = node.attr("staging") else {
            return Ok(Self::default());
        };
        let Some((mode, count)) = raw.split_once('=') else {
            return Err(IsaError::schema(
                node,
                format!("staging '{raw}' must have the form mode=count"),
            ));
        };
        let mode = StagingMode::parse(mode.trim()).ok_or_else(|| {
            IsaError::schema(node, format!("unknown staging mode '{mode}'"))
        })?;
        let count = count.trim();
        let count = match count.parse::<u32>() {
            Ok(value) => StagingCount::Fixed(value),
            Err(_) if !count.is_empty() => StagingCount::Named(count.to_string()),
            Err(_) => {
                return Err(IsaError::schema(node, "staging count is empty"));
            }
        };
        Ok(Self { mode, count })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionDescriptor {
    pub staging: Staging,
    pub dests: u32,
    pub sources: Vec<Source>,
    pub modifiers: Vec<Modifier>,
    pub immediates: Vec<Immediate>,
    pub derived: Vec<DerivedField>,
    pub swaps: Vec<Swap>,
    /// Present once a concrete encoding has been chosen.
    pub exact: Option<ExactEncoding>,
    pub flags: InstructionFlags,
    pub message: String,
}

impl InstructionDescriptor {
    pub fn is_unused(&self) -> bool {
        self.flags.contains(InstructionFlags::UNUSED)
    }

    pub fn is_pseudo(&self) -> bool {
        self.flags.contains(InstructionFlags::PSEUDO)
    }

    pub fn modifier(&self, name: &str) -> Option<&Modifier> {
        self.modifiers.iter().find(|modifier| modifier.name == name)
    }
}

/// One concrete encoding of an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    /// `None` when the instruction has a single, unconditional encoding.
    pub guard: Option<Condition>,
    pub descriptor: InstructionDescriptor,
}

/// Builds every variant declared by an instruction node.
pub fn parse_instruction(node: &Element, include_pseudo: bool) -> Result<Vec<Variant>, IsaError> {
    let shared = parse_shared(node, include_pseudo)?;

    let encodings: Vec<&Element> = node.children_by_tag("encoding").collect();
    if encodings.is_empty() {
        return Ok(vec![Variant {
            guard: None,
            descriptor: shared,
        }]);
    }

    if !shared.derived.is_empty() {
        return Err(IsaError::consistency(format!(
            "{} declares derived fields outside its encodings",
            node.label()
        )));
    }

    encodings
        .into_iter()
        .map(|encoding| {
            let mut descriptor = shared.clone();
            descriptor.exact = Some(parse_exact(encoding)?);
            descriptor.derived = parse_derived(encoding)?;
            apply_copies(node, encoding, &mut descriptor.modifiers)?;

            let guard_node = encoding
                .first_child_except(&["derived", "copy"])
                .ok_or_else(|| IsaError::schema(encoding, "encoding declares no guard condition"))?;
            Ok(Variant {
                guard: Some(build_condition(guard_node)?),
                descriptor,
            })
        })
        .collect()
}

fn parse_shared(node: &Element, include_pseudo: bool) -> Result<InstructionDescriptor, IsaError> {
    let dests = node.u32_attr("dests")?.unwrap_or(1);

    let mut flags = InstructionFlags::empty();
    flags.set(InstructionFlags::UNUSED, node.flag("unused"));
    flags.set(InstructionFlags::PSEUDO, node.flag("pseudo"));
    flags.set(InstructionFlags::LAST, node.flag("last"));
    flags.set(InstructionFlags::TABLE, node.flag("table"));

    let exact = if node.has_attr("exact") {
        Some(parse_exact(node)?)
    } else {
        None
    };

    Ok(InstructionDescriptor {
        staging: Staging::parse(node)?,
        dests,
        sources: parse_sources(node)?,
        modifiers: parse_modifiers(node, include_pseudo)?,
        immediates: parse_immediates(node, include_pseudo)?,
        derived: parse_derived(node)?,
        swaps: parse_swaps(node)?,
        exact,
        flags,
        message: node.attr("message").unwrap_or("none").to_string(),
    })
}
