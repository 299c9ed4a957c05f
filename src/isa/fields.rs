//! Flat field extractors run against a single instruction or encoding node.

use log::{debug, warn};

use super::ast::Element;
use super::condition::{Condition, build_condition};
use super::error::IsaError;

/// Option string that pads unused modifier slots.
pub const RESERVED_OPTION: &str = "reserved";
/// Option string for "modifier absent"; doubles as the implicit default.
pub const NONE_OPTION: &str = "none";
/// Register-field mask applied to a source that does not declare one.
pub const DEFAULT_SOURCE_MASK: u64 = 0xFF;
/// Widest field that may be expanded into a `2^size` option table.
pub const MAX_TABLE_BITS: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitLocation {
    /// `None` until a copy override places the field.
    pub start: Option<u32>,
    pub size: u32,
}

impl BitLocation {
    pub fn new(start: Option<u32>, size: u32) -> Self {
        Self { start, size }
    }

    /// Number of values the field can encode.
    pub fn slots(&self) -> usize {
        1usize << self.size
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExactEncoding {
    pub mask: u64,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedField {
    pub location: BitLocation,
    /// One slot per encoded value; `None` where nothing was declared.
    pub options: Vec<Option<Condition>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modifier {
    pub name: String,
    pub location: BitLocation,
    pub default: Option<String>,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Immediate {
    pub name: String,
    pub start: Option<u32>,
    pub size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Source {
    pub start: u32,
    pub mask: u64,
}

pub fn parse_exact(node: &Element) -> Result<ExactEncoding, IsaError> {
    let mask = node.require_integer("mask")?;
    let value = node.require_integer("exact")?;
    if value & !mask != 0 {
        return Err(IsaError::schema(
            node,
            format!("exact value {value:#x} sets bits outside mask {mask:#x}"),
        ));
    }
    Ok(ExactEncoding { mask, value })
}

pub fn parse_derived(node: &Element) -> Result<Vec<DerivedField>, IsaError> {
    let mut out = Vec::new();
    for derived in node.children_by_tag("derived") {
        let start = derived.require_u32("start")?;
        let size = table_size(derived)?;
        let location = BitLocation::new(Some(start), size);

        let mut options = derived
            .children()
            .map(|child| build_condition(child).map(Some))
            .collect::<Result<Vec<_>, _>>()?;
        fit_table(&mut options, location.slots(), None, derived);
        out.push(DerivedField { location, options });
    }
    Ok(out)
}

pub fn parse_modifiers(node: &Element, include_pseudo: bool) -> Result<Vec<Modifier>, IsaError> {
    let mut out = Vec::new();
    for modifier in node.children_by_tag("mod") {
        if modifier.flag("pseudo") && !include_pseudo {
            continue;
        }

        let name = modifier.require_attr("name")?.to_string();
        let start = modifier.u32_attr("start")?;
        let size = table_size(modifier)?;

        let mut options = modifier
            .children()
            .map(option_label)
            .collect::<Result<Vec<_>, _>>()?;

        if options.is_empty() {
            let Some(opt) = modifier.attr("opt") else {
                return Err(IsaError::schema(
                    modifier,
                    format!("modifier '{name}' declares no options and no 'opt' attribute"),
                ));
            };
            options = vec![NONE_OPTION.to_string(), opt.to_string()];
        }

        let default = match modifier.attr("default") {
            Some(default) => Some(default.to_string()),
            None if options.iter().any(|opt| opt == NONE_OPTION) => Some(NONE_OPTION.to_string()),
            None => None,
        };

        let location = BitLocation::new(start, size);
        fit_table(
            &mut options,
            location.slots(),
            RESERVED_OPTION.to_string(),
            modifier,
        );
        out.push(Modifier {
            name,
            location,
            default,
            options,
        });
    }
    Ok(out)
}

pub fn parse_immediates(
    node: &Element,
    include_pseudo: bool,
) -> Result<Vec<Immediate>, IsaError> {
    let mut out = Vec::new();
    for imm in node.children_by_tag("immediate") {
        if imm.flag("pseudo") && !include_pseudo {
            continue;
        }
        let size = imm.require_u32("size")?;
        if size == 0 {
            return Err(IsaError::schema(imm, "immediate size must be positive"));
        }
        out.push(Immediate {
            name: imm.require_attr("name")?.to_string(),
            start: imm.u32_attr("start")?,
            size,
        });
    }
    Ok(out)
}

pub fn parse_sources(node: &Element) -> Result<Vec<Source>, IsaError> {
    node.children_by_tag("src")
        .map(|src| {
            Ok(Source {
                start: src.require_u32("start")?,
                mask: src.integer_attr("mask")?.unwrap_or(DEFAULT_SOURCE_MASK),
            })
        })
        .collect()
}

/// Applies `copy` overrides from an encoding node onto inherited modifiers.
///
/// `instruction` is the node that declares the modifiers; a copy may only target one of its
/// `mod` children. Targets dropped by the pseudo filter are skipped.
pub fn apply_copies(
    instruction: &Element,
    encoding: &Element,
    modifiers: &mut [Modifier],
) -> Result<(), IsaError> {
    for copy in encoding.children_by_tag("copy") {
        let name = copy.require_attr("name")?;
        let start = copy.u32_attr("start")?;
        if let Some(modifier) = modifiers.iter_mut().find(|modifier| modifier.name == name) {
            modifier.location.start = start;
            continue;
        }
        let declared = instruction
            .children_by_tag("mod")
            .any(|modifier| modifier.attr("name") == Some(name));
        if !declared {
            return Err(IsaError::schema(
                copy,
                format!("copy target '{name}' is not a modifier of {}", instruction.label()),
            ));
        }
        debug!("copy target '{name}' was filtered out, ignoring");
    }
    Ok(())
}

fn option_label(child: &Element) -> Result<String, IsaError> {
    if child.tag != "opt" {
        return Ok(child.tag.clone());
    }
    child
        .text
        .clone()
        .ok_or_else(|| IsaError::schema(child, "option has no text"))
}

fn table_size(node: &Element) -> Result<u32, IsaError> {
    let size = node.require_u32("size")?;
    if size == 0 || size > MAX_TABLE_BITS {
        return Err(IsaError::schema(
            node,
            format!("table size must be between 1 and {MAX_TABLE_BITS} bits, found {size}"),
        ));
    }
    Ok(size)
}

fn fit_table<T: Clone>(options: &mut Vec<T>, slots: usize, fill: T, node: &Element) {
    if options.len() > slots {
        warn!(
            "{} declares {} options for {} slots; truncating",
            node.label(),
            options.len(),
            slots
        );
    }
    options.resize(slots, fill);
}
