//! Property-based tests using proptest.
//!
//! These check the enumeration invariants over randomly generated descriptions, complementing
//! the targeted unit tests next to each module.

use std::fmt::Write as _;

use isagen::isa::builder::{ElementBuilder, opt};
use isagen::isa::fields::{RESERVED_OPTION, parse_modifiers};
use isagen::{CompiledIsa, IsaLoader};
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────

const MODIFIER_NAMES: &[&str] = &["neg0", "neg1", "abs1", "round", "cmpf", "lane"];
const OPTION_WORDS: &[&str] = &["none", "rtz", "rtp", "lt", "gt", "abs", "sat"];

type Declaration = (String, Vec<(&'static str, Vec<&'static str>)>);

fn arb_modifiers() -> impl Strategy<Value = Vec<(&'static str, Vec<&'static str>)>> {
    prop::sample::subsequence(MODIFIER_NAMES.to_vec(), 0..=3).prop_flat_map(|names| {
        names
            .into_iter()
            .map(|name| {
                (
                    Just(name),
                    prop::sample::subsequence(OPTION_WORDS.to_vec(), 1..=4),
                )
            })
            .collect::<Vec<_>>()
    })
}

/// A declaration list together with a shuffled copy of itself.
fn arb_declarations() -> impl Strategy<Value = (Vec<Declaration>, Vec<Declaration>)> {
    prop::collection::vec(arb_modifiers(), 1..6).prop_flat_map(|modifiers| {
        let declarations: Vec<Declaration> = modifiers
            .into_iter()
            .enumerate()
            .map(|(index, modifiers)| (format!("+OP{index}"), modifiers))
            .collect();
        (Just(declarations.clone()), Just(declarations).prop_shuffle())
    })
}

fn table_bits(options: usize) -> u32 {
    usize::BITS - (options.max(2) - 1).leading_zeros()
}

fn render(declarations: &[Declaration]) -> String {
    let mut xml = String::from("<bifrost>\n");
    for (name, modifiers) in declarations {
        writeln!(xml, "  <ins name=\"{name}\">").unwrap();
        for (modifier, options) in modifiers {
            writeln!(
                xml,
                "    <mod name=\"{modifier}\" size=\"{}\">",
                table_bits(options.len())
            )
            .unwrap();
            for option in options {
                writeln!(xml, "      <opt>{option}</opt>").unwrap();
            }
            xml.push_str("    </mod>\n");
        }
        xml.push_str("  </ins>\n");
    }
    xml.push_str("</bifrost>\n");
    xml
}

fn compile(xml: &str) -> CompiledIsa {
    IsaLoader::new()
        .load_str("generated.xml", xml)
        .expect("generated description compiles")
}

// ── Properties ──────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Every modifier table holds exactly one entry per encodable value.
    #[test]
    fn modifier_tables_fill_every_slot(size in 1u32..=4, count in 1usize..=20) {
        let node = ElementBuilder::new("ins")
            .child(
                ElementBuilder::new("mod")
                    .attr("name", "m")
                    .attr("size", size.to_string())
                    .children((0..count).map(|index| opt(format!("o{index}")))),
            )
            .build();
        let modifiers = parse_modifiers(&node, false).unwrap();
        let options = &modifiers[0].options;
        prop_assert_eq!(options.len(), 1usize << size);

        let kept = count.min(1usize << size);
        for (index, option) in options.iter().enumerate() {
            if index < kept {
                prop_assert_eq!(option, &format!("o{index}"));
            } else {
                prop_assert_eq!(option, RESERVED_OPTION);
            }
        }
    }

    /// Shuffling the declaration order never changes the global enumeration.
    #[test]
    fn enumeration_ignores_declaration_order((ordered, shuffled) in arb_declarations()) {
        let first = compile(&render(&ordered));
        let second = compile(&render(&shuffled));

        let first_families: Vec<_> = first.modifiers.iter().collect();
        let second_families: Vec<_> = second.modifiers.iter().collect();
        prop_assert_eq!(first_families, second_families);
        prop_assert_eq!(first.modifiers.fingerprint(), second.modifiers.fingerprint());
    }

    /// Two-option families keep "none" at index 0 whichever way they were declared.
    #[test]
    fn boolean_families_start_with_none(
        word in "[a-z]{1,8}",
        none_first in any::<bool>(),
        digit in 0u8..4,
    ) {
        prop_assume!(word != "none" && word != RESERVED_OPTION);
        let (a, b) = if none_first { ("none", word.as_str()) } else { (word.as_str(), "none") };
        let xml = format!(
            "<bifrost><ins name=\"+FLAG\"><mod name=\"flag{digit}\" size=\"1\">\
             <opt>{a}</opt><opt>{b}</opt></mod></ins></bifrost>"
        );
        let compiled = compile(&xml);
        let family = compiled.modifiers.get("flag").unwrap();
        prop_assert_eq!(family[0].as_str(), "none");
        prop_assert_eq!(family[1].as_str(), word.as_str());
        prop_assert_eq!(compiled.modifiers.index_of(&format!("flag{digit}"), "none"), Some(0));
    }
}
