use std::path::PathBuf;

use crate::isa::condition::Condition;
use crate::isa::instruction::{InstructionFlags, StagingCount, StagingMode};
use crate::isa::operands::SourceCount;
use crate::isa::set::LoadOptions;
use crate::isa::states::c_identifier;
use crate::loader::xml::IsaLoader;

fn sample_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("defs/sample/isa.xml")
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn compiles_sample_description() {
    let compiled = IsaLoader::new()
        .load_file(sample_path())
        .expect("load sample description");

    let names: Vec<_> = compiled.instructions.names().collect();
    assert_eq!(
        names,
        vec![
            "*FADD.f32",
            "*FMA.f32",
            "+FADD.f32",
            "+FCMP.f32",
            "+IADD_IMM.i32",
            "+LD_VAR",
            "+ST_CVT",
        ]
    );

    let states: Vec<_> = compiled.states.keys().map(String::as_str).collect();
    assert!(states.contains(&"+LD_VAR.0"));
    assert!(states.contains(&"+LD_VAR.1"));
    assert!(!states.contains(&"+LD_VAR"));
    assert_eq!(compiled.states.len(), 8);

    let keys: Vec<_> = compiled.mnemonics.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec!["FADD.f32", "FCMP.f32", "FMA.f32", "IADD_IMM.i32", "LD_VAR", "ST_CVT"]
    );
}

#[test]
fn multi_encoding_instruction_expands_with_guards() {
    let compiled = IsaLoader::new().load_file(sample_path()).expect("load");

    let first = compiled.state("+LD_VAR.0").expect("first encoding");
    assert_eq!(first.instruction, "+LD_VAR");
    assert_eq!(
        first.guard,
        Some(Condition::Range {
            tag: "lt".into(),
            left: "src0".into(),
            right: "#8".into(),
        })
    );
    let vecsize = first.descriptor.modifier("vecsize").expect("vecsize");
    assert_eq!(vecsize.location.start, Some(8));
    assert_eq!(first.descriptor.derived.len(), 1);
    assert!(first.descriptor.derived[0].options[1]
        .as_ref()
        .is_some_and(Condition::is_reserved));

    let second = compiled.state("+LD_VAR.1").expect("second encoding");
    assert!(second.guard.as_ref().is_some_and(Condition::is_alias));
    assert_eq!(second.descriptor.modifier("vecsize").unwrap().location.start, Some(10));
    assert!(second.descriptor.derived.is_empty());
    assert_eq!(second.descriptor.exact.map(|exact| exact.value), Some(0xe0));

    assert_eq!(second.descriptor.message, "varying");
    assert_eq!(second.descriptor.staging.mode, StagingMode::Write);
    assert_eq!(
        second.descriptor.staging.count,
        StagingCount::Named("vecsize".into())
    );
    assert_eq!(c_identifier(&second.name), "add_ld_var_1");
}

#[test]
fn enumerates_modifier_families_globally() {
    let compiled = IsaLoader::new().load_file(sample_path()).expect("load");
    let table = &compiled.modifiers;

    let families: Vec<_> = table.iter().map(|(family, _)| family).collect();
    assert_eq!(
        families,
        vec!["abs", "round", "cmpf", "neg", "vecsize", "table", "register_format"]
    );

    assert_eq!(table.get("abs"), Some(strings(&["none", "abs"]).as_slice()));
    assert_eq!(table.get("neg"), Some(strings(&["none", "neg"]).as_slice()));
    assert_eq!(
        table.get("table"),
        Some(strings(&["none", "sample", "attribute", "reserved"]).as_slice())
    );
    assert_eq!(
        table.get("cmpf"),
        Some(strings(&["eq", "gt", "ge", "ne", "lt", "le", "reserved"]).as_slice())
    );
    assert_eq!(table.index_of("neg1", "neg"), Some(1));
    assert_eq!(table.index_of("register_format", "u32"), Some(2));
    assert!(table.get("lane").is_none());
}

#[test]
fn partition_merges_unit_variants() {
    let compiled = IsaLoader::new().load_file(sample_path()).expect("load");

    let fadd = compiled.mnemonic("FADD.f32").expect("FADD group");
    assert_eq!(fadd.variants, 2);
    assert_eq!(fadd.sources, 2);
    assert_eq!(fadd.dests, 1);
    assert_eq!(
        fadd.modifiers.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["abs0", "abs1", "round"]
    );

    let imm = compiled.mnemonic("IADD_IMM.i32").expect("IADD_IMM group");
    assert_eq!(imm.immediates, strings(&["index"]));

    let store = compiled.mnemonic("ST_CVT").expect("ST_CVT group");
    assert_eq!(store.source_count(), 2);
    assert_eq!(store.effective_source_count(), 3);

    let load = compiled.mnemonic("LD_VAR").expect("LD_VAR group");
    assert_eq!(load.variants, 2);
    assert_eq!(load.effective_source_count(), 1);
}

#[test]
fn swaps_and_flags_survive_loading() {
    let compiled = IsaLoader::new().load_file(sample_path()).expect("load");

    let cmp = compiled.state("+FCMP.f32").expect("FCMP");
    assert!(cmp.is_unconditional());
    let swap = &cmp.descriptor.swaps[0];
    assert_eq!(swap.operands, (0, 1));
    assert_eq!(swap.rewrite("cmpf", "gt"), "lt");
    assert_eq!(swap.rewrite("cmpf", "eq"), "eq");
    assert_eq!(cmp.descriptor.modifier("cmpf").unwrap().default, None);

    let fma = compiled.state("*FMA.f32").expect("FMA");
    assert_eq!(fma.descriptor.sources[2].mask, 0xf7);
    assert_eq!(fma.descriptor.sources[0].mask, 0xff);
    assert_eq!(
        fma.descriptor.modifier("round").unwrap().default.as_deref(),
        Some("none")
    );
    assert!(fma.descriptor.modifier("lane").is_none());

    let store = compiled.state("+ST_CVT").expect("ST_CVT");
    assert!(store.descriptor.flags.contains(InstructionFlags::LAST));
}

#[test]
fn load_options_admit_unused_and_pseudo_entries() {
    let options = LoadOptions::new().include_unused(true).include_pseudo(true);
    let compiled = IsaLoader::with_options(options)
        .load_file(sample_path())
        .expect("load");

    assert_eq!(compiled.instructions.len(), 9);
    assert!(compiled.mnemonic("JUMP").is_some());
    assert!(compiled.mnemonic("DISCARD.f32").is_some());

    let fma = compiled.state("*FMA.f32").expect("FMA");
    assert!(fma.descriptor.modifier("lane").is_some());
    assert_eq!(
        compiled.modifiers.get("lane"),
        Some(strings(&["none", "upper"]).as_slice())
    );
}

#[test]
fn fingerprint_is_stable_across_loads() {
    let loader = IsaLoader::new();
    let first = loader.load_file(sample_path()).expect("load");
    let second = loader.load_file(sample_path()).expect("reload");
    assert_eq!(first.modifiers.fingerprint(), second.modifiers.fingerprint());

    let wider = IsaLoader::with_options(LoadOptions::new().include_pseudo(true))
        .load_file(sample_path())
        .expect("load with pseudo");
    assert_ne!(first.modifiers.fingerprint(), wider.modifiers.fingerprint());
}
