//! Bundled grammars, case by case

use glint_engine::glint::bundled::bundled_registry;
use glint_engine::glint::testing::{assert_text_conserved, scoped_texts};
use rstest::rstest;

#[rstest]
#[case("rgbasm", "rgbasm")]
#[case("RGBDS", "rgbasm")]
#[case("gbasm", "rgbasm")]
#[case("gbz80", "rgbasm")]
#[case("evs", "evscript")]
#[case("EvScript", "evscript")]
fn aliases_resolve(#[case] alias: &str, #[case] name: &str) {
    let registry = bundled_registry().unwrap();
    assert_eq!(registry.get_language(alias).unwrap().name(), name);
}

#[rstest]
#[case::hex("ld a, $1F", "number", &["$1F"])]
#[case::binary("ld a, %1010", "number", &["%1010"])]
#[case::octal("ld a, &17", "number", &["&17"])]
#[case::gfx("dw `0123", "number", &["`0123"])]
#[case::section_type("SECTION \"x\", WRAM0", "type", &["WRAM0"])]
#[case::string("db \"hi\"", "string", &["\"hi\""])]
#[case::literal("ld a, _NARG", "literal", &["_NARG"])]
#[case::block_comment("nop /* x */", "comment", &["/* x */"])]
#[case::local_label(".done:", "symbol", &[".done"])]
fn rgbasm_snippets(#[case] code: &str, #[case] scope: &str, #[case] expected: &[&str]) {
    let registry = bundled_registry().unwrap();
    let result = registry.scan(code, "rgbasm", false).unwrap();
    assert_eq!(scoped_texts(&result.tree, scope), expected);
    assert_text_conserved(&result.tree, code);
}

#[rstest]
#[case::include("include \"a.evs\";", "string", &["\"a.evs\""])]
#[case::typedef("typedef id = u8;", "title.class", &["id"])]
#[case::struct_field("struct pos { x: u8, }", "property", &["x"])]
#[case::env_use("env script { use std; }", "title.class.inherited", &["std"])]
#[case::env_def("env script { def wait(u8); }", "title.function", &["wait"])]
#[case::env_yield("env script { def yld(u8); }", "built_in", &["yld"])]
#[case::declaration("script main { u8 count = 3; }", "variable", &["count"])]
#[case::assignment("script main { x += 2; }", "operator", &["+="])]
#[case::control("script main { while (x) { } }", "keyword", &["while"])]
fn evscript_snippets(#[case] code: &str, #[case] scope: &str, #[case] expected: &[&str]) {
    let registry = bundled_registry().unwrap();
    let result = registry.scan(code, "evscript", false).unwrap();
    assert_eq!(scoped_texts(&result.tree, scope), expected);
    assert_text_conserved(&result.tree, code);
}
