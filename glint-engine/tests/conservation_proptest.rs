//! Property-based tests: a scan never loses or invents text
//!
//! Whatever the input, the leaves of the token tree concatenate back to it. Inputs are drawn
//! from the characters the bundled grammars care about, plus some that no rule mentions.

use glint_engine::glint::bundled::bundled_registry;
use glint_engine::glint::testing::registry_from_yaml;
use glint_engine::Registry;
use once_cell::sync::Lazy;
use proptest::prelude::*;

static BUNDLED: Lazy<Registry> = Lazy::new(|| bundled_registry().unwrap());

const NESTED: &str = r#"
keywords: 'if else'
modes:
  block:
    scope: block
    begin: '\{'
    end: '\}'
    contains: [self, string]
  string:
    scope: string
    begin: '"'
    end: '"'
    excludeBegin: true
    excludeEnd: true
    illegal: '\n'
contains: [block, string, {scope: number, match: '\d+'}]
"#;

fn delimiter_grammar(flags: [bool; 5]) -> String {
    let names = ["excludeBegin", "returnBegin", "excludeEnd", "returnEnd", "skip"];
    let mut yaml = String::from("contains:\n  - scope: inner\n    begin: 'ab?'\n    end: 'b|c'\n");
    for (name, set) in names.iter().zip(flags) {
        yaml.push_str(&format!("    {}: {}\n", name, set));
    }
    yaml
}

fn source_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 \t\n;:,.\\[\\]{}()\"$%&#@*/+=<>!-]{0,120}",
        "(ld a, \\[hl\\]\n|jr nz, \\.loop\n|\\.loop:\n|db \"\\{x\\}\"\n|; note\n){0,8}",
        "(u8 x = 1;|x -= 2;|#asm\nnop\n#end\n|script main \\{|\\}|// c\n){0,8}",
        "[a-zé{}\"\n ]{0,60}",
    ]
}

proptest! {
    #[test]
    fn rgbasm_conserves_text(code in source_strategy()) {
        let result = BUNDLED.scan(&code, "rgbasm", true).unwrap();
        prop_assert_eq!(result.tree.text(), code);
    }

    #[test]
    fn evscript_conserves_text(code in source_strategy()) {
        let result = BUNDLED.scan(&code, "evscript", true).unwrap();
        prop_assert_eq!(result.tree.text(), code);
    }

    #[test]
    fn flags_conserve_text(code in source_strategy()) {
        let registry = registry_from_yaml(&[("nested", NESTED)]);
        let result = registry.scan(&code, "nested", true).unwrap();
        prop_assert_eq!(result.tree.text(), code);
    }

    #[test]
    fn delimiter_flags_conserve_text(flags in any::<[bool; 5]>(), code in "[abcx \n]{0,40}") {
        let yaml = delimiter_grammar(flags);
        let registry = registry_from_yaml(&[("delimited", yaml.as_str())]);
        let result = registry.scan(&code, "delimited", true).unwrap();
        prop_assert_eq!(result.tree.text(), code);
    }

    #[test]
    fn detection_conserves_text(code in source_strategy()) {
        let detection = BUNDLED.detect(&code, &[]).unwrap();
        prop_assert_eq!(detection.best.tree.text(), code.clone());
        if let Some(second) = detection.second_best {
            prop_assert_eq!(second.tree.text(), code);
        }
    }
}
