//! Testing utilities
//!
//!     Helpers shared by unit tests, the integration tests under `tests/` and downstream crates.
//!
//! Rules Of Thumb
//!
//!     Grammar behavior is easiest to pin down with a tiny grammar written inline as YAML,
//!     registered under a throwaway name:
//!
//!     ```rust,ignore
//!     let registry = registry_from_yaml(&[("test", "keywords: 'if else'")]);
//!     let result = registry.scan("if x", "test", false).unwrap();
//!     assert_eq!(scoped_texts(&result.tree, "keyword"), vec!["if"]);
//!     ```
//!
//!     Tests of the bundled grammars use the sample sources under `samples/`, see [sample].
//!     Every scan test should also check that the tree still holds the input, with
//!     [assert_text_conserved].

use crate::glint::emitting::TokenTree;
use crate::glint::registry::Registry;

const SAMPLES: &[(&str, &str)] = &[
    ("hello.asm", include_str!("../../samples/hello.asm")),
    ("hello.evs", include_str!("../../samples/hello.evs")),
];

/// Build a registry from `(name, yaml)` pairs. Panics with the grammar error on failure.
pub fn registry_from_yaml(grammars: &[(&str, &str)]) -> Registry {
    let mut registry = Registry::new();
    for (name, yaml) in grammars {
        if let Err(err) = registry.register_yaml(name, yaml) {
            panic!("grammar `{}` failed to register: {}", name, err);
        }
    }
    registry
}

/// A sample source file by name.
pub fn sample(name: &str) -> &'static str {
    SAMPLES
        .iter()
        .find(|(sample, _)| *sample == name)
        .map(|(_, source)| *source)
        .unwrap_or_else(|| panic!("no sample named `{}`", name))
}

/// Texts of the spans whose innermost scope is `scope`, in order.
pub fn scoped_texts(tree: &TokenTree, scope: &str) -> Vec<String> {
    tree.spans()
        .into_iter()
        .filter(|span| span.scopes.last().map(String::as_str) == Some(scope))
        .map(|span| span.text)
        .collect()
}

#[track_caller]
pub fn assert_text_conserved(tree: &TokenTree, code: &str) {
    let text = tree.text();
    if text != code {
        panic!(
            "token tree text differs from the input\n  input: {:?}\n  tree:  {:?}",
            code, text
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_are_available() {
        assert!(sample("hello.asm").contains("SECTION"));
        assert!(sample("hello.evs").contains("#asm"));
    }

    #[test]
    #[should_panic(expected = "no sample named")]
    fn test_missing_sample_panics() {
        sample("missing.txt");
    }
}
