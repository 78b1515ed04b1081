//! Illegal lexemes and forward-progress guards

use glint_engine::glint::error::NoProgressReason;
use glint_engine::glint::testing::{assert_text_conserved, registry_from_yaml};
use glint_engine::{HighlightConfig, IllegalPolicy, Registry, ScanError, ScanOptions};
use rstest::rstest;

const STRICT_LET: &str = "keywords: 'let'\nillegal: '@'";

fn registry_with(config: HighlightConfig, yaml: &str) -> Registry {
    let mut registry = Registry::with_config(config);
    registry.register_yaml("test", yaml).unwrap();
    registry
}

#[test]
fn strict_scans_fail_on_illegal_lexemes() {
    let registry = registry_from_yaml(&[("test", STRICT_LET)]);
    let err = registry.scan("let @ let", "test", false).unwrap_err();
    let context = match err {
        ScanError::IllegalLexeme(context) => context,
        other => panic!("expected an illegal lexeme, got {:?}", other),
    };
    assert_eq!(context.lexeme, "@");
    assert_eq!(context.offset, 4);
    assert_eq!(context.context, "let @ let");
}

#[test]
fn permissive_scans_abort_and_keep_the_text() {
    let registry = registry_from_yaml(&[("test", STRICT_LET)]);
    let code = "let @ let";
    let result = registry.scan(code, "test", true).unwrap();
    assert!(result.illegal);
    assert_eq!(result.relevance, 0);
    assert_eq!(result.illegal_by.unwrap().offset, 4);
    assert_text_conserved(&result.tree, code);
    // nothing was classified before the abort
    assert!(result.tree.spans().iter().all(|span| span.scopes.is_empty()));
}

#[test]
fn ignored_illegal_lexemes_are_text() {
    let registry = registry_from_yaml(&[("test", STRICT_LET)]);
    let options = ScanOptions {
        illegal: IllegalPolicy::Ignore,
        ..ScanOptions::default()
    };
    let code = "let @ let";
    let result = registry.scan_with::<glint_engine::TokenTree>(code, "test", options).unwrap();
    assert!(!result.illegal);
    assert_eq!(result.relevance, 2);
    assert_text_conserved(&result.tree, code);
}

#[test]
fn highlight_uses_configured_permissiveness() {
    let config = HighlightConfig {
        permissive: false,
        ..Default::default()
    };
    let registry = registry_with(config, STRICT_LET);
    assert!(matches!(
        registry.highlight("@", "test"),
        Err(ScanError::IllegalLexeme(_))
    ));
}

#[test]
fn zero_width_loops_skip_a_character_in_safe_mode() {
    let yaml = "contains: [{scope: empty, begin: '(?=a)'}]";
    let registry = registry_from_yaml(&[("test", yaml)]);
    let result = registry.scan("aa", "test", false).unwrap();
    assert_text_conserved(&result.tree, "aa");
}

#[test]
fn zero_width_loops_fail_outside_safe_mode() {
    let config = HighlightConfig {
        safe_mode: false,
        ..Default::default()
    };
    let registry = registry_with(config, "contains: [{scope: empty, begin: '(?=a)'}]");
    let err = registry.scan("aa", "test", false).unwrap_err();
    assert!(matches!(
        err,
        ScanError::NoProgress {
            reason: NoProgressReason::ZeroWidthMatch,
            offset: 0,
            ..
        }
    ));
}

#[rstest]
// A zero-width end that its hook keeps rejecting never moves the cursor.
#[case::rejected_zero_width_end(
    "contains: [{scope: string, begin: '\"(\\w+)', end: '\\b()', endSameAsBegin: true}]",
    r#""abc def"#,
    4
)]
#[case::zero_width_self_nesting(
    "contains: [{scope: x, begin: '\\b', end: 'zzz', contains: [self]}]",
    "a",
    0
)]
#[case::returned_end_reopens_mode(
    "contains: [{scope: x, begin: '(?=x)', end: 'x', returnEnd: true}]",
    "x",
    0
)]
fn runaway_loops_fail(#[case] yaml: &str, #[case] code: &str, #[case] offset: usize) {
    let config = HighlightConfig {
        iteration_floor: 10,
        ..Default::default()
    };
    let registry = registry_with(config, yaml);
    let err = registry.scan(code, "test", true).unwrap_err();
    assert_eq!(no_progress_at(err), (NoProgressReason::Runaway, offset));
}

#[test]
fn runaway_loops_fail_with_default_settings() {
    let yaml = "contains: [{scope: x, begin: '(?=x)', end: 'x', returnEnd: true}]";
    let registry = registry_from_yaml(&[("test", yaml)]);
    let err = registry.scan("x", "test", true).unwrap_err();
    assert_eq!(no_progress_at(err), (NoProgressReason::Runaway, 0));
}

#[test]
fn mode_stack_depth_is_capped() {
    // The stack cap fires long before the default iteration floor.
    let yaml = "contains: [{scope: x, begin: '\\b', end: 'zzz', contains: [self]}]";
    let registry = registry_from_yaml(&[("test", yaml)]);
    let err = registry.scan("a", "test", true).unwrap_err();
    assert_eq!(no_progress_at(err), (NoProgressReason::Runaway, 0));
}

#[test]
fn deep_but_finite_nesting_scans() {
    let yaml = "contains: [{scope: block, begin: '\\{', end: '\\}', contains: [self]}]";
    let registry = registry_from_yaml(&[("test", yaml)]);
    let code = format!("{}{}", "{".repeat(200), "}".repeat(200));
    let result = registry.scan(&code, "test", false).unwrap();
    assert_eq!(result.tree.depth(), 200);
    assert_text_conserved(&result.tree, &code);
}

fn no_progress_at(err: ScanError) -> (NoProgressReason, usize) {
    match err {
        ScanError::NoProgress { reason, offset, .. } => (reason, offset),
        other => panic!("expected a no-progress error, got {:?}", other),
    }
}
