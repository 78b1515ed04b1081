//! Mode structure: nesting, child order, multi-part delimiters

use glint_engine::glint::testing::{assert_text_conserved, registry_from_yaml, scoped_texts};
use rstest::rstest;

const BRACES: &str = r#"
modes:
  block:
    scope: block
    begin: '\{'
    end: '\}'
    contains: [self]
contains: [block]
"#;

#[test]
fn self_reference_nests() {
    let registry = registry_from_yaml(&[("brace", BRACES)]);
    let result = registry.scan("{{}}", "brace", false).unwrap();
    assert_eq!(result.tree.depth(), 2);
    assert_text_conserved(&result.tree, "{{}}");
    // one per closed block
    assert_eq!(result.relevance, 2);
}

#[test]
fn unclosed_modes_are_closed_at_end_of_input() {
    let registry = registry_from_yaml(&[("brace", BRACES)]);
    let result = registry.scan("{{}", "brace", false).unwrap();
    assert_eq!(result.tree.depth(), 2);
    assert_text_conserved(&result.tree, "{{}");
    assert_eq!(result.relevance, 1);
}

#[rstest]
#[case::short_first("[{scope: short, match: 'ab'}, {scope: long, match: 'abc'}]", "short", "ab")]
#[case::long_first("[{scope: long, match: 'abc'}, {scope: short, match: 'ab'}]", "long", "abc")]
fn earliest_declared_child_wins_ties(#[case] contains: &str, #[case] scope: &str, #[case] text: &str) {
    let yaml = format!("contains: {}", contains);
    let registry = registry_from_yaml(&[("tie", yaml.as_str())]);
    let result = registry.scan("abc", "tie", false).unwrap();
    assert_eq!(scoped_texts(&result.tree, scope), vec![text]);
    assert_text_conserved(&result.tree, "abc");
}

#[test]
fn leftmost_match_beats_declaration_order() {
    let registry = registry_from_yaml(&[(
        "order",
        "contains: [{scope: late, match: 'z'}, {scope: early, match: 'a'}]",
    )]);
    let result = registry.scan("az", "order", false).unwrap();
    let spans = result.tree.spans();
    assert_eq!(spans[0].scopes, vec!["early".to_string()]);
    assert_eq!(spans[1].scopes, vec!["late".to_string()]);
}

#[test]
fn back_references_stay_local_to_their_part() {
    let yaml = r#"
contains:
  - begin: ['(a)', '(b)\1']
    beginScope: {1: first, 2: second}
"#;
    let registry = registry_from_yaml(&[("refs", yaml)]);
    let result = registry.scan("aba abb", "refs", false).unwrap();
    assert_eq!(scoped_texts(&result.tree, "first"), vec!["a"]);
    assert_eq!(scoped_texts(&result.tree, "second"), vec!["bb"]);
    assert_text_conserved(&result.tree, "aba abb");
}

#[test]
fn multi_part_end_scopes() {
    let yaml = r#"
contains:
  - scope: call
    begin: '\w+\('
    end: ['\)', ';']
    endScope: {1: paren, 2: semi}
"#;
    let registry = registry_from_yaml(&[("calls", yaml)]);
    let code = "f(x);";
    let result = registry.scan(code, "calls", false).unwrap();
    assert_eq!(scoped_texts(&result.tree, "paren"), vec![")"]);
    assert_eq!(scoped_texts(&result.tree, "semi"), vec![";"]);
    assert_text_conserved(&result.tree, code);
}

#[test]
fn ends_with_parent_closes_both() {
    let yaml = r#"
contains:
  - scope: tag
    begin: '<'
    end: '>'
    contains:
      - scope: attr
        begin: '\w+='
        endsWithParent: true
        contains: [{scope: value, match: '\w+'}]
"#;
    let registry = registry_from_yaml(&[("tags", yaml)]);
    let code = "<a=b> c";
    let result = registry.scan(code, "tags", false).unwrap();
    let spans = result.tree.spans();
    let value = spans.iter().find(|span| span.text == "b").unwrap();
    assert_eq!(value.scopes, vec!["tag", "attr", "value"]);
    let tail = spans.last().unwrap();
    assert_eq!(tail.text, " c");
    assert!(tail.scopes.is_empty());
    assert_text_conserved(&result.tree, code);
}

#[test]
fn end_same_as_begin_matches_its_own_delimiter() {
    let yaml = r#"
contains:
  - scope: string
    begin: '(\w+)"'
    end: '"(\w+)'
    endSameAsBegin: true
"#;
    let registry = registry_from_yaml(&[("heredoc", yaml)]);
    let code = r#"ab"x"cd"ab tail"#;
    let result = registry.scan(code, "heredoc", false).unwrap();
    assert_eq!(scoped_texts(&result.tree, "string"), vec![r#"ab"x"cd"ab"#]);
    assert_text_conserved(&result.tree, code);
}
