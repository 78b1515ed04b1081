//! Embedded grammars: evscript `#asm` blocks scanned as RGBASM

use glint_engine::glint::bundled::bundled_registry;
use glint_engine::glint::scanning::engine::MAX_DETECTED_EMBED_DEPTH;
use glint_engine::glint::testing::{assert_text_conserved, registry_from_yaml, sample, scoped_texts};

#[test]
fn asm_blocks_are_scanned_as_rgbasm() {
    let registry = bundled_registry().unwrap();
    let code = sample("hello.evs");
    let result = registry.scan(code, "evscript", false).unwrap();
    assert_text_conserved(&result.tree, code);

    let spans = result.tree.spans();
    let embedded: Vec<&str> = spans
        .iter()
        .filter(|span| span.scopes.first().map(String::as_str) == Some("language:rgbasm"))
        .map(|span| span.text.as_str())
        .collect();
    assert_eq!(embedded.concat(), "\n\tld a, [hli]\n\tld [de], a\n");
    assert_eq!(scoped_texts(&result.tree, "meta"), vec!["#asm", "#end"]);
}

#[test]
fn embedded_keywords_keep_their_scopes() {
    let registry = bundled_registry().unwrap();
    let result = registry.scan("#asm nop #end", "evscript", false).unwrap();
    let spans = result.tree.spans();
    let nop = spans.iter().find(|span| span.text == "nop").unwrap();
    assert_eq!(nop.scopes, vec!["language:rgbasm", "keyword"]);
    // the embedded scan's relevance counts for the outer one
    assert_eq!(result.relevance, 1);
}

#[test]
fn unknown_sub_language_stays_plain() {
    let yaml = "contains: [{begin: '<<', end: '>>', subLanguage: cobol}]";
    let registry = registry_from_yaml(&[("host", yaml)]);
    let code = "<<MOVE A>>";
    let result = registry.scan(code, "host", false).unwrap();
    assert!(result.tree.spans().iter().all(|span| span.scopes.is_empty()));
    assert_text_conserved(&result.tree, code);
}

#[test]
fn candidate_sub_languages_pick_the_best() {
    let registry = registry_from_yaml(&[
        ("vowels", "keywords: 'a e i'"),
        ("digits", "keywords: 'one two'"),
        ("host", "contains: [{begin: '\\[', end: '\\]', subLanguage: [vowels, digits]}]"),
    ]);
    let result = registry.scan("[one two] [a]", "host", false).unwrap();
    let spans = result.tree.spans();
    let one = spans.iter().find(|span| span.text == "one").unwrap();
    assert_eq!(one.scopes, vec!["language:digits", "keyword"]);
    let a = spans.iter().find(|span| span.text == "a").unwrap();
    assert_eq!(a.scopes, vec!["language:vowels", "keyword"]);
}

#[test]
fn continuation_carries_open_modes_across_regions() {
    let registry = registry_from_yaml(&[
        ("inner", "contains: [{scope: string, begin: '\"', end: '\"'}]"),
        ("host", "contains: [{begin: '<', end: '>', subLanguage: inner}]"),
    ]);
    let code = r#"<"ab> x <cd">"#;
    let result = registry.scan(code, "host", false).unwrap();
    assert_eq!(scoped_texts(&result.tree, "string"), vec![r#""ab"#, r#"cd""#]);
    assert_text_conserved(&result.tree, code);
}

#[test]
fn detected_embeddings_stop_nesting() {
    let yaml = r#"
keywords: 'kw'
contains:
  - {begin: '<', end: '>', subLanguage: [], excludeBegin: true, excludeEnd: true}
"#;
    let registry = registry_from_yaml(&[("angle", yaml)]);
    let code = format!("{}x{}", "<kw ".repeat(12), ">".repeat(12));
    let result = registry.scan(&code, "angle", false).unwrap();
    assert_text_conserved(&result.tree, &code);

    let deepest = result
        .tree
        .spans()
        .iter()
        .map(|span| span.scopes.iter().filter(|scope| scope.starts_with("language:")).count())
        .max();
    assert_eq!(deepest, Some(MAX_DETECTED_EMBED_DEPTH));
}
