//! Auto-detection
//!
//!     Scan the text with every candidate language, permissively, next to a plain text baseline
//!     that classifies nothing and scores 0. Results are ranked by relevance. On a tie, a
//!     language that declares itself a superset of the other ranks first; otherwise the
//!     candidate order stands.

use crate::glint::compiling::Language;
use crate::glint::emitting::{Emitter, TokenTree};
use crate::glint::error::ScanError;
use crate::glint::registry::Registry;
use crate::glint::scanning::engine::Scanner;
use crate::glint::scanning::{IllegalPolicy, ScanOptions, ScanResult};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
pub struct Detection<E = TokenTree> {
    pub best: ScanResult<E>,
    pub second_best: Option<ScanResult<E>>,
}

/// Candidate languages, in order: `candidates` if given, else the configured allow-list, else
/// every registered language. Unknown names and languages excluded from detection are dropped.
pub(crate) fn candidate_languages(registry: &Registry, candidates: &[String]) -> Vec<Arc<Language>> {
    let names = if !candidates.is_empty() {
        candidates.to_vec()
    } else if !registry.config().languages.is_empty() {
        registry.config().languages.clone()
    } else {
        registry.list_languages()
    };

    let mut seen = HashSet::new();
    names
        .iter()
        .filter_map(|name| registry.get_language(name))
        .filter(|language| !language.disable_autodetect())
        .filter(|language| seen.insert(language.name().to_string()))
        .collect()
}

pub(crate) fn rank<E: Emitter>(
    registry: &Registry,
    code: &str,
    candidates: &[String],
    options: ScanOptions,
    embed_depth: usize,
) -> Result<Detection<E>, ScanError> {
    let options = ScanOptions {
        illegal: IllegalPolicy::Abort,
        ..options
    };

    let mut baseline = E::default();
    baseline.add_text(code);
    baseline.finalize();
    let mut results = vec![ScanResult::plain(baseline)];

    for language in candidate_languages(registry, candidates) {
        let result = Scanner::<E>::new(registry, &language, code, options, embed_depth).run(None)?;
        debug!(
            language = language.name(),
            relevance = result.relevance,
            illegal = result.illegal,
            "detection candidate"
        );
        results.push(result);
    }

    sort_results(registry, &mut results);
    let mut ranked = results.into_iter();
    match ranked.next() {
        Some(best) => Ok(Detection {
            best,
            second_best: ranked.next(),
        }),
        None => Ok(Detection {
            best: ScanResult::plain(E::default()),
            second_best: None,
        }),
    }
}

/// Stable insertion sort. The superset tie-break is not a total order, so this avoids the
/// standard sorts.
fn sort_results<E>(registry: &Registry, results: &mut [ScanResult<E>]) {
    for i in 1..results.len() {
        let mut j = i;
        while j > 0 && ranks_before(registry, &results[j], &results[j - 1]) {
            results.swap(j, j - 1);
            j -= 1;
        }
    }
}

fn ranks_before<E>(registry: &Registry, a: &ScanResult<E>, b: &ScanResult<E>) -> bool {
    if a.relevance != b.relevance {
        return a.relevance > b.relevance;
    }
    match (&a.language, &b.language) {
        (Some(a), Some(b)) => is_superset(registry, a, b),
        _ => false,
    }
}

fn is_superset(registry: &Registry, language: &str, of: &str) -> bool {
    let (Some(language), Some(of)) = (registry.get_language(language), registry.get_language(of)) else {
        return false;
    };
    language
        .superset_of()
        .and_then(|base| registry.get_language(base))
        .is_some_and(|base| base.name() == of.name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glint::testing::registry_from_yaml;

    #[test]
    fn test_highest_relevance_wins() {
        let registry = registry_from_yaml(&[
            ("vowels", "keywords: 'a e i'"),
            ("digits", "keywords: 'one two three'"),
        ]);
        let detection = registry.detect("one two a", &[]).unwrap();
        assert_eq!(detection.best.language.as_deref(), Some("digits"));
        assert_eq!(detection.best.relevance, 2);
        assert_eq!(detection.second_best.unwrap().language.as_deref(), Some("vowels"));
    }

    #[test]
    fn test_plain_text_baseline_wins_ties_at_zero() {
        let registry = registry_from_yaml(&[("vowels", "keywords: 'a e i'")]);
        let detection = registry.detect("xyz", &[]).unwrap();
        assert_eq!(detection.best.language, None);
        assert_eq!(detection.best.tree.text(), "xyz");
        assert_eq!(detection.second_best.unwrap().language.as_deref(), Some("vowels"));
    }

    #[test]
    fn test_candidates_restrict_and_skip_unknown() {
        let registry = registry_from_yaml(&[
            ("vowels", "keywords: 'a e i'"),
            ("digits", "keywords: 'one two three'"),
        ]);
        let only = vec!["vowels".to_string(), "missing".to_string()];
        let detection = registry.detect("one two a", &only).unwrap();
        assert_eq!(detection.best.language.as_deref(), Some("vowels"));
        assert_eq!(detection.second_best.unwrap().language, None);
    }

    #[test]
    fn test_disabled_languages_are_not_candidates() {
        let registry = registry_from_yaml(&[("quiet", "disableAutodetect: true\nkeywords: 'x'")]);
        let detection = registry.detect("x x x", &[]).unwrap();
        assert_eq!(detection.best.language, None);
        assert!(detection.second_best.is_none());
    }
}
