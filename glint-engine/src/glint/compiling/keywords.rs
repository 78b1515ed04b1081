//! Keyword tables
//!
//!     A mode's keyword declaration compiles into a word pattern plus a lookup table from word to
//!     [Keyword]. The scanner runs the word pattern over buffered plain text and looks each match
//!     up; misses stay plain text.
//!
//!     Declarations come in three shapes, all ending up in the same table:
//!
//!         keywords: if else while            # category "keyword"
//!         keywords: [if, else, while]        # same
//!         keywords:
//!           $pattern: '[a-z_][a-z0-9_#@]*'   # word pattern, default \w+
//!           keyword: if else
//!           literal: [_NARG, __LINE__]
//!           _hidden: counted but not scoped
//!
//!     A word may carry its weight explicitly (`ds|0`, `incbin|10`). Otherwise it weighs 1,
//!     except for a handful of common English words that weigh 0 so they do not sway
//!     auto-detection.

use super::regex_source::build_regex;
use crate::glint::error::CompileError;
use crate::glint::grammar::{KeywordSpec, OneOrMany};
use std::collections::HashMap;

/// A word only adds relevance for its first this-many occurrences in a scan.
pub const MAX_KEYWORD_HITS: u32 = 7;

const DEFAULT_KEYWORD_PATTERN: &str = r"\w+";
const PATTERN_KEY: &str = "$pattern";
const DEFAULT_CATEGORY: &str = "keyword";
const COMMON_KEYWORDS: [&str; 11] = [
    "of", "and", "for", "in", "not", "or", "if", "then", "parent", "list", "value",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword {
    /// Scope to emit, or `None` for a silent category.
    pub scope: Option<String>,
    pub relevance: u32,
}

#[derive(Debug)]
pub struct KeywordTable {
    pattern: onig::Regex,
    words: HashMap<String, Keyword>,
    case_insensitive: bool,
}

impl KeywordTable {
    pub fn compile(
        spec: &KeywordSpec,
        case_insensitive: bool,
        scope_aliases: &HashMap<String, String>,
    ) -> Result<Self, CompileError> {
        let mut words = HashMap::new();
        let mut pattern = None;

        let mut add = |category: &str, list: Vec<&str>| {
            let scope = if category.starts_with('_') {
                None
            } else {
                Some(
                    scope_aliases
                        .get(category)
                        .cloned()
                        .unwrap_or_else(|| category.to_string()),
                )
            };
            for entry in list {
                let (word, keyword) = parse_entry(entry, scope.clone(), case_insensitive);
                words.insert(word, keyword);
            }
        };

        match spec {
            KeywordSpec::Words(list) => add(DEFAULT_CATEGORY, list.split_whitespace().collect()),
            KeywordSpec::List(list) => add(DEFAULT_CATEGORY, list.iter().map(String::as_str).collect()),
            KeywordSpec::Categories(categories) => {
                for (category, list) in categories.iter() {
                    if category == PATTERN_KEY {
                        pattern = Some(match list {
                            OneOrMany::One(source) => source.clone(),
                            OneOrMany::Many(sources) => sources.join("|"),
                        });
                        continue;
                    }
                    match list {
                        OneOrMany::One(text) => add(category, text.split_whitespace().collect()),
                        OneOrMany::Many(items) => {
                            add(category, items.iter().map(String::as_str).collect())
                        }
                    }
                }
            }
        }

        let source = pattern.as_deref().unwrap_or(DEFAULT_KEYWORD_PATTERN);
        Ok(Self {
            pattern: build_regex(source, case_insensitive)?,
            words,
            case_insensitive,
        })
    }

    /// Byte ranges of candidate words in `text`.
    pub fn words<'a>(&'a self, text: &'a str) -> impl Iterator<Item = (usize, usize)> + 'a {
        self.pattern.find_iter(text)
    }

    /// The table key for a matched word.
    pub fn normalize(&self, word: &str) -> String {
        if self.case_insensitive {
            word.to_lowercase()
        } else {
            word.to_string()
        }
    }

    pub fn get(&self, key: &str) -> Option<&Keyword> {
        self.words.get(key)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

fn parse_entry(entry: &str, scope: Option<String>, case_insensitive: bool) -> (String, Keyword) {
    let mut parts = entry.splitn(2, '|');
    let word = parts.next().unwrap_or_default();
    let word = if case_insensitive {
        word.to_lowercase()
    } else {
        word.to_string()
    };
    let relevance = parts
        .next()
        .and_then(|weight| weight.trim().parse().ok())
        .unwrap_or_else(|| default_relevance(&word));
    (word, Keyword { scope, relevance })
}

fn default_relevance(word: &str) -> u32 {
    if COMMON_KEYWORDS.contains(&word.to_lowercase().as_str()) {
        0
    } else {
        1
    }
}
