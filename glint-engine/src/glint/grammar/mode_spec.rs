//! Author-facing mode specification
//!
//!     A [ModeSpec] is exactly what a grammar author writes, every field optional. Sugar fields
//!     (`match`, `beginKeywords`, `beforeMatch`, `variants`, `extends`, `endSameAsBegin`) stay
//!     sugar here; the compiler desugars them. Optional flags are `Option<bool>` rather than
//!     `bool` so that variant and `extends` merges can tell "unset" from "false".

use serde::Deserialize;
use std::collections::BTreeMap;

/// A begin or end pattern.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Pattern {
    /// A single regex source.
    Single(String),
    /// Sub-patterns matched back to back; pairs with a capture scope map.
    Sequence(Vec<String>),
}

impl From<&str> for Pattern {
    fn from(source: &str) -> Self {
        Pattern::Single(source.to_string())
    }
}

/// A string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            OneOrMany::One(item) => vec![item.clone()],
            OneOrMany::Many(items) => items.clone(),
        }
    }
}

/// A scope label, or per-group labels for a multi-part pattern.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawScope")]
pub enum ScopeSpec {
    Name(String),
    Captures(BTreeMap<usize, String>),
}

impl From<&str> for ScopeSpec {
    fn from(name: &str) -> Self {
        ScopeSpec::Name(name.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScope {
    Name(String),
    Captures(BTreeMap<CaptureKey, String>),
}

impl From<RawScope> for ScopeSpec {
    fn from(raw: RawScope) -> Self {
        match raw {
            RawScope::Name(name) => ScopeSpec::Name(name),
            RawScope::Captures(map) => {
                ScopeSpec::Captures(map.into_iter().map(|(key, scope)| (key.0, scope)).collect())
            }
        }
    }
}

/// Capture map keys arrive as integers from YAML and as strings from JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct CaptureKey(usize);

impl<'de> Deserialize<'de> for CaptureKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct KeyVisitor;

        impl<'de> serde::de::Visitor<'de> for KeyVisitor {
            type Value = CaptureKey;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "a capture group number")
            }

            fn visit_u64<E: serde::de::Error>(self, value: u64) -> Result<CaptureKey, E> {
                usize::try_from(value)
                    .map(CaptureKey)
                    .map_err(|_| E::custom("capture group number out of range"))
            }

            fn visit_i64<E: serde::de::Error>(self, value: i64) -> Result<CaptureKey, E> {
                usize::try_from(value)
                    .map(CaptureKey)
                    .map_err(|_| E::custom("capture group number must not be negative"))
            }

            fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<CaptureKey, E> {
                value
                    .trim()
                    .parse()
                    .map(CaptureKey)
                    .map_err(|_| E::custom(format!("`{}` is not a capture group number", value)))
            }
        }

        deserializer.deserialize_any(KeyVisitor)
    }
}

/// Keyword declaration: a space-separated string, a list, or categories.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum KeywordSpec {
    Words(String),
    List(Vec<String>),
    /// Category name to words. The `$pattern` entry overrides the word pattern.
    Categories(KeywordCategories),
}

/// Keyword categories in declaration order. A word claimed by two categories belongs to the
/// one declared last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordCategories(pub Vec<(String, OneOrMany)>);

impl KeywordCategories {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OneOrMany)> {
        self.0.iter().map(|(category, words)| (category.as_str(), words))
    }
}

impl<'de> Deserialize<'de> for KeywordCategories {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct CategoriesVisitor;

        impl<'de> serde::de::Visitor<'de> for CategoriesVisitor {
            type Value = KeywordCategories;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "a map of keyword categories")
            }

            fn visit_map<A>(self, mut map: A) -> Result<KeywordCategories, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let mut categories = Vec::new();
                while let Some((category, words)) = map.next_entry::<String, OneOrMany>()? {
                    categories.retain(|(seen, _): &(String, OneOrMany)| *seen != category);
                    categories.push((category, words));
                }
                Ok(KeywordCategories(categories))
            }
        }

        deserializer.deserialize_map(CategoriesVisitor)
    }
}

/// Embedded sub-grammar declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SubLanguage {
    /// One fixed grammar.
    Single(String),
    /// Best of these candidates; an empty list means every registered grammar.
    Candidates(Vec<String>),
}

/// Match-time guards. A closed set: hooks are data, not code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Hook {
    /// Reject a begin that is not at offset 0.
    RejectUnlessAtStart,
    /// Reject a begin right after a `.`.
    RejectAfterMemberAccess,
    /// Remember the begin match's first capture for this activation.
    CaptureBeginMatch,
    /// Reject an end whose first capture differs from the remembered begin capture.
    RequireBeginMatch,
}

/// A child reference inside `contains` or `starts`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawModeRef")]
pub enum ModeRef {
    /// The enclosing mode itself.
    SelfRef,
    /// A named mode of the grammar, or `common.<name>` from the built-in library.
    Named(String),
    Inline(Box<ModeSpec>),
}

impl From<ModeSpec> for ModeRef {
    fn from(spec: ModeSpec) -> Self {
        ModeRef::Inline(Box::new(spec))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawModeRef {
    Name(String),
    Inline(Box<ModeSpec>),
}

impl From<RawModeRef> for ModeRef {
    fn from(raw: RawModeRef) -> Self {
        match raw {
            RawModeRef::Name(name) if name == "self" => ModeRef::SelfRef,
            RawModeRef::Name(name) => ModeRef::Named(name),
            RawModeRef::Inline(spec) => ModeRef::Inline(spec),
        }
    }
}

/// One mode as written by a grammar author.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeSpec {
    pub scope: Option<ScopeSpec>,
    /// Older spelling of `scope`.
    pub class_name: Option<String>,
    pub begin_scope: Option<ScopeSpec>,
    pub end_scope: Option<ScopeSpec>,

    pub begin: Option<Pattern>,
    pub end: Option<Pattern>,
    #[serde(rename = "match")]
    pub match_: Option<Pattern>,
    pub before_match: Option<String>,
    pub begin_keywords: Option<String>,
    pub illegal: Option<OneOrMany>,

    pub keywords: Option<KeywordSpec>,
    pub relevance: Option<u32>,

    pub contains: Option<Vec<ModeRef>>,
    pub starts: Option<Box<ModeRef>>,
    pub variants: Option<Vec<ModeSpec>>,
    pub extends: Option<String>,
    pub sub_language: Option<SubLanguage>,

    pub ends_with_parent: Option<bool>,
    pub ends_parent: Option<bool>,
    pub return_begin: Option<bool>,
    pub return_end: Option<bool>,
    pub exclude_begin: Option<bool>,
    pub exclude_end: Option<bool>,
    pub skip: Option<bool>,

    pub on_begin: Option<Hook>,
    pub on_end: Option<Hook>,
    pub end_same_as_begin: Option<bool>,
}

impl ModeSpec {
    /// Shallow merge: every field set on `self` wins, the rest come from `base`.
    pub fn merged_over(&self, base: &ModeSpec) -> ModeSpec {
        let overlay = self.clone();
        let base = base.clone();
        ModeSpec {
            scope: overlay.scope.or(base.scope),
            class_name: overlay.class_name.or(base.class_name),
            begin_scope: overlay.begin_scope.or(base.begin_scope),
            end_scope: overlay.end_scope.or(base.end_scope),
            begin: overlay.begin.or(base.begin),
            end: overlay.end.or(base.end),
            match_: overlay.match_.or(base.match_),
            before_match: overlay.before_match.or(base.before_match),
            begin_keywords: overlay.begin_keywords.or(base.begin_keywords),
            illegal: overlay.illegal.or(base.illegal),
            keywords: overlay.keywords.or(base.keywords),
            relevance: overlay.relevance.or(base.relevance),
            contains: overlay.contains.or(base.contains),
            starts: overlay.starts.or(base.starts),
            variants: overlay.variants.or(base.variants),
            extends: overlay.extends,
            sub_language: overlay.sub_language.or(base.sub_language),
            ends_with_parent: overlay.ends_with_parent.or(base.ends_with_parent),
            ends_parent: overlay.ends_parent.or(base.ends_parent),
            return_begin: overlay.return_begin.or(base.return_begin),
            return_end: overlay.return_end.or(base.return_end),
            exclude_begin: overlay.exclude_begin.or(base.exclude_begin),
            exclude_end: overlay.exclude_end.or(base.exclude_end),
            skip: overlay.skip.or(base.skip),
            on_begin: overlay.on_begin.or(base.on_begin),
            on_end: overlay.on_end.or(base.on_end),
            end_same_as_begin: overlay.end_same_as_begin.or(base.end_same_as_begin),
        }
    }

    /// A short name for diagnostics.
    pub fn label(&self) -> String {
        if let Some(ScopeSpec::Name(scope)) = &self.scope {
            return scope.clone();
        }
        if let Some(name) = &self.class_name {
            return name.clone();
        }
        let pattern = self.begin.as_ref().or(self.match_.as_ref());
        match pattern {
            Some(Pattern::Single(source)) => source.clone(),
            Some(Pattern::Sequence(parts)) => parts.concat(),
            None => match &self.begin_keywords {
                Some(words) => words.clone(),
                None => "<anonymous>".to_string(),
            },
        }
    }
}
