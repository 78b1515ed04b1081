//! Lowering: author-facing specs to a flat arena of desugared modes
//!
//!     Grammars reference modes by name and by "self", so the author-facing structure is a graph.
//!     Lowering walks that graph once and gives every distinct mode form an index in an arena.
//!     Named modes are lowered once no matter how many places refer to them, which is what makes
//!     reference cycles finite. Every sugar form disappears here:
//!
//!         - `extends` shallow-merges the mode over a named base.
//!         - `variants` become one arena entry per variant, each a merge of the variant over the
//!           base. A reference to a mode with variants expands to all of them, in order.
//!         - `className` becomes `scope`, `match` becomes `begin`.
//!         - `beforeMatch` splits the mode in two: an outer mode that matches the prefix with
//!           the original begin as lookahead, and the original mode as an immediately entered
//!           continuation that closes its parent when it ends.
//!         - Multi-part begin/end patterns are joined and their capture scope maps are renumbered
//!           against the joined pattern.
//!         - `beginKeywords` becomes a begin pattern plus a member-access guard.
//!         - An illegal list becomes one alternation.
//!         - `endSameAsBegin` becomes the capture/require hook pair.
//!
//!     The output still holds regex sources, not compiled regexes. Terminators depend on which
//!     parent a mode is entered from, and that is decided by the [mode compiler](super::mode_compiler).

use super::language::{CaptureScopes, DelimiterScope};
use super::regex_source::{count_groups, join_patterns};
use crate::glint::error::{CompileError, Delimiter};
use crate::glint::grammar::library;
use crate::glint::grammar::{
    Hook, KeywordSpec, LanguageDef, ModeRef, ModeSpec, OneOrMany, Pattern, ScopeSpec, SubLanguage,
};
use std::collections::{BTreeMap, HashMap};

pub(crate) type SpecId = usize;

/// The root mode is always the first arena entry.
pub(crate) const ROOT_SPEC: SpecId = 0;

/// `extends` chains longer than this are treated as cycles.
const MAX_EXTENDS_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Child {
    Spec(SpecId),
    /// The enclosing mode ("self").
    Enclosing,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeFlags {
    pub ends_with_parent: bool,
    pub ends_parent: bool,
    pub return_begin: bool,
    pub return_end: bool,
    pub exclude_begin: bool,
    pub exclude_end: bool,
    pub skip: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct LoweredMode {
    pub label: String,
    pub scope: Option<String>,
    pub begin_scope: Option<DelimiterScope>,
    pub end_scope: Option<DelimiterScope>,
    pub begin: Option<String>,
    pub end: Option<String>,
    pub illegal: Option<String>,
    pub keywords: Option<KeywordSpec>,
    pub relevance: u32,
    pub contains: Vec<Child>,
    pub starts: Option<SpecId>,
    pub sub_language: Option<SubLanguage>,
    pub flags: ModeFlags,
    pub before_begin: Option<Hook>,
    pub on_begin: Option<Hook>,
    pub on_end: Option<Hook>,
}

pub(crate) struct Lowering<'d> {
    def: &'d LanguageDef,
    language: &'d str,
    nodes: Vec<Option<LoweredMode>>,
    named: HashMap<String, Vec<SpecId>>,
}

impl<'d> Lowering<'d> {
    pub fn new(def: &'d LanguageDef, language: &'d str) -> Self {
        Self {
            def,
            language,
            nodes: Vec::new(),
            named: HashMap::new(),
        }
    }

    /// Lower the whole grammar. Entry [ROOT_SPEC] is the root mode.
    pub fn lower(mut self) -> Result<Vec<LoweredMode>, CompileError> {
        let root = self.apply_extends(&self.def.root, 0)?;
        let has_self = root
            .contains
            .iter()
            .flatten()
            .any(|child| *child == ModeRef::SelfRef);
        if has_self {
            return Err(CompileError::TopLevelSelf {
                language: self.language.to_string(),
            });
        }

        let id = self.reserve();
        let lowered = self.lower_form(root, id, true)?;
        self.nodes[id] = Some(lowered);

        // Every reserved slot is filled before `lower_spec` returns.
        Ok(self.nodes.into_iter().flatten().collect())
    }

    fn reserve(&mut self) -> SpecId {
        self.nodes.push(None);
        self.nodes.len() - 1
    }

    fn resolve_name(&self, name: &str) -> Result<&'d ModeSpec, CompileError> {
        if let Some(spec) = self.def.modes.get(name) {
            return Ok(spec);
        }
        library::lookup(name)?.ok_or_else(|| CompileError::UnknownModeReference {
            name: name.to_string(),
        })
    }

    fn apply_extends(&self, spec: &ModeSpec, depth: usize) -> Result<ModeSpec, CompileError> {
        let Some(base_name) = &spec.extends else {
            return Ok(spec.clone());
        };
        if depth >= MAX_EXTENDS_DEPTH {
            return Err(CompileError::NestingTooDeep {
                mode: spec.label(),
                limit: MAX_EXTENDS_DEPTH,
            });
        }
        let base = self.apply_extends(self.resolve_name(base_name)?, depth + 1)?;
        let mut merged = spec.merged_over(&base);
        merged.extends = None;
        Ok(merged)
    }

    fn lower_ref(&mut self, reference: &ModeRef) -> Result<Vec<Child>, CompileError> {
        let ids = match reference {
            ModeRef::SelfRef => return Ok(vec![Child::Enclosing]),
            ModeRef::Named(name) => match self.named.get(name) {
                Some(ids) => ids.clone(),
                None => {
                    let spec = self.resolve_name(name)?;
                    self.lower_spec(spec, Some(name))?
                }
            },
            ModeRef::Inline(spec) => self.lower_spec(spec, None)?,
        };
        Ok(ids.into_iter().map(Child::Spec).collect())
    }

    fn lower_spec(&mut self, spec: &ModeSpec, name: Option<&str>) -> Result<Vec<SpecId>, CompileError> {
        let mut spec = self.apply_extends(spec, 0)?;
        let forms = match spec.variants.take() {
            Some(variants) => variants
                .iter()
                .map(|variant| Ok(self.apply_extends(variant, 0)?.merged_over(&spec)))
                .collect::<Result<Vec<_>, CompileError>>()?,
            None => vec![spec],
        };

        let ids: Vec<SpecId> = forms.iter().map(|_| self.reserve()).collect();
        if let Some(name) = name {
            self.named.insert(name.to_string(), ids.clone());
        }
        for (id, form) in ids.iter().zip(forms) {
            let lowered = self.lower_form(form, *id, false)?;
            self.nodes[*id] = Some(lowered);
        }
        Ok(ids)
    }

    fn lower_form(
        &mut self,
        mut spec: ModeSpec,
        id: SpecId,
        is_root: bool,
    ) -> Result<LoweredMode, CompileError> {
        let label = spec.label();

        if spec.scope.is_none() {
            spec.scope = spec.class_name.take().map(ScopeSpec::Name);
        }
        if let Some(shorthand) = spec.match_.take() {
            if spec.begin.is_some() || spec.end.is_some() {
                return Err(CompileError::MatchWithBeginEnd { mode: label });
            }
            spec.begin = Some(shorthand);
        }
        if spec.before_match.is_some() {
            spec = split_before_match(spec, &label)?;
        }
        if spec.end_same_as_begin == Some(true) {
            spec.on_begin = Some(Hook::CaptureBeginMatch);
            spec.on_end = Some(Hook::RequireBeginMatch);
        }

        let flags = ModeFlags {
            ends_with_parent: spec.ends_with_parent.unwrap_or(false),
            ends_parent: spec.ends_parent.unwrap_or(false),
            return_begin: spec.return_begin.unwrap_or(false),
            return_end: spec.return_end.unwrap_or(false),
            exclude_begin: spec.exclude_begin.unwrap_or(false),
            exclude_end: spec.exclude_end.unwrap_or(false),
            skip: spec.skip.unwrap_or(false),
        };

        let mut scope = None;
        let mut begin_scope = spec.begin_scope.take();
        match spec.scope.take() {
            Some(ScopeSpec::Name(name)) => scope = Some(self.alias(&name)),
            Some(captures @ ScopeSpec::Captures(_)) => begin_scope = Some(captures),
            None => {}
        }

        let (mut begin, begin_scope) =
            self.lower_delimiter(spec.begin.take(), begin_scope, Delimiter::Begin, &flags, &label)?;
        let (end, end_scope) =
            self.lower_delimiter(spec.end.take(), spec.end_scope.take(), Delimiter::End, &flags, &label)?;

        let mut keywords = spec.keywords.take();
        let mut relevance = spec.relevance;
        let mut before_begin = None;
        if let Some(words) = spec.begin_keywords.take() {
            if !is_root {
                let alternatives: Vec<&str> = words.split_whitespace().collect();
                begin = Some(format!(r"\b({})(?!\.)(?=\b|\s)", alternatives.join("|")));
                before_begin = Some(Hook::RejectAfterMemberAccess);
                keywords = keywords.or(Some(KeywordSpec::Words(words)));
                relevance = relevance.or(Some(0));
            }
        }

        let illegal = spec.illegal.take().map(|illegal| match illegal {
            OneOrMany::One(source) => source,
            OneOrMany::Many(alternatives) => format!("(?:{})", alternatives.join("|")),
        });

        let mut contains = Vec::new();
        for child in spec.contains.take().unwrap_or_default() {
            contains.extend(self.lower_ref(&child)?);
        }
        let starts = match spec.starts.take() {
            Some(reference) => self
                .lower_ref(&reference)?
                .first()
                .map(|child| match child {
                    Child::Spec(spec_id) => *spec_id,
                    Child::Enclosing => id,
                }),
            None => None,
        };

        Ok(LoweredMode {
            label,
            scope,
            begin_scope,
            end_scope,
            begin,
            end,
            illegal,
            keywords,
            relevance: relevance.unwrap_or(1),
            contains,
            starts,
            sub_language: spec.sub_language.take(),
            flags,
            before_begin,
            on_begin: spec.on_begin,
            on_end: spec.on_end,
        })
    }

    fn lower_delimiter(
        &self,
        pattern: Option<Pattern>,
        scope: Option<ScopeSpec>,
        delimiter: Delimiter,
        flags: &ModeFlags,
        label: &str,
    ) -> Result<(Option<String>, Option<DelimiterScope>), CompileError> {
        match pattern {
            Some(Pattern::Sequence(parts)) => {
                let conflicting = match delimiter {
                    Delimiter::Begin => [
                        (flags.skip, "skip"),
                        (flags.exclude_begin, "excludeBegin"),
                        (flags.return_begin, "returnBegin"),
                    ],
                    Delimiter::End => [
                        (flags.skip, "skip"),
                        (flags.exclude_end, "excludeEnd"),
                        (flags.return_end, "returnEnd"),
                    ],
                };
                if let Some((_, flag)) = conflicting.iter().find(|(set, _)| *set) {
                    return Err(CompileError::MultiPartWithFlag {
                        mode: label.to_string(),
                        delimiter,
                        flag: *flag,
                    });
                }
                let Some(ScopeSpec::Captures(map)) = scope else {
                    return Err(CompileError::CaptureScopeShape {
                        mode: label.to_string(),
                        delimiter,
                    });
                };
                let captures = self.capture_scopes(&parts, &map, label)?;
                Ok((
                    Some(join_patterns(&parts, "")),
                    Some(DelimiterScope::Captures(captures)),
                ))
            }
            Some(Pattern::Single(source)) => match scope {
                Some(ScopeSpec::Captures(_)) => Err(CompileError::CaptureScopeShape {
                    mode: label.to_string(),
                    delimiter,
                }),
                Some(ScopeSpec::Name(name)) => {
                    Ok((Some(source), Some(DelimiterScope::Wrap(self.alias(&name)))))
                }
                None => Ok((Some(source), None)),
            },
            None => Ok((None, scope_without_pattern(scope, |name| self.alias(name)))),
        }
    }

    /// Map sub-pattern numbers to group numbers of the joined pattern. Every sub-pattern is
    /// emitted, with its scope when it has one and through keyword classification otherwise.
    fn capture_scopes(
        &self,
        parts: &[String],
        map: &BTreeMap<usize, String>,
        label: &str,
    ) -> Result<CaptureScopes, CompileError> {
        if let Some(&key) = map.keys().find(|&&key| key == 0 || key > parts.len()) {
            return Err(CompileError::InvalidCaptureScope {
                mode: label.to_string(),
                key,
            });
        }
        let mut groups = Vec::with_capacity(parts.len());
        let mut offset = 0;
        for (index, part) in parts.iter().enumerate() {
            let number = index + 1;
            groups.push((number + offset, map.get(&number).map(|scope| self.alias(scope))));
            offset += count_groups(part)?;
        }
        Ok(CaptureScopes::new(groups))
    }

    fn alias(&self, scope: &str) -> String {
        self.def
            .class_name_aliases
            .get(scope)
            .cloned()
            .unwrap_or_else(|| scope.to_string())
    }
}

/// A wrap scope without a pattern still wraps the default zero-width delimiter.
fn scope_without_pattern(
    scope: Option<ScopeSpec>,
    alias: impl Fn(&str) -> String,
) -> Option<DelimiterScope> {
    match scope {
        Some(ScopeSpec::Name(name)) => Some(DelimiterScope::Wrap(alias(&name))),
        _ => None,
    }
}

/// `beforeMatch: P` on a mode M becomes an outer mode matching `P(?=begin(M))` whose
/// continuation holds M itself, marked to close the continuation when it ends.
fn split_before_match(mut spec: ModeSpec, label: &str) -> Result<ModeSpec, CompileError> {
    if spec.starts.is_some() {
        return Err(CompileError::BeforeMatchWithStarts {
            mode: label.to_string(),
        });
    }
    let prefix = spec.before_match.take().unwrap_or_default();
    let lookahead = match &spec.begin {
        Some(Pattern::Single(source)) => source.clone(),
        Some(Pattern::Sequence(parts)) => join_patterns(parts, ""),
        None => String::new(),
    };

    let keywords = spec.keywords.clone();
    spec.ends_parent = Some(true);
    let continuation = ModeSpec {
        relevance: Some(0),
        contains: Some(vec![ModeRef::from(spec)]),
        ..Default::default()
    };

    Ok(ModeSpec {
        keywords,
        begin: Some(Pattern::Single(format!("{}(?={})", prefix, lookahead))),
        relevance: Some(0),
        starts: Some(Box::new(ModeRef::from(continuation))),
        ..Default::default()
    })
}
