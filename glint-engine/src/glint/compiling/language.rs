//! Compiled languages
//!
//!     A [Language] owns a flat arena of [CompiledMode]s. Modes refer to their children and
//!     continuations by [ModeId], an index into that arena, so recursive grammars are plain
//!     index cycles rather than owning cycles. Index 0 is the root mode.
//!
//!     Everything here is immutable once compiled. The only interior mutability is the lazily
//!     built resumable matchers, which are thread-safe once-cells.

use super::keywords::KeywordTable;
use super::lowering::ModeFlags;
use super::mode_compiler::ModeCompiler;
use super::multiplexer::ResumableMatcher;
use crate::glint::error::CompileError;
use crate::glint::grammar::{Hook, LanguageDef, SubLanguage};

/// Index of a compiled mode inside its language.
pub type ModeId = usize;

/// The root mode of every language.
pub const ROOT_MODE: ModeId = 0;

/// Scope assignment for one side of a mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DelimiterScope {
    /// Wrap the whole delimiter match in this scope.
    Wrap(String),
    /// Scope each sub-pattern of a multi-part delimiter.
    Captures(CaptureScopes),
}

/// Group numbers of a joined multi-part pattern, in order, with the scope for each.
/// Groups without a scope are classified with keywords instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureScopes {
    groups: Vec<(usize, Option<String>)>,
}

impl CaptureScopes {
    pub fn new(groups: Vec<(usize, Option<String>)>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[(usize, Option<String>)] {
        &self.groups
    }
}

#[derive(Debug)]
pub struct CompiledMode {
    pub(crate) label: String,
    pub(crate) scope: Option<String>,
    pub(crate) begin_scope: Option<DelimiterScope>,
    pub(crate) end_scope: Option<DelimiterScope>,
    pub(crate) end: Option<onig::Regex>,
    pub(crate) keywords: Option<KeywordTable>,
    pub(crate) relevance: u32,
    pub(crate) contains: Vec<ModeId>,
    pub(crate) starts: Option<ModeId>,
    pub(crate) sub_language: Option<SubLanguage>,
    pub(crate) flags: ModeFlags,
    pub(crate) before_begin: Option<Hook>,
    pub(crate) on_begin: Option<Hook>,
    pub(crate) on_end: Option<Hook>,
    pub(crate) matcher: ResumableMatcher,
}

impl CompiledMode {
    /// Diagnostic name: the scope, or the begin pattern for unscoped modes.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn relevance(&self) -> u32 {
        self.relevance
    }

    pub fn contains(&self) -> &[ModeId] {
        &self.contains
    }

    pub fn starts(&self) -> Option<ModeId> {
        self.starts
    }

    pub fn flags(&self) -> ModeFlags {
        self.flags
    }

    pub fn keywords(&self) -> Option<&KeywordTable> {
        self.keywords.as_ref()
    }

    pub fn matcher(&self) -> &ResumableMatcher {
        &self.matcher
    }
}

/// A compiled grammar.
#[derive(Debug)]
pub struct Language {
    pub(crate) name: String,
    pub(crate) display_name: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) case_insensitive: bool,
    pub(crate) disable_autodetect: bool,
    pub(crate) superset_of: Option<String>,
    pub(crate) modes: Vec<CompiledMode>,
}

impl Language {
    /// Compile `def` under `name`. The definition's own `name` is only a display name.
    /// `case_insensitive` overrides the definition's own flag when set.
    pub fn compile(
        name: &str,
        def: &LanguageDef,
        case_insensitive: Option<bool>,
    ) -> Result<Self, CompileError> {
        let case_insensitive = case_insensitive.unwrap_or(def.case_insensitive);
        let modes = ModeCompiler::new(def, name, case_insensitive).compile()?;
        Ok(Self {
            name: name.to_string(),
            display_name: def.name.clone().unwrap_or_else(|| name.to_string()),
            aliases: def.alias_list(),
            case_insensitive,
            disable_autodetect: def.disable_autodetect,
            superset_of: def.superset_of.clone(),
            modes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    pub fn disable_autodetect(&self) -> bool {
        self.disable_autodetect
    }

    pub fn superset_of(&self) -> Option<&str> {
        self.superset_of.as_deref()
    }

    pub fn mode_count(&self) -> usize {
        self.modes.len()
    }

    pub fn root(&self) -> &CompiledMode {
        self.mode(ROOT_MODE)
    }

    /// Ids only ever come from this language's own arena.
    pub fn mode(&self, id: ModeId) -> &CompiledMode {
        &self.modes[id]
    }
}
