//! Mode compiler
//!
//!     Turns the lowered arena into compiled modes. Most modes compile exactly once. The exception
//!     is a mode that depends on its parent: one with `endsWithParent` (or whose continuation
//!     chain has it) splices the parent's terminator into its own, so it is compiled once per
//!     distinct parent. A reference cycle through such modes would keep producing new copies,
//!     hence the nesting limit.
//!
//!     Per mode, in order:
//!         1. Defaults: a non-root mode without a begin begins anywhere (`\B|\b`). Without an
//!            end, and not ending with its parent, it ends anywhere as well.
//!         2. Terminator: the end pattern, with the parent's terminator appended for
//!            `endsWithParent` modes.
//!         3. Keyword table.
//!         4. Children, each compiled with this mode as parent. "self" is this mode's own id.
//!         5. Continuation (`starts`), compiled with this mode's parent.
//!         6. The multiplexer: children's begins, then the terminator, then the illegal pattern.
//!
//!     Begin patterns and terminators are recorded before children compile, so a child that
//!     refers back to a mode still being compiled sees everything it needs.

use super::keywords::KeywordTable;
use super::language::{CompiledMode, ModeId};
use super::lowering::{Child, LoweredMode, Lowering, SpecId, ROOT_SPEC};
use super::multiplexer::{ResumableMatcher, Rule, RuleKind};
use super::regex_source::build_regex;
use crate::glint::error::CompileError;
use crate::glint::grammar::LanguageDef;
use std::collections::HashMap;

/// Matches at every position without consuming anything.
pub const ANYWHERE: &str = r"\B|\b";

/// Limit on nested compilation, which only grows through parent-dependent copies.
pub const MAX_NESTING: usize = 64;

struct Slot {
    begin: String,
    terminator: String,
    mode: Option<CompiledMode>,
}

pub(crate) struct ModeCompiler<'d> {
    def: &'d LanguageDef,
    language: &'d str,
    case_insensitive: bool,
    slots: Vec<Slot>,
    cache: HashMap<(SpecId, Option<ModeId>), ModeId>,
    depth: usize,
}

impl<'d> ModeCompiler<'d> {
    pub fn new(def: &'d LanguageDef, language: &'d str, case_insensitive: bool) -> Self {
        Self {
            def,
            language,
            case_insensitive,
            slots: Vec::new(),
            cache: HashMap::new(),
            depth: 0,
        }
    }

    pub fn compile(mut self) -> Result<Vec<CompiledMode>, CompileError> {
        let lowered = Lowering::new(self.def, self.language).lower()?;
        self.compile_mode(&lowered, ROOT_SPEC, None)?;
        Ok(self.slots.into_iter().filter_map(|slot| slot.mode).collect())
    }

    fn compile_mode(
        &mut self,
        lowered: &[LoweredMode],
        spec: SpecId,
        parent: Option<ModeId>,
    ) -> Result<ModeId, CompileError> {
        let key = if depends_on_parent(lowered, spec) {
            (spec, parent)
        } else {
            (spec, None)
        };
        if let Some(&id) = self.cache.get(&key) {
            return Ok(id);
        }
        if self.depth >= MAX_NESTING {
            return Err(CompileError::NestingTooDeep {
                mode: lowered[spec].label.clone(),
                limit: MAX_NESTING,
            });
        }

        self.depth += 1;
        let result = self.compile_new(lowered, spec, parent, key);
        self.depth -= 1;
        result
    }

    fn compile_new(
        &mut self,
        lowered: &[LoweredMode],
        spec: SpecId,
        parent: Option<ModeId>,
        key: (SpecId, Option<ModeId>),
    ) -> Result<ModeId, CompileError> {
        let node = &lowered[spec];
        let id = self.slots.len();
        self.cache.insert(key, id);

        // Only the root is compiled without a parent; it has no delimiters of its own.
        let nested = parent.is_some();
        let begin = match (&node.begin, nested) {
            (Some(begin), _) => begin.clone(),
            (None, true) => ANYWHERE.to_string(),
            (None, false) => String::new(),
        };
        let end = match (&node.end, nested) {
            (_, false) => None,
            (Some(end), true) => Some(end.clone()),
            (None, true) if !node.flags.ends_with_parent => Some(ANYWHERE.to_string()),
            (None, true) => None,
        };
        let end_regex = end
            .as_deref()
            .map(|source| build_regex(source, self.case_insensitive))
            .transpose()?;

        let mut terminator = end.clone().unwrap_or_default();
        if node.flags.ends_with_parent {
            if let Some(parent_terminator) = parent
                .map(|p| self.slots[p].terminator.as_str())
                .filter(|t| !t.is_empty())
            {
                if end.is_some() {
                    terminator.push('|');
                }
                terminator.push_str(parent_terminator);
            }
        }

        let keywords = node
            .keywords
            .as_ref()
            .map(|spec| KeywordTable::compile(spec, self.case_insensitive, &self.def.class_name_aliases))
            .transpose()?;

        self.slots.push(Slot {
            begin,
            terminator: terminator.clone(),
            mode: None,
        });

        let mut contains = Vec::with_capacity(node.contains.len());
        for child in &node.contains {
            let child_id = match child {
                Child::Enclosing => id,
                Child::Spec(child_spec) => self.compile_mode(lowered, *child_spec, Some(id))?,
            };
            contains.push(child_id);
        }
        let starts = match node.starts {
            Some(starts) => Some(self.compile_mode(lowered, starts, parent)?),
            None => None,
        };

        let mut rules: Vec<Rule> = contains
            .iter()
            .map(|&child| Rule::new(self.slots[child].begin.clone(), RuleKind::Begin(child)))
            .collect();
        if !terminator.is_empty() {
            rules.push(Rule::new(terminator, RuleKind::End));
        }
        if let Some(illegal) = &node.illegal {
            rules.push(Rule::new(illegal.clone(), RuleKind::Illegal));
        }
        let matcher = ResumableMatcher::new(rules, self.case_insensitive)?;

        self.slots[id].mode = Some(CompiledMode {
            label: node.label.clone(),
            scope: node.scope.clone(),
            begin_scope: node.begin_scope.clone(),
            end_scope: node.end_scope.clone(),
            end: end_regex,
            keywords,
            relevance: node.relevance,
            contains,
            starts,
            sub_language: node.sub_language.clone(),
            flags: node.flags,
            before_begin: node.before_begin,
            on_begin: node.on_begin,
            on_end: node.on_end,
            matcher,
        });
        Ok(id)
    }
}

/// Whether a mode's compiled form depends on its parent: it ends with its parent, or its
/// continuation chain reaches one that does.
fn depends_on_parent(lowered: &[LoweredMode], spec: SpecId) -> bool {
    let mut current = Some(spec);
    for _ in 0..lowered.len() {
        let Some(id) = current else {
            return false;
        };
        if lowered[id].flags.ends_with_parent {
            return true;
        }
        current = lowered[id].starts;
    }
    false
}
