//! Regex multiplexer
//!
//!     Every compiled mode has an ordered list of rules: the begin patterns of its children in
//!     declaration order, then its terminator, then its illegal pattern. Rather than trying each
//!     rule at the cursor and keeping the leftmost match, the rules are joined into a single
//!     alternation `(r1)|(r2)|...` and run once. The regex engine returns the leftmost match
//!     across all alternatives and, at equal offsets, the alternative that comes first. That
//!     ordering is what lets earlier children shadow later ones.
//!
//!     The rule that matched is the first one whose wrapper group participated in the match.
//!     Wrapper group numbers are laid out from each rule's own group count:
//!
//!         rule 0 -> group 1,     its inner groups 2..=1+n0
//!         rule 1 -> group 2+n0,  ...
//!
//! Resuming
//!
//!     When a begin match is rejected by a hook, the scan retries at the same offset but only
//!     with the rules after the rejected one. [ResumableMatcher] keeps one lazily compiled
//!     multiplexer per starting rule for that purpose. If the narrowed search does not match at
//!     exactly the same offset, the search falls back to the full rule set one character further
//!     on, so a rejection never hides a later match of an earlier rule.

use super::language::ModeId;
use super::regex_source::{build_regex, join_patterns};
use crate::glint::error::CompileError;
use once_cell::sync::OnceCell;
use onig::{Region, SearchOptions};

/// What a rule means to the scan engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Begin of the given child mode.
    Begin(ModeId),
    /// The mode's terminator (its own end, possibly spliced with its parent's).
    End,
    /// The mode's illegal pattern.
    Illegal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub source: String,
    pub kind: RuleKind,
}

impl Rule {
    pub fn new(source: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            source: source.into(),
            kind,
        }
    }
}

/// One match of a multiplexer, with groups numbered relative to the winning rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub kind: RuleKind,
    /// Byte offset of the match start.
    pub index: usize,
    /// Byte offset of the match end.
    pub end: usize,
    /// `groups[0]` is the whole match, `groups[k]` the k-th group of the rule's own pattern.
    pub groups: Vec<Option<(usize, usize)>>,
}

impl RuleMatch {
    pub fn text<'t>(&self, source: &'t str) -> &'t str {
        &source[self.index..self.end]
    }

    pub fn group<'t>(&self, source: &'t str, group: usize) -> Option<&'t str> {
        self.groups
            .get(group)
            .copied()
            .flatten()
            .map(|(start, end)| &source[start..end])
    }

    pub fn is_empty(&self) -> bool {
        self.index == self.end
    }
}

#[derive(Debug, Clone, Copy)]
struct RuleSlot {
    group: usize,
    captures: usize,
    kind: RuleKind,
}

/// A set of rules joined into one alternation.
#[derive(Debug)]
pub struct MultiRegex {
    regex: onig::Regex,
    slots: Vec<RuleSlot>,
}

impl MultiRegex {
    pub fn compile(rules: &[Rule], case_insensitive: bool) -> Result<Self, CompileError> {
        let mut slots = Vec::with_capacity(rules.len());
        let mut group = 1;
        for rule in rules {
            let captures = build_regex(&rule.source, case_insensitive)?.captures_len();
            slots.push(RuleSlot {
                group,
                captures,
                kind: rule.kind,
            });
            group += captures + 1;
        }

        let sources: Vec<&str> = rules.iter().map(|rule| rule.source.as_str()).collect();
        let regex = build_regex(&join_patterns(&sources, "|"), case_insensitive)?;
        Ok(Self { regex, slots })
    }

    /// Leftmost match at or after `from`, with the position of the winning rule in this set.
    pub fn exec(&self, text: &str, from: usize) -> Option<(usize, RuleMatch)> {
        let mut region = Region::new();
        self.regex.search_with_options(
            text,
            from,
            text.len(),
            SearchOptions::SEARCH_OPTION_NONE,
            Some(&mut region),
        )?;

        let (position, slot) = self
            .slots
            .iter()
            .enumerate()
            .find(|(_, slot)| region.pos(slot.group).is_some())?;
        let (index, end) = region.pos(slot.group)?;
        let groups = (0..=slot.captures)
            .map(|k| region.pos(slot.group + k))
            .collect();

        Some((
            position,
            RuleMatch {
                kind: slot.kind,
                index,
                end,
                groups,
            },
        ))
    }
}

/// A multiplexer that can resume after a rejected begin match.
#[derive(Debug)]
pub struct ResumableMatcher {
    rules: Vec<Rule>,
    case_insensitive: bool,
    suffixes: Vec<OnceCell<Option<MultiRegex>>>,
}

impl ResumableMatcher {
    /// Build the matcher. The full rule set is compiled right away so that bad patterns
    /// surface at compile time.
    pub fn new(rules: Vec<Rule>, case_insensitive: bool) -> Result<Self, CompileError> {
        let suffixes = (0..=rules.len()).map(|_| OnceCell::new()).collect();
        let matcher = Self {
            rules,
            case_insensitive,
            suffixes,
        };
        matcher.suffix(0)?;
        Ok(matcher)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    fn suffix(&self, start: usize) -> Result<Option<&MultiRegex>, CompileError> {
        let Some(cell) = self.suffixes.get(start) else {
            return Ok(None);
        };
        cell.get_or_try_init(|| {
            let rest = &self.rules[start..];
            if rest.is_empty() {
                Ok(None)
            } else {
                MultiRegex::compile(rest, self.case_insensitive).map(Some)
            }
        })
        .map(Option::as_ref)
    }

    /// Find the next match at or after `from`, considering rules from `start` onwards.
    ///
    /// Returns the match and the rule index to resume from should this match be rejected;
    /// that index wraps to 0 once every rule has been tried.
    pub fn exec(
        &self,
        text: &str,
        from: usize,
        start: usize,
    ) -> Result<Option<(RuleMatch, usize)>, CompileError> {
        let mut found = self
            .suffix(start)?
            .and_then(|regex| regex.exec(text, from))
            .map(|(position, m)| (start + position, m));

        if start != 0 {
            let resumed_in_place = matches!(&found, Some((_, m)) if m.index == from);
            if !resumed_in_place {
                found = match next_char_boundary(text, from) {
                    Some(next) => self.suffix(0)?.and_then(|regex| regex.exec(text, next)),
                    None => None,
                };
            }
        }

        Ok(found.map(|(absolute, m)| {
            let mut resume = absolute + 1;
            if resume >= self.rules.len() {
                resume = 0;
            }
            (m, resume)
        }))
    }
}

/// Byte offset of the character after the one at `at`, or `None` at the end of `text`.
pub(crate) fn next_char_boundary(text: &str, at: usize) -> Option<usize> {
    text.get(at..)
        .and_then(|rest| rest.chars().next())
        .map(|ch| at + ch.len_utf8())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(sources: &[&str]) -> Vec<Rule> {
        sources
            .iter()
            .enumerate()
            .map(|(i, source)| Rule::new(*source, RuleKind::Begin(i)))
            .collect()
    }

    #[test]
    fn test_leftmost_match_wins_over_declaration_order() {
        let multi = MultiRegex::compile(&rules(&["b", "a"]), false).unwrap();
        let (position, m) = multi.exec("xab", 0).unwrap();
        assert_eq!(position, 1);
        assert_eq!((m.index, m.end), (1, 2));
    }

    #[test]
    fn test_earlier_rule_wins_at_same_offset() {
        let multi = MultiRegex::compile(&rules(&["ab", "a"]), false).unwrap();
        let (position, _) = multi.exec("ab", 0).unwrap();
        assert_eq!(position, 0);

        let multi = MultiRegex::compile(&rules(&["a", "ab"]), false).unwrap();
        let (position, m) = multi.exec("ab", 0).unwrap();
        assert_eq!(position, 0);
        assert_eq!(m.end, 1);
    }

    #[test]
    fn test_groups_are_relative_to_the_rule() {
        let multi = MultiRegex::compile(&rules(&["(x)(y)", "(a)(b)"]), false).unwrap();
        let (position, m) = multi.exec("ab", 0).unwrap();
        assert_eq!(position, 1);
        assert_eq!(m.group("ab", 1), Some("a"));
        assert_eq!(m.group("ab", 2), Some("b"));
        assert_eq!(m.group("ab", 3), None);
    }

    #[test]
    fn test_case_insensitive_rules() {
        let multi = MultiRegex::compile(&rules(&["select"]), true).unwrap();
        assert!(multi.exec("SELECT", 0).is_some());
    }

    #[test]
    fn test_resume_skips_rejected_rules_at_same_offset() {
        let mut all = rules(&["a", "a"]);
        all.push(Rule::new("z", RuleKind::End));
        let matcher = ResumableMatcher::new(all, false).unwrap();

        let (m, resume) = matcher.exec("a", 0, 0).unwrap().unwrap();
        assert_eq!(m.kind, RuleKind::Begin(0));
        assert_eq!(resume, 1);

        let (m, resume) = matcher.exec("a", 0, resume).unwrap().unwrap();
        assert_eq!(m.kind, RuleKind::Begin(1));
        assert_eq!(resume, 2);

        // Only the terminator is left and it does not match here or further on.
        assert!(matcher.exec("a", 0, resume).unwrap().is_none());
    }

    #[test]
    fn test_resume_falls_back_one_character_further() {
        let mut all = rules(&["a", "b"]);
        all.push(Rule::new("c", RuleKind::End));
        let matcher = ResumableMatcher::new(all, false).unwrap();

        // Rule 0 rejected at offset 0; the remaining rules only match later, so the full set
        // is searched again from offset 1 and finds rule 0 first.
        let (m, _) = matcher.exec("aac", 0, 1).unwrap().unwrap();
        assert_eq!(m.kind, RuleKind::Begin(0));
        assert_eq!(m.index, 1);
    }

    #[test]
    fn test_next_char_boundary_handles_multibyte() {
        assert_eq!(next_char_boundary("é!", 0), Some(2));
        assert_eq!(next_char_boundary("é!", 2), Some(3));
        assert_eq!(next_char_boundary("é!", 3), None);
    }
}
