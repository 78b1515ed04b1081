//! Match-time hooks
//!
//!     Hooks are the only way a grammar can veto a match after the regex engine accepted it.
//!     A vetoed begin makes the engine retry at the same offset with the rules after the
//!     rejected one; a vetoed end lets the match fall through to an enclosing mode or to text.

use crate::glint::compiling::RuleMatch;
use crate::glint::grammar::Hook;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BeginResponse {
    /// Keep the match, storing the data (if any) in the new activation record.
    Accept(Option<String>),
    Reject,
}

pub(crate) fn on_begin(hook: Hook, code: &str, m: &RuleMatch) -> BeginResponse {
    match hook {
        Hook::RejectUnlessAtStart if m.index != 0 => BeginResponse::Reject,
        Hook::RejectAfterMemberAccess if preceded_by_dot(code, m.index) => BeginResponse::Reject,
        Hook::CaptureBeginMatch => BeginResponse::Accept(m.group(code, 1).map(str::to_string)),
        _ => BeginResponse::Accept(None),
    }
}

/// Whether an end match stands. `data` is what the activation being ended captured on begin.
pub(crate) fn on_end(hook: Hook, code: &str, m: &RuleMatch, data: Option<&str>) -> bool {
    match hook {
        Hook::RejectUnlessAtStart => m.index == 0,
        Hook::RejectAfterMemberAccess => !preceded_by_dot(code, m.index),
        Hook::CaptureBeginMatch => true,
        Hook::RequireBeginMatch => m.group(code, 1) == data,
    }
}

fn preceded_by_dot(code: &str, index: usize) -> bool {
    code[..index].ends_with('.')
}
