//! Regex source handling
//!
//!     Grammar patterns are joined into larger regexes in two places: multi-part begin/end
//!     patterns are concatenated, and every mode's candidate patterns are joined into one
//!     alternation. Each joined piece is wrapped in its own capture group, which shifts the
//!     numbering of every group after it, so backreferences inside a piece must be rewritten.
//!
//!     The source is tokenized with logos into the handful of constructs that matter for group
//!     numbering. Character classes are one token (a `(` inside `[...]` opens nothing), escapes
//!     are one token (`\(` opens nothing), `(?` opens a non-capturing group and a bare `(` opens
//!     a capturing one. Everything else passes through untouched.
//!
//!     All grammar regexes are compiled with Oniguruma (Ruby syntax) since grammars rely on
//!     backreferences and lookahead. `^` and `$` match at line boundaries and `.` does not
//!     match a newline.

use crate::glint::error::CompileError;
use logos::Logos;
use onig::{Regex, RegexOptions, Syntax};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum Piece {
    #[regex(r"\[([^\\\]]|\\.)*\]")]
    CharClass,

    #[token("(?")]
    OpenNonCapturing,

    #[token("(")]
    OpenCapturing,

    #[regex(r"\\[1-9][0-9]*", |lex| lex.slice()[1..].parse::<usize>().ok(), priority = 5)]
    BackReference(usize),

    #[regex(r"\\.")]
    Escape,

    #[regex(r"[^\[(\\]+")]
    Literal,
}

/// Join `patterns` with `separator`, wrapping each in a capture group.
///
/// Backreferences are local to the pattern they appear in: `\1` inside the second pattern keeps
/// pointing at that pattern's own first group after the join.
pub fn join_patterns<S: AsRef<str>>(patterns: &[S], separator: &str) -> String {
    let mut opened = 0;
    let mut joined = Vec::with_capacity(patterns.len());

    for pattern in patterns {
        let source = pattern.as_ref();
        opened += 1;
        let offset = opened;

        let mut out = String::with_capacity(source.len() + 2);
        out.push('(');
        let mut lexer = Piece::lexer(source);
        while let Some(piece) = lexer.next() {
            match piece {
                Ok(Piece::BackReference(number)) => {
                    out.push('\\');
                    out.push_str(&(number + offset).to_string());
                }
                Ok(Piece::OpenCapturing) => {
                    opened += 1;
                    out.push('(');
                }
                _ => out.push_str(lexer.slice()),
            }
        }
        out.push(')');
        joined.push(out);
    }

    joined.join(separator)
}

/// Compile a grammar pattern.
pub fn build_regex(source: &str, case_insensitive: bool) -> Result<Regex, CompileError> {
    let options = if case_insensitive {
        RegexOptions::REGEX_OPTION_IGNORECASE
    } else {
        RegexOptions::REGEX_OPTION_NONE
    };
    Regex::with_options(source, options, Syntax::default()).map_err(|err| {
        CompileError::InvalidPattern {
            pattern: source.to_string(),
            message: err.to_string(),
        }
    })
}

/// Number of capture groups in `source`, as counted by the regex engine.
pub fn count_groups(source: &str) -> Result<usize, CompileError> {
    Ok(build_regex(source, false)?.captures_len())
}

/// Whether `regex` matches exactly at byte offset `at` of `text`.
pub fn matches_at(regex: &Regex, text: &str, at: usize) -> bool {
    regex
        .match_with_options(text, at, onig::SearchOptions::SEARCH_OPTION_NONE, None)
        .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_wraps_each_pattern() {
        assert_eq!(join_patterns(&["a", "b"], "|"), "(a)|(b)");
        assert_eq!(join_patterns(&["a", "b"], ""), "(a)(b)");
    }

    #[test]
    fn test_backreferences_shift_by_preceding_groups() {
        assert_eq!(join_patterns(&["(a)", r"(b)\1"], ""), r"((a))((b)\4)");
        assert_eq!(join_patterns(&[r"(x)(y)\2"], ""), r"((x)(y)\3)");
    }

    #[test]
    fn test_non_capturing_groups_and_classes_are_not_counted() {
        assert_eq!(join_patterns(&["(?:a)[(]", r"(b)\1"], "|"), r"((?:a)[(])|((b)\3)");
        assert_eq!(join_patterns(&[r"\((c)", r"(d)\1"], "|"), r"(\((c))|((d)\4)");
    }

    #[test]
    fn test_escaped_brackets_inside_class() {
        assert_eq!(join_patterns(&[r"[\]()](d)", r"(e)\1"], ""), r"([\]()](d))((e)\4)");
    }

    #[test]
    fn test_count_groups() {
        assert_eq!(count_groups("a(b)(?:c)(d(e))").unwrap(), 3);
        assert_eq!(count_groups("[(]").unwrap(), 0);
    }

    #[test]
    fn test_invalid_pattern_reports_source() {
        match build_regex("(unclosed", false) {
            Err(CompileError::InvalidPattern { pattern, .. }) => assert_eq!(pattern, "(unclosed"),
            other => panic!("expected invalid pattern, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_matches_at_is_anchored() {
        let regex = build_regex("b+", false).unwrap();
        assert!(matches_at(&regex, "abb", 1));
        assert!(!matches_at(&regex, "abb", 0));
    }
}
