//! Error types for grammar loading, compilation and scanning
//!
//!     Four families, matching where a failure can happen:
//!
//!         - [DefinitionError]: the grammar document itself does not deserialize.
//!         - [CompileError]: the grammar deserialized but is malformed. Always fatal at
//!           registration time; the grammar is not registered.
//!         - [ScanError]: a scan could not produce a result. Unknown grammar names, illegal
//!           lexemes under the strict policy and forward-progress guard violations.
//!         - [GrammarError]: either of the first two, for the parse-and-register helpers.

use std::fmt;
use thiserror::Error;

/// A grammar document could not be deserialized.
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("invalid YAML grammar: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON grammar: {0}")]
    Json(#[from] serde_json::Error),
}

/// A grammar is malformed.
///
/// `mode` fields hold a human readable label for the offending mode: its scope when it has
/// one, otherwise its begin pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("mode `{mode}`: beforeMatch cannot be combined with starts")]
    BeforeMatchWithStarts { mode: String },

    #[error("mode `{mode}`: match cannot be combined with begin or end")]
    MatchWithBeginEnd { mode: String },

    #[error("mode `{mode}`: a multi-part {delimiter} pattern cannot be combined with `{flag}`")]
    MultiPartWithFlag {
        mode: String,
        delimiter: Delimiter,
        flag: &'static str,
    },

    #[error("mode `{mode}`: a multi-part {delimiter} pattern needs a {delimiter}Scope map of group numbers")]
    CaptureScopeShape { mode: String, delimiter: Delimiter },

    #[error("mode `{mode}`: capture scope key `{key}` is not a group number")]
    InvalidCaptureScope { mode: String, key: usize },

    #[error("language `{language}`: `self` cannot be a direct child of the root mode")]
    TopLevelSelf { language: String },

    #[error("unknown mode reference `{name}`")]
    UnknownModeReference { name: String },

    #[error("mode `{mode}`: endsWithParent copies nest deeper than {limit} levels")]
    NestingTooDeep { mode: String, limit: usize },

    #[error("invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("built-in mode library does not parse: {message}")]
    Library { message: String },
}

/// Which side of a mode a multi-part pattern sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Begin,
    End,
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Begin => write!(f, "begin"),
            Delimiter::End => write!(f, "end"),
        }
    }
}

/// Either half of loading a grammar from a document.
#[derive(Debug, Error)]
pub enum GrammarError {
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    #[error(transparent)]
    Compile(#[from] CompileError),
}

/// Where an illegal lexeme was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IllegalContext {
    /// The text matched by the illegal pattern (may be empty).
    pub lexeme: String,
    /// Label of the mode whose illegal pattern matched.
    pub mode: String,
    /// Byte offset of the lexeme in the scanned text.
    pub offset: usize,
    /// Up to 100 characters either side of the offset.
    pub context: String,
}

impl fmt::Display for IllegalContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "illegal lexeme {:?} for mode `{}` at offset {}",
            self.lexeme, self.mode, self.offset
        )
    }
}

/// Why the engine gave up on making progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoProgressReason {
    /// A zero-width end matched right where a mode began (strict mode only).
    ZeroWidthMatch,
    /// The loop ran far more iterations than the input could justify.
    Runaway,
}

impl fmt::Display for NoProgressReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoProgressReason::ZeroWidthMatch => write!(f, "zero-width match"),
            NoProgressReason::Runaway => write!(f, "runaway iteration count"),
        }
    }
}

/// A scan could not produce a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("unknown language `{0}`")]
    UnknownGrammar(String),

    #[error("{0}")]
    IllegalLexeme(Box<IllegalContext>),

    #[error("{language}: no progress in mode `{mode}` at offset {offset} ({reason})")]
    NoProgress {
        language: String,
        mode: String,
        offset: usize,
        reason: NoProgressReason,
    },

    #[error(transparent)]
    Compile(#[from] CompileError),
}
