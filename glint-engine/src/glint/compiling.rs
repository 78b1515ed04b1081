//! Compiling grammars
//!
//!     A [LanguageDef](crate::glint::grammar::LanguageDef) compiles in two passes:
//!
//!         1. Lowering resolves references, expands variants and removes sugar. The result is a
//!            flat arena of modes that still hold regex sources.
//!         2. The [mode compiler](mode_compiler) fixes defaults, splices terminators for modes
//!            that end with their parent and builds one [multiplexer](multiplexer) per mode.
//!
//!     Compiled languages are immutable and are shared between scans behind an `Arc`.

pub mod keywords;
pub mod language;
mod lowering;
pub mod mode_compiler;
pub mod multiplexer;
pub mod regex_source;

pub use keywords::{Keyword, KeywordTable, MAX_KEYWORD_HITS};
pub use language::{CaptureScopes, CompiledMode, DelimiterScope, Language, ModeId, ROOT_MODE};
pub use lowering::ModeFlags;
pub use multiplexer::{ResumableMatcher, Rule, RuleKind, RuleMatch};
