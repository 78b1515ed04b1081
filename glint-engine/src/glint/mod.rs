//! Highlighting engine for the glint toolchain
//!
//!     Source text goes through these stages:
//!         1. Grammar: a language is declared as data. See [grammar](crate::glint::grammar).
//!         2. Compiling: the declaration becomes an arena of compiled modes. See
//!            [compiling](crate::glint::compiling).
//!         3. Scanning: a stack machine walks the text once. See [scanning](crate::glint::scanning).
//!         4. Emitting: scopes and text accumulate into a token tree. See
//!            [emitting](crate::glint::emitting).
//!
//! Highlighting End To End
//!
//!     Grammar (1):
//!         A mode is a lexical region: a begin pattern, an end pattern, the keywords that apply
//!         inside it and the child modes that may open within it. Modes reference each other by
//!         name or as "self", so grammars are graphs, not trees.
//!
//!     Compiling (2):
//!         Every reachable mode is compiled once into a flat arena and addressed by index. Each
//!         compiled mode carries one multiplexed regex over all of its candidate next matches:
//!         the begins of its children, its own terminator and its illegal pattern.
//!
//!     Scanning (3):
//!         The engine keeps a stack of activation records. At each step it runs the multiplexer
//!         of the top mode, and the winning alternative decides whether a child opens, the
//!         current mode closes or the input is illegal. Text between matches is buffered and
//!         classified by the keyword table of the mode it ends up in.
//!
//!     Emitting (4):
//!         The emitter receives open/close/text calls and builds a tree. The leaves of the tree,
//!         in order, are always exactly the input text.
//!
//!     Auto-detection is a thin layer on top: scan with every candidate, keep the best two.

pub mod bundled;
pub mod compiling;
pub mod detection;
pub mod emitting;
pub mod error;
pub mod grammar;
pub mod registry;
pub mod scanning;
pub mod testing;
