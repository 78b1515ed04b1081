//! # glint
//!
//! A grammar-driven lexical highlighter.
//!
//! File Layout
//!
//! The engine lives under `src/glint`, one directory per pipeline stage:
//! src/glint
//!   ├── grammar      Author-facing grammar data model (serde) and the built-in mode library
//!   ├── compiling    Mode compiler, regex multiplexer, keyword tables
//!   ├── scanning     The scan engine and its hooks
//!   ├── emitting     Token tree emitter and HTML rendering
//!   └── registry     Registry, configuration and auto-detection
//!
//! A grammar goes in as data, gets compiled once into an arena of modes, and is then scanned
//! any number of times. See [glint](glint) for the end to end walkthrough.

pub mod glint;

pub use glint::emitting::{Emitter, HtmlRenderer, TokenNode, TokenTree};
pub use glint::error::{CompileError, DefinitionError, GrammarError, ScanError};
pub use glint::grammar::LanguageDef;
pub use glint::registry::{HighlightConfig, Registry};
pub use glint::scanning::{IllegalPolicy, ScanOptions, ScanResult};
