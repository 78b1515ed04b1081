//! Grammar data model
//!
//!     Grammars are plain data. A [LanguageDef] deserializes from YAML or JSON and holds the root
//!     mode, named shared modes and language metadata. Nothing here is validated beyond its
//!     shape: the [compiler](crate::glint::compiling) is where a definition is accepted or
//!     rejected.
//!
//!     Modes may reference the built-in [library] with the `common.` prefix, for instance
//!     `contains: [common.c_line_comment, common.quote_string]`.

pub mod language_def;
pub mod library;
pub mod mode_spec;

pub use language_def::LanguageDef;
pub use mode_spec::{
    Hook, KeywordCategories, KeywordSpec, ModeRef, ModeSpec, OneOrMany, Pattern, ScopeSpec,
    SubLanguage,
};
