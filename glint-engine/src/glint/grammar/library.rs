//! Built-in mode library
//!
//!     Common modes shared by many grammars: strings, comments, numbers. They are stored as YAML
//!     next to the bundled grammars and referenced as `common.<name>`.

use super::mode_spec::ModeSpec;
use crate::glint::error::CompileError;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Prefix that routes a mode reference to this library.
pub const LIBRARY_PREFIX: &str = "common.";

const LIBRARY_YAML: &str = include_str!("../../../grammars/common.yaml");

static LIBRARY: Lazy<Result<BTreeMap<String, ModeSpec>, String>> =
    Lazy::new(|| serde_yaml::from_str(LIBRARY_YAML).map_err(|err| err.to_string()));

fn library() -> Result<&'static BTreeMap<String, ModeSpec>, CompileError> {
    LIBRARY.as_ref().map_err(|message| CompileError::Library {
        message: message.clone(),
    })
}

/// Look up a library mode by its reference (`common.quote_string`). References without the
/// prefix are not library references and yield `None`.
pub fn lookup(reference: &str) -> Result<Option<&'static ModeSpec>, CompileError> {
    let Some(name) = reference.strip_prefix(LIBRARY_PREFIX) else {
        return Ok(None);
    };
    Ok(library()?.get(name))
}

/// Names of every library mode, without the prefix.
pub fn names() -> Result<impl Iterator<Item = &'static str>, CompileError> {
    Ok(library()?.keys().map(String::as_str))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glint::grammar::{ModeRef, ScopeSpec};

    #[test]
    fn test_library_parses() {
        assert!(names().unwrap().count() >= 10);
    }

    #[test]
    fn test_lookup_requires_prefix() {
        assert!(lookup("common.quote_string").unwrap().is_some());
        assert!(lookup("quote_string").unwrap().is_none());
        assert!(lookup("common.nope").unwrap().is_none());
    }

    #[test]
    fn test_comments_carry_doctags() {
        let comment = lookup("common.c_line_comment").unwrap().unwrap();
        assert_eq!(comment.scope, Some(ScopeSpec::from("comment")));
        let contains = comment.contains.as_ref().unwrap();
        assert!(contains.contains(&ModeRef::Named("common.doctag".into())));
    }
}
