//! Language definitions
//!
//!     A [LanguageDef] is the root mode of a grammar plus its metadata. The root mode's fields
//!     sit at the top level of the document, next to `name`, `aliases` and friends:
//!
//!         name: brace
//!         aliases: [br]
//!         modes:
//!           block: {scope: block, begin: '\{', end: '\}', contains: [self]}
//!         contains: [block]

use super::mode_spec::{ModeSpec, OneOrMany};
use crate::glint::error::DefinitionError;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageDef {
    pub name: Option<String>,
    pub aliases: Option<OneOrMany>,
    #[serde(default)]
    pub case_insensitive: bool,
    #[serde(default)]
    pub disable_autodetect: bool,
    pub superset_of: Option<String>,
    #[serde(default)]
    pub class_name_aliases: HashMap<String, String>,
    /// Named modes, referenced by name from `contains`, `starts` and `extends`.
    #[serde(default)]
    pub modes: BTreeMap<String, ModeSpec>,
    #[serde(flatten)]
    pub root: ModeSpec,
}

impl LanguageDef {
    pub fn from_yaml(source: &str) -> Result<Self, DefinitionError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_json(source: &str) -> Result<Self, DefinitionError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn alias_list(&self) -> Vec<String> {
        self.aliases.as_ref().map(OneOrMany::to_vec).unwrap_or_default()
    }
}
