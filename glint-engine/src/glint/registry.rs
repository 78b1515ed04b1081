//! Language registry
//!
//!     A [Registry] owns compiled languages by name and is the entry point for scans and
//!     auto-detection. There is no global registry: callers build one, register languages
//!     during setup and then share it read-only. Compiled languages sit behind `Arc`, so a scan
//!     never holds a borrow of the registry's maps beyond its lookup.
//!
//!     Names and aliases are case-insensitive. Registering a name again replaces the language
//!     and drops the aliases the old one had.

use crate::glint::compiling::Language;
use crate::glint::detection::{self, Detection};
use crate::glint::emitting::{Emitter, TokenTree};
use crate::glint::error::{CompileError, GrammarError, ScanError};
use crate::glint::grammar::LanguageDef;
use crate::glint::scanning::engine::Scanner;
use crate::glint::scanning::{ScanOptions, ScanResult, DEFAULT_ITERATION_FLOOR};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Registry-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Overrides every grammar's own case-insensitivity flag when set.
    pub case_insensitive: Option<bool>,
    /// Illegal lexemes abort with a flagged result instead of failing, for [Registry::highlight].
    pub permissive: bool,
    pub safe_mode: bool,
    /// Auto-detection candidates when none are given. Empty means every language.
    pub languages: Vec<String>,
    pub iteration_floor: usize,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            case_insensitive: None,
            permissive: true,
            safe_mode: true,
            languages: Vec::new(),
            iteration_floor: DEFAULT_ITERATION_FLOOR,
        }
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    languages: HashMap<String, Arc<Language>>,
    aliases: HashMap<String, String>,
    config: HighlightConfig,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: HighlightConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &HighlightConfig {
        &self.config
    }

    /// Compile and store `def` under `name` and its declared aliases.
    pub fn register(&mut self, name: &str, def: &LanguageDef) -> Result<(), CompileError> {
        let key = name.to_lowercase();
        let language = match Language::compile(&key, def, self.config.case_insensitive) {
            Ok(language) => language,
            Err(err) => {
                warn!(language = %key, error = %err, "grammar rejected");
                return Err(err);
            }
        };

        self.aliases.retain(|_, target| *target != key);
        for alias in language.aliases() {
            self.aliases.insert(alias.to_lowercase(), key.clone());
        }
        debug!(language = %key, modes = language.mode_count(), "registered");
        self.languages.insert(key, Arc::new(language));
        Ok(())
    }

    pub fn register_yaml(&mut self, name: &str, yaml: &str) -> Result<(), GrammarError> {
        let def = LanguageDef::from_yaml(yaml)?;
        Ok(self.register(name, &def)?)
    }

    pub fn register_json(&mut self, name: &str, json: &str) -> Result<(), GrammarError> {
        let def = LanguageDef::from_json(json)?;
        Ok(self.register(name, &def)?)
    }

    /// Remove a language and every alias pointing at it.
    pub fn unregister(&mut self, name: &str) {
        let key = name.to_lowercase();
        if self.languages.remove(&key).is_some() {
            debug!(language = %key, "unregistered");
        }
        self.aliases.retain(|_, target| *target != key);
    }

    pub fn register_aliases<I, S>(&mut self, aliases: I, language: &str)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let target = language.to_lowercase();
        for alias in aliases {
            self.aliases.insert(alias.as_ref().to_lowercase(), target.clone());
        }
    }

    /// Look a language up by name or alias.
    pub fn get_language(&self, name: &str) -> Option<Arc<Language>> {
        let key = name.to_lowercase();
        let key = self.aliases.get(&key).unwrap_or(&key);
        self.languages.get(key).cloned()
    }

    /// Registered names (not aliases), sorted.
    pub fn list_languages(&self) -> Vec<String> {
        let mut names: Vec<String> = self.languages.keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether `name` takes part in auto-detection.
    pub fn auto_detection(&self, name: &str) -> bool {
        self.get_language(name)
            .is_some_and(|language| !language.disable_autodetect())
    }

    /// Scan into a [TokenTree] with this registry's settings.
    pub fn scan(&self, code: &str, name: &str, permissive: bool) -> Result<ScanResult, ScanError> {
        self.scan_with::<TokenTree>(code, name, ScanOptions::from_config(&self.config, permissive))
    }

    /// Scan with the configured default for permissiveness.
    pub fn highlight(&self, code: &str, name: &str) -> Result<ScanResult, ScanError> {
        self.scan(code, name, self.config.permissive)
    }

    pub fn scan_with<E: Emitter>(
        &self,
        code: &str,
        name: &str,
        options: ScanOptions,
    ) -> Result<ScanResult<E>, ScanError> {
        let language = self
            .get_language(name)
            .ok_or_else(|| ScanError::UnknownGrammar(name.to_string()))?;
        Scanner::<E>::new(self, &language, code, options, 0).run(None)
    }

    /// Rank `candidates` (or the configured allow-list, or everything) against `code`.
    pub fn detect(&self, code: &str, candidates: &[String]) -> Result<Detection, ScanError> {
        self.detect_with::<TokenTree>(code, candidates)
    }

    pub fn detect_with<E: Emitter>(
        &self,
        code: &str,
        candidates: &[String],
    ) -> Result<Detection<E>, ScanError> {
        detection::rank(self, code, candidates, ScanOptions::from_config(&self.config, true), 0)
    }
}
