//! Shared configuration loader for the glint toolchain.
//!
//! `defaults/glint.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user files and `GLINT_*`
//! environment variables on top of those defaults via [`Loader`] before
//! deserializing into [`GlintConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat, ValueKind};
use glint_engine::HighlightConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_TOML: &str = include_str!("../defaults/glint.default.toml");

/// Prefix of environment overrides: `GLINT_RENDER__FORMAT=json`.
pub const ENV_PREFIX: &str = "GLINT";

/// Top-level configuration consumed by glint applications.
#[derive(Debug, Clone, Deserialize)]
pub struct GlintConfig {
    pub highlight: HighlightConfig,
    pub render: RenderConfig,
    pub grammars: GrammarsConfig,
}

/// How scan results are written out.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    pub format: OutputFormat,
    pub class_prefix: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// `<span class="hljs-keyword">` markup.
    Html,
    /// The token tree as JSON.
    Json,
    /// One line per run of text with its scopes.
    Spans,
    /// The input, unchanged. Useful to check a grammar accepts it.
    Text,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Html,
        OutputFormat::Json,
        OutputFormat::Spans,
        OutputFormat::Text,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Json => "json",
            OutputFormat::Spans => "spans",
            OutputFormat::Text => "text",
        }
    }
}

/// Which grammars get registered.
#[derive(Debug, Clone, Deserialize)]
pub struct GrammarsConfig {
    pub bundled: bool,
    pub paths: Vec<PathBuf>,
}

/// Layers, lowest first: embedded defaults, files, `GLINT_*` variables, key overrides.
///
/// The `config` crate orders sources by insertion and puts overrides on top regardless, so
/// call [Loader::with_file] before [Loader::with_env].
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// A loader holding only `defaults/glint.default.toml`.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a TOML file. Building fails if it does not exist.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer `GLINT_<SECTION>__<KEY>` environment variables.
    pub fn with_env(mut self) -> Self {
        let source = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Override one dotted key, e.g. `render.class_prefix`.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Merge every layer into a [GlintConfig].
    pub fn build(self) -> Result<GlintConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<GlintConfig, ConfigError> {
    Loader::new().build()
}
