//! Bundled grammars
//!
//!     Grammars shipped with the engine, stored as YAML under `grammars/`. They are parsed and
//!     compiled on registration like any user grammar.
//!
//!         rgbasm      RGBDS assembly for the Game Boy (aliases: rgbds, gbasm, gbz80)
//!         evscript    Game Boy scripting language with embedded `#asm` blocks (alias: evs)

use crate::glint::error::GrammarError;
use crate::glint::registry::Registry;

pub const RGBASM: &str = include_str!("../../grammars/rgbasm.yaml");
pub const EVSCRIPT: &str = include_str!("../../grammars/evscript.yaml");

/// Name and source of every bundled grammar.
pub const BUNDLED: &[(&str, &str)] = &[("rgbasm", RGBASM), ("evscript", EVSCRIPT)];

/// Register every bundled grammar.
pub fn register_bundled(registry: &mut Registry) -> Result<(), GrammarError> {
    for (name, source) in BUNDLED {
        registry.register_yaml(name, source)?;
    }
    Ok(())
}

/// A registry holding just the bundled grammars.
pub fn bundled_registry() -> Result<Registry, GrammarError> {
    let mut registry = Registry::new();
    register_bundled(&mut registry)?;
    Ok(registry)
}
