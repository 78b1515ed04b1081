//! Scanning
//!
//!     The scan engine walks the input once, left to right, with an explicit stack of
//!     activation records. See [engine] for the loop itself.
//!
//!     Every scan takes a [ScanOptions]. The illegal policy decides what an illegal match
//!     means:
//!
//!         Fail    the scan fails with `ScanError::IllegalLexeme`
//!         Abort   the scan stops and returns what it has, flagged illegal, with the rest of
//!                 the input appended as plain text
//!         Ignore  the illegal match is plain text (embedded scans)
//!
//!     Forward-progress guard violations are errors under every policy.

pub mod engine;
pub(crate) mod hooks;
pub mod result;

pub use result::ScanResult;

use crate::glint::registry::HighlightConfig;

/// Default floor for the runaway guard.
pub const DEFAULT_ITERATION_FLOOR: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IllegalPolicy {
    Fail,
    Abort,
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub illegal: IllegalPolicy,
    /// Recover from a zero-width end right after a zero-width begin by consuming a character,
    /// instead of failing.
    pub safe_mode: bool,
    /// The runaway guard fires once the iteration count exceeds both this and three times the
    /// current offset.
    pub iteration_floor: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            illegal: IllegalPolicy::Abort,
            safe_mode: true,
            iteration_floor: DEFAULT_ITERATION_FLOOR,
        }
    }
}

impl ScanOptions {
    /// `Abort` when permissive, `Fail` otherwise.
    pub fn permissive(permissive: bool) -> Self {
        Self {
            illegal: if permissive {
                IllegalPolicy::Abort
            } else {
                IllegalPolicy::Fail
            },
            ..Self::default()
        }
    }

    pub fn from_config(config: &HighlightConfig, permissive: bool) -> Self {
        Self {
            safe_mode: config.safe_mode,
            iteration_floor: config.iteration_floor,
            ..Self::permissive(permissive)
        }
    }
}
