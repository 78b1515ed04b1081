//! Scan results and activation records

use crate::glint::compiling::{ModeId, ROOT_MODE};
use crate::glint::emitting::TokenTree;
use crate::glint::error::IllegalContext;

/// One active mode on the scan stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Frame {
    pub mode: ModeId,
    /// First multiplexer rule to try when resuming at the same offset.
    pub regex_index: usize,
    /// Begin capture stored by a hook.
    pub data: Option<String>,
    /// Entered as the `starts` continuation of a mode that just ended.
    pub via_starts: bool,
}

impl Frame {
    pub fn new(mode: ModeId, data: Option<String>, via_starts: bool) -> Self {
        Self {
            mode,
            regex_index: 0,
            data,
            via_starts,
        }
    }

    pub fn root() -> Self {
        Self::new(ROOT_MODE, None, false)
    }
}

#[derive(Debug)]
pub struct ScanResult<E = TokenTree> {
    /// Canonical name of the language used, `None` for the plain text baseline of detection.
    pub language: Option<String>,
    pub relevance: u32,
    /// The scan stopped at an illegal lexeme. The tree still covers the whole input.
    pub illegal: bool,
    pub illegal_by: Option<IllegalContext>,
    pub tree: E,
    /// Mode stack at the end of the scan, for continuing embedded regions.
    pub(crate) top: Vec<Frame>,
}

impl<E> ScanResult<E> {
    /// A result that classifies nothing.
    pub(crate) fn plain(tree: E) -> Self {
        Self {
            language: None,
            relevance: 0,
            illegal: false,
            illegal_by: None,
            tree,
            top: Vec::new(),
        }
    }
}
