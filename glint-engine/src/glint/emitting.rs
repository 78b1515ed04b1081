//! Emitting
//!
//!     The scan engine never builds output directly. It drives an [Emitter] with a small set of
//!     calls, in input order:
//!
//!         add_text        plain text under the current node
//!         open_node       start a scoped node under the current node
//!         close_node      end the current node
//!         add_keyword     a complete scoped leaf
//!         add_sublanguage attach the finished output of an embedded scan
//!
//!     The calls are balanced: every node that is opened is closed, at the latest by
//!     `close_all_nodes` at the end of the scan. The engine never drops text, so an emitter that
//!     concatenates what it receives through `add_text` and `add_keyword` reproduces the input.
//!
//!     [TokenTree] is the default emitter. [HtmlRenderer] turns a finished tree into markup.

pub mod html;
pub mod token_tree;

pub use html::HtmlRenderer;
pub use token_tree::{ScopeNode, Span, TokenNode, TokenTree};

/// Receiver of scan output.
///
/// Implementations must tolerate `close_node` at the root, which is a no-op.
pub trait Emitter: Default {
    fn add_text(&mut self, text: &str);

    fn open_node(&mut self, scope: &str);

    fn close_node(&mut self);

    fn add_keyword(&mut self, text: &str, scope: &str) {
        if text.is_empty() {
            return;
        }
        self.open_node(scope);
        self.add_text(text);
        self.close_node();
    }

    /// Attach the output of an embedded scan of language `name`.
    fn add_sublanguage(&mut self, emitter: Self, name: &str);

    fn close_all_nodes(&mut self);

    /// Called once, after `close_all_nodes`, when the scan is over.
    fn finalize(&mut self) {}
}
