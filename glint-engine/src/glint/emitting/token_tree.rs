//! Token tree
//!
//!     The default emitter. Nodes under construction live on a stack whose bottom entry is the
//!     root; closing a node moves it into the children of the node below. Adjacent text is
//!     merged as it arrives.

use super::Emitter;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TokenNode {
    Text(String),
    Scope(ScopeNode),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScopeNode {
    /// Scope name, or the language name for an embedded scan. `None` only for the root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub sublanguage: bool,
    pub children: Vec<TokenNode>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ScopeNode {
    fn new(scope: &str) -> Self {
        Self {
            scope: Some(scope.to_string()),
            ..Default::default()
        }
    }

    /// The scope as seen by renderers: `language:<name>` for embedded scans.
    pub fn display_scope(&self) -> Option<String> {
        match (&self.scope, self.sublanguage) {
            (Some(name), true) => Some(format!("language:{}", name)),
            (scope, false) => scope.clone(),
            (None, true) => None,
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(TokenNode::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(TokenNode::Text(text.to_string()));
        }
    }

    fn collapse(&mut self) {
        if self.children.len() > 1 && self.children.iter().all(|c| matches!(c, TokenNode::Text(_))) {
            let mut merged = String::new();
            for child in self.children.drain(..) {
                if let TokenNode::Text(text) = child {
                    merged.push_str(&text);
                }
            }
            self.children.push(TokenNode::Text(merged));
            return;
        }
        for child in &mut self.children {
            if let TokenNode::Scope(node) = child {
                node.collapse();
            }
        }
    }
}

/// A run of text with the scopes enclosing it, outermost first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    pub scopes: Vec<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTree {
    stack: Vec<ScopeNode>,
}

impl Default for TokenTree {
    fn default() -> Self {
        Self {
            stack: vec![ScopeNode::default()],
        }
    }
}

impl TokenTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// The root node. Nodes that are still open are not part of it yet.
    pub fn root(&self) -> &ScopeNode {
        &self.stack[0]
    }

    fn top(&mut self) -> &mut ScopeNode {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    /// All leaf text, in order.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.root().children, &mut out);
        out
    }

    /// Flatten into runs of text. Consecutive runs may share scopes.
    pub fn spans(&self) -> Vec<Span> {
        let mut spans = Vec::new();
        let mut scopes = Vec::new();
        collect_spans(&self.root().children, &mut scopes, &mut spans);
        spans
    }

    /// Deepest nesting of scoped nodes.
    pub fn depth(&self) -> usize {
        node_depth(self.root())
    }
}

fn collect_text(children: &[TokenNode], out: &mut String) {
    for child in children {
        match child {
            TokenNode::Text(text) => out.push_str(text),
            TokenNode::Scope(node) => collect_text(&node.children, out),
        }
    }
}

fn collect_spans(children: &[TokenNode], scopes: &mut Vec<String>, spans: &mut Vec<Span>) {
    for child in children {
        match child {
            TokenNode::Text(text) => spans.push(Span {
                scopes: scopes.clone(),
                text: text.clone(),
            }),
            TokenNode::Scope(node) => {
                let scope = node.display_scope();
                if let Some(scope) = &scope {
                    scopes.push(scope.clone());
                }
                collect_spans(&node.children, scopes, spans);
                if scope.is_some() {
                    scopes.pop();
                }
            }
        }
    }
}

fn node_depth(node: &ScopeNode) -> usize {
    node.children
        .iter()
        .map(|child| match child {
            TokenNode::Text(_) => 0,
            TokenNode::Scope(inner) => 1 + node_depth(inner),
        })
        .max()
        .unwrap_or(0)
}

impl Emitter for TokenTree {
    fn add_text(&mut self, text: &str) {
        if !text.is_empty() {
            self.top().push_text(text);
        }
    }

    fn open_node(&mut self, scope: &str) {
        self.stack.push(ScopeNode::new(scope));
    }

    fn close_node(&mut self) {
        if self.stack.len() > 1 {
            if let Some(node) = self.stack.pop() {
                self.top().children.push(TokenNode::Scope(node));
            }
        }
    }

    fn add_sublanguage(&mut self, mut emitter: Self, name: &str) {
        emitter.close_all_nodes();
        let root = emitter.stack.swap_remove(0);
        self.top().children.push(TokenNode::Scope(ScopeNode {
            scope: Some(name.to_string()),
            sublanguage: true,
            children: root.children,
        }));
    }

    fn close_all_nodes(&mut self) {
        while self.stack.len() > 1 {
            self.close_node();
        }
    }

    fn finalize(&mut self) {
        self.close_all_nodes();
        self.stack[0].collapse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacent_text_is_merged() {
        let mut tree = TokenTree::new();
        tree.add_text("ab");
        tree.add_text("");
        tree.add_text("c");
        assert_eq!(tree.root().children, vec![TokenNode::Text("abc".into())]);
    }

    #[test]
    fn test_close_at_root_is_a_no_op() {
        let mut tree = TokenTree::new();
        tree.close_node();
        tree.add_text("x");
        tree.close_node();
        tree.finalize();
        assert_eq!(tree.text(), "x");
        assert_eq!(tree.depth(), 0);
    }

    #[test]
    fn test_nodes_nest() {
        let mut tree = TokenTree::new();
        tree.open_node("string");
        tree.add_text("\"a");
        tree.add_keyword("\\n", "char.escape");
        tree.add_text("\"");
        tree.close_node();
        tree.finalize();

        assert_eq!(tree.depth(), 2);
        assert_eq!(
            tree.spans(),
            vec![
                Span { scopes: vec!["string".into()], text: "\"a".into() },
                Span { scopes: vec!["string".into(), "char.escape".into()], text: "\\n".into() },
                Span { scopes: vec!["string".into()], text: "\"".into() },
            ]
        );
    }

    #[test]
    fn test_empty_keywords_are_skipped() {
        let mut tree = TokenTree::new();
        tree.add_keyword("", "keyword");
        assert!(tree.root().children.is_empty());
    }

    #[test]
    fn test_finalize_closes_open_nodes() {
        let mut tree = TokenTree::new();
        tree.open_node("a");
        tree.open_node("b");
        tree.add_text("x");
        tree.finalize();
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.text(), "x");
    }

    #[test]
    fn test_sublanguage_nodes() {
        let mut inner = TokenTree::new();
        inner.open_node("keyword");
        inner.add_text("ld");
        inner.add_text(" a");

        let mut tree = TokenTree::new();
        tree.add_text("#asm");
        tree.add_sublanguage(inner, "rgbasm");
        tree.finalize();

        assert_eq!(tree.text(), "#asmld a");
        let spans = tree.spans();
        assert_eq!(spans[1].scopes, vec!["language:rgbasm".to_string(), "keyword".to_string()]);
    }

    #[test]
    fn test_serializes_untagged() {
        let mut tree = TokenTree::new();
        tree.add_keyword("if", "keyword");
        tree.add_text(" x");
        tree.finalize();
        let json = serde_json::to_string(tree.root()).unwrap();
        assert_eq!(
            json,
            r#"{"children":[{"scope":"keyword","children":["if"]}," x"]}"#
        );
    }
}
