//! HTML rendering of token trees

use super::token_tree::{ScopeNode, TokenNode, TokenTree};

pub const DEFAULT_CLASS_PREFIX: &str = "hljs-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlRenderer {
    pub class_prefix: String,
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self {
            class_prefix: DEFAULT_CLASS_PREFIX.to_string(),
        }
    }
}

impl HtmlRenderer {
    pub fn new(class_prefix: impl Into<String>) -> Self {
        Self {
            class_prefix: class_prefix.into(),
        }
    }

    pub fn render(&self, tree: &TokenTree) -> String {
        let mut out = String::new();
        self.render_children(tree.root(), &mut out);
        out
    }

    fn render_children(&self, node: &ScopeNode, out: &mut String) {
        for child in &node.children {
            match child {
                TokenNode::Text(text) => out.push_str(&escape(text)),
                TokenNode::Scope(inner) => self.render_node(inner, out),
            }
        }
    }

    fn render_node(&self, node: &ScopeNode, out: &mut String) {
        let class = match (&node.scope, node.sublanguage) {
            (Some(name), true) => Some(format!("language-{}", name)),
            (Some(scope), false) => Some(self.scope_class(scope)),
            (None, _) => None,
        };
        match class {
            Some(class) => {
                out.push_str("<span class=\"");
                out.push_str(&escape(&class));
                out.push_str("\">");
                self.render_children(node, out);
                out.push_str("</span>");
            }
            None => self.render_children(node, out),
        }
    }

    /// `title.class.inherited` becomes `hljs-title class_ inherited__`.
    pub fn scope_class(&self, scope: &str) -> String {
        let mut pieces = scope.split('.');
        let mut class = format!("{}{}", self.class_prefix, pieces.next().unwrap_or_default());
        for (depth, piece) in pieces.enumerate() {
            class.push(' ');
            class.push_str(piece);
            class.push_str(&"_".repeat(depth + 1));
        }
        class
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}
