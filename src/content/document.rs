//! Render nodes produced by the markdown renderer

use serde::Serialize;

/// A rendered markdown document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    pub nodes: Vec<Node>,
}

/// One structural unit of a rendered document. Presentation is left to the
/// consumer; the structure is fixed by the markdown input.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Heading {
        level: u8,
        children: Vec<Node>,
    },
    Paragraph {
        children: Vec<Node>,
    },
    List {
        ordered: bool,
        start: Option<u64>,
        children: Vec<Node>,
    },
    ListItem {
        children: Vec<Node>,
    },
    TaskMarker {
        checked: bool,
    },
    BlockQuote {
        children: Vec<Node>,
    },
    Table {
        children: Vec<Node>,
    },
    TableHead {
        children: Vec<Node>,
    },
    TableRow {
        children: Vec<Node>,
    },
    TableCell {
        children: Vec<Node>,
    },
    Emphasis {
        children: Vec<Node>,
    },
    Strong {
        children: Vec<Node>,
    },
    Strikethrough {
        children: Vec<Node>,
    },
    /// `external` links open in a new context without a referrer
    Link {
        url: String,
        title: String,
        external: bool,
        children: Vec<Node>,
    },
    /// `alternate` is a lighter-format sibling of `src`; it may not exist
    Image {
        src: String,
        alt: String,
        title: String,
        alternate: Option<String>,
    },
    Video {
        src: String,
        alt: String,
    },
    InlineCode {
        code: String,
    },
    CodeBlock {
        language: Option<String>,
        code: String,
    },
    /// A resolved footnote reference
    Footnote {
        id: String,
        text: String,
    },
    /// A footnote reference without a definition
    FootnoteMissing {
        id: String,
    },
    Rule,
    SoftBreak,
    HardBreak,
    Html {
        html: String,
    },
    Text {
        text: String,
    },
    /// Anything without a dedicated kind, passed through unstyled
    Generic {
        tag: String,
        children: Vec<Node>,
    },
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text { text: text.into() }
    }

    /// Child nodes, empty for leaves
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Heading { children, .. }
            | Node::Paragraph { children }
            | Node::List { children, .. }
            | Node::ListItem { children }
            | Node::BlockQuote { children }
            | Node::Table { children }
            | Node::TableHead { children }
            | Node::TableRow { children }
            | Node::TableCell { children }
            | Node::Emphasis { children }
            | Node::Strong { children }
            | Node::Strikethrough { children }
            | Node::Link { children, .. }
            | Node::Generic { children, .. } => children.as_slice(),
            _ => &[],
        }
    }

    pub fn children_mut(&mut self) -> &mut [Node] {
        match self {
            Node::Heading { children, .. }
            | Node::Paragraph { children }
            | Node::List { children, .. }
            | Node::ListItem { children }
            | Node::BlockQuote { children }
            | Node::Table { children }
            | Node::TableHead { children }
            | Node::TableRow { children }
            | Node::TableCell { children }
            | Node::Emphasis { children }
            | Node::Strong { children }
            | Node::Strikethrough { children }
            | Node::Link { children, .. }
            | Node::Generic { children, .. } => children.as_mut_slice(),
            _ => &mut [],
        }
    }

    /// Concatenated text content. Footnotes contribute their bracketed id.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text { text } => out.push_str(text),
            Node::InlineCode { code } | Node::CodeBlock { code, .. } => out.push_str(code),
            Node::Footnote { id, .. } | Node::FootnoteMissing { id } => {
                out.push('[');
                out.push_str(id);
                out.push(']');
            }
            Node::Image { alt, .. } | Node::Video { alt, .. } => out.push_str(alt),
            Node::SoftBreak | Node::HardBreak => out.push(' '),
            _ => {
                for child in self.children() {
                    child.collect_text(out);
                }
            }
        }
    }
}

impl Document {
    /// All nodes, depth-first in document order
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        let mut flat = Vec::new();
        for node in &self.nodes {
            flatten(node, &mut flat);
        }
        flat.into_iter()
    }

    /// Visit every node mutably, depth-first in document order
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut Node)) {
        fn walk(node: &mut Node, f: &mut dyn FnMut(&mut Node)) {
            f(node);
            for child in node.children_mut() {
                walk(child, f);
            }
        }
        for node in &mut self.nodes {
            walk(node, &mut f);
        }
    }

    /// Resolved footnotes in document order
    pub fn footnotes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter_map(|node| match node {
            Node::Footnote { id, text } => Some((id.as_str(), text.as_str())),
            _ => None,
        })
    }
}

fn flatten<'a>(node: &'a Node, out: &mut Vec<&'a Node>) {
    out.push(node);
    for child in node.children() {
        flatten(child, out);
    }
}
