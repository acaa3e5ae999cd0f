//! Markdown rendering into a structured document
//!
//! Rendering runs the footnote pre-pass first, then walks pulldown-cmark
//! events with a stack of open containers. Text is coalesced per container
//! before it is split on footnote markers, since the parser may break a run
//! of text into several events.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use super::document::{Document, Node};
use super::footnote::{self, FootnoteTable, Segment};
use crate::config::MarkdownConfig;

/// Label for code blocks without a language
pub const CODE_LABEL: &str = "Code";

/// Markdown renderer producing render nodes
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    alternate_format: String,
    still_extensions: Vec<String>,
    video_extensions: Vec<String>,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::with_config(&MarkdownConfig::default())
    }

    /// Create with custom settings
    pub fn with_config(config: &MarkdownConfig) -> Self {
        let lower = |exts: &[String]| exts.iter().map(|e| e.to_lowercase()).collect();
        Self {
            alternate_format: config.alternate_format.clone(),
            still_extensions: lower(&config.still_extensions),
            video_extensions: lower(&config.video_extensions),
        }
    }

    /// Parser options: CommonMark plus the GFM extensions. Footnotes are
    /// handled by our own pre-pass, so the parser's native footnote syntax
    /// stays off.
    fn options() -> Options {
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
    }

    /// Render a post body
    pub fn render(&self, markdown: &str) -> Document {
        let (prepared, footnotes) = footnote::extract_footnotes(markdown);
        self.render_prepared(&prepared, &footnotes)
    }

    /// Render text that already went through the footnote pre-pass
    pub fn render_prepared(&self, prepared: &str, footnotes: &FootnoteTable) -> Document {
        let parser = Parser::new_ext(prepared, Self::options());
        let mut converter = Converter::new(self, footnotes);

        for event in parser {
            converter.handle_event(event);
        }

        converter.finish()
    }

    /// Image or video node for a media reference
    fn media_node(&self, src: String, alt: String, title: String) -> Node {
        let Some((start, end)) = extension_span(&src) else {
            return Node::Image {
                src,
                alt,
                title,
                alternate: None,
            };
        };

        let ext = src[start..end].to_lowercase();
        if self.video_extensions.contains(&ext) {
            return Node::Video { src, alt };
        }

        let alternate = (self.still_extensions.contains(&ext) && ext != self.alternate_format)
            .then(|| format!("{}{}{}", &src[..start], self.alternate_format, &src[end..]));

        Node::Image {
            src,
            alt,
            title,
            alternate,
        }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte range of the file extension in a URL path, ignoring query and fragment
fn extension_span(src: &str) -> Option<(usize, usize)> {
    let path_end = src.find(['?', '#']).unwrap_or(src.len());
    let path = &src[..path_end];
    let dot = path.rfind('.')?;
    if path[dot..].contains('/') || dot + 1 == path_end {
        return None;
    }
    Some((dot + 1, path_end))
}

/// Links with a scheme open in a new context
fn is_external(url: &str) -> bool {
    url.starts_with("http")
}

/// Open container while walking events
enum Frame {
    Paragraph(Vec<Node>),
    Heading(u8, Vec<Node>),
    BlockQuote(Vec<Node>),
    List {
        start: Option<u64>,
        children: Vec<Node>,
    },
    Item(Vec<Node>),
    Table(Vec<Node>),
    TableHead(Vec<Node>),
    TableRow(Vec<Node>),
    TableCell(Vec<Node>),
    Emphasis(Vec<Node>),
    Strong(Vec<Node>),
    Strikethrough(Vec<Node>),
    Link {
        url: String,
        title: String,
        children: Vec<Node>,
    },
    Image {
        src: String,
        title: String,
        children: Vec<Node>,
    },
    CodeBlock {
        language: Option<String>,
        code: String,
    },
    Generic(String, Vec<Node>),
}

impl Frame {
    fn open(tag: Tag) -> Self {
        match tag {
            Tag::Paragraph => Frame::Paragraph(Vec::new()),
            Tag::Heading { level, .. } => Frame::Heading(heading_level(level), Vec::new()),
            Tag::BlockQuote(_) => Frame::BlockQuote(Vec::new()),
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info.split_whitespace().next().map(String::from),
                    CodeBlockKind::Indented => None,
                };
                Frame::CodeBlock {
                    language,
                    code: String::new(),
                }
            }
            Tag::List(start) => Frame::List {
                start,
                children: Vec::new(),
            },
            Tag::Item => Frame::Item(Vec::new()),
            Tag::Table(_) => Frame::Table(Vec::new()),
            Tag::TableHead => Frame::TableHead(Vec::new()),
            Tag::TableRow => Frame::TableRow(Vec::new()),
            Tag::TableCell => Frame::TableCell(Vec::new()),
            Tag::Emphasis => Frame::Emphasis(Vec::new()),
            Tag::Strong => Frame::Strong(Vec::new()),
            Tag::Strikethrough => Frame::Strikethrough(Vec::new()),
            // Destinations and titles are literal; undo the reference markers
            Tag::Link {
                dest_url, title, ..
            } => Frame::Link {
                url: footnote::restore_references(&dest_url),
                title: footnote::restore_references(&title),
                children: Vec::new(),
            },
            Tag::Image {
                dest_url, title, ..
            } => Frame::Image {
                src: footnote::restore_references(&dest_url),
                title: footnote::restore_references(&title),
                children: Vec::new(),
            },
            other => Frame::Generic(generic_name(&other), Vec::new()),
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Frame::Paragraph(c)
            | Frame::Heading(_, c)
            | Frame::BlockQuote(c)
            | Frame::List { children: c, .. }
            | Frame::Item(c)
            | Frame::Table(c)
            | Frame::TableHead(c)
            | Frame::TableRow(c)
            | Frame::TableCell(c)
            | Frame::Emphasis(c)
            | Frame::Strong(c)
            | Frame::Strikethrough(c)
            | Frame::Link { children: c, .. }
            | Frame::Image { children: c, .. }
            | Frame::Generic(_, c) => Some(c),
            Frame::CodeBlock { .. } => None,
        }
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Lowercased variant name of a tag without a dedicated node
fn generic_name(tag: &Tag) -> String {
    format!("{:?}", tag)
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

/// Whether a tag is dropped from the tree while its content is kept
fn is_transparent(tag: &Tag) -> bool {
    matches!(tag, Tag::HtmlBlock | Tag::MetadataBlock(_))
}

fn is_transparent_end(tag: &TagEnd) -> bool {
    matches!(tag, TagEnd::HtmlBlock | TagEnd::MetadataBlock(_))
}

/// Event walker building the node tree
struct Converter<'r> {
    renderer: &'r MarkdownRenderer,
    footnotes: &'r FootnoteTable,
    stack: Vec<Frame>,
    root: Vec<Node>,
    pending: String,
}

impl<'r> Converter<'r> {
    fn new(renderer: &'r MarkdownRenderer, footnotes: &'r FootnoteTable) -> Self {
        Self {
            renderer,
            footnotes,
            stack: Vec::new(),
            root: Vec::new(),
            pending: String::new(),
        }
    }

    fn handle_event(&mut self, event: Event) {
        if let Event::Text(text) = &event {
            self.push_text(text);
            return;
        }

        self.flush_text();

        match event {
            Event::Start(tag) => {
                if !is_transparent(&tag) {
                    self.stack.push(Frame::open(tag));
                }
            }
            Event::End(tag) => {
                if !is_transparent_end(&tag) {
                    self.close_top();
                }
            }
            Event::Code(code) => self.add_node(Node::InlineCode {
                code: footnote::restore_references(&code),
            }),
            Event::Html(html) | Event::InlineHtml(html) => self.add_node(Node::Html {
                html: html.to_string(),
            }),
            Event::SoftBreak => self.add_node(Node::SoftBreak),
            Event::HardBreak => self.add_node(Node::HardBreak),
            Event::Rule => self.add_node(Node::Rule),
            Event::TaskListMarker(checked) => self.add_node(Node::TaskMarker { checked }),
            Event::FootnoteReference(id) => {
                let node = self.footnote_node(&id);
                self.add_node(node);
            }
            Event::InlineMath(math) => self.add_node(Node::Generic {
                tag: "inlinemath".to_string(),
                children: vec![Node::text(math.to_string())],
            }),
            Event::DisplayMath(math) => self.add_node(Node::Generic {
                tag: "displaymath".to_string(),
                children: vec![Node::text(math.to_string())],
            }),
            Event::Text(_) => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(Frame::CodeBlock { code, .. }) = self.stack.last_mut() {
            code.push_str(text);
        } else {
            self.pending.push_str(text);
        }
    }

    /// Emit buffered text, resolving footnote markers
    fn flush_text(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending);

        let nodes: Vec<Node> = footnote::split_markers(&pending)
            .into_iter()
            .map(|segment| match segment {
                Segment::Text(text) => Node::text(text),
                Segment::Marker(id) => self.footnote_node(id),
            })
            .collect();

        for node in nodes {
            self.add_node(node);
        }
    }

    fn footnote_node(&self, id: &str) -> Node {
        match self.footnotes.get(id) {
            Some(text) => Node::Footnote {
                id: id.to_string(),
                text: text.to_string(),
            },
            None => Node::FootnoteMissing { id: id.to_string() },
        }
    }

    fn close_top(&mut self) {
        if let Some(frame) = self.stack.pop() {
            let node = self.close(frame);
            self.add_node(node);
        }
    }

    fn close(&self, frame: Frame) -> Node {
        match frame {
            Frame::Paragraph(mut children) => {
                // A lone image is a block of its own
                let lone_media = children.len() == 1
                    && matches!(children[0], Node::Image { .. } | Node::Video { .. });
                match children.pop() {
                    Some(media) if lone_media => media,
                    Some(last) => {
                        children.push(last);
                        Node::Paragraph { children }
                    }
                    None => Node::Paragraph { children },
                }
            }
            Frame::Heading(level, children) => Node::Heading { level, children },
            Frame::BlockQuote(children) => Node::BlockQuote { children },
            Frame::List { start, children } => Node::List {
                ordered: start.is_some(),
                start,
                children,
            },
            Frame::Item(children) => Node::ListItem { children },
            Frame::Table(children) => Node::Table { children },
            Frame::TableHead(children) => Node::TableHead { children },
            Frame::TableRow(children) => Node::TableRow { children },
            Frame::TableCell(children) => Node::TableCell { children },
            Frame::Emphasis(children) => Node::Emphasis { children },
            Frame::Strong(children) => Node::Strong { children },
            Frame::Strikethrough(children) => Node::Strikethrough { children },
            Frame::Link {
                url,
                title,
                children,
            } => Node::Link {
                external: is_external(&url),
                url,
                title,
                children,
            },
            Frame::Image {
                src,
                title,
                children,
            } => {
                let alt: String = children.iter().map(Node::plain_text).collect();
                self.renderer.media_node(src, alt, title)
            }
            Frame::CodeBlock { language, code } => Node::CodeBlock {
                language,
                code: footnote::restore_references(&code),
            },
            Frame::Generic(tag, children) => Node::Generic { tag, children },
        }
    }

    /// Add a node to the innermost open container, or the root
    fn add_node(&mut self, node: Node) {
        match self.stack.last_mut().and_then(Frame::children_mut) {
            Some(children) => children.push(node),
            None => self.root.push(node),
        }
    }

    fn finish(mut self) -> Document {
        self.flush_text();
        while !self.stack.is_empty() {
            self.close_top();
        }
        Document { nodes: self.root }
    }
}
