//! HTML output for rendered documents
//!
//! Styling is driven by an explicit [`RenderContext`]; nothing here reads
//! global state, so the same document renders identically for the same
//! context.

use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use super::document::{Document, Node};
use super::markdown::CODE_LABEL;
use crate::config::{Accent, Mode, ThemeConfig};

/// Presentation context threaded through rendering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderContext {
    pub mode: Mode,
    pub accent: Accent,
}

impl From<&ThemeConfig> for RenderContext {
    fn from(theme: &ThemeConfig) -> Self {
        Self {
            mode: theme.mode,
            accent: theme.accent,
        }
    }
}

impl RenderContext {
    pub fn text(&self) -> &'static str {
        match self.mode {
            Mode::Light => "text-stone-900",
            Mode::Dark => "text-stone-100",
        }
    }

    pub fn text_muted(&self) -> &'static str {
        match self.mode {
            Mode::Light => "text-stone-500",
            Mode::Dark => "text-stone-400",
        }
    }

    pub fn border(&self) -> &'static str {
        match self.mode {
            Mode::Light => "border-stone-200",
            Mode::Dark => "border-stone-800",
        }
    }

    pub fn quote_bg(&self) -> &'static str {
        match self.mode {
            Mode::Light => "bg-stone-100",
            Mode::Dark => "bg-stone-900",
        }
    }

    pub fn bg(&self) -> &'static str {
        match self.mode {
            Mode::Light => "bg-stone-50",
            Mode::Dark => "bg-stone-950",
        }
    }

    pub fn accent_text(&self) -> String {
        format!("text-{}-600", self.accent.name())
    }

    pub fn accent_border(&self) -> String {
        format!("border-{}-600", self.accent.name())
    }

    /// syntect theme matching the mode
    fn code_theme(&self) -> &'static str {
        match self.mode {
            Mode::Light => "InspiredGitHub",
            Mode::Dark => "base16-ocean.dark",
        }
    }
}

/// Renders documents to HTML with syntax highlighting
pub struct HtmlRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

impl HtmlRenderer {
    pub fn new() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
        }
    }

    /// Render a document to an HTML fragment
    pub fn render(&self, doc: &Document, ctx: &RenderContext) -> String {
        let mut writer = Writer {
            html: self,
            ctx,
            out: String::new(),
            footnotes_seen: 0,
            in_table_head: false,
        };
        for node in &doc.nodes {
            writer.node(node);
        }
        writer.out
    }

    /// Highlight a code block, falling back to escaped plain text
    fn highlight_code(&self, code: &str, lang: Option<&str>, ctx: &RenderContext) -> String {
        let token = lang.unwrap_or("txt");
        let syntax = self
            .syntax_set
            .find_syntax_by_token(token)
            .or_else(|| self.syntax_set.find_syntax_by_extension(token))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let theme = self
            .theme_set
            .themes
            .get(ctx.code_theme())
            .or_else(|| self.theme_set.themes.values().next());

        let highlighted = theme.and_then(|theme| {
            highlighted_html_for_string(code, &self.syntax_set, syntax, theme).ok()
        });

        match highlighted {
            Some(html) => html,
            None => format!("<pre><code>{}</code></pre>", html_escape(code)),
        }
    }
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new()
    }
}

struct Writer<'a> {
    html: &'a HtmlRenderer,
    ctx: &'a RenderContext,
    out: String,
    /// Footnote occurrences so far; each one gets its own toggle id
    footnotes_seen: usize,
    /// Cells are header cells while set
    in_table_head: bool,
}

impl Writer<'_> {
    fn children(&mut self, children: &[Node]) {
        for child in children {
            self.node(child);
        }
    }

    fn wrap(&mut self, open: &str, close: &str, children: &[Node]) {
        self.out.push_str(open);
        self.children(children);
        self.out.push_str(close);
    }

    fn node(&mut self, node: &Node) {
        let ctx = *self.ctx;
        match node {
            Node::Heading { level, children } => {
                let class = match *level {
                    1 => format!("heading-1 {} uppercase", ctx.text()),
                    2 => format!("heading-2 {}", ctx.text()),
                    3 => format!("heading-3 {} border-l-4 {}", ctx.text(), ctx.accent_border()),
                    _ => format!("heading {}", ctx.text()),
                };
                let open = format!(r#"<h{} class="{}">"#, level, class);
                let close = format!("</h{}>", level);
                self.wrap(&open, &close, children);
            }
            Node::Paragraph { children } => {
                let open = format!(r#"<p class="font-serif {}">"#, ctx.text());
                self.wrap(&open, "</p>", children);
            }
            Node::List {
                ordered,
                start,
                children,
            } => {
                let marker = format!("marker:{}", ctx.accent_text());
                if *ordered {
                    let start_attr = match start {
                        Some(n) if *n != 1 => format!(r#" start="{}""#, n),
                        _ => String::new(),
                    };
                    let open = format!(
                        r#"<ol class="list-decimal {} {}"{}>"#,
                        ctx.text(),
                        marker,
                        start_attr
                    );
                    self.wrap(&open, "</ol>", children);
                } else {
                    let open = format!(r#"<ul class="list-disc {} {}">"#, ctx.text(), marker);
                    self.wrap(&open, "</ul>", children);
                }
            }
            Node::ListItem { children } => self.wrap("<li>", "</li>", children),
            Node::TaskMarker { checked } => {
                let checked = if *checked { " checked" } else { "" };
                self.out
                    .push_str(&format!(r#"<input type="checkbox" disabled{}>"#, checked));
            }
            Node::BlockQuote { children } => {
                let open = format!(
                    r#"<blockquote class="border-l-4 {} {} italic {}">"#,
                    ctx.accent_border(),
                    ctx.quote_bg(),
                    ctx.text_muted()
                );
                self.wrap(&open, "</blockquote>", children);
            }
            Node::Table { children } => self.wrap("<table>", "</table>", children),
            Node::TableHead { children } => {
                self.in_table_head = true;
                self.wrap("<thead><tr>", "</tr></thead>", children);
                self.in_table_head = false;
            }
            Node::TableRow { children } => self.wrap("<tr>", "</tr>", children),
            Node::TableCell { children } => {
                if self.in_table_head {
                    self.wrap("<th>", "</th>", children);
                } else {
                    self.wrap("<td>", "</td>", children);
                }
            }
            Node::Emphasis { children } => self.wrap("<em>", "</em>", children),
            Node::Strong { children } => self.wrap("<strong>", "</strong>", children),
            Node::Strikethrough { children } => self.wrap("<del>", "</del>", children),
            Node::Link {
                url,
                title,
                external,
                children,
            } => {
                let mut open = format!(
                    r#"<a href="{}" class="underline {}""#,
                    html_escape(url),
                    ctx.accent_text()
                );
                if !title.is_empty() {
                    open.push_str(&format!(r#" title="{}""#, html_escape(title)));
                }
                if *external {
                    open.push_str(r#" target="_blank" rel="noopener noreferrer""#);
                }
                open.push('>');
                self.wrap(&open, "</a>", children);
            }
            Node::Image {
                src,
                alt,
                title,
                alternate,
            } => {
                self.out.push_str(r#"<figure class="media"><picture>"#);
                if let Some(alternate) = alternate {
                    self.out.push_str(&format!(
                        r#"<source srcset="{}" type="image/webp">"#,
                        html_escape(alternate)
                    ));
                }
                let title_attr = if title.is_empty() {
                    String::new()
                } else {
                    format!(r#" title="{}""#, html_escape(title))
                };
                self.out.push_str(&format!(
                    r#"<img src="{}" alt="{}"{} class="border {}" loading="lazy"></picture>"#,
                    html_escape(src),
                    html_escape(alt),
                    title_attr,
                    ctx.border()
                ));
                self.caption("figcaption", alt);
                self.out.push_str("</figure>");
            }
            Node::Video { src, alt } => {
                self.out.push_str(&format!(
                    r#"<div class="media"><video controls preload="metadata"><source src="{}">Your browser does not support the video tag.</video>"#,
                    html_escape(src)
                ));
                self.caption("p", alt);
                self.out.push_str("</div>");
            }
            Node::InlineCode { code } => {
                self.out.push_str(&format!(
                    r#"<code class="inline-code border {} {}">{}</code>"#,
                    ctx.border(),
                    ctx.text(),
                    html_escape(code)
                ));
            }
            Node::CodeBlock { language, code } => {
                let label = language.as_deref().unwrap_or(CODE_LABEL);
                self.out.push_str(&format!(
                    r#"<div class="code-block border {}"><div class="code-label">{}</div>"#,
                    ctx.border(),
                    html_escape(label)
                ));
                let highlighted = self.html.highlight_code(code, language.as_deref(), &ctx);
                self.out.push_str(&highlighted);
                self.out.push_str("</div>");
            }
            Node::Footnote { id, text } => {
                let n = self.footnotes_seen;
                self.footnotes_seen += 1;
                self.out.push_str(&format!(
                    concat!(
                        r#"<span class="footnote">"#,
                        r#"<input type="checkbox" class="footnote-toggle" id="fn-toggle-{n}" hidden>"#,
                        r#"<label for="fn-toggle-{n}" class="{accent}"><sup>[{id}]</sup></label>"#,
                        r#"<span class="footnote-body border {border}" role="tooltip">{text}</span>"#,
                        "</span>"
                    ),
                    n = n,
                    accent = ctx.accent_text(),
                    id = html_escape(id),
                    border = ctx.border(),
                    text = html_escape(text),
                ));
            }
            Node::FootnoteMissing { id } => {
                self.out
                    .push_str(&format!("<sup>[{}]</sup>", html_escape(id)));
            }
            Node::Rule => self
                .out
                .push_str(&format!(r#"<hr class="border-t-2 {}">"#, ctx.border())),
            Node::SoftBreak => self.out.push('\n'),
            Node::HardBreak => self.out.push_str("<br>"),
            Node::Html { html } => self.out.push_str(html),
            Node::Text { text } => self.out.push_str(&html_escape(text)),
            Node::Generic { children, .. } => self.children(children),
        }
    }

    fn caption(&mut self, tag: &str, alt: &str) {
        if alt.is_empty() {
            return;
        }
        self.out.push_str(&format!(
            r#"<{tag} class="caption {}">{}</{tag}>"#,
            self.ctx.text_muted(),
            html_escape(alt),
            tag = tag
        ));
    }
}

/// Simple HTML escaping
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MarkdownRenderer;

    fn to_html(markdown: &str, ctx: RenderContext) -> String {
        let doc = MarkdownRenderer::new().render(markdown);
        HtmlRenderer::new().render(&doc, &ctx)
    }

    #[test]
    fn test_context_drives_classes() {
        let light = to_html("> note", RenderContext::default());
        assert!(light.contains("border-red-600"));
        assert!(light.contains("bg-stone-100"));

        let dark = to_html(
            "> note",
            RenderContext {
                mode: Mode::Dark,
                accent: Accent::Green,
            },
        );
        assert!(dark.contains("border-green-600"));
        assert!(dark.contains("bg-stone-900"));
    }

    #[test]
    fn test_external_link_attributes() {
        let html = to_html("[x](https://example.com) [y](/local)", RenderContext::default());
        assert!(html.contains(r#"href="https://example.com""#));
        assert_eq!(html.matches(r#"rel="noopener noreferrer""#).count(), 1);
    }

    #[test]
    fn test_footnotes_get_distinct_toggles() {
        let html = to_html(
            "One[^a] two[^a] three[^b]\n\n[^a]: Alpha <detail>",
            RenderContext::default(),
        );
        assert!(html.contains(r#"id="fn-toggle-0""#));
        assert!(html.contains(r#"id="fn-toggle-1""#));
        assert!(!html.contains(r#"id="fn-toggle-2""#));
        assert!(html.contains("Alpha &lt;detail&gt;"));
        assert!(html.contains("<sup>[b]</sup>"));
    }

    #[test]
    fn test_media_output() {
        let html = to_html("![Sunset](img/sunset.jpg)", RenderContext::default());
        assert!(html.contains(r#"<source srcset="img/sunset.webp" type="image/webp">"#));
        assert!(html.contains("<figcaption"));
        assert!(!html.contains("<p class"));

        let html = to_html("![](clip.webm)", RenderContext::default());
        assert!(html.contains("<video controls"));
        assert!(!html.contains("caption"));
    }

    #[test]
    fn test_code_block_label() {
        let html = to_html("```\nplain\n```", RenderContext::default());
        assert!(html.contains(r#"<div class="code-label">Code</div>"#));

        let html = to_html("```rust\nfn main() {}\n```", RenderContext::default());
        assert!(html.contains(r#"<div class="code-label">rust</div>"#));
    }

    #[test]
    fn test_table_head_cells() {
        let html = to_html("| a | b |\n|---|---|\n| 1 | 2 |", RenderContext::default());
        assert!(html.contains("<thead><tr><th>a</th><th>b</th></tr></thead>"));
        assert!(html.contains("<tr><td>1</td><td>2</td></tr>"));
        assert!(!html.contains("<th>1</th>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let html = to_html("a < b & c", RenderContext::default());
        assert!(html.contains("a &lt; b &amp; c"));
    }
}
