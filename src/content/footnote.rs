//! Footnote extension
//!
//! Footnotes are single-line definitions referenced inline:
//!
//! ```text
//! Some claim needing support.[^1]
//!
//! [^1]: The supporting detail, one line.
//! ```
//!
//! [`extract_footnotes`] runs before markdown parsing. It pulls definitions
//! into a [`FootnoteTable`], deletes their lines and swaps every inline
//! reference for a sentinel marker built from private-use code points, which
//! survive markdown parsing untouched. The renderer later splits text on
//! those markers with [`split_markers`].

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

use super::Document;

const MARKER_OPEN: char = '\u{E000}';
const MARKER_CLOSE: char = '\u{E001}';

lazy_static! {
    static ref DEFINITION: Regex =
        Regex::new(r"^\[\^(\w+)\]:(.*)$").expect("footnote definition regex");
    static ref REFERENCE: Regex = Regex::new(r"\[\^(\w+)\]").expect("footnote reference regex");
    static ref MARKER: Regex =
        Regex::new(r"\x{E000}fn:(\w+)\x{E001}").expect("footnote marker regex");
    /// Two or more blank lines; a blank line may hold spaces or tabs
    static ref BLANK_RUN: Regex =
        Regex::new(r"\n(?:[ \t]*\n){2,}").expect("blank line regex");
}

/// Footnote definitions of one document, keyed by identifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FootnoteTable {
    entries: BTreeMap<String, String>,
}

impl FootnoteTable {
    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Sentinel marker for the footnote `id`
pub fn marker(id: &str) -> String {
    format!("{}fn:{}{}", MARKER_OPEN, id, MARKER_CLOSE)
}

/// Extract footnote definitions and mark references.
/// Returns the rewritten text and the definitions found; a redefined
/// identifier keeps its last definition.
pub fn extract_footnotes(text: &str) -> (String, FootnoteTable) {
    let text = text.replace("\r\n", "\n");
    let mut table = FootnoteTable::default();
    let mut kept = String::with_capacity(text.len());

    for line in text.split_inclusive('\n') {
        let bare = line.strip_suffix('\n').unwrap_or(line);
        if let Some(caps) = DEFINITION.captures(bare) {
            table
                .entries
                .insert(caps[1].to_string(), caps[2].trim().to_string());
            continue;
        }
        kept.push_str(line);
    }

    let marked = REFERENCE.replace_all(&kept, |caps: &regex::Captures| marker(&caps[1]));
    let collapsed = BLANK_RUN.replace_all(&marked, "\n\n");

    (collapsed.into_owned(), table)
}

/// A piece of text split on footnote markers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Marker(&'a str),
}

/// Split text into plain runs and footnote markers, in order
pub fn split_markers(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in MARKER.captures_iter(text) {
        let (Some(whole), Some(id)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            segments.push(Segment::Text(&text[last..whole.start()]));
        }
        segments.push(Segment::Marker(id.as_str()));
        last = whole.end();
    }

    if last < text.len() {
        segments.push(Segment::Text(&text[last..]));
    }

    segments
}

/// Turn markers back into `[^id]` references, for literal contexts like code
pub fn restore_references(text: &str) -> String {
    MARKER.replace_all(text, "[^$1]").into_owned()
}

/// Signals a rendered footnote can receive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FootnoteSignal {
    /// The footnote's own marker was activated
    Activate,
    /// A click landed outside the footnote's rendered region
    ClickOutside,
    /// Explicit dismissal (escape key, close button)
    Cancel,
}

/// Open/closed state of one footnote occurrence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FootnoteToggle {
    open: bool,
}

impl FootnoteToggle {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Apply a signal and return the new state
    pub fn handle(&mut self, signal: FootnoteSignal) -> bool {
        match signal {
            FootnoteSignal::Activate => self.toggle(),
            FootnoteSignal::ClickOutside | FootnoteSignal::Cancel => self.close(),
        }
        self.open
    }
}

/// One independent toggle per footnote occurrence in a document
#[derive(Debug, Clone, Default)]
pub struct FootnoteToggles {
    toggles: Vec<FootnoteToggle>,
}

impl FootnoteToggles {
    pub fn new(occurrences: usize) -> Self {
        Self {
            toggles: vec![FootnoteToggle::default(); occurrences],
        }
    }

    /// One closed toggle per resolved footnote in `doc`, in document order
    pub fn for_document(doc: &Document) -> Self {
        Self::new(doc.footnotes().count())
    }

    pub fn len(&self) -> usize {
        self.toggles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toggles.is_empty()
    }

    pub fn is_open(&self, occurrence: usize) -> bool {
        self.toggles.get(occurrence).is_some_and(FootnoteToggle::is_open)
    }

    /// Route a signal to one occurrence. Unknown indices are ignored.
    pub fn handle(&mut self, occurrence: usize, signal: FootnoteSignal) -> bool {
        match self.toggles.get_mut(occurrence) {
            Some(toggle) => toggle.handle(signal),
            None => false,
        }
    }

    /// A click somewhere in the page: every footnote except the one that was
    /// hit (if any) closes.
    pub fn click_outside_all_but(&mut self, hit: Option<usize>) {
        for (i, toggle) in self.toggles.iter_mut().enumerate() {
            if Some(i) != hit {
                toggle.handle(FootnoteSignal::ClickOutside);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_definitions() {
        let (text, table) = extract_footnotes("Claim.[^a]\n\n[^a]: Detail text\n");
        assert_eq!(table.get("a"), Some("Detail text"));
        assert_eq!(table.len(), 1);
        assert!(!text.contains("Detail text"));
        assert!(text.contains(&marker("a")));
        assert!(!text.contains("[^a]"));
    }

    #[test]
    fn test_last_definition_wins() {
        let (_, table) = extract_footnotes("[^n]: first\n[^n]: second\n");
        assert_eq!(table.get("n"), Some("second"));
    }

    #[test]
    fn test_indented_definition_is_not_a_definition() {
        let (text, table) = extract_footnotes("  [^x]: not at line start\n");
        assert!(table.is_empty());
        assert!(text.contains(&marker("x")));
    }

    #[test]
    fn test_blank_runs_collapse() {
        let (text, _) = extract_footnotes("One\n\n[^1]: gone\n\n\n\nTwo");
        assert_eq!(text, "One\n\nTwo");
    }

    #[test]
    fn test_whitespace_only_lines_count_as_blank() {
        let (text, _) = extract_footnotes("One\n  \n[^1]: gone\n\t\n  Two");
        assert_eq!(text, "One\n\n  Two");

        let (text, _) = extract_footnotes("One\n \nTwo");
        assert_eq!(text, "One\n \nTwo");
    }

    #[test]
    fn test_crlf_definitions() {
        let (text, table) = extract_footnotes("Hi[^1]\r\n\r\n[^1]: windows line\r\n");
        assert_eq!(table.get("1"), Some("windows line"));
        assert!(!text.contains('\r'));
    }

    #[test]
    fn test_split_markers() {
        let text = format!("Before{}middle{}", marker("1"), marker("two"));
        assert_eq!(
            split_markers(&text),
            vec![
                Segment::Text("Before"),
                Segment::Marker("1"),
                Segment::Text("middle"),
                Segment::Marker("two"),
            ]
        );
        assert_eq!(split_markers("plain"), vec![Segment::Text("plain")]);
        assert!(split_markers("").is_empty());
    }

    #[test]
    fn test_restore_references() {
        let text = format!("let x = a{};", marker("i"));
        assert_eq!(restore_references(&text), "let x = a[^i];");
    }

    #[test]
    fn test_toggle_state() {
        let mut toggle = FootnoteToggle::default();
        assert!(toggle.handle(FootnoteSignal::Activate));
        assert!(!toggle.handle(FootnoteSignal::Activate));
        toggle.handle(FootnoteSignal::Activate);
        assert!(!toggle.handle(FootnoteSignal::Cancel));
        assert!(!toggle.handle(FootnoteSignal::ClickOutside));
    }

    #[test]
    fn test_toggles_are_independent() {
        let mut toggles = FootnoteToggles::new(3);
        toggles.handle(0, FootnoteSignal::Activate);
        toggles.handle(2, FootnoteSignal::Activate);
        assert!(toggles.is_open(0));
        assert!(!toggles.is_open(1));
        assert!(toggles.is_open(2));

        toggles.click_outside_all_but(Some(2));
        assert!(!toggles.is_open(0));
        assert!(toggles.is_open(2));

        assert!(!toggles.handle(7, FootnoteSignal::Activate));
    }

    #[test]
    fn test_toggles_for_document() {
        let doc = crate::content::MarkdownRenderer::new()
            .render("One[^a] two[^a] three[^b]\n\n[^a]: Shared note");
        let toggles = FootnoteToggles::for_document(&doc);
        assert_eq!(toggles.len(), 2);
        assert!(!toggles.is_open(0));
    }
}
