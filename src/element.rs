//! Document model produced by block classification and consumed by layout.

use std::path::PathBuf;

use crate::inline::RichText;

/// One item of a bullet or numbered list. `level` is 0 for top-level items
/// and 1 for nested ones; deeper indentation is normalized to one level.
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub text: RichText,
    pub level: u8,
}

/// A typed block of document content.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// Heading at levels 1 through 4.
    Heading { level: u8, text: RichText },
    Paragraph(RichText),
    ListBlock {
        items: Vec<ListItem>,
        ordered: bool,
    },
    /// Rows of formatted cells, header row first. Rows are padded to equal
    /// width during classification.
    TableBlock { rows: Vec<Vec<RichText>> },
    Blockquote { lines: Vec<RichText> },
    /// Fenced code, kept verbatim with no inline formatting.
    CodeBlock {
        text: String,
        language: Option<String>,
    },
    /// Horizontal rule.
    Rule,
    /// A diagram rendered to an image on disk, with its caption.
    DiagramImage { path: PathBuf, caption: String },
    /// Vertical gap in points.
    Spacer { height: f32 },
    /// Elements laid out as a unit and kept on one page when possible.
    Grouped(Vec<Element>),
    /// Cover block assembled by the book builder, never by the classifier.
    TitleBlock {
        title: RichText,
        subtitle: Option<RichText>,
        date_line: Option<RichText>,
    },
    /// One contents line, styled distinctly from body text.
    TocEntry(RichText),
}

impl Element {
    pub fn heading(level: u8, text: RichText) -> Self {
        Element::Heading { level, text }
    }

    pub fn is_spacer(&self) -> bool {
        matches!(self, Element::Spacer { .. })
    }
}

/// The classifier's output: an ordered element sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub elements: Vec<Element>,
}

impl Document {
    pub fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
