//! Block classifier: lines in, ordered [`Element`] sequence out.
//!
//! One forward pass over the document. At most one block state is open at a
//! time (code fence, table, list, blockquote); while a block is open its
//! handler gets first refusal on every line and either buffers it or closes
//! the block, producing a [`Step`] the driver applies. A closed-and-not-
//! consumed line is reclassified from scratch, so for example the line after
//! a table's last row can itself open a list.
//!
//! Line classification order is load-bearing: fence, then table row (any
//! line containing `|`), then list marker, then quote, then rule, then
//! heading, then blank, then include reference, then plain text. Later
//! checks assume earlier kinds were already consumed.
//!
//! Numbered level-3 headings (`N.N Title`) additionally open an entity
//! group, an overlay that collects the heading and the content after it so
//! pagination can keep a definition and its diagram on one page. Top-level
//! and level-2 headings, non-matching level-3 headings and rules close the
//! group; level-4 headings land inside it.

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::diagrams::{parse_include_reference, DiagramCatalog, PLACEHOLDER_TEXT};
use crate::element::{Document, Element, ListItem};
use crate::inline::{format_inline, RichText};

/// Height of the spacer emitted for a blank line, in points.
pub const BLANK_SPACER_PT: f32 = 5.7;

static RE_FRONTMATTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\A---\n.*?\n---\n").unwrap());
static RE_BADGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[[^\]]*\]\(https://img\.shields\.io/[^)]*\)").unwrap());

/// Strip material outside the block grammar: Windows line endings, a YAML
/// frontmatter block at the very start, and shields.io badge images.
fn preprocess(source: &str) -> String {
    let text = source.replace("\r\n", "\n");
    let text = RE_FRONTMATTER.replace(&text, "");
    RE_BADGE.replace_all(&text, "").into_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum BlockState {
    #[default]
    None,
    Code,
    Table,
    List,
    Blockquote,
}

/// Outcome of feeding one line to the open block's handler.
struct Step {
    /// Element produced by closing the block, if it closed.
    flushed: Option<Element>,
    state: BlockState,
    /// Whether the line was used up. A closed block leaves its trigger line
    /// unconsumed for reclassification.
    consumed: bool,
}

impl Step {
    fn buffered(state: BlockState) -> Self {
        Self {
            flushed: None,
            state,
            consumed: true,
        }
    }

    fn closed(flushed: Option<Element>) -> Self {
        Self {
            flushed,
            state: BlockState::None,
            consumed: false,
        }
    }
}

enum LineKind<'a> {
    Fence { language: &'a str },
    TableRow,
    ListMarker { ordered: bool },
    Quote,
    RuleLine,
    Heading { level: u8, text: &'a str },
    Blank,
    Include { path: &'a str },
    Text,
}

fn classify_line(line: &str) -> LineKind<'_> {
    let trimmed = line.trim();
    if let Some(language) = trimmed.strip_prefix("```") {
        return LineKind::Fence {
            language: language.trim(),
        };
    }
    if line.contains('|') {
        return LineKind::TableRow;
    }
    if let Some((ordered, _, _)) = parse_list_marker(line) {
        return LineKind::ListMarker { ordered };
    }
    if line.trim_start().starts_with('>') {
        return LineKind::Quote;
    }
    if is_rule_line(trimmed) {
        return LineKind::RuleLine;
    }
    if let Some((level, text)) = parse_heading(line) {
        return LineKind::Heading { level, text };
    }
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if let Some(path) = parse_include_reference(line) {
        return LineKind::Include { path };
    }
    LineKind::Text
}

/// Bullet (`- `, `* `, `+ `) or ordinal (`N. `) marker, with the indent
/// width and the text after the marker.
fn parse_list_marker(line: &str) -> Option<(bool, usize, &str)> {
    let indent = line.len() - line.trim_start().len();
    let t = line.trim_start();
    for marker in ["- ", "* ", "+ "] {
        if let Some(rest) = t.strip_prefix(marker) {
            return Some((false, indent, rest));
        }
    }
    let digits = t.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        if let Some(rest) = t[digits..].strip_prefix(". ") {
            return Some((true, indent, rest));
        }
    }
    None
}

/// Three or more of the same `-`, `*` or `_`, nothing else.
fn is_rule_line(trimmed: &str) -> bool {
    if trimmed.len() < 3 {
        return false;
    }
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(c @ ('-' | '*' | '_')) => chars.all(|x| x == c),
        _ => false,
    }
}

/// `#` through `####` at the start of the line, followed by a space.
/// Deeper levels and indented hashes fall through to plain text.
fn parse_heading(line: &str) -> Option<(u8, &str)> {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    if !(1..=4).contains(&hashes) {
        return None;
    }
    let text = line[hashes..].strip_prefix(' ')?;
    Some((hashes as u8, text.trim()))
}

/// `N.N ` subsection numbering, the trigger for entity grouping.
fn is_numbered_subsection(text: &str) -> bool {
    let t = text.trim_start();
    let d1 = t.chars().take_while(|c| c.is_ascii_digit()).count();
    if d1 == 0 {
        return false;
    }
    let Some(rest) = t[d1..].strip_prefix('.') else {
        return false;
    };
    let d2 = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if d2 == 0 {
        return false;
    }
    rest[d2..].starts_with(char::is_whitespace)
}

struct Classifier<'a> {
    state: BlockState,
    buffer: Vec<String>,
    code_language: Option<String>,
    list_ordered: bool,
    /// Open entity group collecting elements, or `None` at top level.
    entity: Option<Vec<Element>>,
    /// Raw text of the last heading seen, context for diagram resolution.
    last_heading: String,
    elements: Vec<Element>,
    catalog: &'a DiagramCatalog,
}

/// Classify a Markdown document into its element sequence.
pub fn parse_markdown(source: &str, catalog: &DiagramCatalog) -> Document {
    let text = preprocess(source);
    let lines: Vec<&str> = text.lines().collect();
    let mut st = Classifier {
        state: BlockState::None,
        buffer: Vec::new(),
        code_language: None,
        list_ordered: false,
        entity: None,
        last_heading: String::new(),
        elements: Vec::new(),
        catalog,
    };

    let mut i = 0;
    while i < lines.len() {
        if st.state != BlockState::None {
            let step = st.continue_block(lines[i]);
            st.state = step.state;
            if let Some(el) = step.flushed {
                st.push_sink(el);
            }
            if step.consumed {
                i += 1;
                continue;
            }
        }
        i = st.open_line(&lines, i);
    }
    st.finish()
}

impl Classifier<'_> {
    fn continue_block(&mut self, line: &str) -> Step {
        match self.state {
            BlockState::Code => self.continue_code(line),
            BlockState::Table => self.continue_table(line),
            BlockState::List => self.continue_list(line),
            BlockState::Blockquote => self.continue_quote(line),
            BlockState::None => Step::closed(None),
        }
    }

    fn continue_code(&mut self, line: &str) -> Step {
        if line.trim_start().starts_with("```") {
            // The closing fence is consumed with the block.
            Step {
                flushed: Some(self.take_code()),
                state: BlockState::None,
                consumed: true,
            }
        } else {
            self.buffer.push(line.to_string());
            Step::buffered(BlockState::Code)
        }
    }

    fn continue_table(&mut self, line: &str) -> Step {
        if line.contains('|') {
            self.buffer.push(line.to_string());
            Step::buffered(BlockState::Table)
        } else {
            Step::closed(self.take_table())
        }
    }

    fn continue_list(&mut self, line: &str) -> Step {
        if line.trim().is_empty() {
            // Loose list: a blank line does not close the block.
            self.buffer.push(line.to_string());
            return Step::buffered(BlockState::List);
        }
        match parse_list_marker(line) {
            Some((ordered, _, _)) if ordered == self.list_ordered => {
                self.buffer.push(line.to_string());
                Step::buffered(BlockState::List)
            }
            Some((ordered, _, _)) => {
                // Marker style switched: this line both closes the open list
                // and starts a new one.
                let flushed = self.take_list();
                self.buffer = vec![line.to_string()];
                self.list_ordered = ordered;
                Step {
                    flushed,
                    state: BlockState::List,
                    consumed: true,
                }
            }
            None => Step::closed(self.take_list()),
        }
    }

    fn continue_quote(&mut self, line: &str) -> Step {
        if line.trim_start().starts_with('>') {
            self.buffer.push(line.to_string());
            Step::buffered(BlockState::Blockquote)
        } else {
            Step::closed(self.take_quote())
        }
    }

    /// Classify a line from the no-open-block state. Returns the index of
    /// the next line to look at (diagram fences consume several).
    fn open_line(&mut self, lines: &[&str], i: usize) -> usize {
        let line = lines[i];
        match classify_line(line) {
            LineKind::Fence { language } => {
                if language.eq_ignore_ascii_case("mermaid") {
                    return self.diagram_fence(lines, i);
                }
                self.code_language = (!language.is_empty()).then(|| language.to_string());
                self.buffer.clear();
                self.state = BlockState::Code;
            }
            LineKind::TableRow => {
                self.buffer = vec![line.to_string()];
                self.state = BlockState::Table;
            }
            LineKind::ListMarker { ordered } => {
                self.buffer = vec![line.to_string()];
                self.list_ordered = ordered;
                self.state = BlockState::List;
            }
            LineKind::Quote => {
                self.buffer = vec![line.to_string()];
                self.state = BlockState::Blockquote;
            }
            LineKind::RuleLine => {
                // An open entity group closes before the rule, preserving
                // document order.
                self.close_entity();
                self.elements.push(Element::Rule);
            }
            LineKind::Heading { level, text } => self.heading(level, text),
            LineKind::Blank => self.blank(),
            LineKind::Include { path } => self.include(path),
            LineKind::Text => {
                self.push_sink(Element::Paragraph(format_inline(line.trim())));
            }
        }
        i + 1
    }

    /// A fence tagged as diagram source never becomes a code block: the
    /// source is captured up to the closing fence and resolved to an image
    /// or placeholder on the spot.
    fn diagram_fence(&mut self, lines: &[&str], open: usize) -> usize {
        let mut j = open + 1;
        let mut source = Vec::new();
        while j < lines.len() && !lines[j].trim_start().starts_with("```") {
            source.push(lines[j]);
            j += 1;
        }
        let el = diagram_element(&self.last_heading, &source.join("\n"), self.catalog);
        self.push_sink(el);
        if j < lines.len() {
            j + 1
        } else {
            j
        }
    }

    fn heading(&mut self, level: u8, text: &str) {
        match level {
            1 | 2 => {
                self.close_entity();
                self.elements.push(Element::heading(level, format_inline(text)));
            }
            3 => {
                self.close_entity();
                let el = Element::heading(3, format_inline(text));
                if is_numbered_subsection(text) {
                    // The heading itself belongs to the group it opens.
                    self.entity = Some(vec![el]);
                } else {
                    self.elements.push(el);
                }
            }
            _ => self.push_sink(Element::heading(level, format_inline(text))),
        }
        self.last_heading = text.to_string();
    }

    fn blank(&mut self) {
        let last_is_spacer = match &self.entity {
            Some(buf) => buf.last().map(Element::is_spacer).unwrap_or(false),
            None => self.elements.last().map(Element::is_spacer).unwrap_or(false),
        };
        if !last_is_spacer {
            self.push_sink(Element::Spacer {
                height: BLANK_SPACER_PT,
            });
        }
    }

    fn include(&mut self, path: &str) {
        match fs::read_to_string(Path::new(path)) {
            Ok(content) => {
                let el = diagram_element(&self.last_heading, &content, self.catalog);
                self.push_sink(el);
            }
            Err(err) => {
                log::warn!("Cannot read included diagram source '{path}': {err}");
                self.push_sink(Element::Paragraph(RichText::italic(PLACEHOLDER_TEXT)));
            }
        }
    }

    fn push_sink(&mut self, el: Element) {
        match &mut self.entity {
            Some(buf) => buf.push(el),
            None => self.elements.push(el),
        }
    }

    fn close_entity(&mut self) {
        if let Some(buf) = self.entity.take() {
            if buf.len() > 1 {
                self.elements.push(Element::Grouped(buf));
            } else {
                self.elements.extend(buf);
            }
        }
    }

    fn take_code(&mut self) -> Element {
        let text = self.buffer.join("\n");
        self.buffer.clear();
        Element::CodeBlock {
            text,
            language: self.code_language.take(),
        }
    }

    fn take_table(&mut self) -> Option<Element> {
        let lines = std::mem::take(&mut self.buffer);
        build_table(&lines)
    }

    fn take_list(&mut self) -> Option<Element> {
        let lines = std::mem::take(&mut self.buffer);
        build_list(&lines, self.list_ordered)
    }

    fn take_quote(&mut self) -> Option<Element> {
        let lines = std::mem::take(&mut self.buffer);
        let formatted: Vec<RichText> = lines
            .iter()
            .map(|l| {
                let t = l.trim_start();
                let rest = t.strip_prefix('>').unwrap_or(t);
                format_inline(rest.trim())
            })
            .collect();
        if formatted.is_empty() {
            None
        } else {
            Some(Element::Blockquote { lines: formatted })
        }
    }

    /// End of input: whatever is still open flushes through the same paths
    /// a triggered close would take, so no buffered content is dropped.
    fn finish(mut self) -> Document {
        let flushed = match self.state {
            BlockState::None => None,
            BlockState::Code => Some(self.take_code()),
            BlockState::Table => self.take_table(),
            BlockState::List => self.take_list(),
            BlockState::Blockquote => self.take_quote(),
        };
        if let Some(el) = flushed {
            self.push_sink(el);
        }
        self.close_entity();
        Document::new(self.elements)
    }
}

/// Resolve a diagram block against the catalog and the filesystem, falling
/// back to the textual placeholder.
fn diagram_element(heading: &str, source: &str, catalog: &DiagramCatalog) -> Element {
    if let Some(entry) = catalog.resolve(heading, source) {
        if let Some(path) = catalog.asset_path(&entry.base) {
            return Element::DiagramImage {
                path,
                caption: entry.caption(),
            };
        }
        log::warn!(
            "No rendered asset for diagram '{}', using placeholder",
            entry.base
        );
    } else {
        log::warn!("Unresolved diagram under heading '{heading}', using placeholder");
    }
    Element::Paragraph(RichText::italic(PLACEHOLDER_TEXT))
}

/// Buffered table lines → rows of formatted cells. Separator rows are
/// discarded; one leading and one trailing empty cell per row are artifacts
/// of the outer pipes and are stripped; jagged rows are padded with empty
/// cells to the widest row.
fn build_table(lines: &[String]) -> Option<Element> {
    let mut rows: Vec<Vec<RichText>> = Vec::new();
    for line in lines {
        if is_separator_row(line) {
            continue;
        }
        let mut cells: Vec<&str> = line.split('|').map(str::trim).collect();
        if cells.first() == Some(&"") {
            cells.remove(0);
        }
        if cells.last() == Some(&"") {
            cells.pop();
        }
        rows.push(cells.into_iter().map(format_inline).collect());
    }
    if rows.is_empty() {
        log::warn!("Discarding table block with no content rows");
        return None;
    }
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if rows.iter().any(|r| r.len() != width) {
        log::warn!("Padding jagged table rows to {width} columns");
        for row in &mut rows {
            row.resize(width, RichText::default());
        }
    }
    Some(Element::TableBlock { rows })
}

fn is_separator_row(line: &str) -> bool {
    let t = line.trim();
    !t.is_empty()
        && t.contains('-')
        && t.chars().all(|c| matches!(c, '-' | ':' | '|' | ' '))
}

/// Buffered list lines → items with one level of nesting, measured against
/// the block's minimum indentation.
fn build_list(lines: &[String], ordered: bool) -> Option<Element> {
    let parsed: Vec<(usize, &str)> = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| match parse_list_marker(l) {
            Some((_, indent, rest)) => (indent, rest),
            None => {
                log::warn!("List line without a marker: '{}'", l.trim());
                (0, l.trim())
            }
        })
        .collect();
    if parsed.is_empty() {
        return None;
    }
    let min_indent = parsed.iter().map(|(indent, _)| *indent).min().unwrap_or(0);
    let items = parsed
        .into_iter()
        .map(|(indent, rest)| ListItem {
            text: format_inline(rest.trim()),
            level: u8::from(indent >= min_indent + 2),
        })
        .collect();
    Some(Element::ListBlock { items, ordered })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Vec<Element> {
        parse_markdown(source, &DiagramCatalog::empty()).elements
    }

    fn non_spacer(elements: &[Element]) -> Vec<&Element> {
        elements.iter().filter(|e| !e.is_spacer()).collect()
    }

    #[test]
    fn headings_and_paragraphs() {
        let els = parse("# Title\n\nSome text here.\n\n## Section\n");
        let els = non_spacer(&els);
        assert!(matches!(els[0], Element::Heading { level: 1, .. }));
        assert!(matches!(els[1], Element::Paragraph(_)));
        assert!(matches!(els[2], Element::Heading { level: 2, .. }));
    }

    #[test]
    fn five_hashes_is_a_paragraph() {
        let els = parse("##### too deep\n");
        assert!(matches!(&els[0], Element::Paragraph(t) if t.plain_text() == "##### too deep"));
    }

    #[test]
    fn indented_hashes_stay_text() {
        let els = parse("   # Not A Heading\n");
        assert!(matches!(&els[0], Element::Paragraph(t) if t.plain_text() == "# Not A Heading"));
    }

    #[test]
    fn table_round_trip() {
        let els = parse("| A | B |\n|---|---|\n| 1 | 2 |\n");
        match &els[0] {
            Element::TableBlock { rows } => {
                assert_eq!(rows.len(), 2);
                let texts: Vec<Vec<String>> = rows
                    .iter()
                    .map(|r| r.iter().map(|c| c.plain_text()).collect())
                    .collect();
                assert_eq!(texts[0], vec!["A", "B"]);
                assert_eq!(texts[1], vec!["1", "2"]);
            }
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn jagged_table_rows_are_padded() {
        let els = parse("| A | B | C |\n|---|---|---|\n| 1 | 2 |\n");
        match &els[0] {
            Element::TableBlock { rows } => {
                assert!(rows.iter().all(|r| r.len() == 3));
                assert!(rows[1][2].is_empty());
            }
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn loose_list_stays_one_block() {
        let els = parse("- one\n- two\n- three\n\n- four\n");
        let els = non_spacer(&els);
        assert_eq!(els.len(), 1);
        match els[0] {
            Element::ListBlock { items, ordered } => {
                assert_eq!(items.len(), 4);
                assert!(!ordered);
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn marker_style_switch_splits_lists() {
        let els = parse("- alpha\n- beta\n1. first\n2. second\n");
        let els = non_spacer(&els);
        assert_eq!(els.len(), 2);
        assert!(matches!(els[0], Element::ListBlock { ordered: false, .. }));
        assert!(matches!(els[1], Element::ListBlock { ordered: true, .. }));
    }

    #[test]
    fn nested_items_normalize_to_one_level() {
        let els = parse("- top\n  - nested\n      - deeper\n- top again\n");
        match &els[0] {
            Element::ListBlock { items, .. } => {
                let levels: Vec<u8> = items.iter().map(|i| i.level).collect();
                assert_eq!(levels, vec![0, 1, 1, 0]);
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn blockquote_lines_form_one_block() {
        let els = parse("> first line\n> second line\nafter\n");
        let els = non_spacer(&els);
        match els[0] {
            Element::Blockquote { lines } => {
                assert_eq!(lines.len(), 2);
                assert_eq!(lines[0].plain_text(), "first line");
            }
            other => panic!("expected blockquote, got {other:?}"),
        }
        assert!(matches!(els[1], Element::Paragraph(_)));
    }

    #[test]
    fn code_fence_buffers_verbatim() {
        let els = parse("```rust\nlet x = **not bold**;\n\nlet y = 2;\n```\n");
        match &els[0] {
            Element::CodeBlock { text, language } => {
                assert_eq!(language.as_deref(), Some("rust"));
                assert_eq!(text, "let x = **not bold**;\n\nlet y = 2;");
            }
            other => panic!("expected code block, got {other:?}"),
        }
    }

    #[test]
    fn unclosed_fence_flushes_at_eof() {
        let els = parse("```\ntrailing content\n");
        match &els[0] {
            Element::CodeBlock { text, .. } => assert_eq!(text, "trailing content"),
            other => panic!("expected code block, got {other:?}"),
        }
    }

    #[test]
    fn consecutive_blanks_collapse_to_one_spacer() {
        let els = parse("para one\n\n\n\npara two\n");
        let spacers = els.iter().filter(|e| e.is_spacer()).count();
        assert_eq!(spacers, 1);
        assert_eq!(els.len(), 3);
    }

    #[test]
    fn rule_variants_recognized() {
        for src in ["---\n", "*****\n", "___\n"] {
            let els = parse(src);
            assert!(matches!(els[0], Element::Rule), "input {src:?}");
        }
        // Mixed characters are not a rule.
        let els = parse("--*\n");
        assert!(matches!(els[0], Element::Paragraph(_)));
    }

    #[test]
    fn entity_group_collects_heading_and_content() {
        let src = "### 1.2 Example Entity\nIntro paragraph.\n```mermaid\ngraph TD\n```\n## Next Section\n";
        let els = parse(src);
        match &els[0] {
            Element::Grouped(members) => {
                assert_eq!(members.len(), 3);
                assert!(matches!(members[0], Element::Heading { level: 3, .. }));
                assert!(matches!(members[1], Element::Paragraph(_)));
                // Empty catalog: the diagram degrades to a placeholder.
                assert!(matches!(&members[2], Element::Paragraph(t)
                    if t.plain_text() == PLACEHOLDER_TEXT));
            }
            other => panic!("expected group, got {other:?}"),
        }
        assert!(matches!(els[1], Element::Heading { level: 2, .. }));
    }

    #[test]
    fn lone_entity_heading_is_not_wrapped() {
        let els = parse("### 2.1 First\n### 2.2 Second\ncontent\n");
        assert!(matches!(els[0], Element::Heading { level: 3, .. }));
        assert!(matches!(els[1], Element::Grouped(_)));
    }

    #[test]
    fn non_numbered_h3_stays_top_level() {
        let els = parse("### Plain Heading\ncontent\n");
        assert!(matches!(els[0], Element::Heading { level: 3, .. }));
        assert!(matches!(els[1], Element::Paragraph(_)));
    }

    #[test]
    fn rule_closes_entity_before_emitting() {
        let els = parse("### 3.1 Thing\nbody\n---\nafter\n");
        assert!(matches!(els[0], Element::Grouped(_)));
        assert!(matches!(els[1], Element::Rule));
        assert!(matches!(els[2], Element::Paragraph(_)));
    }

    #[test]
    fn level_four_heading_stays_inside_entity() {
        let els = parse("### 4.1 Outer\n#### Detail\ntext\n## Close\n");
        match &els[0] {
            Element::Grouped(members) => {
                assert!(matches!(members[1], Element::Heading { level: 4, .. }));
            }
            other => panic!("expected group, got {other:?}"),
        }
    }

    #[test]
    fn frontmatter_and_badges_stripped() {
        let src = "---\ntitle: Doc\nauthor: x\n---\n![build](https://img.shields.io/badge/build-ok-green)\n# Real Title\n";
        let els = parse(src);
        let first = non_spacer(&els)[0];
        assert!(
            matches!(first, Element::Heading { level: 1, .. }),
            "got {first:?}"
        );
    }

    #[test]
    fn badge_strip_keeps_blank_line_structure() {
        let src =
            "# T\n![a](https://img.shields.io/a) ![b](https://img.shields.io/b)\n\nIntro.\n";
        let els = parse(src);
        assert!(
            els.iter().any(Element::is_spacer),
            "badge line should leave its blank"
        );
        let els = non_spacer(&els);
        assert!(matches!(els[0], Element::Heading { level: 1, .. }));
        assert!(matches!(&els[1], Element::Paragraph(t) if t.plain_text() == "Intro."));
    }

    #[test]
    fn missing_include_becomes_placeholder() {
        let els = parse("--8<-- \"/no/such/diagram.mmd\"\n");
        assert!(matches!(&els[0], Element::Paragraph(t)
            if t.plain_text() == PLACEHOLDER_TEXT));
    }

    #[test]
    fn table_inside_entity_lands_in_group() {
        let src = "### 5.1 Fields\n| K | V |\n|---|---|\n| a | b |\n## After\n";
        let els = parse(src);
        match &els[0] {
            Element::Grouped(members) => {
                assert!(members.iter().any(|m| matches!(m, Element::TableBlock { .. })));
            }
            other => panic!("expected group, got {other:?}"),
        }
    }

    #[test]
    fn inline_formatting_reaches_cells_and_items() {
        let els = parse("| **H** |\n| *v* |\n");
        match &els[0] {
            Element::TableBlock { rows } => {
                assert!(rows[0][0].spans[0].bold);
                assert!(rows[1][0].spans[0].italic);
            }
            other => panic!("expected table, got {other:?}"),
        }
    }
}
