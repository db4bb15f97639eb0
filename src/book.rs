//! Book assembly – stitches multiple Markdown chapters into one document
//! with a cover page and a table of contents, then renders it through the
//! shared pipeline. Chapter headings are level-1, so each chapter starts on
//! a fresh page.

use std::fs;
use std::path::{Path, PathBuf};

use crate::blocks::parse_markdown;
use crate::diagrams::DiagramCatalog;
use crate::element::{Document, Element};
use crate::error::{Error, Result};
use crate::inline::{format_inline, RichText};
use crate::layout_config::LayoutConfig;
use crate::pipeline::{convert_document, render_elements, RenderOptions};

/// One chapter: a Markdown source file plus its display title.
#[derive(Debug, Clone)]
pub struct Chapter {
    pub path: PathBuf,
    pub title: String,
}

impl Chapter {
    pub fn new(path: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
        }
    }

    /// Derive the display title from the file stem:
    /// `03_data-model.md` becomes "Data Model".
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let trimmed = stem.trim_start_matches(|c: char| c.is_ascii_digit() || c == '_' || c == '-');
        let base = if trimmed.is_empty() { &stem } else { trimmed };
        Self {
            title: title_from_stem(base),
            path,
        }
    }
}

fn title_from_stem(stem: &str) -> String {
    stem.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A whole book: front-matter text plus ordered chapters.
#[derive(Debug, Clone, Default)]
pub struct BookPlan {
    pub title: String,
    pub subtitle: Option<String>,
    pub date_line: Option<String>,
    pub chapters: Vec<Chapter>,
}

impl BookPlan {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn date_line(mut self, date_line: impl Into<String>) -> Self {
        self.date_line = Some(date_line.into());
        self
    }

    pub fn chapter(mut self, chapter: Chapter) -> Self {
        self.chapters.push(chapter);
        self
    }

    /// Build a plan whose chapter titles come from the file stems.
    pub fn from_paths(title: impl Into<String>, paths: &[PathBuf]) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            date_line: None,
            chapters: paths.iter().map(|p| Chapter::from_path(p)).collect(),
        }
    }
}

/// Assemble and render a book: cover, contents, then each chapter.
///
/// A chapter whose source file cannot be read degrades to an italic
/// placeholder paragraph instead of failing the whole book.
pub fn convert_book(plan: &BookPlan, opts: &RenderOptions) -> Result<(Vec<u8>, LayoutConfig)> {
    if plan.chapters.is_empty() {
        return Err(Error::EmptyBook);
    }

    let catalog = match &opts.diagrams_dir {
        Some(dir) => DiagramCatalog::scan(dir),
        None => DiagramCatalog::empty(),
    };

    let mut elements = cover_elements(plan);
    elements.extend(toc_elements(plan));

    for chapter in &plan.chapters {
        elements.push(Element::heading(1, format_inline(&chapter.title)));
        match fs::read_to_string(&chapter.path) {
            Ok(markdown) => {
                let mut doc = parse_markdown(&markdown, &catalog);
                strip_leading_h1(&mut doc);
                elements.extend(doc.elements);
            }
            Err(e) => {
                log::warn!("Cannot read chapter '{}': {e}", chapter.path.display());
                elements.push(Element::Paragraph(RichText::italic(format!(
                    "[Chapter source missing: {}]",
                    chapter.path.display()
                ))));
            }
        }
    }

    let mut opts = opts.clone();
    opts.title = plan.title.clone();
    render_elements(&Document::new(elements), &opts)
}

fn cover_elements(plan: &BookPlan) -> Vec<Element> {
    vec![
        Element::Spacer { height: 120.0 },
        Element::TitleBlock {
            title: RichText::plain(plan.title.as_str()),
            subtitle: plan.subtitle.as_deref().map(RichText::plain),
            date_line: plan.date_line.as_deref().map(RichText::plain),
        },
        Element::Spacer { height: 18.0 },
        Element::Rule,
    ]
}

fn toc_elements(plan: &BookPlan) -> Vec<Element> {
    let mut els = vec![Element::heading(1, RichText::plain("Contents"))];
    for (idx, chapter) in plan.chapters.iter().enumerate() {
        els.push(Element::TocEntry(RichText::plain(format!(
            "{:02}.  {}",
            idx + 1,
            chapter.title
        ))));
    }
    els
}

/// Drop a chapter's own top-level heading; the synthetic chapter heading
/// already carries the title.
fn strip_leading_h1(doc: &mut Document) {
    if matches!(doc.elements.first(), Some(Element::Heading { level: 1, .. })) {
        doc.elements.remove(0);
    }
}

/// Result of a per-file batch conversion.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub written: Vec<PathBuf>,
    pub failures: Vec<(PathBuf, Error)>,
}

impl BatchOutcome {
    pub fn all_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Convert each input to its own PDF under `out_dir`, titled after its file
/// stem. A failing input is reported and skipped; the rest of the batch
/// still converts.
pub fn convert_each(
    inputs: &[PathBuf],
    out_dir: &Path,
    opts: &RenderOptions,
) -> Result<BatchOutcome> {
    fs::create_dir_all(out_dir).map_err(|source| Error::WriteOutput {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let mut outcome = BatchOutcome::default();
    for input in inputs {
        match convert_one(input, out_dir, opts) {
            Ok(dest) => outcome.written.push(dest),
            Err(e) => {
                log::warn!("Skipping '{}': {e}", input.display());
                outcome.failures.push((input.clone(), e));
            }
        }
    }
    Ok(outcome)
}

fn convert_one(input: &Path, out_dir: &Path, opts: &RenderOptions) -> Result<PathBuf> {
    let markdown = fs::read_to_string(input).map_err(|source| Error::ReadInput {
        path: input.to_path_buf(),
        source,
    })?;
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());

    let mut doc_opts = opts.clone();
    doc_opts.title = stem.clone();

    let (bytes, _) = convert_document(&markdown, &doc_opts)?;
    let dest = out_dir.join(format!("{stem}.pdf"));
    fs::write(&dest, &bytes).map_err(|source| Error::WriteOutput {
        path: dest.clone(),
        source,
    })?;
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout_config::LayoutBox;
    use tempfile::tempdir;

    fn all_text(config: &LayoutConfig) -> String {
        let mut out = String::new();
        for page in &config.pages {
            for lbox in &page.boxes {
                collect_text(lbox, &mut out);
            }
        }
        out
    }

    fn collect_text(lbox: &LayoutBox, out: &mut String) {
        if let Some(text) = &lbox.text {
            for line in &text.lines {
                for run in &line.runs {
                    out.push_str(&run.text);
                }
                out.push('\n');
            }
        }
        for child in &lbox.children {
            collect_text(child, out);
        }
    }

    #[test]
    fn cover_and_toc_precede_chapters() {
        let dir = tempdir().unwrap();
        let ch1 = dir.path().join("01_intro.md");
        let ch2 = dir.path().join("02_details.md");
        fs::write(&ch1, "First chapter body.\n").unwrap();
        fs::write(&ch2, "Second chapter body.\n").unwrap();

        let plan = BookPlan::new("Atlas Handbook")
            .subtitle("Internal edition")
            .chapter(Chapter::new(&ch1, "Introduction"))
            .chapter(Chapter::new(&ch2, "Details"));
        let (bytes, config) = convert_book(&plan, &RenderOptions::default()).unwrap();

        assert_eq!(&bytes[0..5], b"%PDF-");
        let text = all_text(&config);
        assert!(text.contains("Atlas Handbook"));
        assert!(text.contains("Internal edition"));
        assert!(text.contains("Contents"));
        let toc1 = text.find("01.").unwrap();
        let toc2 = text.find("02.").unwrap();
        assert!(toc1 < toc2);
        assert!(text.contains("First chapter body."));
        assert!(text.contains("Second chapter body."));
    }

    #[test]
    fn missing_chapter_becomes_placeholder() {
        let dir = tempdir().unwrap();
        let present = dir.path().join("here.md");
        fs::write(&present, "Content.\n").unwrap();

        let plan = BookPlan::new("Gaps")
            .chapter(Chapter::new(&present, "Here"))
            .chapter(Chapter::new(dir.path().join("gone.md"), "Gone"));
        let (_, config) = convert_book(&plan, &RenderOptions::default()).unwrap();

        let text = all_text(&config);
        assert!(text.contains("Chapter source missing"));
        assert!(text.contains("Content."));
    }

    #[test]
    fn empty_book_is_rejected() {
        let plan = BookPlan::new("Nothing");
        let err = convert_book(&plan, &RenderOptions::default()).unwrap_err();
        assert!(matches!(err, Error::EmptyBook));
    }

    #[test]
    fn chapter_duplicate_h1_is_dropped() {
        let dir = tempdir().unwrap();
        let ch = dir.path().join("ch.md");
        fs::write(&ch, "# Original Internal Title\n\nBody text.\n").unwrap();

        let plan = BookPlan::new("Book").chapter(Chapter::new(&ch, "Display Title"));
        let (_, config) = convert_book(&plan, &RenderOptions::default()).unwrap();

        let text = all_text(&config);
        assert!(text.contains("Display Title"));
        assert!(!text.contains("Original Internal Title"));
        assert!(text.contains("Body text."));
    }

    #[test]
    fn stem_titles_read_well() {
        let ch = Chapter::from_path("docs/03_data-model.md");
        assert_eq!(ch.title, "Data Model");
        let plain = Chapter::from_path("overview.md");
        assert_eq!(plain.title, "Overview");
    }

    #[test]
    fn convert_each_isolates_failures() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.md");
        fs::write(&good, "# Fine\n\nworks\n").unwrap();
        let bad = dir.path().join("absent.md");
        let out_dir = dir.path().join("out");

        let outcome = convert_each(
            &[good.clone(), bad.clone()],
            &out_dir,
            &RenderOptions::default(),
        )
        .unwrap();

        assert_eq!(outcome.written.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert!(!outcome.all_ok());
        assert!(outcome.written[0].ends_with("good.pdf"));
        assert!(outcome.written[0].is_file());
        assert_eq!(outcome.failures[0].0, bad);
    }
}
