//! Diagram catalog and resolution.
//!
//! Diagram sources live as `.mmd` files next to the documents, pre-rendered
//! to raster assets under `<dir>/images/png/` (preferred) with an SVG
//! fallback tier. The catalog indexes the sources once per conversion;
//! [`DiagramCatalog::resolve`] then maps a fenced diagram block to an entry
//! by its surrounding heading first and by the diagram source text second.
//!
//! Resolution is pure string matching. Whether the resolved asset actually
//! exists on disk is the caller's concern, checked via
//! [`DiagramCatalog::asset_path`]; an entry without an asset degrades to the
//! same textual placeholder as an unresolved block.

use std::fs;
use std::path::{Path, PathBuf};

/// Substitute paragraph text when a diagram cannot be resolved to an asset.
pub const PLACEHOLDER_TEXT: &str =
    "[Diagram - see visual in the diagrams section or web version]";

/// One known diagram source.
#[derive(Debug, Clone)]
pub struct DiagramEntry {
    /// File stem of the `.mmd` source, keys the rendered asset path.
    pub base: String,
    /// Position in the sorted source listing, matched against explicit
    /// "figure N" mentions in headings.
    pub figure: Option<u32>,
    heading_keywords: Vec<String>,
    content_keywords: Vec<String>,
}

impl DiagramEntry {
    /// Derive match keywords from the file stem: the stem with `-`/`_`
    /// turned into spaces matches headings, and its longer words (5+
    /// characters, short words match too promiscuously) match diagram
    /// source text.
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        let phrase = base.replace(['-', '_'], " ").to_lowercase();
        let content_keywords = phrase
            .split_whitespace()
            .filter(|w| w.len() >= 5)
            .map(str::to_string)
            .collect();
        Self {
            base,
            figure: None,
            heading_keywords: vec![phrase],
            content_keywords,
        }
    }

    pub fn with_figure(mut self, figure: u32) -> Self {
        self.figure = Some(figure);
        self
    }

    pub fn with_heading_keywords(mut self, keywords: &[&str]) -> Self {
        self.heading_keywords
            .extend(keywords.iter().map(|k| k.to_lowercase()));
        self
    }

    pub fn with_content_keywords(mut self, keywords: &[&str]) -> Self {
        self.content_keywords
            .extend(keywords.iter().map(|k| k.to_lowercase()));
        self
    }

    /// Caption rendered under the embedded image.
    pub fn caption(&self) -> String {
        let title = title_case(&self.base.replace(['-', '_'], " "));
        match self.figure {
            Some(n) => format!("Figure {n}: {title}"),
            None => title,
        }
    }
}

fn title_case(phrase: &str) -> String {
    phrase
        .split_whitespace()
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

/// Read-only lookup table of diagram sources, built once per document.
#[derive(Debug, Clone, Default)]
pub struct DiagramCatalog {
    entries: Vec<DiagramEntry>,
    diagrams_dir: Option<PathBuf>,
}

impl DiagramCatalog {
    /// A catalog that resolves nothing, for conversions without diagrams.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Catalog for tests and callers with an explicit entry list.
    pub fn from_entries(entries: Vec<DiagramEntry>) -> Self {
        Self {
            entries,
            diagrams_dir: None,
        }
    }

    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.diagrams_dir = Some(dir.into());
        self
    }

    /// Index the `.mmd` sources under `dir`. Figure numbers follow sorted
    /// stem order, matching the numbering the rendered docs use. A missing
    /// or unreadable directory yields an empty catalog rather than an error.
    pub fn scan(dir: &Path) -> Self {
        let mut stems: Vec<String> = match fs::read_dir(dir) {
            Ok(read) => read
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|p| p.extension().map(|e| e == "mmd").unwrap_or(false))
                .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
                .collect(),
            Err(err) => {
                log::warn!("Cannot index diagrams under '{}': {err}", dir.display());
                Vec::new()
            }
        };
        stems.sort();
        let entries: Vec<DiagramEntry> = stems
            .into_iter()
            .enumerate()
            .map(|(idx, stem)| DiagramEntry::new(stem).with_figure(idx as u32 + 1))
            .collect();
        log::debug!(
            "Indexed {} diagram source(s) under '{}'",
            entries.len(),
            dir.display()
        );
        Self {
            entries,
            diagrams_dir: Some(dir.to_path_buf()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Map a diagram block to an entry. Heading context wins over source
    /// content: an explicit "figure N" mention is checked first, then the
    /// heading keywords of every entry, and only then the diagram source
    /// text itself.
    pub fn resolve(&self, heading: &str, source: &str) -> Option<&DiagramEntry> {
        let heading = heading.to_lowercase();
        for entry in &self.entries {
            if let Some(n) = entry.figure {
                if heading.contains(&format!("figure {n}")) {
                    return Some(entry);
                }
            }
        }
        for entry in &self.entries {
            if entry
                .heading_keywords
                .iter()
                .any(|kw| heading.contains(kw.as_str()))
            {
                return Some(entry);
            }
        }
        let source = source.to_lowercase();
        for entry in &self.entries {
            if entry
                .content_keywords
                .iter()
                .any(|kw| source.contains(kw.as_str()))
            {
                return Some(entry);
            }
        }
        None
    }

    /// Rendered asset for `base`, if present on disk: the PNG tier first,
    /// falling back to SVG.
    pub fn asset_path(&self, base: &str) -> Option<PathBuf> {
        let dir = self.diagrams_dir.as_ref()?;
        let png = dir.join("images").join("png").join(format!("{base}.png"));
        if png.is_file() {
            return Some(png);
        }
        let svg = dir.join("images").join("svg").join(format!("{base}.svg"));
        if svg.is_file() {
            return Some(svg);
        }
        None
    }
}

/// Recognize an include-style reference line (`--8<-- "path"`) and return
/// the referenced path.
pub fn parse_include_reference(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix("--8<--")?;
    let path = rest.trim().trim_matches(|c| c == '"' || c == '\'');
    if path.is_empty() {
        None
    } else {
        Some(path)
    }
}
