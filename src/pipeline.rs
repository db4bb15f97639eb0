//! Pipeline – ties together block classification, styling, layout,
//! pagination, and rendering into a single function call.

use std::fs;
use std::path::PathBuf;

use crate::blocks::parse_markdown;
use crate::diagrams::DiagramCatalog;
use crate::element::Document;
use crate::error::{Error, Result};
use crate::fonts::FontLibrary;
use crate::layout::layout_elements;
use crate::layout_config::LayoutConfig;
use crate::pagination::{paginate, PAGE_MARGIN_PT};
use crate::render::render_pdf;
use crate::style::{ColorScheme, FontFace, PageSize, StyleSheet};

/// Configuration for the Markdown → PDF pipeline.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Document title embedded in the PDF metadata and page footers
    /// (default: "mdpress output").
    pub title: String,
    /// Physical page size (default: A4).
    pub page_size: PageSize,
    /// Palette selection; grayscale keeps the layout identical (default: color).
    pub scheme: ColorScheme,
    /// Page margin in points (default: 56.7 ≈ 2 cm).
    pub page_margin: f32,
    /// Directory holding `.mmd` diagram sources and their rendered
    /// `images/png/` / `images/svg/` assets. `None` disables diagram lookup.
    pub diagrams_dir: Option<PathBuf>,
    /// Optional TTF file whose metrics refine body-text width measurement.
    /// Rendering always uses the built-in PDF faces.
    pub body_font: Option<PathBuf>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            title: "mdpress output".to_string(),
            page_size: PageSize::A4,
            scheme: ColorScheme::Color,
            page_margin: PAGE_MARGIN_PT,
            diagrams_dir: None,
            body_font: None,
        }
    }
}

impl RenderOptions {
    pub fn page_width(&self) -> f32 {
        self.page_size.width_pt()
    }

    pub fn page_height(&self) -> f32 {
        self.page_size.height_pt()
    }

    /// Width of the text column between the margins.
    pub fn content_width(&self) -> f32 {
        self.page_width() - 2.0 * self.page_margin
    }
}

/// Full pipeline: Markdown string → PDF bytes.
///
/// Returns `(pdf_bytes, layout_config)`; the layout config describes every
/// positioned box and can be serialized for inspection.
pub fn convert_document(
    markdown: &str,
    opts: &RenderOptions,
) -> Result<(Vec<u8>, LayoutConfig)> {
    // 1. Classify blocks into elements
    let catalog = match &opts.diagrams_dir {
        Some(dir) => DiagramCatalog::scan(dir),
        None => DiagramCatalog::empty(),
    };
    let doc = parse_markdown(markdown, &catalog);
    log::debug!("classified {} elements", doc.elements.len());

    render_elements(&doc, opts)
}

/// Layout and render an already-built element sequence. Shared by single
/// documents and assembled books.
pub fn render_elements(doc: &Document, opts: &RenderOptions) -> Result<(Vec<u8>, LayoutConfig)> {
    // 2. Styles and font metrics
    let styles = StyleSheet::new(opts.scheme);
    let mut fonts = FontLibrary::new();
    if let Some(path) = &opts.body_font {
        let bytes = fs::read(path).map_err(|source| Error::ReadInput {
            path: path.clone(),
            source,
        })?;
        fonts
            .load_ttf(FontFace::TimesRoman, bytes)
            .map_err(|reason| Error::FontParse {
                path: path.clone(),
                reason,
            })?;
    }

    // 3. Flow elements into document space
    let boxes = layout_elements(doc, opts.page_margin, opts.content_width(), &styles, &fonts);
    log::debug!("flow layout produced {} boxes", boxes.len());

    // 4. Paginate
    let layout_config = paginate(
        &boxes,
        opts.page_width(),
        opts.page_height(),
        opts.page_margin,
        &opts.title,
        &styles,
        &fonts,
    );
    log::debug!("paginated into {} pages", layout_config.pages.len());

    // 5. Render PDF
    let pdf_bytes = render_pdf(&layout_config).map_err(Error::Render)?;
    log::debug!("rendered {} bytes of PDF", pdf_bytes.len());

    Ok((pdf_bytes, layout_config))
}

/// Convenience: convert with default A4 options.
pub fn convert_markdown(markdown: &str) -> Result<Vec<u8>> {
    let (bytes, _) = convert_document(markdown, &RenderOptions::default())?;
    Ok(bytes)
}

/// Generate only the layout config (no PDF rendering) – useful for testing.
pub fn compute_layout(markdown: &str, opts: &RenderOptions) -> LayoutConfig {
    let catalog = match &opts.diagrams_dir {
        Some(dir) => DiagramCatalog::scan(dir),
        None => DiagramCatalog::empty(),
    };
    let doc = parse_markdown(markdown, &catalog);
    let styles = StyleSheet::new(opts.scheme);
    let fonts = FontLibrary::new();
    let boxes = layout_elements(&doc, opts.page_margin, opts.content_width(), &styles, &fonts);
    paginate(
        &boxes,
        opts.page_width(),
        opts.page_height(),
        opts.page_margin,
        &opts.title,
        &styles,
        &fonts,
    )
}
