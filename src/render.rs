//! PDF renderer – takes a [`LayoutConfig`] and produces PDF bytes using
//! `printpdf` (v0.8 ops-based API).
//!
//! Text is pre-wrapped into styled runs by layout, so rendering is a direct
//! translation: one text section per line, one write op per run, with the
//! built-in Type1 faces (nothing is embedded).

use std::collections::{HashMap, HashSet};
use std::fs;

use printpdf::*;

use crate::layout_config::{LayoutBox, LayoutConfig, TextRun};
use crate::style::FontFace;

/// A printpdf XObject together with the pixel dimensions of the source image.
struct ImageResource {
    xobj_id: XObjectId,
    px_width: u32,
    px_height: u32,
}

/// Render a LayoutConfig into PDF bytes.
///
/// Image boxes whose file cannot be read or decoded render as a bordered
/// placeholder carrying a short diagnostic instead of failing the document.
pub fn render_pdf(config: &LayoutConfig) -> Result<Vec<u8>, String> {
    let page_w = Mm(config.page_width_pt * 0.352778); // pt → mm
    let page_h = Mm(config.page_height_pt * 0.352778);

    let mut doc = PdfDocument::new(&config.title);

    // ── Pre-register all images ────────────────────────────────────────────
    let mut all_srcs: HashSet<&str> = HashSet::new();
    for page_layout in &config.pages {
        for lbox in &page_layout.boxes {
            collect_image_srcs(lbox, &mut all_srcs);
        }
    }

    let mut image_resources: HashMap<String, ImageResource> = HashMap::new();
    let mut img_warnings: Vec<PdfWarnMsg> = Vec::new();

    for src in &all_srcs {
        let bytes = match fs::read(src) {
            Ok(b) => b,
            Err(e) => {
                log::warn!("Cannot read image '{src}': {e}");
                continue;
            }
        };

        // Decode with the `image` crate to obtain pixel dimensions.
        let dyn_img = match ::image::load_from_memory(&bytes) {
            Ok(img) => img,
            Err(e) => {
                log::warn!("Cannot decode image '{src}': {e}");
                continue;
            }
        };
        let (px_width, px_height) = (dyn_img.width(), dyn_img.height());

        // Register with printpdf as a reusable XObject.
        let raw = match RawImage::decode_from_bytes(&bytes, &mut img_warnings) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Cannot encode image '{src}' for PDF: {e}");
                continue;
            }
        };
        let xobj_id = doc.add_image(&raw);

        image_resources.insert(
            src.to_string(),
            ImageResource {
                xobj_id,
                px_width,
                px_height,
            },
        );
    }

    // ── Render pages ──────────────────────────────────────────────────────
    let mut pages = Vec::new();

    for page_layout in &config.pages {
        let mut ops = Vec::new();

        for lbox in &page_layout.boxes {
            render_box(&mut ops, lbox, config.page_height_pt, &image_resources);
        }

        pages.push(PdfPage::new(page_w, page_h, ops));
    }

    // Ensure at least one page.
    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }

    doc.with_pages(pages);
    let bytes = doc.save(&PdfSaveOptions::default(), &mut Vec::new());

    Ok(bytes)
}

fn builtin(face: FontFace) -> BuiltinFont {
    match face {
        FontFace::Helvetica => BuiltinFont::Helvetica,
        FontFace::HelveticaBold => BuiltinFont::HelveticaBold,
        FontFace::HelveticaOblique => BuiltinFont::HelveticaOblique,
        FontFace::HelveticaBoldOblique => BuiltinFont::HelveticaBoldOblique,
        FontFace::TimesRoman => BuiltinFont::TimesRoman,
        FontFace::TimesBold => BuiltinFont::TimesBold,
        FontFace::TimesItalic => BuiltinFont::TimesItalic,
        FontFace::TimesBoldItalic => BuiltinFont::TimesBoldItalic,
        FontFace::Courier => BuiltinFont::Courier,
        FontFace::CourierBold => BuiltinFont::CourierBold,
    }
}

fn rgb(c: [f32; 4]) -> Color {
    Color::Rgb(Rgb {
        r: c[0],
        g: c[1],
        b: c[2],
        icc_profile: None,
    })
}

/// Convert a UTF-8 string to raw Windows-1252 bytes then wrap in a String so
/// printpdf writes the bytes unchanged into the PDF stream (builtin fonts use
/// WinAnsiEncoding, so each glyph is one byte 0x00–0xFF).
fn to_winlatin(s: &str) -> String {
    let bytes: Vec<u8> = s
        .chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80, // euro
            '\u{201A}' => 0x82, // single low-9 quote
            '\u{201E}' => 0x84, // double low-9 quote
            '\u{2026}' => 0x85, // ellipsis
            '\u{2018}' => 0x91, // left single quote
            '\u{2019}' => 0x92, // right single quote
            '\u{201C}' => 0x93, // left double quote
            '\u{201D}' => 0x94, // right double quote
            '\u{2022}' => 0x95, // bullet
            '\u{2013}' => 0x96, // en-dash
            '\u{2014}' => 0x97, // em-dash
            '\u{2122}' => 0x99, // trademark
            '\u{00A0}' => 0x20, // non-breaking space -> space
            c if (c as u32) < 256 => c as u8,
            _ => b'?',
        })
        .collect();
    // SAFETY: intentionally non-UTF-8 for 0x80-0x9F range; printpdf passes
    // these bytes straight to the PDF stream, decoded by WinAnsiEncoding.
    #[allow(unsafe_code)]
    unsafe {
        String::from_utf8_unchecked(bytes)
    }
}

/// Recursively collect all unique `image.src` strings from a [`LayoutBox`] tree.
fn collect_image_srcs<'a>(lbox: &'a LayoutBox, srcs: &mut HashSet<&'a str>) {
    if let Some(img) = &lbox.image {
        srcs.insert(img.src.as_str());
    }
    for child in &lbox.children {
        collect_image_srcs(child, srcs);
    }
}

/// Recursively render a LayoutBox and its children into PDF ops.
fn render_box(
    ops: &mut Vec<Op>,
    lbox: &LayoutBox,
    page_height: f32,
    images: &HashMap<String, ImageResource>,
) {
    // PDF coordinate system: origin at bottom-left.
    // Our layout uses origin at top-left. Convert:
    let pdf_y = page_height - lbox.y;

    // Background
    if let Some(bg) = &lbox.background_color {
        ops.push(Op::SetFillColor { col: rgb(*bg) });
        ops.push(Op::DrawPolygon {
            polygon: rect_polygon(lbox.x, pdf_y - lbox.height, lbox.x + lbox.width, pdf_y),
        });
    }

    // Border
    if let Some(border) = &lbox.border {
        ops.push(Op::SetOutlineColor {
            col: rgb(border.color),
        });
        ops.push(Op::SetOutlineThickness {
            pt: Pt(border.width),
        });
        ops.push(Op::DrawLine {
            line: rect_outline(lbox.x, pdf_y - lbox.height, lbox.x + lbox.width, pdf_y),
        });
    }

    // Horizontal rule across the box
    if let Some(rule) = &lbox.rule {
        let y = pdf_y - lbox.height / 2.0;
        ops.push(Op::SetOutlineColor {
            col: rgb(rule.color),
        });
        ops.push(Op::SetOutlineThickness {
            pt: Pt(rule.thickness),
        });
        ops.push(Op::DrawLine {
            line: Line {
                points: vec![
                    line_point(lbox.x, y),
                    line_point(lbox.x + lbox.width, y),
                ],
                is_closed: false,
            },
        });
    }

    // Text
    if let Some(text) = &lbox.text {
        for tline in &text.lines {
            if tline.runs.iter().all(|r| r.text.is_empty()) {
                continue;
            }
            let text_x = lbox.x + tline.x_offset;
            // One shared baseline per line, from its largest run.
            let max_size = tline.runs.iter().map(|r| r.size).fold(0.0f32, f32::max);
            let text_y = pdf_y - tline.y_offset - max_size * 0.75;

            ops.push(Op::StartTextSection);
            ops.push(Op::SetTextCursor {
                pos: Point {
                    x: Pt(text_x),
                    y: Pt(text_y),
                },
            });
            ops.push(Op::SetLineHeight {
                lh: Pt(text.leading),
            });
            for run in &tline.runs {
                if run.text.is_empty() {
                    continue;
                }
                let font = builtin(run.face);
                ops.push(Op::SetFontSizeBuiltinFont {
                    size: Pt(run.size),
                    font,
                });
                ops.push(Op::SetFillColor {
                    col: rgb(run.color),
                });
                ops.push(Op::WriteTextBuiltinFont {
                    items: vec![TextItem::Text(to_winlatin(&run.text))],
                    font,
                });
            }
            ops.push(Op::EndTextSection);

            // Underlines, positioned from the measured run widths.
            let mut run_x = text_x;
            for run in &tline.runs {
                if run.underline && !run.text.is_empty() {
                    let underline_y = text_y - run.size * 0.1;
                    ops.push(Op::SetOutlineThickness { pt: Pt(0.5) });
                    ops.push(Op::SetOutlineColor {
                        col: rgb(run.color),
                    });
                    ops.push(Op::DrawLine {
                        line: Line {
                            points: vec![
                                line_point(run_x, underline_y),
                                line_point(run_x + run.width, underline_y),
                            ],
                            is_closed: false,
                        },
                    });
                }
                run_x += run.width;
            }
        }

        // List marker, right-aligned in the gutter left of the box.
        if let Some(marker) = &text.marker {
            draw_marker(ops, marker, lbox.x, pdf_y);
        }
    }

    // Image – embed from pre-registered XObject
    if let Some(img) = &lbox.image {
        match images.get(&img.src) {
            Some(res) => {
                // PDF origin is bottom-left; our layout origin is top-left.
                // translate_y = bottom edge of image in PDF coordinates.
                let img_bottom_y = page_height - lbox.y - img.height;

                // At dpi=72 printpdf renders 1 px = 1 pt, so
                // scale = desired_pt / px_dim.
                let scale_x = if res.px_width > 0 {
                    img.width / res.px_width as f32
                } else {
                    1.0
                };
                let scale_y = if res.px_height > 0 {
                    img.height / res.px_height as f32
                } else {
                    1.0
                };

                ops.push(Op::UseXobject {
                    id: res.xobj_id.clone(),
                    transform: XObjectTransform {
                        translate_x: Some(Pt(lbox.x)),
                        translate_y: Some(Pt(img_bottom_y)),
                        dpi: Some(72.0),
                        scale_x: Some(scale_x),
                        scale_y: Some(scale_y),
                        rotate: None,
                    },
                });
            }
            None => draw_image_placeholder(ops, lbox, pdf_y),
        }
    }

    // Children
    for child in &lbox.children {
        render_box(ops, child, page_height, images);
    }
}

fn draw_marker(ops: &mut Vec<Op>, marker: &TextRun, box_x: f32, pdf_y: f32) {
    let font = builtin(marker.face);
    let marker_x = box_x - marker.width - 6.0;
    let marker_y = pdf_y - marker.size * 0.75;
    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextCursor {
        pos: Point {
            x: Pt(marker_x),
            y: Pt(marker_y),
        },
    });
    ops.push(Op::SetFontSizeBuiltinFont {
        size: Pt(marker.size),
        font,
    });
    ops.push(Op::SetFillColor {
        col: rgb(marker.color),
    });
    ops.push(Op::WriteTextBuiltinFont {
        items: vec![TextItem::Text(to_winlatin(&marker.text))],
        font,
    });
    ops.push(Op::EndTextSection);
}

/// Stand-in for an image that could not be registered: a light panel with a
/// border and a one-line diagnostic.
fn draw_image_placeholder(ops: &mut Vec<Op>, lbox: &LayoutBox, pdf_y: f32) {
    const PANEL: [f32; 4] = [0.95, 0.96, 0.96, 1.0];
    const EDGE: [f32; 4] = [0.82, 0.84, 0.86, 1.0];
    const NOTE: [f32; 4] = [0.42, 0.45, 0.49, 1.0];

    ops.push(Op::SetFillColor { col: rgb(PANEL) });
    ops.push(Op::DrawPolygon {
        polygon: rect_polygon(lbox.x, pdf_y - lbox.height, lbox.x + lbox.width, pdf_y),
    });
    ops.push(Op::SetOutlineColor { col: rgb(EDGE) });
    ops.push(Op::SetOutlineThickness { pt: Pt(0.75) });
    ops.push(Op::DrawLine {
        line: rect_outline(lbox.x, pdf_y - lbox.height, lbox.x + lbox.width, pdf_y),
    });

    let font = BuiltinFont::Helvetica;
    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextCursor {
        pos: Point {
            x: Pt(lbox.x + 8.0),
            y: Pt(pdf_y - lbox.height / 2.0),
        },
    });
    ops.push(Op::SetFontSizeBuiltinFont {
        size: Pt(8.0),
        font,
    });
    ops.push(Op::SetFillColor { col: rgb(NOTE) });
    ops.push(Op::WriteTextBuiltinFont {
        items: vec![TextItem::Text(to_winlatin("[image unavailable]"))],
        font,
    });
    ops.push(Op::EndTextSection);
}

fn line_point(x: f32, y: f32) -> LinePoint {
    LinePoint {
        p: Point { x: Pt(x), y: Pt(y) },
        bezier: false,
    }
}

fn rect_polygon(x1: f32, y1: f32, x2: f32, y2: f32) -> Polygon {
    Polygon {
        rings: vec![PolygonRing {
            points: vec![
                line_point(x1, y1),
                line_point(x2, y1),
                line_point(x2, y2),
                line_point(x1, y2),
            ],
        }],
        mode: PaintMode::Fill,
        winding_order: WindingOrder::NonZero,
    }
}

fn rect_outline(x1: f32, y1: f32, x2: f32, y2: f32) -> Line {
    Line {
        points: vec![
            line_point(x1, y2),
            line_point(x2, y2),
            line_point(x2, y1),
            line_point(x1, y1),
        ],
        is_closed: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout_config::{PageLayout, TextContent, TextLine};

    #[test]
    fn render_empty_page() {
        let config = LayoutConfig::a4();
        let bytes = render_pdf(&config).unwrap();
        assert!(bytes.len() > 100, "PDF should have content");
        // PDF magic number
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn render_runs_and_missing_image() {
        let mut config = LayoutConfig::a4();
        let mut text_box = LayoutBox::new(56.7, 56.7, 400.0, 28.0);
        text_box.text = Some(TextContent {
            lines: vec![TextLine {
                runs: vec![
                    TextRun {
                        text: "bold".into(),
                        face: FontFace::TimesBold,
                        size: 10.5,
                        color: [0.1, 0.1, 0.1, 1.0],
                        underline: false,
                        width: 22.0,
                    },
                    TextRun {
                        text: " and linked".into(),
                        face: FontFace::TimesRoman,
                        size: 10.5,
                        color: [0.1, 0.1, 0.1, 1.0],
                        underline: true,
                        width: 50.0,
                    },
                ],
                x_offset: 0.0,
                y_offset: 0.0,
            }],
            leading: 14.0,
            align: "left".to_string(),
            marker: None,
        });
        let mut image_box = LayoutBox::new(56.7, 120.0, 200.0, 100.0);
        image_box.image = Some(crate::layout_config::ImageContent {
            src: "/definitely/not/here.png".to_string(),
            width: 200.0,
            height: 100.0,
        });
        config.pages.push(PageLayout {
            page_index: 0,
            boxes: vec![text_box, image_box],
        });
        let bytes = render_pdf(&config).unwrap();
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn winlatin_maps_typographic_chars() {
        let s = to_winlatin("a\u{2022}b\u{2013}c");
        let bytes = s.as_bytes();
        assert_eq!(bytes, &[b'a', 0x95, b'b', 0x96, b'c']);
    }
}
