//! Text measurement and span-aware word wrapping using `ttf-parser`.
//!
//! The built-in PDF fonts need no embedding, so by default widths come from
//! per-family average-width heuristics. A real TTF can be loaded for any
//! face to refine measurement with actual glyph advances; the raw bytes are
//! kept alive for ttf-parser's zero-copy API and parsed per call.

use std::collections::HashMap;

use crate::inline::{RichText, Span};
use crate::layout_config::TextRun;
use crate::style::FontFace;

/// Metrics for one loaded face.
#[derive(Clone)]
pub struct FontMetrics {
    pub bytes: Vec<u8>,
    pub units_per_em: f32,
}

/// Measurement source for every [`FontFace`]. Empty by default, which means
/// every face measures heuristically.
#[derive(Default)]
pub struct FontLibrary {
    fonts: HashMap<FontFace, FontMetrics>,
}

/// Average glyph width as a fraction of the font size. Courier is fixed
/// pitch; the proportional families differ enough to matter for wrapping.
fn avg_ratio(face: FontFace) -> f32 {
    use FontFace::*;
    match face {
        Courier | CourierBold => 0.6,
        HelveticaBold | HelveticaBoldOblique => 0.55,
        Helvetica | HelveticaOblique => 0.5,
        TimesBold | TimesBoldItalic => 0.52,
        TimesRoman | TimesItalic => 0.48,
    }
}

impl FontLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach TTF/OTF bytes to a face so it measures with real advances.
    pub fn load_ttf(&mut self, face: FontFace, bytes: Vec<u8>) -> Result<(), String> {
        let parsed = ttf_parser::Face::parse(&bytes, 0)
            .map_err(|e| format!("Failed to parse font: {e}"))?;
        let metrics = FontMetrics {
            units_per_em: parsed.units_per_em() as f32,
            bytes,
        };
        self.fonts.insert(face, metrics);
        Ok(())
    }

    /// Width of `text` at `size` points.
    pub fn measure_width(&self, text: &str, face: FontFace, size: f32) -> f32 {
        let fallback = size * avg_ratio(face);
        let Some(data) = self.fonts.get(&face).filter(|d| !d.bytes.is_empty()) else {
            return text.chars().count() as f32 * fallback;
        };
        match ttf_parser::Face::parse(&data.bytes, 0) {
            Ok(parsed) => {
                let scale = size / data.units_per_em;
                let mut width = 0.0f32;
                for ch in text.chars() {
                    match parsed.glyph_index(ch) {
                        Some(gid) => {
                            width += parsed.glyph_hor_advance(gid).unwrap_or(0) as f32 * scale;
                        }
                        None => width += fallback,
                    }
                }
                width
            }
            Err(_) => text.chars().count() as f32 * fallback,
        }
    }
}

/// Total width of a wrapped line.
pub fn line_width(runs: &[TextRun]) -> f32 {
    runs.iter().map(|r| r.width).sum()
}

/// Face and size for one styled span. Code spans switch to Courier and drop
/// slightly in size so inline code sits inside body lines.
pub fn run_font(span: &Span, base_face: FontFace, base_size: f32) -> (FontFace, f32) {
    if span.code {
        let face = if span.bold {
            FontFace::CourierBold
        } else {
            FontFace::Courier
        };
        (face, (base_size - 1.5).max(6.0))
    } else {
        (base_face.styled(span.bold, span.italic), base_size)
    }
}

/// A fragment of a word in one style.
struct Piece {
    text: String,
    face: FontFace,
    size: f32,
    underline: bool,
    width: f32,
}

/// A whitespace-delimited word. A style change mid-word ("**Data**base")
/// produces several pieces in the same word, so wrapping never breaks at a
/// style boundary.
struct Word {
    pieces: Vec<Piece>,
    width: f32,
}

/// Greedy word-wrap of styled text into lines of [`TextRun`]s that fit
/// `max_width`. A word wider than the limit is placed alone on its own
/// overflowing line; there is no hyphenation. Empty input yields one empty
/// line so the caller still gets a line box.
pub fn wrap_spans(
    rich: &RichText,
    base_face: FontFace,
    base_size: f32,
    color: [f32; 4],
    max_width: f32,
    fonts: &FontLibrary,
) -> Vec<Vec<TextRun>> {
    let words = split_words(rich, base_face, base_size, fonts);
    if words.is_empty() {
        return vec![Vec::new()];
    }

    let mut lines: Vec<Vec<TextRun>> = Vec::new();
    let mut line: Vec<TextRun> = Vec::new();
    let mut line_w = 0.0f32;

    for word in words {
        let space_w = match line.last() {
            Some(run) => fonts.measure_width(" ", run.face, run.size),
            None => 0.0,
        };
        if !line.is_empty() && line_w + space_w + word.width > max_width {
            lines.push(std::mem::take(&mut line));
            line_w = 0.0;
        } else if let Some(run) = line.last_mut() {
            run.text.push(' ');
            run.width += space_w;
            line_w += space_w;
        }
        for piece in word.pieces {
            append_piece(&mut line, piece, color);
        }
        line_w += word.width;
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Append one piece to the open line, merging into the previous run when
/// the style matches.
fn append_piece(line: &mut Vec<TextRun>, piece: Piece, color: [f32; 4]) {
    if let Some(run) = line.last_mut() {
        if run.face == piece.face && run.size == piece.size && run.underline == piece.underline {
            run.text.push_str(&piece.text);
            run.width += piece.width;
            return;
        }
    }
    line.push(TextRun {
        text: piece.text,
        face: piece.face,
        size: piece.size,
        color,
        underline: piece.underline,
        width: piece.width,
    });
}

fn split_words(
    rich: &RichText,
    base_face: FontFace,
    base_size: f32,
    fonts: &FontLibrary,
) -> Vec<Word> {
    let mut words: Vec<Word> = Vec::new();
    let mut open: Option<Word> = None;

    for span in &rich.spans {
        let (face, size) = run_font(span, base_face, base_size);
        let mut chunk = String::new();
        for ch in span.text.chars() {
            if ch.is_whitespace() {
                if !chunk.is_empty() {
                    push_chunk(&mut open, &mut chunk, face, size, span.underline, fonts);
                }
                // Whitespace closes the word; runs of it collapse.
                if let Some(word) = open.take() {
                    words.push(word);
                }
            } else {
                chunk.push(ch);
            }
        }
        // No trailing whitespace: the next span continues this word.
        if !chunk.is_empty() {
            push_chunk(&mut open, &mut chunk, face, size, span.underline, fonts);
        }
    }
    if let Some(word) = open.take() {
        words.push(word);
    }
    words
}

fn push_chunk(
    open: &mut Option<Word>,
    chunk: &mut String,
    face: FontFace,
    size: f32,
    underline: bool,
    fonts: &FontLibrary,
) {
    let text = std::mem::take(chunk);
    let width = fonts.measure_width(&text, face, size);
    let word = open.get_or_insert(Word {
        pieces: Vec::new(),
        width: 0.0,
    });
    word.pieces.push(Piece {
        text,
        face,
        size,
        underline,
        width,
    });
    word.width += width;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inline::format_inline;

    #[test]
    fn heuristic_text_width() {
        let fonts = FontLibrary::new();
        let w = fonts.measure_width("Hello", FontFace::Helvetica, 16.0);
        // 5 chars × 16 × 0.5 = 40
        assert!((w - 40.0).abs() < 0.1);
    }

    #[test]
    fn fixed_pitch_is_wider() {
        let fonts = FontLibrary::new();
        let prop = fonts.measure_width("abc", FontFace::TimesRoman, 10.0);
        let mono = fonts.measure_width("abc", FontFace::Courier, 10.0);
        assert!(mono > prop);
    }

    #[test]
    fn word_wrap_basic() {
        let fonts = FontLibrary::new();
        let rich = RichText::plain("Hello world foo bar");
        let lines = wrap_spans(&rich, FontFace::Helvetica, 16.0, [0.0; 4], 60.0, &fonts);
        assert!(lines.len() >= 2, "Expected wrapping, got {lines:?}");
        for runs in &lines {
            assert!(line_width(runs) <= 60.0 + f32::EPSILON);
        }
    }

    #[test]
    fn style_change_mid_word_does_not_break() {
        let fonts = FontLibrary::new();
        // "Database" is one word spanning a bold and a plain run.
        let rich = format_inline("**Data**base systems");
        let lines = wrap_spans(&rich, FontFace::Helvetica, 10.0, [0.0; 4], 60.0, &fonts);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), 2);
        assert_eq!(lines[0][0].text, "Data");
        assert!(lines[0][0].face.is_bold());
        assert_eq!(lines[0][1].text, "base");
        assert_eq!(lines[1][0].text, "systems");
    }

    #[test]
    fn overlong_word_gets_its_own_line() {
        let fonts = FontLibrary::new();
        let rich = RichText::plain("tiny Incomprehensibilities tiny");
        let lines = wrap_spans(&rich, FontFace::Helvetica, 12.0, [0.0; 4], 50.0, &fonts);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1][0].text, "Incomprehensibilities");
    }

    #[test]
    fn empty_text_yields_one_empty_line() {
        let fonts = FontLibrary::new();
        let lines = wrap_spans(
            &RichText::default(),
            FontFace::Helvetica,
            10.0,
            [0.0; 4],
            100.0,
            &fonts,
        );
        assert_eq!(lines.len(), 1);
        assert!(lines[0].is_empty());
    }

    #[test]
    fn code_spans_drop_to_courier() {
        let rich = format_inline("call `frobnicate()` now");
        let span = rich.spans.iter().find(|s| s.code).unwrap();
        let (face, size) = run_font(span, FontFace::TimesRoman, 10.5);
        assert_eq!(face, FontFace::Courier);
        assert!(size < 10.5);
    }
}
