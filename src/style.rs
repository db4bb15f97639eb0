//! Style tables – page geometry, color palettes, and per-element text styles
//! resolved once into an immutable [`StyleSheet`] handed to the layout and
//! pagination stages. No module-level mutable state.

use serde::{Deserialize, Serialize};

/// RGBA colour (0.0 – 1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub fn is_transparent(&self) -> bool {
        self.a < 0.001
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() == 6 {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()? as f32 / 255.0;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()? as f32 / 255.0;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()? as f32 / 255.0;
            Some(Self { r, g, b, a: 1.0 })
        } else if hex.len() == 3 {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()? as f32 / 255.0;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()? as f32 / 255.0;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()? as f32 / 255.0;
            Some(Self { r, g, b, a: 1.0 })
        } else {
            None
        }
    }

    pub fn as_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

// ---------------------------------------------------------------------------
// Typography
// ---------------------------------------------------------------------------

/// The PDF builtin faces the renderer can address. Serialized into the layout
/// intermediate so a rendered run knows its exact face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFace {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
}

impl FontFace {
    /// Apply bold/italic flags within this face's family.
    pub fn styled(self, bold: bool, italic: bool) -> Self {
        use FontFace::*;
        match self {
            Helvetica | HelveticaBold | HelveticaOblique | HelveticaBoldOblique => {
                match (bold, italic) {
                    (true, true) => HelveticaBoldOblique,
                    (true, false) => HelveticaBold,
                    (false, true) => HelveticaOblique,
                    (false, false) => Helvetica,
                }
            }
            TimesRoman | TimesBold | TimesItalic | TimesBoldItalic => match (bold, italic) {
                (true, true) => TimesBoldItalic,
                (true, false) => TimesBold,
                (false, true) => TimesItalic,
                (false, false) => TimesRoman,
            },
            // Courier has no oblique mapping here; bold is the only variant used.
            Courier | CourierBold => {
                if bold {
                    CourierBold
                } else {
                    Courier
                }
            }
        }
    }

    pub fn is_fixed_pitch(self) -> bool {
        matches!(self, FontFace::Courier | FontFace::CourierBold)
    }

    pub fn is_bold(self) -> bool {
        use FontFace::*;
        matches!(
            self,
            HelveticaBold | HelveticaBoldOblique | TimesBold | TimesBoldItalic | CourierBold
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Physical page dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSize {
    /// 210 × 297 mm.
    #[default]
    A4,
    /// 8.5 × 11 in.
    Letter,
}

impl PageSize {
    pub fn width_pt(self) -> f32 {
        match self {
            PageSize::A4 => 595.28,
            PageSize::Letter => 612.0,
        }
    }

    pub fn height_pt(self) -> f32 {
        match self {
            PageSize::A4 => 841.89,
            PageSize::Letter => 792.0,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "a4" => Some(PageSize::A4),
            "letter" => Some(PageSize::Letter),
            _ => None,
        }
    }
}

/// Palette selector. Does not alter parsing or layout, only colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorScheme {
    #[default]
    Color,
    Grayscale,
}

impl ColorScheme {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "color" | "colour" => Some(ColorScheme::Color),
            "grayscale" | "greyscale" => Some(ColorScheme::Grayscale),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Palette and text styles
// ---------------------------------------------------------------------------

/// Brand colors for one scheme.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub primary: Color,
    pub secondary: Color,
    pub accent: Color,
    pub text: Color,
    pub muted: Color,
    pub rule: Color,
    pub code_bg: Color,
}

impl Palette {
    fn for_scheme(scheme: ColorScheme) -> Self {
        // Hex values are shared with the web rendition of the docs.
        let hex = |h: &str| Color::from_hex(h).unwrap_or(Color::BLACK);
        match scheme {
            ColorScheme::Color => Self {
                primary: hex("#6366f1"),
                secondary: hex("#8b5cf6"),
                accent: hex("#06b6d4"),
                text: hex("#1f2937"),
                muted: hex("#6b7280"),
                rule: hex("#e5e7eb"),
                code_bg: hex("#f3f4f6"),
            },
            ColorScheme::Grayscale => Self {
                primary: hex("#374151"),
                secondary: hex("#4b5563"),
                accent: hex("#6b7280"),
                text: hex("#111827"),
                muted: hex("#6b7280"),
                rule: hex("#d1d5db"),
                code_bg: hex("#f3f4f6"),
            },
        }
    }
}

/// Resolved typography for one element class. `leading` is the absolute
/// baseline-to-baseline distance in points.
#[derive(Debug, Clone, Copy)]
pub struct TextStyle {
    pub face: FontFace,
    pub size: f32,
    pub leading: f32,
    pub space_before: f32,
    pub space_after: f32,
    pub color: Color,
    pub align: TextAlign,
}

impl TextStyle {
    fn new(face: FontFace, size: f32, leading: f32) -> Self {
        Self {
            face,
            size,
            leading,
            space_before: 0.0,
            space_after: 0.0,
            color: Color::BLACK,
            align: TextAlign::Left,
        }
    }

    fn spaced(mut self, before: f32, after: f32) -> Self {
        self.space_before = before;
        self.space_after = after;
        self
    }

    fn colored(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    fn aligned(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }
}

/// All style decisions for one conversion, resolved up front.
#[derive(Debug, Clone)]
pub struct StyleSheet {
    pub palette: Palette,
    pub title: TextStyle,
    pub subtitle: TextStyle,
    heading: [TextStyle; 4],
    pub body: TextStyle,
    pub quote: TextStyle,
    pub code: TextStyle,
    pub caption: TextStyle,
    pub table_header: TextStyle,
    pub table_body: TextStyle,
    pub toc_entry: TextStyle,
    pub footer: TextStyle,
    pub table_header_bg: Color,
    pub table_grid: Color,
    pub rule_color: Color,
    pub code_bg: Color,
}

impl StyleSheet {
    pub fn new(scheme: ColorScheme) -> Self {
        let p = Palette::for_scheme(scheme);
        Self {
            palette: p,
            title: TextStyle::new(FontFace::HelveticaBold, 24.0, 28.0)
                .colored(p.primary)
                .aligned(TextAlign::Center)
                .spaced(0.0, 10.0),
            subtitle: TextStyle::new(FontFace::Helvetica, 13.0, 17.0)
                .colored(p.muted)
                .aligned(TextAlign::Center)
                .spaced(0.0, 6.0),
            heading: [
                TextStyle::new(FontFace::HelveticaBold, 20.0, 24.0)
                    .colored(p.primary)
                    .spaced(18.0, 10.0),
                TextStyle::new(FontFace::HelveticaBold, 16.0, 20.0)
                    .colored(p.secondary)
                    .spaced(14.0, 8.0),
                TextStyle::new(FontFace::HelveticaBold, 13.0, 16.0)
                    .colored(p.text)
                    .spaced(12.0, 6.0),
                TextStyle::new(FontFace::HelveticaBold, 11.0, 14.0)
                    .colored(p.text)
                    .spaced(10.0, 4.0),
            ],
            body: TextStyle::new(FontFace::TimesRoman, 10.5, 14.0)
                .colored(p.text)
                .spaced(0.0, 6.0),
            quote: TextStyle::new(FontFace::TimesItalic, 10.5, 14.0)
                .colored(p.muted)
                .spaced(4.0, 8.0),
            code: TextStyle::new(FontFace::Courier, 8.5, 10.5).colored(p.text),
            caption: TextStyle::new(FontFace::TimesItalic, 9.0, 11.0)
                .colored(p.muted)
                .aligned(TextAlign::Center),
            table_header: TextStyle::new(FontFace::HelveticaBold, 9.5, 12.0).colored(Color::WHITE),
            table_body: TextStyle::new(FontFace::TimesRoman, 9.5, 12.0).colored(p.text),
            toc_entry: TextStyle::new(FontFace::Helvetica, 11.0, 18.0).colored(p.text),
            footer: TextStyle::new(FontFace::Helvetica, 8.0, 10.0)
                .colored(p.muted)
                .aligned(TextAlign::Center),
            table_header_bg: p.primary,
            table_grid: p.rule,
            rule_color: p.rule,
            code_bg: p.code_bg,
        }
    }

    /// Style for a heading level 1–4. Levels are clamped into range.
    pub fn heading(&self, level: u8) -> &TextStyle {
        let idx = usize::from(level.clamp(1, 4)) - 1;
        &self.heading[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parsing() {
        let c = Color::from_hex("#6366f1").unwrap();
        assert!((c.r - 0x63 as f32 / 255.0).abs() < 0.001);
        assert!((c.b - 0xf1 as f32 / 255.0).abs() < 0.001);
        assert_eq!(Color::from_hex("fff"), Some(Color::WHITE));
        assert_eq!(Color::from_hex("not-a-color"), None);
    }

    #[test]
    fn schemes_differ_in_primary() {
        let color = StyleSheet::new(ColorScheme::Color);
        let gray = StyleSheet::new(ColorScheme::Grayscale);
        assert_ne!(color.palette.primary, gray.palette.primary);
        // Grayscale primary stays close to neutral.
        let p = gray.palette.primary;
        assert!((p.r - p.g).abs() < 0.2 && (p.g - p.b).abs() < 0.2);
    }

    #[test]
    fn heading_levels_clamp() {
        let s = StyleSheet::new(ColorScheme::Color);
        assert_eq!(s.heading(1).size, 20.0);
        assert_eq!(s.heading(4).size, 11.0);
        assert_eq!(s.heading(9).size, s.heading(4).size);
    }

    #[test]
    fn face_styling() {
        assert_eq!(
            FontFace::TimesRoman.styled(true, true),
            FontFace::TimesBoldItalic
        );
        assert_eq!(FontFace::Courier.styled(false, true), FontFace::Courier);
        assert!(FontFace::CourierBold.is_fixed_pitch());
    }

    #[test]
    fn page_size_options() {
        assert_eq!(PageSize::parse("Letter"), Some(PageSize::Letter));
        assert_eq!(PageSize::parse("a4"), Some(PageSize::A4));
        assert_eq!(PageSize::parse("tabloid"), None);
        assert!(PageSize::A4.height_pt() > PageSize::Letter.height_pt());
    }
}
