//! Width estimation for the standard base fonts.
//!
//! Widths are AFM glyph widths in 1/1000 of text space for the printable
//! ASCII range. The engine works from these estimates rather than full font
//! shaping; characters outside the table fall back to a default advance.

/// Default advance for characters outside the width tables (1/1000 units).
const DEFAULT_WIDTH: f32 = 600.0;

/// Base font used for measuring and rendering translated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaseFont {
    /// Helvetica (sans-serif)
    #[default]
    Helvetica,
    /// Times Roman (serif)
    TimesRoman,
}

impl BaseFont {
    /// Map an extracted font name onto the closest base font.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("times") || lower.contains("serif") || lower.contains("roman") {
            BaseFont::TimesRoman
        } else {
            BaseFont::Helvetica
        }
    }

    /// PDF base-font name for the writer.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            BaseFont::Helvetica => "Helvetica",
            BaseFont::TimesRoman => "Times-Roman",
        }
    }

    fn widths(&self) -> &'static [u16; 95] {
        match self {
            BaseFont::Helvetica => &HELVETICA_WIDTHS,
            BaseFont::TimesRoman => &TIMES_ROMAN_WIDTHS,
        }
    }
}

/// Advance width of one character at the given size, in points.
pub fn char_width(font: BaseFont, c: char, font_size: f32) -> f32 {
    let code = c as u32;
    let units = if (0x20..=0x7E).contains(&code) {
        font.widths()[(code - 0x20) as usize] as f32
    } else {
        DEFAULT_WIDTH
    };
    units * font_size / 1000.0
}

/// Estimated width of a string at the given size, in points.
pub fn text_width(text: &str, font: BaseFont, font_size: f32) -> f32 {
    text.chars().map(|c| char_width(font, c, font_size)).sum()
}

/// Helvetica AFM widths for chars 0x20..=0x7E.
#[rustfmt::skip]
static HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333,
    278, 278, 556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278,
    584, 584, 584, 556, 1015, 667, 667, 722, 722, 667, 611, 778, 722, 278,
    500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944,
    667, 667, 611, 278, 278, 278, 469, 556, 333, 556, 556, 500, 556, 556,
    278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333, 500,
    278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Times Roman AFM widths for chars 0x20..=0x7E.
#[rustfmt::skip]
static TIMES_ROMAN_WIDTHS: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333,
    250, 278, 500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278,
    564, 564, 564, 444, 921, 722, 667, 667, 722, 611, 556, 722, 722, 333,
    389, 722, 611, 889, 722, 722, 556, 722, 667, 556, 611, 722, 722, 944,
    722, 722, 611, 333, 278, 333, 469, 500, 333, 444, 500, 444, 500, 444,
    333, 500, 500, 278, 278, 500, 278, 778, 500, 500, 500, 500, 333, 389,
    278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];
