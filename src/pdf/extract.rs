//! PDF text extraction using lopdf.
//!
//! Walks each page's content stream and collects positioned text fragments
//! for the layout engine. Extraction is lenient: a malformed page logs a
//! warning and yields no fragments rather than failing the whole document.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use lopdf::{Document as LopdfDocument, Object, ObjectId};
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};
use crate::layout::{metrics, BaseFont, TextFragment};

/// Kerning adjustment (in 1/1000 text space units) large enough to read as
/// a word space inside a TJ array.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// Approximate ascent above the baseline as a fraction of the font size.
const ASCENT_RATIO: f32 = 0.8;

/// One source page: dimensions plus the fragments found on it, in top-left
/// page coordinates.
#[derive(Debug, Clone)]
pub struct RawPage {
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
    /// Positioned text fragments in content-stream order
    pub fragments: Vec<TextFragment>,
}

impl RawPage {
    /// Whether the page carries any non-whitespace text.
    pub fn has_text(&self) -> bool {
        self.fragments.iter().any(|f| !f.text.trim().is_empty())
    }
}

/// PDF reader producing positioned fragments per page.
pub struct PdfReader {
    doc: LopdfDocument,
}

impl PdfReader {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let doc = LopdfDocument::load(path)?;
        Ok(Self { doc })
    }

    /// Parse a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data)?;
        Ok(Self { doc })
    }

    /// Parse a PDF from a reader.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Extract every page. Returns [`Error::NoText`] when no page carries
    /// any text at all; individual malformed pages degrade to empty pages.
    pub fn extract_pages(&self) -> Result<Vec<RawPage>> {
        let mut pages = Vec::new();
        for (page_num, page_id) in self.doc.get_pages() {
            let (width, height) = self.page_dimensions(page_id);
            let fragments = match self.page_fragments(page_id, height) {
                Ok(fragments) => fragments,
                Err(e) => {
                    log::warn!("failed to extract text from page {page_num}: {e}");
                    Vec::new()
                }
            };
            pages.push(RawPage {
                width,
                height,
                fragments,
            });
        }
        if !pages.iter().any(|p| p.has_text()) {
            return Err(Error::NoText);
        }
        Ok(pages)
    }

    /// Page dimensions from the MediaBox, defaulting to Letter.
    fn page_dimensions(&self, page_id: ObjectId) -> (f32, f32) {
        if let Ok(page_dict) = self.doc.get_dictionary(page_id) {
            if let Ok(media_box) = page_dict.get(b"MediaBox") {
                if let Ok(array) = media_box.as_array() {
                    if array.len() >= 4 {
                        let x0 = get_number(&array[0]).unwrap_or(0.0);
                        let y0 = get_number(&array[1]).unwrap_or(0.0);
                        let x1 = get_number(&array[2]).unwrap_or(612.0);
                        let y1 = get_number(&array[3]).unwrap_or(792.0);
                        return (x1 - x0, y1 - y0);
                    }
                }
            }
        }
        (612.0, 792.0)
    }

    /// Raw (decompressed) content stream bytes for a page.
    fn page_content(&self, page_id: ObjectId) -> Result<Vec<u8>> {
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let contents = page_dict
            .get(b"Contents")
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        match contents {
            Object::Reference(r) => {
                if let Ok(Object::Stream(s)) = self.doc.get_object(*r) {
                    return s
                        .decompressed_content()
                        .map_err(|e| Error::PdfParse(e.to_string()));
                }
                Err(Error::PdfParse("invalid content stream".to_string()))
            }
            Object::Array(arr) => {
                let mut content = Vec::new();
                for obj in arr {
                    if let Object::Reference(r) = obj {
                        if let Ok(Object::Stream(s)) = self.doc.get_object(*r) {
                            if let Ok(data) = s.decompressed_content() {
                                content.extend_from_slice(&data);
                                content.push(b' ');
                            }
                        }
                    }
                }
                Ok(content)
            }
            _ => Err(Error::PdfParse("invalid content stream".to_string())),
        }
    }

    /// Walk one page's content stream and collect positioned fragments.
    fn page_fragments(&self, page_id: ObjectId, page_height: f32) -> Result<Vec<TextFragment>> {
        let data = self.page_content(page_id)?;
        let content = lopdf::content::Content::decode(&data)
            .map_err(|e| Error::PdfParse(e.to_string()))?;
        let fonts = self.doc.get_page_fonts(page_id).unwrap_or_default();
        let base_fonts = base_font_names(&fonts);

        let mut fragments = Vec::new();
        let mut current_font_name: Vec<u8> = Vec::new();
        let mut current_font_size: f32 = 12.0;
        let mut text_matrix = TextMatrix::default();
        let mut in_text_block = false;

        for op in content.operations {
            match op.operator.as_str() {
                "BT" => {
                    in_text_block = true;
                    text_matrix = TextMatrix::default();
                }
                "ET" => {
                    in_text_block = false;
                }
                "Tf" => {
                    if op.operands.len() >= 2 {
                        if let Object::Name(name) = &op.operands[0] {
                            current_font_name = name.clone();
                        }
                        current_font_size = get_number(&op.operands[1]).unwrap_or(12.0);
                    }
                }
                "Td" | "TD" => {
                    if op.operands.len() >= 2 {
                        let tx = get_number(&op.operands[0]).unwrap_or(0.0);
                        let ty = get_number(&op.operands[1]).unwrap_or(0.0);
                        text_matrix.translate(tx, ty);
                    }
                }
                "Tm" => {
                    if op.operands.len() >= 6 {
                        text_matrix.set(
                            get_number(&op.operands[0]).unwrap_or(1.0),
                            get_number(&op.operands[1]).unwrap_or(0.0),
                            get_number(&op.operands[2]).unwrap_or(0.0),
                            get_number(&op.operands[3]).unwrap_or(1.0),
                            get_number(&op.operands[4]).unwrap_or(0.0),
                            get_number(&op.operands[5]).unwrap_or(0.0),
                        );
                    }
                }
                "T*" => {
                    text_matrix.next_line();
                }
                "Tj" | "TJ" => {
                    if in_text_block {
                        let text =
                            self.decode_operand_text(&op, &fonts, &current_font_name);
                        self.push_fragment(
                            &mut fragments,
                            text,
                            &text_matrix,
                            current_font_size,
                            &current_font_name,
                            &base_fonts,
                            page_height,
                        );
                    }
                }
                "'" | "\"" => {
                    text_matrix.next_line();
                    if in_text_block {
                        let text_idx = if op.operator == "\"" { 2 } else { 0 };
                        if let Some(Object::String(bytes, _)) = op.operands.get(text_idx) {
                            let text = self.decode_string(bytes, &fonts, &current_font_name);
                            self.push_fragment(
                                &mut fragments,
                                text,
                                &text_matrix,
                                current_font_size,
                                &current_font_name,
                                &base_fonts,
                                page_height,
                            );
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(fragments)
    }

    /// Decode the text payload of a Tj or TJ operation. TJ kerning
    /// adjustments beyond the space threshold turn into word spaces.
    fn decode_operand_text(
        &self,
        op: &lopdf::content::Operation,
        fonts: &BTreeMap<Vec<u8>, &lopdf::Dictionary>,
        font_name: &[u8],
    ) -> String {
        if op.operator == "TJ" {
            let Some(Object::Array(arr)) = op.operands.first() else {
                return String::new();
            };
            let mut combined = String::new();
            for item in arr {
                match item {
                    Object::String(bytes, _) => {
                        combined.push_str(&self.decode_string(bytes, fonts, font_name));
                    }
                    Object::Integer(n) => {
                        if -(*n as f32) > TJ_SPACE_THRESHOLD
                            && !combined.is_empty()
                            && !combined.ends_with(' ')
                        {
                            combined.push(' ');
                        }
                    }
                    Object::Real(n) => {
                        if -n > TJ_SPACE_THRESHOLD
                            && !combined.is_empty()
                            && !combined.ends_with(' ')
                        {
                            combined.push(' ');
                        }
                    }
                    _ => {}
                }
            }
            combined
        } else {
            match op.operands.first() {
                Some(Object::String(bytes, _)) => self.decode_string(bytes, fonts, font_name),
                _ => String::new(),
            }
        }
    }

    /// Decode one text string using the current font's encoding, falling
    /// back to simple decoding when the font or encoding is unavailable.
    fn decode_string(
        &self,
        bytes: &[u8],
        fonts: &BTreeMap<Vec<u8>, &lopdf::Dictionary>,
        font_name: &[u8],
    ) -> String {
        if let Some(font_dict) = fonts.get(font_name) {
            if let Ok(enc) = font_dict.get_font_encoding(&self.doc) {
                if let Ok(text) = LopdfDocument::decode_text(&enc, bytes) {
                    return text;
                }
            }
        }
        decode_text_simple(bytes)
    }

    #[allow(clippy::too_many_arguments)]
    fn push_fragment(
        &self,
        fragments: &mut Vec<TextFragment>,
        text: String,
        matrix: &TextMatrix,
        font_size: f32,
        font_name: &[u8],
        base_fonts: &BTreeMap<Vec<u8>, String>,
        page_height: f32,
    ) {
        let text = normalize_text(&text);
        if text.trim().is_empty() {
            return;
        }
        let (x, y) = matrix.position();
        let size = font_size * matrix.scale();
        if size <= 0.0 {
            return;
        }
        let name = base_fonts
            .get(font_name)
            .cloned()
            .unwrap_or_else(|| String::from_utf8_lossy(font_name).to_string());
        let width = metrics::text_width(&text, BaseFont::from_name(&name), size);

        // Flip from bottom-up baseline coordinates to top-left box edges.
        let top = page_height - y - size * ASCENT_RATIO;
        fragments.push(TextFragment {
            text,
            x0: x,
            x1: x + width,
            top,
            bottom: top + size,
            font_name: name,
            font_size: size,
        });
    }
}

/// Resolve each page font resource name to its BaseFont name.
fn base_font_names(
    fonts: &BTreeMap<Vec<u8>, &lopdf::Dictionary>,
) -> BTreeMap<Vec<u8>, String> {
    fonts
        .iter()
        .filter_map(|(name, dict)| {
            dict.get(b"BaseFont")
                .ok()
                .and_then(|o| o.as_name().ok())
                .map(|n| (name.clone(), String::from_utf8_lossy(n).to_string()))
        })
        .collect()
}

/// Simple text decoding fallback when no encoding is available.
fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter_map(|c| {
                if c.len() == 2 {
                    Some(u16::from_be_bytes([c[0], c[1]]))
                } else {
                    None
                }
            })
            .collect();
        return String::from_utf16(&utf16).unwrap_or_default();
    }

    if let Ok(s) = String::from_utf8(bytes.to_vec()) {
        return s;
    }

    // Latin-1 fallback
    bytes.iter().map(|&b| b as char).collect()
}

/// NFKC-normalize and strip control characters that sometimes leak out of
/// broken encodings.
fn normalize_text(text: &str) -> String {
    text.nfkc()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

/// Text matrix tracking the pen position through a content stream.
#[derive(Debug, Clone)]
struct TextMatrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32, // X translation
    f: f32, // Y translation
}

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }
}

impl TextMatrix {
    fn set(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        self.a = a;
        self.b = b;
        self.c = c;
        self.d = d;
        self.e = e;
        self.f = f;
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        self.e += tx * self.a + ty * self.c;
        self.f += tx * self.b + ty * self.d;
    }

    fn next_line(&mut self) {
        // Default leading; a TL-aware reader could refine this.
        self.f -= 12.0 * self.d;
    }

    fn position(&self) -> (f32, f32) {
        (self.e, self.f)
    }

    fn scale(&self) -> f32 {
        (self.a * self.a + self.c * self.c).sqrt()
    }
}

/// Extract a number from a PDF object.
fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_text_simple_utf8() {
        assert_eq!(decode_text_simple(b"Hello"), "Hello");
    }

    #[test]
    fn test_decode_text_simple_latin1() {
        // 0xE9 = 'é' in Latin-1
        let bytes = vec![0x48, 0x65, 0x6C, 0x6C, 0xE9];
        assert_eq!(decode_text_simple(&bytes), "Hellé");
    }

    #[test]
    fn test_decode_text_simple_utf16be() {
        let bytes = vec![0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69];
        assert_eq!(decode_text_simple(&bytes), "Hi");
    }

    #[test]
    fn test_normalize_text_nfkc() {
        // Ligature "ﬁ" decomposes to "fi" under NFKC.
        assert_eq!(normalize_text("ﬁre"), "fire");
        assert_eq!(normalize_text("plain"), "plain");
    }

    #[test]
    fn test_normalize_strips_control_chars() {
        assert_eq!(normalize_text("a\u{0000}b\u{0007}c"), "abc");
        assert_eq!(normalize_text("keep\ttabs\nand newlines"), "keep\ttabs\nand newlines");
    }

    #[test]
    fn test_text_matrix_translate() {
        let mut m = TextMatrix::default();
        m.translate(72.0, -14.0);
        assert_eq!(m.position(), (72.0, -14.0));
        m.translate(0.0, -14.0);
        assert_eq!(m.position(), (72.0, -28.0));
    }

    #[test]
    fn test_text_matrix_scale() {
        let mut m = TextMatrix::default();
        m.set(2.0, 0.0, 0.0, 2.0, 10.0, 20.0);
        assert!((m.scale() - 2.0).abs() < 0.001);
    }

    #[test]
    fn test_get_number() {
        assert_eq!(get_number(&Object::Integer(42)), Some(42.0));
        assert_eq!(get_number(&Object::Real(3.5)), Some(3.5));
        assert_eq!(get_number(&Object::Null), None);
    }
}
