//! PDF output using lopdf.
//!
//! Builds a fresh document object graph (fonts, pages, catalog) and renders
//! either positioned render plans (layout-preserving mode) or plain reflowed
//! text. Only the standard base fonts are used, so no font embedding is
//! required.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document as LopdfDocument, Object, ObjectId, Stream, StringFormat};

use crate::error::{Error, Result};
use crate::layout::{wrap_text, BaseFont, RenderPlan};
use crate::model::Page;

/// Margin used for reflowed and continuation pages, in points.
const PAGE_MARGIN: f32 = 72.0;

/// Body size used when reflowing without layout information.
const REFLOW_FONT_SIZE: f32 = 11.0;
const REFLOW_LINE_HEIGHT: f32 = REFLOW_FONT_SIZE * 1.4;

/// Incrementally built output document.
///
/// Pages are appended in order; [`finish`] wires up the page tree and
/// catalog and serializes the result.
///
/// [`finish`]: PdfWriter::finish
pub struct PdfWriter {
    doc: LopdfDocument,
    resources_id: ObjectId,
    page_ids: Vec<ObjectId>,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    /// Create an empty document with the standard base fonts registered.
    pub fn new() -> Self {
        let mut doc = LopdfDocument::with_version("1.5");

        let helvetica_id = doc.add_object(lopdf::Dictionary::from_iter([
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(b"Helvetica".to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ]));
        let times_id = doc.add_object(lopdf::Dictionary::from_iter([
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(b"Times-Roman".to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ]));
        let resources_id = doc.add_object(lopdf::Dictionary::from_iter([(
            "Font",
            Object::Dictionary(lopdf::Dictionary::from_iter([
                ("F1", Object::Reference(helvetica_id)),
                ("F2", Object::Reference(times_id)),
            ])),
        )]));

        Self {
            doc,
            resources_id,
            page_ids: Vec::new(),
        }
    }

    /// Append one page with the given content operations.
    pub fn add_page(&mut self, width: f32, height: f32, operations: Vec<Operation>) {
        let content = Content { operations };
        let content_bytes = content.encode().unwrap_or_default();
        let content_id = self
            .doc
            .add_object(Stream::new(lopdf::Dictionary::new(), content_bytes));

        let page_id = self.doc.add_object(lopdf::Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Reference(self.resources_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Real(0.0),
                    Object::Real(0.0),
                    Object::Real(width),
                    Object::Real(height),
                ]),
            ),
        ]));
        self.page_ids.push(page_id);
    }

    /// Number of pages appended so far.
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Wire up the page tree and catalog and serialize the document.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if self.page_ids.is_empty() {
            return Err(Error::Render("no pages to write".to_string()));
        }

        let pages_id = self.doc.new_object_id();
        let kids: Vec<Object> = self
            .page_ids
            .iter()
            .map(|&id| Object::Reference(id))
            .collect();
        for &page_id in &self.page_ids {
            if let Ok(dict) = self.doc.get_dictionary_mut(page_id) {
                dict.set("Parent", Object::Reference(pages_id));
            }
        }
        self.doc.objects.insert(
            pages_id,
            Object::Dictionary(lopdf::Dictionary::from_iter([
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Kids", Object::Array(kids)),
                ("Count", Object::Integer(self.page_ids.len() as i64)),
            ])),
        );

        let catalog_id = self.doc.add_object(lopdf::Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        self.doc.renumber_objects();
        self.doc.compress();

        let mut output = Vec::new();
        self.doc
            .save_to(&mut output)
            .map_err(|e| Error::Render(e.to_string()))?;
        Ok(output)
    }

    /// Serialize and write to a file.
    pub fn save<P: AsRef<Path>>(self, path: P) -> Result<()> {
        let bytes = self.finish()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

/// Render planned pages into a document, preserving the source layout.
///
/// `plans[i]` holds the render plans for `pages[i]`. Plan remainders flow
/// onto continuation pages inserted directly after their source page.
pub fn write_layout(pages: &[Page], plans: &[Vec<RenderPlan>]) -> Result<Vec<u8>> {
    let mut writer = PdfWriter::new();
    for (page, page_plans) in pages.iter().zip(plans.iter()) {
        let mut operations = Vec::new();
        let mut overflow: Vec<(BaseFont, f32, f32, Vec<String>)> = Vec::new();

        for plan in page_plans {
            for (line, x, baseline) in plan.placed_lines() {
                if line.trim().is_empty() {
                    continue;
                }
                operations.extend(text_operations(
                    plan.font,
                    plan.font_size,
                    x,
                    page.height - baseline,
                    line,
                ));
            }
            if !plan.remainder.is_empty() {
                overflow.push((
                    plan.font,
                    plan.font_size,
                    plan.line_height,
                    plan.remainder.clone(),
                ));
            }
        }
        writer.add_page(page.width, page.height, operations);

        for (font, font_size, line_height, lines) in overflow {
            flow_onto_pages(
                &mut writer,
                &lines,
                font,
                font_size,
                line_height,
                page.width,
                page.height,
            );
        }
    }
    writer.finish()
}

/// Render planned pages and write the result to a file.
pub fn write_layout_to_file<P: AsRef<Path>>(
    pages: &[Page],
    plans: &[Vec<RenderPlan>],
    path: P,
) -> Result<()> {
    let bytes = write_layout(pages, plans)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Render plain text as reflowed Letter pages, ignoring any source layout.
/// Paragraphs are separated by blank lines in the input.
pub fn write_document(text: &str, page_width: f32, page_height: f32) -> Result<Vec<u8>> {
    let font = BaseFont::Helvetica;
    let usable_width = page_width - 2.0 * PAGE_MARGIN;
    let lines = wrap_text(text, font, usable_width, REFLOW_FONT_SIZE);

    let mut writer = PdfWriter::new();
    flow_onto_pages(
        &mut writer,
        &lines,
        font,
        REFLOW_FONT_SIZE,
        REFLOW_LINE_HEIGHT,
        page_width,
        page_height,
    );
    if writer.page_count() == 0 {
        writer.add_page(page_width, page_height, Vec::new());
    }
    writer.finish()
}

/// Render one reflowed section per source page, each starting on a new
/// output page (a long section still spills onto extra pages).
pub fn write_pages(page_texts: &[String], page_width: f32, page_height: f32) -> Result<Vec<u8>> {
    let font = BaseFont::Helvetica;
    let usable_width = page_width - 2.0 * PAGE_MARGIN;

    let mut writer = PdfWriter::new();
    for text in page_texts {
        let lines = wrap_text(text, font, usable_width, REFLOW_FONT_SIZE);
        if lines.is_empty() {
            writer.add_page(page_width, page_height, Vec::new());
            continue;
        }
        flow_onto_pages(
            &mut writer,
            &lines,
            font,
            REFLOW_FONT_SIZE,
            REFLOW_LINE_HEIGHT,
            page_width,
            page_height,
        );
    }
    if writer.page_count() == 0 {
        writer.add_page(page_width, page_height, Vec::new());
    }
    writer.finish()
}

/// Render per-page reflowed sections and write the result to a file.
pub fn write_pages_to_file<P: AsRef<Path>>(
    page_texts: &[String],
    page_width: f32,
    page_height: f32,
    path: P,
) -> Result<()> {
    let bytes = write_pages(page_texts, page_width, page_height)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Reflow plain text and write the result to a file.
pub fn write_document_to_file<P: AsRef<Path>>(
    text: &str,
    page_width: f32,
    page_height: f32,
    path: P,
) -> Result<()> {
    let bytes = write_document(text, page_width, page_height)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Place wrapped lines sequentially from the top margin, appending as many
/// pages as needed.
fn flow_onto_pages(
    writer: &mut PdfWriter,
    lines: &[String],
    font: BaseFont,
    font_size: f32,
    line_height: f32,
    page_width: f32,
    page_height: f32,
) {
    let usable_height = (page_height - 2.0 * PAGE_MARGIN).max(line_height);
    let lines_per_page = ((usable_height / line_height).floor() as usize).max(1);

    for chunk in lines.chunks(lines_per_page) {
        let mut operations = Vec::new();
        for (i, line) in chunk.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let baseline_from_top = PAGE_MARGIN + font_size + i as f32 * line_height;
            operations.extend(text_operations(
                font,
                font_size,
                PAGE_MARGIN,
                page_height - baseline_from_top,
                line,
            ));
        }
        writer.add_page(page_width, page_height, operations);
    }
}

/// Content operations drawing one line of text at an absolute position
/// (PDF bottom-up coordinates).
fn text_operations(
    font: BaseFont,
    font_size: f32,
    x: f32,
    y: f32,
    text: &str,
) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![
                Object::Name(font_resource(font).to_vec()),
                Object::Real(font_size),
            ],
        ),
        Operation::new("Td", vec![Object::Real(x), Object::Real(y)]),
        Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
        ),
        Operation::new("ET", vec![]),
    ]
}

fn font_resource(font: BaseFont) -> &'static [u8] {
    match font {
        BaseFont::Helvetica => b"F1",
        BaseFont::TimesRoman => b"F2",
    }
}

/// Encode text for a WinAnsiEncoding font. Characters outside Latin-1 are
/// replaced; the fitter has already measured with the same fallback width.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| {
            let code = c as u32;
            if code <= 0xFF {
                code as u8
            } else {
                b'?'
            }
        })
        .collect()
}

/// Read back page count and text per page, for round-trip checks.
pub fn page_texts(data: &[u8]) -> Result<BTreeMap<u32, String>> {
    let doc = LopdfDocument::load_mem(data)?;
    let mut texts = BTreeMap::new();
    for (page_num, _) in doc.get_pages() {
        let text = doc
            .extract_text(&[page_num])
            .map_err(|e| Error::PdfParse(e.to_string()))?;
        texts.insert(page_num, text);
    }
    Ok(texts)
}
