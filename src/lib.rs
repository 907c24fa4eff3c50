//! # transpdf
//!
//! Layout-preserving PDF translation library.
//!
//! transpdf extracts positioned text from a PDF, reconstructs its block
//! layout and typography, translates the text through an AI provider, and
//! writes a new PDF where the translated text sits in the original block
//! boxes, shrinking the font or degrading gracefully when the translation
//! runs long.
//!
//! ## Quick Start
//!
//! ```no_run
//! use transpdf::{create_provider, translate_pdf_layout, PipelineOptions, ProviderConfig};
//!
//! fn main() -> transpdf::Result<()> {
//!     let provider = create_provider("ollama", ProviderConfig::default())?;
//!     let options = PipelineOptions::default();
//!     let report = translate_pdf_layout(
//!         "book.pdf",
//!         "book.fr.pdf",
//!         provider.as_ref(),
//!         "fr",
//!         &options,
//!     )?;
//!     println!("{}", report.summary.totals.total());
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! 1. **Extract**: positioned fragments per page ([`pdf::extract`])
//! 2. **Blocks**: fragments grouped into lines and blocks ([`layout::extract`])
//! 3. **Profile**: document-wide typography thresholds ([`layout::typography`])
//! 4. **Merge**: soft wraps and hyphen breaks collapsed ([`layout::merge`])
//! 5. **Translate**: block texts through a [`Translator`]
//! 6. **Fit**: translated text planned into the original boxes ([`layout::fit`])
//! 7. **Write**: a fresh PDF rendered from the plans ([`pdf::write`])

pub mod error;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod translate;

pub use error::{Error, Result};
pub use layout::{LayoutOptions, RenderPlan};
pub use model::{
    BlockRole, BoundingBox, FormattingIssue, IssueCounts, IssueKind, IssueReport, IssueReporter,
    IssueSummary, LineRole, Page, TextBlock, TextLine, TypographyProfile,
};
pub use pdf::{PdfReader, RawPage};
pub use translate::{create_provider, list_providers, ProviderConfig, Translator};

use std::path::Path;

/// End-to-end pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Layout engine thresholds
    pub layout: LayoutOptions,
    /// Maximum characters per translation request
    pub chunk_size: usize,
    /// Translate at most this many chunks, leaving the rest untranslated
    /// (quick-test escape hatch)
    pub max_chunks: Option<usize>,
    /// In reflow mode, start each source page on a new output page
    pub preserve_pages: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            layout: LayoutOptions::default(),
            chunk_size: 4000,
            max_chunks: None,
            preserve_pages: false,
        }
    }
}

impl PipelineOptions {
    /// Validate the configuration before running the pipeline.
    pub fn validate(&self) -> Result<()> {
        self.layout.validate()?;
        if self.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be positive".to_string()));
        }
        Ok(())
    }
}

/// Analyze extracted pages: group blocks, build the typography profile,
/// classify roles, and merge lines into translatable paragraphs.
pub fn analyze_pages(
    raw_pages: &[RawPage],
    options: &LayoutOptions,
) -> (Vec<Page>, TypographyProfile) {
    let mut pages: Vec<Page> = raw_pages
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let mut page = Page::new(index, raw.width, raw.height);
            page.blocks = layout::extract_blocks(index, &raw.fragments, raw.width, options);
            page
        })
        .collect();

    let profile = layout::build_profile(&pages, options);
    layout::classify_document(&mut pages, &profile, options);
    layout::merge_document(&mut pages);
    (pages, profile)
}

/// Open and analyze a PDF file in one step.
pub fn analyze_file<P: AsRef<Path>>(
    path: P,
    options: &LayoutOptions,
) -> Result<(Vec<Page>, TypographyProfile)> {
    let reader = PdfReader::open(path)?;
    let raw_pages = reader.extract_pages()?;
    Ok(analyze_pages(&raw_pages, options))
}

/// Translate every non-footer block in place, replacing `merged_text` with
/// the translated text. Returns the number of chunks spent; when a chunk
/// budget is given, blocks beyond it keep their source text.
pub fn translate_blocks(
    pages: &mut [Page],
    translator: &dyn Translator,
    target_lang: &str,
    chunk_size: usize,
    max_chunks: Option<usize>,
) -> Result<usize> {
    let mut spent = 0usize;
    let total_pages = pages.len();

    for page in pages.iter_mut() {
        for block in &mut page.blocks {
            if block.role == BlockRole::Footer || block.merged_text.trim().is_empty() {
                continue;
            }
            let mut chunks = translate::chunk_text(&block.merged_text, chunk_size);
            if chunks.is_empty() {
                continue;
            }
            if let Some(budget) = max_chunks {
                let remaining = budget.saturating_sub(spent);
                if remaining == 0 {
                    log::warn!("chunk budget reached; remaining blocks keep source text");
                    return Ok(spent);
                }
                chunks.truncate(remaining);
            }

            let mut translated = Vec::with_capacity(chunks.len());
            for chunk in &chunks {
                log::info!(
                    "translating page {}/{total_pages} ({} chars)",
                    page.index + 1,
                    chunk.chars().count()
                );
                translated.push(translator.translate(chunk, target_lang)?);
                spent += 1;
            }
            block.merged_text = translated.join("\n\n");
        }
    }
    Ok(spent)
}

/// Plan every page of the document, recording fit issues on `reporter`.
pub fn plan_document(
    pages: &[Page],
    profile: &TypographyProfile,
    options: &LayoutOptions,
    reporter: &mut IssueReporter,
) -> Vec<Vec<RenderPlan>> {
    pages
        .iter()
        .map(|page| layout::plan_page(page, profile, options, reporter))
        .collect()
}

/// Full layout-preserving pipeline: extract, analyze, translate, fit, and
/// write. Returns the formatting issue report for the run.
pub fn translate_pdf_layout<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    translator: &dyn Translator,
    target_lang: &str,
    options: &PipelineOptions,
) -> Result<IssueReport> {
    options.validate()?;
    let (mut pages, profile) = analyze_file(input, &options.layout)?;
    translate_blocks(
        &mut pages,
        translator,
        target_lang,
        options.chunk_size,
        options.max_chunks,
    )?;

    let mut reporter = IssueReporter::new();
    let plans = plan_document(&pages, &profile, &options.layout, &mut reporter);
    pdf::write::write_layout_to_file(&pages, &plans, output)?;
    Ok(reporter.into_report())
}

/// Reflow pipeline: translate the document text and write it as plain
/// reflowed pages, ignoring the source layout. With `preserve_pages`, each
/// source page starts on a new output page.
pub fn translate_pdf_reflow<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    translator: &dyn Translator,
    target_lang: &str,
    options: &PipelineOptions,
) -> Result<()> {
    options.validate()?;
    let (mut pages, _profile) = analyze_file(input, &options.layout)?;
    translate_blocks(
        &mut pages,
        translator,
        target_lang,
        options.chunk_size,
        options.max_chunks,
    )?;

    let (width, height) = pages
        .first()
        .map(|p| (p.width, p.height))
        .unwrap_or((612.0, 792.0));

    if options.preserve_pages {
        let page_texts: Vec<String> = pages.iter().map(page_text).collect();
        pdf::write::write_pages_to_file(&page_texts, width, height, output)?;
        return Ok(());
    }

    let text = pages
        .iter()
        .map(page_text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    pdf::write::write_document_to_file(&text, width, height, output)?;
    Ok(())
}

/// Concatenate a page's translatable block texts.
fn page_text(page: &Page) -> String {
    page.blocks
        .iter()
        .filter(|b| b.role != BlockRole::Footer)
        .map(|b| b.merged_text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
