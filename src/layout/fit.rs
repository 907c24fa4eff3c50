//! The layout fitter: wrap translated text into the original block box,
//! shrinking the font in discrete steps and degrading to truncation or a
//! continuation page when even the minimum readable size overflows.
//!
//! Fit failures are never errors; they are recorded on the issue reporter.

use crate::model::{
    BlockRole, FormattingIssue, IssueKind, IssueReporter, Page, TextBlock, TypographyProfile,
};

use super::metrics::{text_width, BaseFont};
use super::options::LINE_HEIGHT_MIN;
use super::LayoutOptions;

/// A rendering plan for one block: wrapped lines at a single font size,
/// positioned inside the block's bounding box.
#[derive(Debug, Clone)]
pub struct RenderPlan {
    /// Index of the source block within its page
    pub block_index: usize,
    /// Left edge where lines start
    pub x: f32,
    /// Top edge of the first line (distance from page top)
    pub top: f32,
    /// Font applied to every line of the plan
    pub font: BaseFont,
    /// Final font size in points
    pub font_size: f32,
    /// Vertical advance between lines in points
    pub line_height: f32,
    /// Wrapped lines, in order; empty strings are blank paragraph breaks
    pub lines: Vec<String>,
    /// Lines that did not fit and flow onto a continuation page
    /// (only populated when overflow-to-new-page is enabled)
    pub remainder: Vec<String>,
}

impl RenderPlan {
    /// Whether the plan places no text at all.
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty()) && self.remainder.is_empty()
    }

    /// Baseline positions (text, x, y-from-top) for the placed lines.
    pub fn placed_lines(&self) -> impl Iterator<Item = (&str, f32, f32)> {
        let x = self.x;
        let top = self.top;
        let size = self.font_size;
        let height = self.line_height;
        self.lines
            .iter()
            .enumerate()
            .map(move |(i, line)| (line.as_str(), x, top + size + i as f32 * height))
    }
}

/// Outcome of the discrete font-size search.
struct FitOutcome {
    font_size: f32,
    line_height: f32,
    lines: Vec<String>,
    remainder: Vec<String>,
    truncated: bool,
}

/// Plan every translatable block of a page.
///
/// `page.blocks[i].merged_text` must already hold the translated text for
/// block `i`; footer blocks and empty blocks are skipped. Issues are
/// recorded on `reporter`, one at most per block.
pub fn plan_page(
    page: &Page,
    profile: &TypographyProfile,
    options: &LayoutOptions,
    reporter: &mut IssueReporter,
) -> Vec<RenderPlan> {
    let mut plans = Vec::new();
    for (block_index, block) in page.blocks.iter().enumerate() {
        if block.role == BlockRole::Footer {
            continue;
        }
        let next_top = page.blocks[block_index + 1..]
            .iter()
            .map(|b| b.bbox.top)
            .find(|top| *top > block.bbox.bottom);
        if let Some(plan) = fit_block(block, block_index, next_top, profile, options, reporter) {
            plans.push(plan);
        }
    }
    plans
}

/// Fit one block's translated text into its bounding box.
///
/// Returns `None` for blocks that produce nothing to draw (empty text or a
/// degenerate box).
pub fn fit_block(
    block: &TextBlock,
    block_index: usize,
    next_block_top: Option<f32>,
    profile: &TypographyProfile,
    options: &LayoutOptions,
    reporter: &mut IssueReporter,
) -> Option<RenderPlan> {
    let text = block.merged_text.trim();
    if text.is_empty() {
        // An empty translated string produces an empty plan, no issue.
        return None;
    }
    if block.bbox.is_degenerate() {
        reporter.record(FormattingIssue {
            page_index: block.page_index,
            block_index,
            kind: IssueKind::Truncated,
            detail: format!(
                "{} characters dropped (degenerate block box, zero characters placed)",
                text.chars().count()
            ),
        });
        return None;
    }

    let font = block
        .lines
        .first()
        .map(|l| BaseFont::from_name(&l.font_name))
        .unwrap_or_default();
    let box_width = block.bbox.width().max(1.0);
    let box_height = block.bbox.height().max(1.0);

    // Headings snap to the document's cluster targets and keep a raised
    // minimum so they stay visually distinct from body text.
    let is_heading = block.role == BlockRole::Heading;
    let mut base_size = block.font_size;
    let mut min_size = options.min_font_size;
    if is_heading {
        if let Some(target) = profile.match_heading_target(base_size, options.heading_tolerance) {
            base_size = base_size.max(target);
        }
        min_size = min_size.max(profile.body_font_size * options.heading_size_ratio);
    }
    let base_size = base_size.max(min_size);

    // The block may borrow the whitespace gap below it, plus the configured
    // allowance, before giving up.
    let mut allowed_height = box_height;
    if let Some(next_top) = next_block_top {
        let gap = (next_top - block.bbox.bottom).max(0.0);
        if gap > 1.0 {
            allowed_height = box_height + gap + options.extra_allowance;
        }
    } else if options.extra_allowance > 0.0 {
        allowed_height = box_height + options.extra_allowance;
    }

    let mut outcome = search_fit(text, font, box_width, box_height, base_size, min_size, options);
    if outcome.truncated && allowed_height > box_height {
        outcome = search_fit(text, font, box_width, allowed_height, base_size, min_size, options);
    }

    let mut truncated = outcome.truncated;
    let mut remainder = Vec::new();
    if truncated && options.overflow_to_new_page {
        // Continuation suppresses the truncation record; the overflow lines
        // are carried on the plan for the writer to place on a new page.
        remainder = std::mem::take(&mut outcome.remainder);
        truncated = false;
    }

    if truncated {
        let dropped: usize = dropped_char_count(&outcome.remainder);
        reporter.record(FormattingIssue::truncated(
            block.page_index,
            block_index,
            dropped,
        ));
    }
    if outcome.font_size < block.font_size {
        let factor = outcome.font_size / block.font_size;
        reporter.record(FormattingIssue::font_scaled(
            block.page_index,
            block_index,
            factor,
        ));
    }

    Some(RenderPlan {
        block_index,
        x: block.bbox.x0,
        top: block.bbox.top,
        font,
        font_size: outcome.font_size,
        line_height: outcome.line_height,
        lines: outcome.lines,
        remainder,
    })
}

/// Discrete search for the largest font size at which the wrapped text fits
/// the box. Explicit loop bounded by `(base - min) / step`; each step
/// strictly decreases the size.
fn search_fit(
    text: &str,
    font: BaseFont,
    max_width: f32,
    max_height: f32,
    base_size: f32,
    min_size: f32,
    options: &LayoutOptions,
) -> FitOutcome {
    let steps = ((base_size - min_size) / options.font_step).floor().max(0.0) as usize;
    for step in 0..=steps {
        let font_size = base_size - step as f32 * options.font_step;
        let lines = wrap_text(text, font, max_width, font_size);
        for ratio in [options.line_height_ratio, LINE_HEIGHT_MIN] {
            let line_height = font_size * ratio;
            if lines.len() as f32 * line_height <= max_height {
                return FitOutcome {
                    font_size,
                    line_height,
                    lines,
                    remainder: Vec::new(),
                    truncated: false,
                };
            }
        }
    }

    // Even the minimum size overflows: keep what fits, carry the rest.
    let font_size = min_size;
    let line_height = font_size * LINE_HEIGHT_MIN;
    let mut lines = wrap_text(text, font, max_width, font_size);
    let max_lines = ((max_height / line_height).floor() as usize).max(1);
    let remainder = if lines.len() > max_lines {
        lines.split_off(max_lines)
    } else {
        Vec::new()
    };
    let truncated = !remainder.is_empty();
    FitOutcome {
        font_size,
        line_height,
        lines,
        remainder,
        truncated,
    }
}

/// Greedy word-wrap of multi-paragraph text. Blank input lines survive as
/// empty output lines (paragraph separators).
pub fn wrap_text(text: &str, font: BaseFont, max_width: f32, font_size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        if paragraph.trim().is_empty() {
            lines.push(String::new());
            continue;
        }
        wrap_paragraph(paragraph, font, max_width, font_size, &mut lines);
    }
    lines
}

fn wrap_paragraph(
    paragraph: &str,
    font: BaseFont,
    max_width: f32,
    font_size: f32,
    lines: &mut Vec<String>,
) {
    let mut current = String::new();
    for word in paragraph.split_whitespace() {
        for piece in split_oversized_word(word, font, max_width, font_size) {
            let candidate_width = if current.is_empty() {
                text_width(&piece, font, font_size)
            } else {
                text_width(&current, font, font_size)
                    + text_width(" ", font, font_size)
                    + text_width(&piece, font, font_size)
            };
            if candidate_width <= max_width || current.is_empty() {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(&piece);
            } else {
                lines.push(std::mem::take(&mut current));
                current = piece;
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
}

/// Split a word wider than the box into character-bounded pieces.
fn split_oversized_word(
    word: &str,
    font: BaseFont,
    max_width: f32,
    font_size: f32,
) -> Vec<String> {
    if text_width(word, font, font_size) <= max_width {
        return vec![word.to_string()];
    }
    let mut pieces = Vec::new();
    let mut current = String::new();
    for c in word.chars() {
        let mut candidate = current.clone();
        candidate.push(c);
        if text_width(&candidate, font, font_size) <= max_width || current.is_empty() {
            current = candidate;
        } else {
            pieces.push(std::mem::take(&mut current));
            current.push(c);
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

fn dropped_char_count(remainder: &[String]) -> usize {
    let chars: usize = remainder.iter().map(|l| l.chars().count()).sum();
    let separators = remainder.len().saturating_sub(1);
    chars + separators
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, LineRole, TextLine};

    fn profile() -> TypographyProfile {
        TypographyProfile {
            body_font_size: 11.0,
            heading_threshold: 13.2,
            heading_targets: vec![],
            footer_band_ratio: 0.05,
        }
    }

    fn block_with_box(text: &str, bbox: BoundingBox, font_size: f32) -> TextBlock {
        let line = TextLine {
            text: text.to_string(),
            bbox,
            font_name: "Helvetica".to_string(),
            font_size,
            baseline: bbox.top + font_size,
            role: LineRole::default(),
        };
        let mut block = TextBlock::from_lines(0, vec![line]);
        block.merged_text = text.to_string();
        block
    }

    #[test]
    fn test_fitting_text_produces_no_issue() {
        let options = LayoutOptions::default();
        let block = block_with_box(
            "short text",
            BoundingBox::new(72.0, 100.0, 500.0, 160.0),
            11.0,
        );
        let mut reporter = IssueReporter::new();
        let plan = fit_block(&block, 0, None, &profile(), &options, &mut reporter).unwrap();
        assert!(reporter.is_empty());
        assert_eq!(plan.font_size, 11.0);
        assert_eq!(plan.lines, vec!["short text".to_string()]);
    }

    #[test]
    fn test_empty_text_yields_no_plan_no_issue() {
        let options = LayoutOptions::default();
        let block = block_with_box("", BoundingBox::new(72.0, 100.0, 500.0, 160.0), 11.0);
        let mut reporter = IssueReporter::new();
        assert!(fit_block(&block, 0, None, &profile(), &options, &mut reporter).is_none());
        assert!(reporter.is_empty());
    }

    #[test]
    fn test_degenerate_box_reports_truncation() {
        let options = LayoutOptions::default();
        let block = block_with_box("doomed", BoundingBox::new(72.0, 100.0, 72.0, 100.0), 11.0);
        let mut reporter = IssueReporter::new();
        assert!(fit_block(&block, 3, None, &profile(), &options, &mut reporter).is_none());
        assert_eq!(reporter.issues().len(), 1);
        assert_eq!(reporter.issues()[0].kind, IssueKind::Truncated);
        assert!(reporter.issues()[0].detail.contains("zero characters placed"));
    }

    #[test]
    fn test_scaling_records_font_scaled_with_ratio() {
        let options = LayoutOptions::default();
        // Narrow-but-tall box: text needs a couple of wraps at 12pt and
        // only fits after shrinking.
        let text = "a long sentence that will certainly need to wrap many times over";
        let block = block_with_box(text, BoundingBox::new(72.0, 100.0, 200.0, 140.0), 12.0);
        let mut reporter = IssueReporter::new();
        let plan = fit_block(&block, 0, None, &profile(), &options, &mut reporter).unwrap();

        assert!(plan.font_size < 12.0);
        let issues = reporter.issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::FontScaled);
        let expected = format!("{:.2}x", plan.font_size / 12.0);
        assert!(issues[0].detail.contains(&expected));
    }

    #[test]
    fn test_search_is_monotonic() {
        let options = LayoutOptions::default();
        let mut last = f32::MAX;
        let steps = ((12.0 - options.min_font_size) / options.font_step) as usize;
        for step in 0..=steps {
            let size = 12.0 - step as f32 * options.font_step;
            assert!(size < last);
            last = size;
        }
        assert!((last - options.min_font_size).abs() < options.font_step);
    }

    #[test]
    fn test_hopeless_overflow_truncates_once() {
        let options = LayoutOptions::default();
        let text = "word ".repeat(400);
        let block = block_with_box(
            text.trim(),
            BoundingBox::new(72.0, 100.0, 172.0, 130.0),
            11.0,
        );
        let mut reporter = IssueReporter::new();
        let plan = fit_block(&block, 0, None, &profile(), &options, &mut reporter).unwrap();

        let truncations: Vec<_> = reporter
            .issues()
            .iter()
            .filter(|i| i.kind == IssueKind::Truncated)
            .collect();
        assert_eq!(truncations.len(), 1);
        assert!(truncations[0].detail.contains("characters dropped"));
        assert!(plan.remainder.is_empty());
        assert!(!plan.lines.is_empty());
    }

    #[test]
    fn test_overflow_to_new_page_suppresses_truncation() {
        let options = LayoutOptions::default().with_overflow_to_new_page(true);
        let text = "word ".repeat(400);
        let block = block_with_box(
            text.trim(),
            BoundingBox::new(72.0, 100.0, 172.0, 130.0),
            11.0,
        );
        let mut reporter = IssueReporter::new();
        let plan = fit_block(&block, 0, None, &profile(), &options, &mut reporter).unwrap();

        assert!(!plan.remainder.is_empty());
        assert!(reporter
            .issues()
            .iter()
            .all(|i| i.kind != IssueKind::Truncated));
    }

    #[test]
    fn test_gap_below_block_grants_allowance() {
        let options = LayoutOptions::default();
        // Fits at 11pt only when the 40pt gap below the box is borrowed.
        let text = "several words that wrap into a handful of lines when narrow";
        let block = block_with_box(text, BoundingBox::new(72.0, 100.0, 200.0, 124.0), 11.0);
        let mut reporter_no_gap = IssueReporter::new();
        let cramped = fit_block(&block, 0, None, &profile(), &options, &mut reporter_no_gap);

        let mut reporter_gap = IssueReporter::new();
        let roomy = fit_block(
            &block,
            0,
            Some(block.bbox.bottom + 40.0),
            &profile(),
            &options,
            &mut reporter_gap,
        );

        let cramped_truncated = reporter_no_gap
            .issues()
            .iter()
            .any(|i| i.kind == IssueKind::Truncated);
        let roomy_truncated = reporter_gap
            .issues()
            .iter()
            .any(|i| i.kind == IssueKind::Truncated);
        assert!(cramped.is_some() && roomy.is_some());
        assert!(cramped_truncated);
        assert!(!roomy_truncated);
    }

    #[test]
    fn test_wrap_respects_width() {
        let width = 100.0;
        let lines = wrap_text(
            "the quick brown fox jumps over the lazy dog",
            BaseFont::Helvetica,
            width,
            12.0,
        );
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, BaseFont::Helvetica, 12.0) <= width);
        }
    }

    #[test]
    fn test_wrap_preserves_blank_separator() {
        let lines = wrap_text("one\n\ntwo", BaseFont::Helvetica, 500.0, 12.0);
        assert_eq!(lines, vec!["one".to_string(), String::new(), "two".to_string()]);
    }

    #[test]
    fn test_oversized_word_split() {
        let pieces = split_oversized_word("abcdefghij", BaseFont::Helvetica, 20.0, 12.0);
        assert!(pieces.len() > 1);
        let rejoined: String = pieces.concat();
        assert_eq!(rejoined, "abcdefghij");
    }

    #[test]
    fn test_footer_blocks_skipped_in_page_plan() {
        let options = LayoutOptions::default();
        let mut page = Page::letter(0);
        let mut body = block_with_box("body", BoundingBox::new(72.0, 100.0, 500.0, 130.0), 11.0);
        body.merged_text = "body".to_string();
        let mut footer = block_with_box("12", BoundingBox::new(72.0, 770.0, 100.0, 782.0), 9.0);
        footer.role = BlockRole::Footer;
        page.blocks = vec![body, footer];

        let mut reporter = IssueReporter::new();
        let plans = plan_page(&page, &profile(), &options, &mut reporter);
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].block_index, 0);
    }
}
