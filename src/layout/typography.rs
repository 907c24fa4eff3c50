//! Typography profiling and role classification.
//!
//! A first read-only pass over the whole document computes the
//! [`TypographyProfile`]; a second pass annotates every line and block with
//! a role. Profiling is document-scoped so thresholds stay consistent
//! across all pages of the same book.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::{BlockRole, LineRole, Page, TypographyProfile};

use super::LayoutOptions;

const DEFAULT_BODY_SIZE: f32 = 11.0;

/// Compute the document-wide typography profile from extracted pages.
pub fn build_profile(pages: &[Page], options: &LayoutOptions) -> TypographyProfile {
    let mut sizes: Vec<f32> = pages
        .iter()
        .flat_map(|p| p.blocks.iter())
        .flat_map(|b| b.lines.iter())
        .map(|l| l.font_size)
        .filter(|s| *s > 0.0)
        .collect();

    let body_font_size = if sizes.is_empty() {
        DEFAULT_BODY_SIZE
    } else {
        sizes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        sizes[sizes.len() / 2]
    };
    let heading_threshold = body_font_size * options.heading_size_ratio;

    let heading_sizes: Vec<f32> = sizes
        .iter()
        .copied()
        .filter(|s| *s >= heading_threshold)
        .collect();
    let heading_targets =
        cluster_targets(&heading_sizes, options.heading_tolerance, heading_threshold);

    log::debug!(
        "typography profile: body {body_font_size:.1}pt, heading threshold {heading_threshold:.1}pt, {} target(s)",
        heading_targets.len()
    );

    TypographyProfile {
        body_font_size,
        heading_threshold,
        heading_targets,
        footer_band_ratio: options.footer_band_ratio,
    }
}

/// Annotate every line and block of the document with its role.
///
/// The profile must already be final; classification never mutates it.
pub fn classify_document(pages: &mut [Page], profile: &TypographyProfile, options: &LayoutOptions) {
    for page in pages.iter_mut() {
        let footer_top = page.height - profile.footer_band(page.height);
        for block in &mut page.blocks {
            for line in &mut block.lines {
                line.role = classify_line(
                    &line.text,
                    line.font_size,
                    line.bbox.bottom,
                    footer_top,
                    profile,
                    options,
                );
            }
            block.role = derive_block_role(block.lines.iter().map(|l| l.role));
        }
    }
}

/// Classify one line. Rules are applied in priority order; first match wins.
fn classify_line(
    text: &str,
    font_size: f32,
    bottom: f32,
    footer_top: f32,
    profile: &TypographyProfile,
    options: &LayoutOptions,
) -> LineRole {
    let tokens = text.split_whitespace().count();

    if bottom >= footer_top && tokens <= options.footer_max_tokens && is_footer_text(text) {
        return LineRole::FooterOrPageNumber;
    }

    let large_enough = font_size >= profile.heading_threshold;
    let short_enough = tokens > 0 && tokens <= options.heading_max_tokens;
    if short_enough && !ends_mid_sentence(text) && (large_enough || is_all_caps_heading(text)) {
        return LineRole::Heading;
    }

    LineRole::Paragraph
}

/// Majority role of the lines; any non-paragraph role wins on a single-line
/// block; several roles without a majority yield `Mixed`.
fn derive_block_role(roles: impl Iterator<Item = LineRole>) -> BlockRole {
    let (mut paragraph, mut heading, mut footer) = (0usize, 0usize, 0usize);
    for role in roles {
        match role {
            LineRole::Paragraph => paragraph += 1,
            LineRole::Heading => heading += 1,
            LineRole::FooterOrPageNumber => footer += 1,
        }
    }
    let total = paragraph + heading + footer;
    if total == 0 {
        return BlockRole::Paragraph;
    }
    if footer * 2 > total || (total == 1 && footer == 1) {
        return BlockRole::Footer;
    }
    if heading * 2 > total || (total == 1 && heading == 1) {
        return BlockRole::Heading;
    }
    if paragraph * 2 > total {
        return BlockRole::Paragraph;
    }
    BlockRole::Mixed
}

/// Cluster heading sizes within `tolerance` and return one representative
/// target per cluster (cluster median, clamped to the threshold).
fn cluster_targets(sizes: &[f32], tolerance: f32, threshold: f32) -> Vec<f32> {
    if sizes.is_empty() {
        return Vec::new();
    }
    let mut sorted = sizes.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mut clusters: Vec<Vec<f32>> = vec![vec![sorted[0]]];
    for size in &sorted[1..] {
        let last = clusters.last_mut().expect("at least one cluster");
        if size - last.last().copied().unwrap_or(*size) <= tolerance {
            last.push(*size);
        } else {
            clusters.push(vec![*size]);
        }
    }

    clusters
        .into_iter()
        .map(|cluster| cluster[cluster.len() / 2].max(threshold))
        .collect()
}

/// Whether the text looks like a page number or running footer: bare
/// numerals, roman numerals, or a "Page N" marker.
pub fn is_footer_text(text: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(\d{1,4}|[ivxlcdm]{1,7}|page\s+\d{1,4}(\s+of\s+\d{1,4})?)$")
            .expect("valid footer pattern")
    });
    let trimmed = text.trim().trim_matches(|c: char| c == '-' || c == '\u{2013}' || c.is_whitespace());
    !trimmed.is_empty() && pattern.is_match(trimmed)
}

/// Whether the line visibly stops mid-sentence (trailing connector
/// punctuation), which disqualifies it as a heading.
fn ends_mid_sentence(text: &str) -> bool {
    matches!(
        text.trim_end().chars().last(),
        Some(',') | Some(';') | Some(':') | Some('-')
    )
}

/// Short all-caps lines read as headings even at body size.
fn is_all_caps_heading(text: &str) -> bool {
    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 4
        && letters.iter().all(|c| c.is_uppercase())
        && text.split_whitespace().count() <= 8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, TextBlock, TextLine};

    fn make_line(text: &str, top: f32, size: f32) -> TextLine {
        TextLine {
            text: text.to_string(),
            bbox: BoundingBox::new(72.0, top, 300.0, top + size * 1.2),
            font_name: "Helvetica".to_string(),
            font_size: size,
            baseline: top + size,
            role: LineRole::default(),
        }
    }

    fn make_page(lines: Vec<TextLine>) -> Page {
        let mut page = Page::letter(0);
        page.blocks = lines
            .into_iter()
            .map(|l| TextBlock::from_lines(0, vec![l]))
            .collect();
        page
    }

    fn classify(pages: &mut [Page]) -> TypographyProfile {
        let options = LayoutOptions::default();
        let profile = build_profile(pages, &options);
        classify_document(pages, &profile, &options);
        profile
    }

    #[test]
    fn test_median_body_size() {
        let mut pages = vec![make_page(vec![
            make_line("body one", 100.0, 10.0),
            make_line("body two", 120.0, 10.0),
            make_line("Big Heading", 60.0, 20.0),
        ])];
        let profile = classify(&mut pages);
        assert_eq!(profile.body_font_size, 10.0);
        assert!((profile.heading_threshold - 12.0).abs() < 0.01);
    }

    #[test]
    fn test_heading_classification_double_size() {
        // A 3-word line at 2x the median size is a heading.
        let mut pages = vec![make_page(vec![
            make_line("Chapter One Begins", 60.0, 20.0),
            make_line("plain body text here,", 100.0, 10.0),
            make_line("and some more body", 120.0, 10.0),
        ])];
        classify(&mut pages);
        assert_eq!(pages[0].blocks[0].role, BlockRole::Heading);
        assert_eq!(pages[0].blocks[1].role, BlockRole::Paragraph);
    }

    #[test]
    fn test_footer_classification_ignores_font_size() {
        // Page height 792, footer band 5% -> lines below 752.4 qualify.
        let mut pages = vec![make_page(vec![
            make_line("body text on the page", 100.0, 11.0),
            make_line("more body text here", 120.0, 11.0),
            make_line("12", 770.0, 22.0),
        ])];
        classify(&mut pages);
        let footer_block = &pages[0].blocks[2];
        assert_eq!(footer_block.lines[0].role, LineRole::FooterOrPageNumber);
        assert_eq!(footer_block.role, BlockRole::Footer);
    }

    #[test]
    fn test_footer_patterns() {
        assert!(is_footer_text("12"));
        assert!(is_footer_text(" 1234 "));
        assert!(is_footer_text("- 42 -"));
        assert!(is_footer_text("xiv"));
        assert!(is_footer_text("Page 7"));
        assert!(is_footer_text("page 3 of 10"));
        assert!(!is_footer_text("12345"));
        assert!(!is_footer_text("Chapter 1"));
        assert!(!is_footer_text(""));
    }

    #[test]
    fn test_heading_rejects_mid_sentence_endings() {
        let mut pages = vec![make_page(vec![
            make_line("This line trails off with a comma,", 60.0, 20.0),
            make_line("body text", 100.0, 10.0),
            make_line("body text", 120.0, 10.0),
        ])];
        // Short enough token-wise? 7 tokens, under the limit, but the
        // trailing comma disqualifies it.
        classify(&mut pages);
        assert_eq!(pages[0].blocks[0].role, BlockRole::Paragraph);
    }

    #[test]
    fn test_all_caps_heading_at_body_size() {
        let mut pages = vec![make_page(vec![
            make_line("INTRODUCTION", 60.0, 11.0),
            make_line("body text goes here", 100.0, 11.0),
            make_line("and continues on", 120.0, 11.0),
        ])];
        classify(&mut pages);
        assert_eq!(pages[0].blocks[0].role, BlockRole::Heading);
    }

    #[test]
    fn test_heading_targets_cluster() {
        let mut pages = vec![make_page(vec![
            make_line("Heading A", 60.0, 14.1),
            make_line("Heading B", 80.0, 14.3),
            make_line("body", 100.0, 10.0),
            make_line("body", 120.0, 10.0),
            make_line("body", 140.0, 10.0),
        ])];
        let profile = classify(&mut pages);
        assert_eq!(profile.heading_targets.len(), 1);
        let target = profile.heading_targets[0];
        assert!((target - 14.2).abs() < 0.3);
    }

    #[test]
    fn test_mixed_block_role() {
        let mut page = Page::letter(0);
        page.blocks = vec![TextBlock::from_lines(
            0,
            vec![
                make_line("BIG HEADING TEXT", 60.0, 22.0),
                make_line("plain body here,", 80.0, 11.0),
            ],
        )];
        let mut pages = vec![page];
        classify(&mut pages);
        assert_eq!(pages[0].blocks[0].role, BlockRole::Mixed);
    }

    #[test]
    fn test_empty_document_profile_defaults() {
        let options = LayoutOptions::default();
        let profile = build_profile(&[], &options);
        assert_eq!(profile.body_font_size, DEFAULT_BODY_SIZE);
        assert!(profile.heading_targets.is_empty());
    }
}
