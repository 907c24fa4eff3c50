//! Block extraction: positioned fragments -> lines -> blocks.
//!
//! Groups raw positioned text fragments into lines by baseline proximity,
//! splits obvious two-column layouts, then groups lines into blocks by
//! vertical gap and left-edge alignment. Malformed or empty page input
//! yields an empty block list, never an error: any page may legitimately
//! contain non-text or noise fragments.

use crate::model::{BoundingBox, LineRole, TextBlock, TextLine};

use super::LayoutOptions;

/// A positioned text fragment handed in by the extraction collaborator.
#[derive(Debug, Clone)]
pub struct TextFragment {
    /// Decoded text content
    pub text: String,
    /// Left edge
    pub x0: f32,
    /// Right edge
    pub x1: f32,
    /// Top edge (distance from page top)
    pub top: f32,
    /// Bottom edge
    pub bottom: f32,
    /// Font name (e.g. "Helvetica")
    pub font_name: String,
    /// Font size in points
    pub font_size: f32,
}

/// Extract ordered blocks from one page of fragments.
///
/// Deterministic: the same input always produces the same, order-stable
/// block list.
pub fn extract_blocks(
    page_index: usize,
    fragments: &[TextFragment],
    page_width: f32,
    options: &LayoutOptions,
) -> Vec<TextBlock> {
    let lines = fragments_to_lines(fragments, options.line_y_tolerance);
    if lines.is_empty() {
        return Vec::new();
    }

    // Reading order is column-major: all of the left column's blocks come
    // before the right column's, sorted top-to-bottom within each column.
    let mut blocks = Vec::new();
    for column in split_columns(lines, page_width, options) {
        let mut column_blocks = lines_to_blocks(page_index, column, options);
        column_blocks.retain(|b| !b.lines.is_empty() && !b.is_empty());
        column_blocks.sort_by(|a, b| {
            a.bbox
                .top
                .partial_cmp(&b.bbox.top)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(
                    a.bbox
                        .x0
                        .partial_cmp(&b.bbox.x0)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
        });
        blocks.extend(column_blocks);
    }
    log::debug!(
        "page {}: {} fragments -> {} blocks",
        page_index + 1,
        fragments.len(),
        blocks.len()
    );
    blocks
}

/// Horizontal gap, as a multiple of the font size, beyond which fragments
/// on one baseline belong to separate lines (column gutters, not word
/// spaces).
const LINE_SPLIT_GAP_RATIO: f32 = 3.0;

/// Group fragments into lines by vertical proximity of their top edges.
/// A baseline shared across a column gutter yields one line per column.
fn fragments_to_lines(fragments: &[TextFragment], y_tolerance: f32) -> Vec<TextLine> {
    let mut sorted: Vec<&TextFragment> = fragments
        .iter()
        .filter(|f| !f.text.trim().is_empty())
        .collect();
    if sorted.is_empty() {
        return Vec::new();
    }
    sorted.sort_by(|a, b| {
        a.top
            .partial_cmp(&b.top)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x0.partial_cmp(&b.x0).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut lines = Vec::new();
    let mut current: Vec<&TextFragment> = vec![sorted[0]];
    let mut current_top = sorted[0].top;

    for &fragment in &sorted[1..] {
        if (fragment.top - current_top).abs() <= y_tolerance {
            current_top = current_top.min(fragment.top);
            current.push(fragment);
        } else {
            lines.extend(build_baseline_lines(&current));
            current = vec![fragment];
            current_top = fragment.top;
        }
    }
    lines.extend(build_baseline_lines(&current));
    lines
}

/// Build the lines for one baseline group, splitting at gaps too wide to be
/// word spaces.
fn build_baseline_lines(fragments: &[&TextFragment]) -> Vec<TextLine> {
    let mut sorted: Vec<&TextFragment> = fragments.to_vec();
    sorted.sort_by(|a, b| a.x0.partial_cmp(&b.x0).unwrap_or(std::cmp::Ordering::Equal));

    let mut lines = Vec::new();
    let mut run: Vec<&TextFragment> = Vec::new();
    for &fragment in &sorted {
        let wide_gap = run.last().is_some_and(|prev| {
            fragment.x0 - prev.x1 > prev.font_size.max(fragment.font_size) * LINE_SPLIT_GAP_RATIO
        });
        if wide_gap {
            lines.push(build_line(&run));
            run.clear();
        }
        run.push(fragment);
    }
    if !run.is_empty() {
        lines.push(build_line(&run));
    }
    lines
}

/// Assemble one line from the fragments sharing its baseline.
fn build_line(fragments: &[&TextFragment]) -> TextLine {
    let mut sorted: Vec<&&TextFragment> = fragments.iter().collect();
    sorted.sort_by(|a, b| a.x0.partial_cmp(&b.x0).unwrap_or(std::cmp::Ordering::Equal));

    let mut text = String::new();
    let mut prev_x1: Option<f32> = None;
    for fragment in &sorted {
        if let Some(prev) = prev_x1 {
            let gap = fragment.x0 - prev;
            // A gap wider than a sliver of the font size means a word break
            // the extractor did not encode as a space.
            let needs_space = gap > fragment.font_size * 0.15
                && !text.ends_with(' ')
                && !fragment.text.starts_with(' ');
            if needs_space {
                text.push(' ');
            }
        }
        text.push_str(&fragment.text);
        prev_x1 = Some(fragment.x1);
    }

    let bbox = sorted
        .iter()
        .map(|f| BoundingBox::new(f.x0, f.top, f.x1, f.bottom))
        .reduce(|a, b| a.union(&b))
        .unwrap_or(BoundingBox::new(0.0, 0.0, 0.0, 0.0));

    let font_size = median(sorted.iter().map(|f| f.font_size)).unwrap_or(11.0);
    let font_name = sorted
        .iter()
        .max_by(|a, b| {
            (a.x1 - a.x0)
                .partial_cmp(&(b.x1 - b.x0))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|f| f.font_name.clone())
        .unwrap_or_default();

    TextLine {
        text: text.trim().to_string(),
        baseline: bbox.top + font_size * 0.8,
        bbox,
        font_name,
        font_size,
        role: LineRole::default(),
    }
}

/// Split lines into two columns when a wide horizontal gutter separates two
/// distinct left-edge groups. Anything ambiguous stays a single column.
fn split_columns(
    lines: Vec<TextLine>,
    page_width: f32,
    options: &LayoutOptions,
) -> Vec<Vec<TextLine>> {
    if lines.len() < 6 || page_width <= 0.0 {
        return vec![lines];
    }

    let mut x0s: Vec<f32> = lines
        .iter()
        .map(|l| (l.bbox.x0 * 10.0).round() / 10.0)
        .collect();
    x0s.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    x0s.dedup();
    if x0s.len() < 2 {
        return vec![lines];
    }

    let (mut max_gap, mut split_index) = (0.0f32, 0usize);
    for i in 0..x0s.len() - 1 {
        let gap = x0s[i + 1] - x0s[i];
        if gap > max_gap {
            max_gap = gap;
            split_index = i;
        }
    }
    if max_gap < page_width * options.column_gap_ratio {
        return vec![lines];
    }

    let split_x = (x0s[split_index] + x0s[split_index + 1]) / 2.0;
    let (left, right): (Vec<TextLine>, Vec<TextLine>) =
        lines.into_iter().partition(|l| l.bbox.x0 < split_x);
    if left.len() < 3 || right.len() < 3 {
        let mut all = left;
        all.extend(right);
        all.sort_by(|a, b| {
            a.bbox
                .top
                .partial_cmp(&b.bbox.top)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        return vec![all];
    }
    vec![left, right]
}

/// Group a column's lines into blocks by vertical gap and left alignment.
fn lines_to_blocks(
    page_index: usize,
    mut lines: Vec<TextLine>,
    options: &LayoutOptions,
) -> Vec<TextBlock> {
    if lines.is_empty() {
        return Vec::new();
    }
    lines.sort_by(|a, b| {
        a.bbox
            .top
            .partial_cmp(&b.bbox.top)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                a.bbox
                    .x0
                    .partial_cmp(&b.bbox.x0)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
    });

    let heights: Vec<f32> = lines.iter().map(|l| l.bbox.height().max(1.0)).collect();
    let gap_threshold = median(heights.iter().copied()).unwrap_or(12.0) * options.block_gap_ratio;

    let mut groups: Vec<Vec<TextLine>> = Vec::new();
    let mut current: Vec<TextLine> = Vec::new();
    for line in lines {
        if let Some(prev) = current.last() {
            let gap = line.bbox.top - prev.bbox.bottom;
            let indent_jump = (line.bbox.x0 - prev.bbox.x0).abs() > options.indent_tolerance;
            if gap > gap_threshold || indent_jump {
                groups.push(std::mem::take(&mut current));
            }
        }
        current.push(line);
    }
    if !current.is_empty() {
        groups.push(current);
    }

    groups
        .into_iter()
        .map(|group| TextBlock::from_lines(page_index, group))
        .collect()
}

fn median(values: impl Iterator<Item = f32>) -> Option<f32> {
    let mut values: Vec<f32> = values.filter(|v| *v > 0.0).collect();
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    Some(values[values.len() / 2])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(text: &str, x0: f32, top: f32) -> TextFragment {
        TextFragment {
            text: text.to_string(),
            x0,
            x1: x0 + text.len() as f32 * 5.0,
            top,
            bottom: top + 12.0,
            font_name: "Helvetica".to_string(),
            font_size: 11.0,
        }
    }

    #[test]
    fn test_empty_input_yields_empty_blocks() {
        let options = LayoutOptions::default();
        assert!(extract_blocks(0, &[], 612.0, &options).is_empty());
    }

    #[test]
    fn test_whitespace_fragments_dropped() {
        let options = LayoutOptions::default();
        let fragments = vec![fragment("   ", 72.0, 100.0)];
        assert!(extract_blocks(0, &fragments, 612.0, &options).is_empty());
    }

    #[test]
    fn test_fragments_on_one_baseline_share_a_line() {
        let options = LayoutOptions::default();
        let fragments = vec![
            fragment("world", 100.0, 100.0),
            fragment("hello", 72.0, 100.5),
        ];
        let blocks = extract_blocks(0, &fragments, 612.0, &options);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lines.len(), 1);
        assert_eq!(blocks[0].lines[0].text, "hello world");
    }

    #[test]
    fn test_gutter_gap_splits_baseline_into_lines() {
        let options = LayoutOptions::default();
        // Same baseline, but the gap is far too wide for a word space.
        let fragments = vec![
            fragment("left", 72.0, 100.0),
            fragment("right", 400.0, 100.0),
        ];
        let blocks = extract_blocks(0, &fragments, 612.0, &options);
        let lines: usize = blocks.iter().map(|b| b.lines.len()).sum();
        assert_eq!(lines, 2);
    }

    #[test]
    fn test_vertical_gap_starts_new_block() {
        let options = LayoutOptions::default();
        let fragments = vec![
            fragment("first paragraph line", 72.0, 100.0),
            fragment("second line", 72.0, 114.0),
            // 60pt gap, far beyond 1.5x the 12pt line height
            fragment("new block", 72.0, 174.0),
        ];
        let blocks = extract_blocks(0, &fragments, 612.0, &options);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].lines.len(), 2);
        assert_eq!(blocks[1].lines[0].text, "new block");
    }

    #[test]
    fn test_indent_jump_starts_new_block() {
        let options = LayoutOptions::default();
        let fragments = vec![
            fragment("left aligned", 72.0, 100.0),
            fragment("pushed right", 140.0, 114.0),
        ];
        let blocks = extract_blocks(0, &fragments, 612.0, &options);
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_block_bbox_is_union_of_lines() {
        let options = LayoutOptions::default();
        let fragments = vec![
            fragment("one", 72.0, 100.0),
            fragment("two longer", 72.0, 114.0),
        ];
        let blocks = extract_blocks(0, &fragments, 612.0, &options);
        let block = &blocks[0];
        assert_eq!(block.bbox.top, 100.0);
        assert_eq!(block.bbox.bottom, 126.0);
        assert!(block.bbox.x1 >= 72.0 + 10.0 * 5.0);
    }

    #[test]
    fn test_two_columns_split() {
        let options = LayoutOptions::default();
        let mut fragments = Vec::new();
        for i in 0..4 {
            fragments.push(fragment("left col", 72.0, 100.0 + i as f32 * 14.0));
            fragments.push(fragment("right col", 400.0, 100.0 + i as f32 * 14.0));
        }
        let blocks = extract_blocks(0, &fragments, 612.0, &options);
        assert_eq!(blocks.len(), 2);
        let texts: Vec<String> = blocks.iter().map(|b| b.raw_text()).collect();
        assert!(texts.iter().any(|t| t.contains("left col") && !t.contains("right")));
        assert!(texts.iter().any(|t| t.contains("right col") && !t.contains("left")));
    }

    #[test]
    fn test_column_blocks_keep_column_order() {
        let options = LayoutOptions::default();
        // Two columns, each holding two blocks separated by a large gap.
        let mut fragments = Vec::new();
        for top in [100.0, 114.0, 300.0, 314.0] {
            fragments.push(fragment("left text", 72.0, top));
            fragments.push(fragment("right text", 400.0, top));
        }
        let blocks = extract_blocks(0, &fragments, 612.0, &options);
        assert_eq!(blocks.len(), 4);

        // All left-column blocks precede all right-column blocks, and each
        // column stays in top-to-bottom order.
        let first_right = blocks
            .iter()
            .position(|b| b.bbox.x0 > 200.0)
            .expect("right column block");
        assert!(blocks[..first_right].iter().all(|b| b.bbox.x0 < 200.0));
        assert!(blocks[first_right..].iter().all(|b| b.bbox.x0 > 200.0));
        for column in [&blocks[..first_right], &blocks[first_right..]] {
            for pair in column.windows(2) {
                assert!(pair[0].bbox.top < pair[1].bbox.top);
            }
        }
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let options = LayoutOptions::default();
        let fragments = vec![
            fragment("b", 200.0, 100.0),
            fragment("a", 72.0, 100.0),
            fragment("c", 72.0, 150.0),
        ];
        let first = extract_blocks(0, &fragments, 612.0, &options);
        let second = extract_blocks(0, &fragments, 612.0, &options);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.raw_text(), b.raw_text());
            assert_eq!(a.bbox, b.bbox);
        }
    }
}
