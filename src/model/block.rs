//! Text block and line types.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in page coordinates.
///
/// Coordinates use the extraction convention: `top` is the distance from the
/// top edge of the page, so `top < bottom` for any non-degenerate box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge
    pub x0: f32,
    /// Top edge (distance from page top)
    pub top: f32,
    /// Right edge
    pub x1: f32,
    /// Bottom edge
    pub bottom: f32,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(x0: f32, top: f32, x1: f32, bottom: f32) -> Self {
        Self { x0, top, x1, bottom }
    }

    /// Box width.
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    /// Box height.
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Whether the box encloses zero area.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x0: self.x0.min(other.x0),
            top: self.top.min(other.top),
            x1: self.x1.max(other.x1),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

/// Role assigned to a single line by the typography profiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineRole {
    /// Regular body text
    #[default]
    Paragraph,
    /// Heading line (large font, short, sentence-complete)
    Heading,
    /// Footer or page-number line, excluded from translatable text
    FooterOrPageNumber,
}

/// Role assigned to a block, derived from its lines' roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockRole {
    /// Regular paragraph block
    #[default]
    Paragraph,
    /// Heading block, rendered with distinct sizing
    Heading,
    /// Footer or page-number block, skipped during rendering
    Footer,
    /// Lines of several roles mixed in one block
    Mixed,
}

/// A single extracted line of text.
///
/// Owned exclusively by its [`TextBlock`]; built once during extraction and
/// only annotated (role) afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLine {
    /// Raw line text as extracted
    pub text: String,
    /// Line bounding box
    pub bbox: BoundingBox,
    /// Font name of the dominant fragment (e.g. "Helvetica")
    pub font_name: String,
    /// Dominant font size in points
    pub font_size: f32,
    /// Baseline y position (distance from page top)
    pub baseline: f32,
    /// Role assigned by the typography profiler
    pub role: LineRole,
}

impl TextLine {
    /// Number of whitespace-separated tokens in the line.
    pub fn token_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Whether the line holds any non-whitespace text.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A spatially grouped run of lines treated as one layout unit.
///
/// Created once by the block extractor; the line merger caches the merged
/// paragraph text on it; the layout fitter then consumes it read-only. The
/// bounding box is the union of the lines' boxes at extraction time and is
/// never enlarged afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBlock {
    /// Index of the owning page (0-based)
    pub page_index: usize,
    /// Union of the lines' bounding boxes
    pub bbox: BoundingBox,
    /// Lines in reading order
    pub lines: Vec<TextLine>,
    /// Dominant (median) font size of the block
    pub font_size: f32,
    /// Role derived from the lines' roles
    pub role: BlockRole,
    /// Merged paragraph text, populated by the line merger.
    ///
    /// Paragraphs are separated by blank lines; footer lines are absent.
    pub merged_text: String,
}

impl TextBlock {
    /// Create a block from its lines. The bounding box and dominant font
    /// size are derived from the lines; an empty line list yields a
    /// degenerate box.
    pub fn from_lines(page_index: usize, lines: Vec<TextLine>) -> Self {
        let bbox = lines
            .iter()
            .map(|l| l.bbox)
            .reduce(|a, b| a.union(&b))
            .unwrap_or(BoundingBox::new(0.0, 0.0, 0.0, 0.0));
        let font_size = median_size(&lines).unwrap_or(11.0);
        Self {
            page_index,
            bbox,
            lines,
            font_size,
            role: BlockRole::default(),
            merged_text: String::new(),
        }
    }

    /// Raw text of the block: lines joined with newlines, no merging.
    pub fn raw_text(&self) -> String {
        self.lines
            .iter()
            .filter(|l| !l.is_empty())
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether the block holds any non-whitespace text.
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.is_empty())
    }

    /// Whether every line of the block is a footer/page-number line.
    pub fn is_footer_only(&self) -> bool {
        !self.lines.is_empty()
            && self
                .lines
                .iter()
                .all(|l| l.role == LineRole::FooterOrPageNumber)
    }
}

fn median_size(lines: &[TextLine]) -> Option<f32> {
    let mut sizes: Vec<f32> = lines
        .iter()
        .map(|l| l.font_size)
        .filter(|s| *s > 0.0)
        .collect();
    if sizes.is_empty() {
        return None;
    }
    sizes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    Some(sizes[sizes.len() / 2])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str, top: f32, size: f32) -> TextLine {
        TextLine {
            text: text.to_string(),
            bbox: BoundingBox::new(72.0, top, 300.0, top + size),
            font_name: "Helvetica".to_string(),
            font_size: size,
            baseline: top + size * 0.8,
            role: LineRole::default(),
        }
    }

    #[test]
    fn test_bbox_union() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 5.0, 20.0, 30.0);
        let u = a.union(&b);
        assert_eq!(u, BoundingBox::new(0.0, 0.0, 20.0, 30.0));
    }

    #[test]
    fn test_bbox_degenerate() {
        assert!(BoundingBox::new(0.0, 0.0, 0.0, 0.0).is_degenerate());
        assert!(BoundingBox::new(10.0, 5.0, 10.0, 25.0).is_degenerate());
        assert!(!BoundingBox::new(0.0, 0.0, 1.0, 1.0).is_degenerate());
    }

    #[test]
    fn test_block_from_lines_derives_bbox_and_size() {
        let block = TextBlock::from_lines(0, vec![line("one", 100.0, 10.0), line("two", 114.0, 12.0)]);
        assert_eq!(block.bbox.top, 100.0);
        assert_eq!(block.bbox.bottom, 126.0);
        assert_eq!(block.font_size, 12.0);
        assert_eq!(block.raw_text(), "one\ntwo");
    }

    #[test]
    fn test_empty_block() {
        let block = TextBlock::from_lines(0, vec![]);
        assert!(block.is_empty());
        assert!(block.bbox.is_degenerate());
    }

    #[test]
    fn test_token_count() {
        assert_eq!(line("hello brave world", 0.0, 10.0).token_count(), 3);
        assert_eq!(line("  ", 0.0, 10.0).token_count(), 0);
    }
}
