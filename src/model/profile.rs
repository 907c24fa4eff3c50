//! Document-wide typography statistics.

use serde::{Deserialize, Serialize};

/// Typography profile computed once per document.
///
/// Built from a first read-only pass over every page so that heading and
/// footer thresholds stay consistent across the whole book; a page-local
/// profile would misclassify documents with unusually large or small global
/// font sizes. Immutable after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypographyProfile {
    /// Median line font size across the document
    pub body_font_size: f32,

    /// Font size at and above which a line may be a heading
    pub heading_threshold: f32,

    /// Representative heading sizes (cluster medians, largest last).
    ///
    /// The fitter snaps heading blocks to the nearest target so headings of
    /// the same level keep one size across pages.
    pub heading_targets: Vec<f32>,

    /// Fraction of the page height (from the bottom) treated as the footer
    /// band
    pub footer_band_ratio: f32,
}

impl TypographyProfile {
    /// Footer band height in points for a page of the given height.
    pub fn footer_band(&self, page_height: f32) -> f32 {
        page_height * self.footer_band_ratio
    }

    /// The heading target closest to `size`, if any lies within `tolerance`.
    pub fn match_heading_target(&self, size: f32, tolerance: f32) -> Option<f32> {
        self.heading_targets
            .iter()
            .copied()
            .min_by(|a, b| {
                (a - size)
                    .abs()
                    .partial_cmp(&(b - size).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .filter(|closest| (closest - size).abs() <= tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> TypographyProfile {
        TypographyProfile {
            body_font_size: 10.0,
            heading_threshold: 12.0,
            heading_targets: vec![14.0, 18.0],
            footer_band_ratio: 0.05,
        }
    }

    #[test]
    fn test_footer_band() {
        assert!((profile().footer_band(792.0) - 39.6).abs() < 0.01);
    }

    #[test]
    fn test_match_heading_target() {
        let p = profile();
        assert_eq!(p.match_heading_target(14.2, 0.5), Some(14.0));
        assert_eq!(p.match_heading_target(17.8, 0.5), Some(18.0));
        assert_eq!(p.match_heading_target(16.0, 0.5), None);
    }

    #[test]
    fn test_match_heading_target_empty() {
        let p = TypographyProfile {
            heading_targets: vec![],
            ..profile()
        };
        assert_eq!(p.match_heading_target(14.0, 0.5), None);
    }
}
