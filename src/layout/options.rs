//! Layout engine configuration.

use crate::error::{Error, Result};

/// Compact line-height floor tried before shrinking the font.
pub const LINE_HEIGHT_MIN: f32 = 1.05;

/// Tunable thresholds for the layout engine.
///
/// All values are plain configuration, validated once by [`validate`] before
/// any page is processed; per-block fit failures are reported as formatting
/// issues instead.
///
/// [`validate`]: LayoutOptions::validate
#[derive(Debug, Clone)]
pub struct LayoutOptions {
    /// Vertical tolerance for fragments sharing a line (points)
    pub line_y_tolerance: f32,

    /// A vertical gap larger than `median line height * this` starts a new
    /// block
    pub block_gap_ratio: f32,

    /// A left-edge jump beyond this many points starts a new block
    pub indent_tolerance: f32,

    /// Minimum horizontal gap, as a fraction of page width, that splits
    /// lines into two columns
    pub column_gap_ratio: f32,

    /// Multiplier over the body font size above which a line may be a
    /// heading
    pub heading_size_ratio: f32,

    /// Size tolerance when clustering and matching heading targets (points)
    pub heading_tolerance: f32,

    /// Fraction of page height (from the bottom) treated as the footer band
    pub footer_band_ratio: f32,

    /// Maximum token count for a footer/page-number line
    pub footer_max_tokens: usize,

    /// Maximum token count for a heading line
    pub heading_max_tokens: usize,

    /// Minimum readable font size the fitter may shrink to (points)
    pub min_font_size: f32,

    /// Discrete decrement applied while searching for a fitting size
    /// (points)
    pub font_step: f32,

    /// Preferred line height as a multiple of the font size
    pub line_height_ratio: f32,

    /// Extra vertical allowance granted beyond the block box before
    /// truncating (points)
    pub extra_allowance: f32,

    /// Flow overflowing text onto a continuation page instead of truncating
    pub overflow_to_new_page: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            line_y_tolerance: 2.0,
            block_gap_ratio: 1.5,
            indent_tolerance: 18.0,
            column_gap_ratio: 0.2,
            heading_size_ratio: 1.2,
            heading_tolerance: 0.5,
            footer_band_ratio: 0.05,
            footer_max_tokens: 3,
            heading_max_tokens: 8,
            min_font_size: 9.0,
            font_step: 0.5,
            line_height_ratio: 1.4,
            extra_allowance: 0.0,
            overflow_to_new_page: false,
        }
    }
}

impl LayoutOptions {
    /// Create options with documented defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum readable font size.
    pub fn with_min_font_size(mut self, size: f32) -> Self {
        self.min_font_size = size;
        self
    }

    /// Set the font-size search step.
    pub fn with_font_step(mut self, step: f32) -> Self {
        self.font_step = step;
        self
    }

    /// Set the block-grouping vertical gap multiplier.
    pub fn with_block_gap_ratio(mut self, ratio: f32) -> Self {
        self.block_gap_ratio = ratio;
        self
    }

    /// Set the heading size multiplier.
    pub fn with_heading_size_ratio(mut self, ratio: f32) -> Self {
        self.heading_size_ratio = ratio;
        self
    }

    /// Set the footer band as a fraction of page height.
    pub fn with_footer_band_ratio(mut self, ratio: f32) -> Self {
        self.footer_band_ratio = ratio;
        self
    }

    /// Set the extra vertical allowance granted before truncation.
    pub fn with_extra_allowance(mut self, points: f32) -> Self {
        self.extra_allowance = points;
        self
    }

    /// Enable or disable overflow onto continuation pages.
    pub fn with_overflow_to_new_page(mut self, enabled: bool) -> Self {
        self.overflow_to_new_page = enabled;
        self
    }

    /// Validate the configuration. Called once at setup, before any page is
    /// processed; a failure here is fatal, unlike per-block fit failures.
    pub fn validate(&self) -> Result<()> {
        if self.font_step <= 0.0 {
            return Err(Error::Config(format!(
                "font_step must be positive, got {}",
                self.font_step
            )));
        }
        if self.min_font_size <= 0.0 {
            return Err(Error::Config(format!(
                "min_font_size must be positive, got {}",
                self.min_font_size
            )));
        }
        if self.line_height_ratio < LINE_HEIGHT_MIN {
            return Err(Error::Config(format!(
                "line_height_ratio must be at least {LINE_HEIGHT_MIN}, got {}",
                self.line_height_ratio
            )));
        }
        if !(0.0..1.0).contains(&self.footer_band_ratio) {
            return Err(Error::Config(format!(
                "footer_band_ratio must be in [0, 1), got {}",
                self.footer_band_ratio
            )));
        }
        if self.block_gap_ratio <= 0.0 {
            return Err(Error::Config(format!(
                "block_gap_ratio must be positive, got {}",
                self.block_gap_ratio
            )));
        }
        if self.heading_size_ratio <= 1.0 {
            return Err(Error::Config(format!(
                "heading_size_ratio must exceed 1.0, got {}",
                self.heading_size_ratio
            )));
        }
        if !(0.0..1.0).contains(&self.column_gap_ratio) {
            return Err(Error::Config(format!(
                "column_gap_ratio must be in [0, 1), got {}",
                self.column_gap_ratio
            )));
        }
        if self.extra_allowance < 0.0 {
            return Err(Error::Config(format!(
                "extra_allowance must not be negative, got {}",
                self.extra_allowance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(LayoutOptions::default().validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let options = LayoutOptions::new()
            .with_min_font_size(8.0)
            .with_font_step(1.0)
            .with_overflow_to_new_page(true);
        assert_eq!(options.min_font_size, 8.0);
        assert_eq!(options.font_step, 1.0);
        assert!(options.overflow_to_new_page);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_invalid_step_rejected() {
        let options = LayoutOptions::new().with_font_step(0.0);
        assert!(matches!(options.validate(), Err(Error::Config(_))));

        let options = LayoutOptions::new().with_font_step(-0.5);
        assert!(matches!(options.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_footer_band_rejected() {
        let options = LayoutOptions::new().with_footer_band_ratio(1.5);
        assert!(matches!(options.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_min_size_rejected() {
        let options = LayoutOptions::new().with_min_font_size(-1.0);
        assert!(matches!(options.validate(), Err(Error::Config(_))));
    }
}
