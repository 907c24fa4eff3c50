//! Page-level types.

use super::TextBlock;
use serde::{Deserialize, Serialize};

/// A single page of the source document with its extracted blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Page index (0-based)
    pub index: usize,

    /// Page width in points (1 point = 1/72 inch)
    pub width: f32,

    /// Page height in points
    pub height: f32,

    /// Blocks in reading order: top-to-bottom, with a split column read in
    /// full before the column to its right
    pub blocks: Vec<TextBlock>,
}

impl Page {
    /// Create a new empty page with the given dimensions.
    pub fn new(index: usize, width: f32, height: f32) -> Self {
        Self {
            index,
            width,
            height,
            blocks: Vec::new(),
        }
    }

    /// Create a new page with standard Letter size (8.5 x 11 inches).
    pub fn letter(index: usize) -> Self {
        Self::new(index, 612.0, 792.0)
    }

    /// Check if the page has no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Page dimensions as (width, height).
    pub fn dimensions(&self) -> (f32, f32) {
        (self.width, self.height)
    }
}
