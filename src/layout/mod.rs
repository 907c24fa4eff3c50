//! Layout engine: block extraction, typography profiling, line merging and
//! fit planning.

pub mod extract;
pub mod fit;
pub mod merge;
pub mod metrics;
mod options;
pub mod typography;

pub use extract::{extract_blocks, TextFragment};
pub use fit::{fit_block, plan_page, wrap_text, RenderPlan};
pub use merge::merge_document;
pub use metrics::BaseFont;
pub use options::{LayoutOptions, LINE_HEIGHT_MIN};
pub use typography::{build_profile, classify_document};
