//! Document model types for layout-preserving translation.
//!
//! This module defines the intermediate representation that bridges PDF
//! extraction, translation, and rendering. Blocks and lines carry the
//! physical geometry of the source document; the typography profile and
//! formatting issues describe document-wide facts about it.

mod block;
mod issue;
mod page;
mod profile;

pub use block::{BlockRole, BoundingBox, LineRole, TextBlock, TextLine};
pub use issue::{FormattingIssue, IssueCounts, IssueKind, IssueReport, IssueReporter, IssueSummary};
pub use page::Page;
pub use profile::TypographyProfile;
