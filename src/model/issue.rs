//! Formatting issue records and the append-only reporter.
//!
//! Every deviation between the original and rendered layout (font shrink,
//! truncation) is recorded here instead of being raised: losing a
//! description of dropped text would be worse than a lossy run that reports
//! precisely what did not fit.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of formatting deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Font size was reduced to make the text fit
    FontScaled,
    /// Text was truncated to fit the block
    Truncated,
}

impl IssueKind {
    /// Short human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            IssueKind::FontScaled => "font scaled",
            IssueKind::Truncated => "truncated",
        }
    }
}

/// A recorded deviation for one block. Append-only, never edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormattingIssue {
    /// Page index (0-based)
    pub page_index: usize,
    /// Block index within the page
    pub block_index: usize,
    /// Deviation kind
    pub kind: IssueKind,
    /// Human-readable detail (scale factor applied, characters dropped)
    pub detail: String,
}

impl FormattingIssue {
    /// A font-scaling record with the applied/original ratio.
    pub fn font_scaled(page_index: usize, block_index: usize, factor: f32) -> Self {
        Self {
            page_index,
            block_index,
            kind: IssueKind::FontScaled,
            detail: format!("font scaled to {:.2}x of original size", factor),
        }
    }

    /// A truncation record with the number of characters dropped.
    pub fn truncated(page_index: usize, block_index: usize, dropped_chars: usize) -> Self {
        Self {
            page_index,
            block_index,
            kind: IssueKind::Truncated,
            detail: format!("{dropped_chars} characters dropped"),
        }
    }
}

/// Per-kind issue counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCounts {
    /// Number of font-scaled records
    pub font_scaled: usize,
    /// Number of truncation records
    pub truncated: usize,
}

impl IssueCounts {
    fn add(&mut self, kind: IssueKind) {
        match kind {
            IssueKind::FontScaled => self.font_scaled += 1,
            IssueKind::Truncated => self.truncated += 1,
        }
    }

    /// Total records counted.
    pub fn total(&self) -> usize {
        self.font_scaled + self.truncated
    }
}

/// Counts by kind, overall and grouped by page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueSummary {
    /// Document-wide counts
    pub totals: IssueCounts,
    /// Counts per page index
    pub by_page: BTreeMap<usize, IssueCounts>,
}

/// Serializable end-of-run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueReport {
    /// When the report was produced
    pub generated_at: DateTime<Utc>,
    /// All recorded issues, in recording order
    pub issues: Vec<FormattingIssue>,
    /// Aggregated counts
    pub summary: IssueSummary,
}

/// Append-only collector of formatting issues for one document run.
///
/// Passed explicitly through the pipeline so the engine stays reentrant
/// across documents within one process.
#[derive(Debug, Default)]
pub struct IssueReporter {
    issues: Vec<FormattingIssue>,
}

impl IssueReporter {
    /// Create an empty reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an issue. Records are never deleted or edited afterwards.
    pub fn record(&mut self, issue: FormattingIssue) {
        log::debug!(
            "formatting issue on page {} block {}: {} ({})",
            issue.page_index + 1,
            issue.block_index,
            issue.kind.label(),
            issue.detail
        );
        self.issues.push(issue);
    }

    /// All recorded issues in order.
    pub fn issues(&self) -> &[FormattingIssue] {
        &self.issues
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Aggregate counts by kind, grouped by page.
    pub fn summary(&self) -> IssueSummary {
        let mut summary = IssueSummary::default();
        for issue in &self.issues {
            summary.totals.add(issue.kind);
            summary.by_page.entry(issue.page_index).or_default().add(issue.kind);
        }
        summary
    }

    /// Render a human-readable summary, one warning per issue.
    pub fn to_text(&self) -> String {
        if self.issues.is_empty() {
            return "No formatting issues recorded.".to_string();
        }
        let summary = self.summary();
        let mut out = format!(
            "{} formatting issue(s): {} font scaled, {} truncated\n",
            summary.totals.total(),
            summary.totals.font_scaled,
            summary.totals.truncated
        );
        for issue in &self.issues {
            out.push_str(&format!(
                "  page {}, block {}: {} ({})\n",
                issue.page_index + 1,
                issue.block_index,
                issue.kind.label(),
                issue.detail
            ));
        }
        out
    }

    /// Consume the reporter into a timestamped, serializable report.
    pub fn into_report(self) -> IssueReport {
        let summary = self.summary();
        IssueReport {
            generated_at: Utc::now(),
            issues: self.issues,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_summary() {
        let mut reporter = IssueReporter::new();
        reporter.record(FormattingIssue::font_scaled(0, 1, 0.8));
        reporter.record(FormattingIssue::truncated(0, 2, 42));
        reporter.record(FormattingIssue::truncated(3, 0, 7));

        let summary = reporter.summary();
        assert_eq!(summary.totals.font_scaled, 1);
        assert_eq!(summary.totals.truncated, 2);
        assert_eq!(summary.by_page[&0].total(), 2);
        assert_eq!(summary.by_page[&3].truncated, 1);
    }

    #[test]
    fn test_detail_formats() {
        let issue = FormattingIssue::font_scaled(0, 0, 0.75);
        assert_eq!(issue.detail, "font scaled to 0.75x of original size");

        let issue = FormattingIssue::truncated(0, 0, 120);
        assert_eq!(issue.detail, "120 characters dropped");
    }

    #[test]
    fn test_to_text_empty() {
        let reporter = IssueReporter::new();
        assert_eq!(reporter.to_text(), "No formatting issues recorded.");
    }

    #[test]
    fn test_report_serializes() {
        let mut reporter = IssueReporter::new();
        reporter.record(FormattingIssue::truncated(1, 0, 5));
        let report = reporter.into_report();
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"truncated\""));
        assert!(json.contains("5 characters dropped"));
    }
}
