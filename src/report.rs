//! Rendering lint results for people and for tools.

use std::fmt::Write as _;

use serde::Serialize;

use crate::linter::{Issue, IssueKind};

/// Output format for lint results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// `path:line:column: KIND: message` lines.
    #[default]
    Text,
    /// A JSON array with one object per file.
    Json,
}

/// Issues found in one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: String,
    pub issues: Vec<Issue>,
}

impl FileReport {
    #[must_use]
    pub fn new(path: impl Into<String>, issues: Vec<Issue>) -> Self {
        Self {
            path: path.into(),
            issues,
        }
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(Issue::is_error)
    }
}

fn label(issue: &Issue) -> String {
    match issue.kind {
        IssueKind::Error => "ERROR".to_string(),
        IssueKind::Warning => "WARNING".to_string(),
        IssueKind::Rule => format!("RULE({})", issue.rule.as_deref().unwrap_or_default()),
    }
}

/// Text report for one file, newline terminated.
#[must_use]
pub fn text(report: &FileReport) -> String {
    let path = &report.path;
    if report.issues.is_empty() {
        return format!("No issues found in {path}\n");
    }
    let mut out = format!("Found {} issues in {path}:\n", report.issues.len());
    for issue in &report.issues {
        let _ = writeln!(
            out,
            "{path}:{}:{}: {}: {}",
            issue.line,
            issue.column,
            label(issue),
            issue.message
        );
    }
    out
}

/// All reports as one pretty-printed JSON array.
pub fn json(reports: &[FileReport]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(reports)
}

/// Render `reports` in `format`.
pub fn render(reports: &[FileReport], format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Text => Ok(reports.iter().map(text).collect()),
        OutputFormat::Json => json(reports).map(|mut s| {
            s.push('\n');
            s
        }),
    }
}
