use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::ast::Node;
use crate::lexer::tokenize;
use crate::parser::{Diagnostic, parse};
use crate::rules;
use crate::token::Span;

/// Reported, alone, for source that is not written in Vim9 script.
pub const DIALECT_MESSAGE: &str =
    "File must start with vim9script declaration. Only vim9script files are supported.";

/// One problem a rule found in a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub message: String,
    pub span: Span,
}

impl Finding {
    #[must_use]
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// A structural check over a parsed program.
///
/// Rules receive the `Program` root and usually look for nodes with
/// [`Node::collect`] or [`Node::walk`].
pub trait Rule: Send + Sync {
    /// Stable identifier, used in reports and ignore lists.
    fn id(&self) -> &str;

    fn description(&self) -> &str;

    fn check(&self, program: &Node) -> Vec<Finding>;
}

/// A [`Rule`] built from a closure.
pub struct FnRule<F> {
    id: String,
    description: String,
    check: F,
}

impl<F> FnRule<F>
where
    F: Fn(&Node) -> Vec<Finding> + Send + Sync,
{
    #[must_use]
    pub fn new(id: impl Into<String>, description: impl Into<String>, check: F) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            check,
        }
    }
}

impl<F> Rule for FnRule<F>
where
    F: Fn(&Node) -> Vec<Finding> + Send + Sync,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn check(&self, program: &Node) -> Vec<Finding> {
        (self.check)(program)
    }
}

/// Where an [`Issue`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Error,
    Warning,
    Rule,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Rule => write!(f, "rule"),
        }
    }
}

/// A located problem in linted source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    /// Id of the rule that reported it; only set for `Rule` issues.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl Issue {
    fn from_diagnostic(kind: IssueKind, diagnostic: &Diagnostic) -> Self {
        Self {
            kind,
            rule: None,
            message: diagnostic.message(),
            line: diagnostic.span.line,
            column: diagnostic.span.column,
        }
    }

    fn from_finding(rule: &str, finding: Finding) -> Self {
        Self {
            kind: IssueKind::Rule,
            rule: Some(rule.to_string()),
            message: finding.message,
            line: finding.span.line,
            column: finding.span.column,
        }
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.kind, IssueKind::Error)
    }
}

/// Scan state for the dialect check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    /// Only blank and comment lines seen so far.
    Preamble,
    Accepted,
    /// The first substantive line, or 1 when there is none.
    Rejected(u32),
}

impl Gate {
    fn step(self, line_number: u32, line: &str) -> Self {
        if self != Self::Preamble {
            return self;
        }
        let text = line.trim_start_matches('\u{feff}').trim();
        if text.is_empty() || text.starts_with('#') || text.starts_with('"') {
            return self;
        }
        if text.split_whitespace().next() == Some("vim9script") {
            Self::Accepted
        } else {
            Self::Rejected(line_number)
        }
    }
}

fn check_dialect(source: &str) -> Gate {
    let mut gate = Gate::Preamble;
    for (line_number, line) in (1..).zip(source.lines()) {
        gate = gate.step(line_number, line);
        if gate != Gate::Preamble {
            break;
        }
    }
    match gate {
        Gate::Preamble => Gate::Rejected(1),
        decided => decided,
    }
}

/// Runs the parser and every registered rule over Vim9 script source.
pub struct Linter {
    rules: Vec<Box<dyn Rule>>,
    ignored: HashSet<String>,
}

impl Linter {
    /// A linter with the default rules, skipping the rules in `ignored`.
    #[must_use]
    pub fn new<I, S>(ignored: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rules: rules::default_rules(),
            ignored: ignored.into_iter().map(Into::into).collect(),
        }
    }

    pub fn register_rule(&mut self, rule: impl Rule + 'static) {
        self.rules.push(Box::new(rule));
    }

    /// Registered rules, in run order, ignored ones included.
    #[must_use]
    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(AsRef::as_ref)
    }

    #[must_use]
    pub fn is_ignored(&self, id: &str) -> bool {
        self.ignored.contains(id)
    }

    /// Lint `source`: parse errors, then parse warnings, then rule
    /// findings in rule registration order.
    ///
    /// Source whose first substantive line is not `vim9script` yields a
    /// single error and nothing else.
    #[must_use]
    pub fn lint(&self, source: &str) -> Vec<Issue> {
        let gate = check_dialect(source);
        tracing::trace!(?gate, "dialect gate");
        if let Gate::Rejected(line) = gate {
            return vec![Issue {
                kind: IssueKind::Error,
                rule: None,
                message: DIALECT_MESSAGE.to_string(),
                line,
                column: 1,
            }];
        }

        let parsed = parse(tokenize(source));
        let mut issues: Vec<Issue> = parsed
            .errors
            .iter()
            .map(|d| Issue::from_diagnostic(IssueKind::Error, d))
            .chain(
                parsed
                    .warnings
                    .iter()
                    .map(|d| Issue::from_diagnostic(IssueKind::Warning, d)),
            )
            .collect();

        for rule in &self.rules {
            if self.is_ignored(rule.id()) {
                tracing::trace!(rule = rule.id(), "rule ignored");
                continue;
            }
            let findings = rule.check(&parsed.program);
            tracing::debug!(rule = rule.id(), findings = findings.len(), "rule checked");
            issues.extend(
                findings
                    .into_iter()
                    .map(|f| Issue::from_finding(rule.id(), f)),
            );
        }

        tracing::debug!(
            errors = parsed.errors.len(),
            warnings = parsed.warnings.len(),
            issues = issues.len(),
            "lint finished"
        );
        issues
    }
}

impl Default for Linter {
    fn default() -> Self {
        Self::new(std::iter::empty::<String>())
    }
}

impl fmt::Debug for Linter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Linter")
            .field("rules", &self.rules.iter().map(|r| r.id()).collect::<Vec<_>>())
            .field("ignored", &self.ignored)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;

    #[test]
    fn gate_skips_blank_and_comment_lines() {
        assert_eq!(
            check_dialect("\n# header\n\" legacy header\n  vim9script\n"),
            Gate::Accepted
        );
    }

    #[test]
    fn gate_rejects_at_first_statement() {
        assert_eq!(check_dialect("\n\nlet x = 1\nvim9script"), Gate::Rejected(3));
    }

    #[test]
    fn gate_rejects_empty_source_at_line_one() {
        assert_eq!(check_dialect(""), Gate::Rejected(1));
        assert_eq!(check_dialect("# only a comment\n"), Gate::Rejected(1));
    }

    #[test]
    fn gate_needs_the_whole_word() {
        assert_eq!(check_dialect("vim9scripts"), Gate::Rejected(1));
        assert_eq!(check_dialect("vim9script noclear"), Gate::Accepted);
    }

    #[test]
    fn rejected_source_gets_single_error() {
        let issues = Linter::default().lint("function! Foo()\nendfunction");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::Error);
        assert_eq!(issues[0].message, DIALECT_MESSAGE);
        assert_eq!((issues[0].line, issues[0].column), (1, 1));
    }

    #[test]
    fn custom_rule_runs_after_defaults() {
        let mut linter = Linter::default();
        linter.register_rule(FnRule::new("no-echo", "Disallow echo", |program: &Node| {
            program
                .collect(|n| matches!(n.kind, NodeKind::Echo { .. }))
                .into_iter()
                .map(|n| Finding::new("echo found", n.span))
                .collect()
        }));
        let issues = linter.lint("vim9script\necho 'hi'");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].rule.as_deref(), Some("no-echo"));
        assert_eq!(issues[0].line, 2);
        assert_eq!(linter.rules().last().map(Rule::id), Some("no-echo"));
    }

    #[test]
    fn ignored_rules_do_not_run() {
        let source = "vim9script\nvar x = 1";
        assert_eq!(Linter::default().lint(source).len(), 1);
        assert!(Linter::new(["missing-type-annotation"]).lint(source).is_empty());
    }

    #[test]
    fn parse_errors_precede_warnings() {
        let issues = Linter::default().lint("vim9script\n)\nvar x: number = (");
        assert_eq!(issues[0].kind, IssueKind::Error);
        assert!(issues.iter().any(|i| i.kind == IssueKind::Warning));
    }

    #[test]
    fn issue_json_shape() {
        let issue = Issue {
            kind: IssueKind::Rule,
            rule: Some("missing-return-type".to_string()),
            message: "Function F should have a return type annotation".to_string(),
            line: 3,
            column: 1,
        };
        let json = serde_json::to_value(&issue).expect("serialize");
        assert_eq!(json["kind"], "rule");
        assert_eq!(json["rule"], "missing-return-type");
        assert_eq!(json["line"], 3);
    }

    #[test]
    fn linter_is_shareable() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<Linter>();
    }
}
