//! Lexer, parser, and linter for Vim9 script.
//!
//! Source is tokenized, parsed into a syntax tree that survives syntax
//! errors, and checked by a set of rules. Files that do not declare
//! `vim9script` before their first statement are rejected outright.
//!
//! # Quick start
//!
//! ```
//! use vinter::{IssueKind, Linter};
//!
//! let linter = Linter::default();
//! let issues = linter.lint("vim9script\nvar count = 0\n");
//! assert_eq!(issues.len(), 1);
//! assert_eq!(issues[0].kind, IssueKind::Rule);
//! assert_eq!(issues[0].rule.as_deref(), Some("missing-type-annotation"));
//! ```
//!
//! ## Inspect the tree
//!
//! ```
//! use vinter::{NodeKind, parse, tokenize};
//!
//! let parsed = parse(tokenize("vim9script\ndef Add(a: number): number\n  return a + 1\nenddef\n"));
//! assert!(parsed.is_clean());
//! assert!(matches!(parsed.program.body()[1].kind, NodeKind::DefFunction { .. }));
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::too_many_lines
)]

pub mod ast;
pub mod builtins;
pub mod config;
pub mod lexer;
pub mod linter;
pub mod parser;
pub mod printer;
pub mod report;
pub mod rules;
pub mod token;

use std::fs;
use std::path::{Path, PathBuf};

pub use ast::{Node, NodeKind};
pub use config::{Config, ConfigError};
pub use lexer::tokenize;
pub use linter::{DIALECT_MESSAGE, Finding, FnRule, Issue, IssueKind, Linter, Rule};
pub use parser::{Diagnostic, DiagnosticKind, Parse, parse};
pub use printer::print_tree;
pub use report::{FileReport, OutputFormat};
pub use token::{Span, Token, TokenKind};

/// Errors from reading configuration and source files.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Walk(#[from] walkdir::Error),
}

/// Read and lint one file.
pub fn lint_file(linter: &Linter, path: &Path) -> Result<FileReport, Error> {
    let source = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = source.len(), "linting");
    Ok(FileReport::new(
        path.display().to_string(),
        linter.lint(&source),
    ))
}

/// Expand `paths` into the files to lint: files are kept as given,
/// directories contribute every `*.vim` file below them, sorted.
pub fn collect_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<PathBuf>, Error> {
    let mut files = Vec::new();
    for path in paths {
        let path = path.as_ref();
        if !path.is_dir() {
            files.push(path.to_path_buf());
            continue;
        }
        let mut found = Vec::new();
        for entry in walkdir::WalkDir::new(path) {
            let entry = entry?;
            if entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "vim")
            {
                found.push(entry.into_path());
            }
        }
        found.sort();
        files.extend(found);
    }
    Ok(files)
}
