//! End-to-end tests: files on disk through discovery, linting, and
//! reporting, plus the `vinter` binary itself.

mod common;

use std::fs;
use std::path::Path;
use std::process::Command;

use vinter::report::{self, FileReport, OutputFormat};
use vinter::{Config, Linter, collect_files, lint_file};

fn write(dir: &Path, name: &str, text: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create dirs");
    }
    fs::write(path, text).expect("write file");
}

fn vinter(dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_vinter"))
        .args(args)
        .current_dir(dir)
        .env("HOME", dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("run vinter");
    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
    )
}

#[test]
fn directories_are_walked_for_vim_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "plugin/b.vim", "vim9script\n");
    write(dir.path(), "plugin/a.vim", "vim9script\n");
    write(dir.path(), "autoload/deep/c.vim", "vim9script\n");
    write(dir.path(), "README.md", "# not vim\n");

    let files = collect_files(&[dir.path()]).expect("walk");
    let names: Vec<String> = files
        .iter()
        .map(|p| {
            p.strip_prefix(dir.path())
                .expect("inside tempdir")
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    assert_eq!(names, ["autoload/deep/c.vim", "plugin/a.vim", "plugin/b.vim"]);
}

#[test]
fn explicit_files_are_kept_in_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "z.vim", "vim9script\n");
    write(dir.path(), "notes.txt", "vim9script\n");
    let z = dir.path().join("z.vim");
    let notes = dir.path().join("notes.txt");
    assert_eq!(
        collect_files(&[&z, &notes]).expect("collect"),
        [z, notes]
    );
}

#[test]
fn unreadable_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = lint_file(&Linter::default(), &dir.path().join("missing.vim"))
        .expect_err("missing file");
    assert!(matches!(err, vinter::Error::Io { .. }));
}

#[test]
fn config_ignores_flow_into_reports() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), ".vinter.yml", "ignore_rules:\n  - missing-type-annotation\n");
    write(dir.path(), "plugin.vim", "vim9script\nvar count = 0\ndef F()\nenddef\n");

    let config = Config::discover(dir.path(), None).expect("config");
    let linter = Linter::new(config.ignore_rules);
    let report = lint_file(&linter, &dir.path().join("plugin.vim")).expect("lint");
    let rules: Vec<&str> = report
        .issues
        .iter()
        .filter_map(|i| i.rule.as_deref())
        .collect();
    assert_eq!(rules, ["missing-return-type"]);
}

#[test]
fn text_report_for_mixed_files() {
    let reports = [
        FileReport::new("clean.vim", Linter::default().lint(common::CLEAN_PLUGIN)),
        FileReport::new("legacy.vim", Linter::default().lint("let x = 1\n")),
    ];
    let text = report::render(&reports, OutputFormat::Text).expect("render");
    assert_eq!(
        text,
        format!(
            "No issues found in clean.vim\nFound 1 issues in legacy.vim:\nlegacy.vim:1:1: ERROR: {}\n",
            vinter::DIALECT_MESSAGE
        )
    );
}

#[test]
fn binary_lints_and_sets_exit_code() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "good.vim", common::CLEAN_PLUGIN);
    write(dir.path(), "warn.vim", "vim9script\nvar count = 0\n");
    write(dir.path(), "bad.vim", "let g:x = 1\n");

    let (code, stdout, _) = vinter(dir.path(), &["good.vim"]);
    assert_eq!(code, 0);
    assert_eq!(stdout, "No issues found in good.vim\n");

    let (code, stdout, _) = vinter(dir.path(), &["warn.vim"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("warn.vim:2:1: RULE(missing-type-annotation): Variable count should have a type annotation"));

    let (code, stdout, _) = vinter(dir.path(), &["good.vim", "bad.vim"]);
    assert_eq!(code, 1);
    assert!(stdout.contains("bad.vim:1:1: ERROR: File must start with vim9script declaration."));
}

#[test]
fn binary_json_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "plugin/tools.vim", "vim9script\ndef F(x): void\nenddef\n");

    let (code, stdout, _) = vinter(dir.path(), &["--format", "json", "plugin"]);
    assert_eq!(code, 0);
    let value: serde_json::Value = serde_json::from_str(&stdout).expect("json output");
    let issues = &value[0]["issues"];
    assert_eq!(issues[0]["kind"], "rule");
    assert_eq!(issues[0]["rule"], "missing-param-type");
    assert_eq!(issues[0]["line"], 2);
    assert_eq!(issues[0]["column"], 7);
}

#[test]
fn binary_reads_project_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), ".vinter", "ignore_rules: [no-legacy-function]\n");
    write(dir.path(), "old.vim", "vim9script\nfunction! Old()\nendfunction\n");

    let (code, stdout, _) = vinter(dir.path(), &["old.vim"]);
    assert_eq!(code, 0);
    assert_eq!(stdout, "No issues found in old.vim\n");

    let (_, stdout, _) = vinter(dir.path(), &["--list-rules"]);
    assert!(stdout.contains("no-legacy-function: Legacy function syntax is not supported in vim9script-only mode (ignored)"));
}

#[test]
fn binary_usage_and_config_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (code, _, stderr) = vinter(dir.path(), &[]);
    assert_eq!(code, 2);
    assert!(stderr.contains("Usage"));

    let (code, _, stderr) = vinter(dir.path(), &["--config", "absent.yml", "x.vim"]);
    assert_eq!(code, 2);
    assert!(stderr.contains("absent.yml"));

    write(dir.path(), "broken.yml", "ignore_rules: [oops\n");
    let (code, _, _) = vinter(dir.path(), &["--config", "broken.yml", "x.vim"]);
    assert_eq!(code, 2);
}

#[test]
fn binary_missing_file_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (code, _, stderr) = vinter(dir.path(), &["nope.vim"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("nope.vim"));
}

#[test]
fn binary_prints_ast() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "a.vim", "vim9script\nvar n: number = 1\n");
    let (code, stdout, _) = vinter(dir.path(), &["--print-ast", "a.vim"]);
    assert_eq!(code, 0);
    assert!(stdout.starts_with("a.vim:\nprogram @1:1\n"));
    assert!(stdout.contains("  variable_declaration var n: number @2:1\n"));
}
