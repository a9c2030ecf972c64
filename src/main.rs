//! Command-line linter for Vim9 script files.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use vinter::report::{self, FileReport, OutputFormat};
use vinter::{Config, Linter};

/// Lint Vim9 script files
#[derive(Debug, Parser)]
#[command(name = "vinter")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Files or directories to lint; directories are searched for *.vim files
    paths: Vec<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Configuration file (default: .vinter.yaml, .vinter.yml or .vinter, then ~/.vinter)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the syntax tree of each file instead of linting it
    #[arg(long)]
    print_ast: bool,

    /// List the available rules and exit
    #[arg(long)]
    list_rules: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(directive_for_verbosity(cli.verbose))),
        )
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };
    let linter = Linter::new(config.ignore_rules);

    if cli.list_rules {
        for rule in linter.rules() {
            let note = if linter.is_ignored(rule.id()) {
                " (ignored)"
            } else {
                ""
            };
            println!("{}: {}{note}", rule.id(), rule.description());
        }
        return ExitCode::SUCCESS;
    }

    if cli.paths.is_empty() {
        eprintln!("Usage: vinter [OPTIONS] <PATHS>...");
        return ExitCode::from(2);
    }

    let files = match vinter::collect_files(&cli.paths) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.print_ast {
        return print_ast(&files);
    }

    let mut failed = false;
    let mut reports = Vec::new();
    for path in &files {
        match vinter::lint_file(&linter, path) {
            Ok(report) => {
                failed |= report.has_errors();
                reports.push(report);
            }
            Err(e) => {
                eprintln!("{e}");
                failed = true;
            }
        }
    }

    if let Err(e) = emit(&reports, cli.format) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn load_config(explicit: Option<&Path>) -> Result<Config, vinter::Error> {
    if let Some(path) = explicit {
        return Ok(Config::load(path)?);
    }
    let cwd = std::env::current_dir().map_err(|source| vinter::Error::Io {
        path: PathBuf::from("."),
        source,
    })?;
    let home = std::env::var_os("HOME").map(PathBuf::from);
    Ok(Config::discover(&cwd, home.as_deref())?)
}

fn print_ast(files: &[PathBuf]) -> ExitCode {
    let mut failed = false;
    for path in files {
        match std::fs::read_to_string(path) {
            Ok(source) => {
                let parsed = vinter::parse(vinter::tokenize(&source));
                println!("{}:", path.display());
                print!("{}", vinter::print_tree(&parsed.program));
            }
            Err(e) => {
                eprintln!("{}: {e}", path.display());
                failed = true;
            }
        }
    }
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn emit(reports: &[FileReport], format: OutputFormat) -> std::io::Result<()> {
    let rendered = report::render(reports, format)?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush()
}

fn directive_for_verbosity(v: u8) -> &'static str {
    match v {
        0 => "vinter=info",
        1 => "vinter=debug",
        _ => "vinter=trace",
    }
}
