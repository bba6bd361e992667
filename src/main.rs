use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use keel::config::Config;
use keel::diagnostics::{self, CompileError};
use keel::Checked;

#[derive(Parser)]
#[command(name = "keelc", version, about = "The Keel type checker and interpreter")]
struct Cli {
    /// Path to a keel.toml (default: discovered next to the source file)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a .keel source file and report errors and warnings
    Check {
        file: PathBuf,
        /// Print findings as JSON instead of rendered reports
        #[arg(long)]
        json: bool,
    },
    /// Analyze and then evaluate a .keel source file
    Run {
        file: PathBuf,
    },
    /// Print the type of every top-level declaration
    Types {
        file: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_max_level(level)
        .init();
}

struct Loaded {
    source: String,
    checked: Checked,
    config: Config,
}

/// Read, configure and analyze `file`, rendering any hard error.
fn load(file: &Path, config_path: Option<&Path>) -> Result<Loaded, ExitCode> {
    let source = std::fs::read_to_string(file).map_err(|e| {
        fail(file, "", &CompileError::io(format!("failed to read '{}': {e}", file.display())))
    })?;
    let config = match config_path {
        Some(path) => Config::load(path),
        None => Config::discover(file.parent().unwrap_or(Path::new("."))),
    }
    .map_err(|err| fail(file, &source, &err))?;
    let checked = keel::check_source(&source, &config).map_err(|err| fail(file, &source, &err))?;
    Ok(Loaded { source, checked, config })
}

/// Whether the findings should fail the command.
fn failed(checked: &Checked, config: &Config) -> bool {
    checked.findings.is_erroneous() || (config.deny_warnings && !checked.findings.warnings.is_empty())
}

fn fail(file: &Path, source: &str, err: &CompileError) -> ExitCode {
    diagnostics::render_error(source, &file.to_string_lossy(), err);
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Check { file, json } => {
            let Loaded { source, checked, config } = match load(&file, cli.config.as_deref()) {
                Ok(loaded) => loaded,
                Err(code) => return code,
            };
            if json {
                match serde_json::to_string_pretty(&checked.findings) {
                    Ok(text) => println!("{text}"),
                    Err(e) => {
                        eprintln!("error: failed to serialize findings: {e}");
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                diagnostics::render_findings(&source, &checked.findings);
            }
            if failed(&checked, &config) {
                return ExitCode::FAILURE;
            }
            if !json {
                eprintln!("{}: ok", file.display());
            }
        }
        Commands::Run { file } => {
            let Loaded { source, checked, config } = match load(&file, cli.config.as_deref()) {
                Ok(loaded) => loaded,
                Err(code) => return code,
            };
            diagnostics::render_findings(&source, &checked.findings);
            if failed(&checked, &config) {
                return ExitCode::FAILURE;
            }
            let stdout = std::io::stdout().lock();
            if let Err(err) = keel::run_checked(&checked, stdout) {
                return fail(&file, &source, &err);
            }
        }
        Commands::Types { file } => {
            let Loaded { source, checked, .. } = match load(&file, cli.config.as_deref()) {
                Ok(loaded) => loaded,
                Err(code) => return code,
            };
            if checked.findings.is_erroneous() {
                diagnostics::render_findings(&source, &checked.findings);
                return ExitCode::FAILURE;
            }
            for line in keel::describe_declarations(&checked) {
                println!("{line}");
            }
        }
    }
    ExitCode::SUCCESS
}
