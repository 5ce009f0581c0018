//! IFJ20 Compiler CLI
//!
//! Main entry point for the `ifjc` command.

use clap::Parser;
use ifjc::{CompileError, SourceFile};
use miette::IntoDiagnostic;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "ifjc")]
#[command(author = "IFJ20 compiler team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compile IFJ20 source to IFJcode20", long_about = None)]
struct Cli {
    /// Input file; standard input when omitted or `-`
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file; standard output when omitted
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Emit an intermediate form instead of IFJcode20
    #[arg(long, value_enum)]
    emit: Option<EmitType>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum EmitType {
    /// Token stream (JSON)
    Tokens,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing; logs go to stderr so stdout stays program output
    let default = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let source = match read_input(cli.input.as_deref()) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("{err:?}");
            return exit_code(&CompileError::internal(err.to_string()));
        }
    };

    let result = match cli.emit {
        Some(EmitType::Tokens) => ifjc::tokens(&source.content).and_then(|tokens| {
            serde_json::to_string_pretty(&tokens)
                .map(|json| json + "\n")
                .map_err(|e| CompileError::internal(e.to_string()))
        }),
        None => ifjc::compile(&source.content),
    };

    match result {
        Ok(text) => match write_output(cli.output.as_deref(), &text) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("{err:?}");
                exit_code(&CompileError::internal(err.to_string()))
            }
        },
        Err(err) => {
            tracing::debug!(code = err.exit_code(), "compilation failed");
            let code = exit_code(&err);
            eprintln!("{:?}", source.report(err));
            code
        }
    }
}

fn exit_code(err: &CompileError) -> ExitCode {
    ExitCode::from(err.exit_code() as u8)
}

fn read_input(path: Option<&Path>) -> miette::Result<SourceFile> {
    match path {
        Some(path) if path != Path::new("-") => {
            tracing::info!("Reading {}", path.display());
            let content = std::fs::read_to_string(path).into_diagnostic()?;
            Ok(SourceFile::new(path.display().to_string(), content))
        }
        _ => {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .into_diagnostic()?;
            Ok(SourceFile::new("<stdin>", content))
        }
    }
}

/// Nothing is written unless compilation succeeded
fn write_output(path: Option<&Path>, text: &str) -> miette::Result<()> {
    match path {
        Some(path) => std::fs::write(path, text).into_diagnostic(),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes()).into_diagnostic()?;
            stdout.flush().into_diagnostic()
        }
    }
}
