//! lpfront command line interface
//!
//! Usage:
//!   lpfront [OPTIONS] <input-file>
//!   lpfront --help
//!
//! Examples:
//!   lpfront program.lp                       # Compile, print solver matrices
//!   lpfront --emit=ast program.lp            # Just parse and dump the AST
//!   lpfront --emit=canonical program.lp      # Show the normalized program
//!   lpfront --solver=./simplex_solver program.lp --emit=solve

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};
use lpfront::solver::SubprocessSolver;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// lpfront - compiles LP programs to simplex solver input
#[derive(Parser, Debug)]
#[command(name = "lpfront")]
#[command(version)]
#[command(about = "Compiles a small LP language to simplex solver matrices", long_about = None)]
struct Cli {
    /// Input file (.lp format)
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// What to emit
    #[arg(long, default_value = "matrix")]
    emit: EmitKind,

    /// Path to the simplex solver binary (required for --emit=solve)
    #[arg(long, value_name = "PATH")]
    solver: Option<PathBuf>,

    /// Timeout for the solver subprocess, in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (suppress warnings)
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EmitKind {
    /// Token stream
    Tokens,
    /// Abstract syntax tree
    Ast,
    /// Normalized (canonical) program
    Canonical,
    /// Solver wire-format matrices
    Matrix,
    /// Run the solver and print the JSON response
    Solve,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        log::LevelFilter::Error
    } else {
        match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    info!("lpfront v{}", lpfront::VERSION);
    debug!("input file: {:?}", cli.input);

    let source = fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read input file: {:?}", cli.input))?;

    let output = match cli.emit {
        EmitKind::Tokens => {
            let tokens = lpfront::frontend::tokenize(&source)?;
            tokens
                .iter()
                .map(|t| format!("{:>4}  {}", t.line, t))
                .collect::<Vec<_>>()
                .join("\n")
        }
        EmitKind::Ast => {
            let program = lpfront::frontend::parse(&source)?;
            format!("{:#?}", program)
        }
        EmitKind::Canonical => {
            let (program, _) = lpfront::frontend::parse_and_check(&source)?;
            program.to_string()
        }
        EmitKind::Matrix => {
            let compiled = lpfront::compile(&source)?;
            compiled.standard_form.to_solver_input()?
        }
        EmitKind::Solve => {
            let binary = match cli.solver {
                Some(ref path) => path,
                None => bail!("--emit=solve requires --solver=<path>"),
            };
            let solver = SubprocessSolver::new(binary)
                .with_timeout(Duration::from_secs(cli.timeout));
            let response = lpfront::solve(&source, &solver)?;
            serde_json::to_string_pretty(&response)?
        }
    };

    write_output(&cli.output, &output)
}

fn write_output(path: &Option<PathBuf>, content: &str) -> Result<()> {
    match path {
        Some(p) => {
            fs::write(p, content)
                .with_context(|| format!("Failed to write output file: {:?}", p))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
