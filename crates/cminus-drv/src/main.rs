//! `cminus` CLI: lex, parse, and generate code for one C-minus source file,
//! writing the seven output files of §6 into an output directory.
//!
//! Flag shape grounded on `faxt`'s `clap` derive `Cli` (short/long flags,
//! `#[command(version = env!("CARGO_PKG_VERSION"))]`); logging grounded on
//! `fgc`'s bare `log::` macro usage rather than `faxt`'s `tracing`, matching
//! the ambient-stack choice recorded in `DESIGN.md`. `main` wraps the I/O
//! failures `compile` surfaces in `anyhow::Context` rather than matching
//! `DriverError` by hand, the same division the teacher's own `faxc-drv`
//! declares an `anyhow` dependency for (a library-level `thiserror` enum,
//! a binary-level `anyhow::Result` at the outermost edge).

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use cminus_drv::{compile, Config};

/// Compile a C-minus source file.
#[derive(Parser, Debug)]
#[command(name = "cminus")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A C-minus compiler front end", long_about = None)]
struct Cli {
    /// Input source file
    #[arg(short, long, default_value = "input.txt")]
    input: PathBuf,

    /// Directory the seven output files are written to
    #[arg(short, long, default_value = ".")]
    output_directory: PathBuf,

    /// Enable verbose (debug-level) logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let input_display = cli.input.display().to_string();
    let config = Config { input: cli.input, output_dir: cli.output_directory };

    let summary = compile(&config).with_context(|| format!("compiling {input_display}"))?;

    if summary.has_errors() {
        log::warn!(
            "compilation finished with errors ({} lexical, {} syntax, {} semantic)",
            summary.lexical_errors,
            summary.syntax_errors,
            summary.semantic_errors
        );
    } else {
        log::info!("compilation finished with no errors");
    }
    Ok(())
}
