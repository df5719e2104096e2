//! Compiler driver for C-minus (§5, §6): orchestrates one source file
//! through the lexer and the syntax-directed code generator, then writes
//! the seven output files.
//!
//! Grounded on `faxc-drv`'s `Config`/`Session` shape (read the source,
//! run the pipeline, emit output), but the pipeline itself collapses to a
//! single lex+parse+codegen pass — C-minus has no separate HIR/MIR/LIR
//! stages, optimization levels, or cross compilation to orchestrate
//! (§1 Non-goals). `DriverError` uses `thiserror` rather than `faxc-drv`'s
//! hand-written `Display`/`Error` impl on `CompileError`, matching the
//! ambient-stack choice recorded in `DESIGN.md`.

pub mod output;

use std::fs;
use std::path::PathBuf;

use cminus_lex::Scanner;
use cminus_par::{CodeGenerator, CodegenConfig, Parser};
use cminus_util::{Handler, Interner};

/// One invocation's configuration: the input file and the directory the
/// seven output files land in.
#[derive(Debug, Clone)]
pub struct Config {
    pub input: PathBuf,
    pub output_dir: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("failed to read input file {path}: {source}")]
    ReadInput { path: PathBuf, #[source] source: std::io::Error },
    #[error("failed to create output directory {path}: {source}")]
    CreateOutputDir { path: PathBuf, #[source] source: std::io::Error },
    #[error("failed to write {path}: {source}")]
    WriteOutput { path: PathBuf, #[source] source: std::io::Error },
}

/// Diagnostic counts from one compilation, so `main` can choose an exit
/// code without re-reading the written files.
#[derive(Debug, Default, Clone, Copy)]
pub struct CompileSummary {
    pub lexical_errors: usize,
    pub syntax_errors: usize,
    pub semantic_errors: usize,
}

impl CompileSummary {
    pub fn has_errors(&self) -> bool {
        self.lexical_errors > 0 || self.syntax_errors > 0 || self.semantic_errors > 0
    }
}

/// Runs `config.input` through the whole pipeline and writes the seven
/// output files into `config.output_dir`. A malformed C-minus program
/// never fails this call — lexical, syntactic, and semantic errors are
/// each their own non-fatal taxonomy (§7) reported in the output files.
/// Only I/O failures (unreadable input, a directory that cannot be
/// created or written to) surface as `Err`.
pub fn compile(config: &Config) -> Result<CompileSummary, DriverError> {
    log::info!("compiling {}", config.input.display());
    let source = fs::read_to_string(&config.input)
        .map_err(|source| DriverError::ReadInput { path: config.input.clone(), source })?;

    fs::create_dir_all(&config.output_dir)
        .map_err(|source| DriverError::CreateOutputDir { path: config.output_dir.clone(), source })?;

    let arena = bumpalo::Bump::new();
    let mut interner = Interner::new(&arena);

    // `output`/`main` need stable lexeme-table handles before the scanner
    // ever runs (`CodeGenerator::new`/`Parser::new` both take one as a
    // constructor argument) — the same pre-registration the scanner
    // already does for the nine reserved words, just two entries earlier.
    let output_symbol = interner.intern("output");
    let main_symbol = interner.intern("main");

    let lexical = Handler::new();
    let scanner = Scanner::new(&source, &lexical, interner);

    log::debug!("parsing and generating code");
    let codegen = CodeGenerator::new(CodegenConfig::default(), output_symbol);
    let mut parser = Parser::new(scanner, codegen, main_symbol);
    let tree = parser.parse();

    let summary = CompileSummary {
        lexical_errors: lexical.count(),
        syntax_errors: parser.syntax_errors().count(),
        semantic_errors: parser.codegen().semantic_errors().count(),
    };

    log::debug!(
        "writing output files to {} ({} lexical, {} syntax, {} semantic)",
        config.output_dir.display(),
        summary.lexical_errors,
        summary.syntax_errors,
        summary.semantic_errors
    );

    output::write_all(&config.output_dir, &tree, parser.interner(), &lexical, &parser)
        .map_err(|(path, source)| DriverError::WriteOutput { path, source })?;

    Ok(summary)
}
