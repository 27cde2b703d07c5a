//! `naturec` — the NatureLang compiler driver.
//!
//! Pipeline: source → lex → parse → semantic analysis → TAC → optimize →
//! C output. `check` stops after analysis; `build` runs the whole thing
//! and writes the generated `.c` next to the input (or to `-o`).

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser as ClapParser, Subcommand};
use owo_colors::OwoColorize;

use naturec_codegen::CodegenOptions;
use naturec_lexer::Lexer;
use naturec_parser::Parser;
use naturec_sema::{Analyzer, SemanticResult};
use naturec_syntax::{Program, Severity};

#[derive(ClapParser)]
#[command(name = "naturec", version, about = "NatureLang compiler")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a NatureLang source file to C
    Build {
        /// Input file (.nl)
        file: PathBuf,

        /// Output file name (defaults to <input stem>.c)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Optimization level (0, 1, 2)
        #[arg(short = 'O', long = "optimize", default_value_t = 1)]
        optimize: u8,

        /// Dump the optimized TAC IR to stdout
        #[arg(long)]
        emit_ir: bool,

        /// Print optimization statistics as JSON
        #[arg(long)]
        stats: bool,

        /// Include TAC comments in the generated C
        #[arg(long)]
        comments: bool,

        /// Verbose stage-by-stage output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Parse and type-check only (no code output)
    Check {
        /// Input file (.nl)
        file: PathBuf,

        /// Verbose stage-by-stage output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Command::Build {
            file,
            output,
            optimize,
            emit_ir,
            stats,
            comments,
            verbose,
        } => build(
            &file, output, optimize, emit_ir, stats, comments, verbose,
        ),
        Command::Check { file, verbose } => check(&file, verbose),
    }
}

fn render_error(kind: &str, source: &str, msg: &str, line: Option<usize>, col: Option<usize>) {
    eprintln!("{}: {}", kind.red().bold(), msg.red());
    if let (Some(line), Some(col)) = (line, col) {
        if let Some(src_line) = source.lines().nth(line.saturating_sub(1)) {
            eprintln!("  {}", src_line.bright_black());
            let mut marker = String::new();
            if col > 1 {
                marker.push_str(&" ".repeat(col - 1));
            }
            marker.push('^');
            eprintln!("  {}", marker.red());
        } else {
            eprintln!("  at {}:{}", line, col);
        }
    }
}

fn render_diagnostics(source: &str, result: &SemanticResult) {
    for diag in &result.diagnostics {
        match diag.severity {
            Severity::Error => render_error(
                "Semantic error",
                source,
                &diag.msg,
                Some(diag.loc.line),
                Some(diag.loc.col),
            ),
            Severity::Warning => {
                eprintln!("{}: {}", "Warning".yellow().bold(), diag.msg);
                eprintln!("  at {}:{}", diag.loc.line, diag.loc.col);
            }
        }
    }
}

fn read_source(path: &Path) -> Result<String, ExitCode> {
    if !path.exists() {
        eprintln!(
            "{}: {}",
            "error".red().bold(),
            format!("File not found: {}", path.display()).red()
        );
        return Err(ExitCode::FAILURE);
    }
    fs::read_to_string(path).map_err(|e| {
        eprintln!(
            "{}: {}",
            "error".red().bold(),
            format!("Failed to read {}: {}", path.display(), e).red()
        );
        ExitCode::FAILURE
    })
}

/// Lex + parse + analyze. On success returns the annotated program and the
/// analysis result; rendering of any diagnostics has already happened.
fn front(source: &str, verbose: bool) -> Result<(Program, SemanticResult), ExitCode> {
    if verbose {
        eprintln!("[1/4] Parsing...");
    }
    let tokens = match Lexer::new(source).tokenize() {
        Ok(t) => t,
        Err(e) => {
            render_error("Lex error", source, &e.msg, e.line, e.col);
            return Err(ExitCode::FAILURE);
        }
    };
    let mut program = match Parser::new(tokens).parse_program() {
        Ok(p) => p,
        Err(e) => {
            render_error("Parse error", source, &e.msg, e.line, e.col);
            return Err(ExitCode::FAILURE);
        }
    };

    if verbose {
        eprintln!("[2/4] Analyzing...");
    }
    let result = Analyzer::new().analyze(&mut program);
    render_diagnostics(source, &result);
    Ok((program, result))
}

fn check(file: &Path, verbose: bool) -> ExitCode {
    let source = match read_source(file) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let (program, result) = match front(&source, verbose) {
        Ok(v) => v,
        Err(code) => return code,
    };
    if !result.success {
        eprintln!(
            "{} error(s), {} warning(s)",
            result.error_count, result.warning_count
        );
        return ExitCode::FAILURE;
    }
    eprintln!(
        "OK: {} checked successfully ({} statements, {} warning(s))",
        file.display(),
        program.statements.len(),
        result.warning_count
    );
    ExitCode::SUCCESS
}

fn build(
    file: &Path,
    output: Option<PathBuf>,
    optimize: u8,
    emit_ir: bool,
    stats: bool,
    comments: bool,
    verbose: bool,
) -> ExitCode {
    let source = match read_source(file) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let (program, result) = match front(&source, verbose) {
        Ok(v) => v,
        Err(code) => return code,
    };
    // never generate code from a program with semantic errors
    if !result.success {
        eprintln!(
            "{} error(s), {} warning(s)",
            result.error_count, result.warning_count
        );
        return ExitCode::FAILURE;
    }

    if verbose {
        eprintln!("[3/4] Generating and optimizing IR (O{})...", optimize);
    }
    let mut tac = naturec_irgen::lower(&program);
    let level = naturec_opt::OptLevel::from_u8(optimize);
    let mut options = naturec_opt::OptOptions::for_level(level);
    options.verbose = verbose;
    let opt_stats = naturec_opt::optimize(&mut tac, &options);
    if verbose && opt_stats.total_instructions_before > 0 {
        let eliminated =
            opt_stats.total_instructions_before - opt_stats.total_instructions_after;
        eprintln!(
            "      {} instruction(s) eliminated ({:.1}% reduction)",
            eliminated,
            100.0 * eliminated as f64 / opt_stats.total_instructions_before as f64
        );
    }

    if emit_ir {
        println!("{}", tac);
    }
    if stats {
        match serde_json::to_string_pretty(&opt_stats) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("{}: {}", "error".red().bold(), e),
        }
    }

    if verbose {
        eprintln!("[4/4] Generating C code...");
    }
    let codegen_options = CodegenOptions {
        emit_comments: comments,
        ..Default::default()
    };
    let code = naturec_codegen::generate(&tac, &codegen_options);

    let out_path = output.unwrap_or_else(|| file.with_extension("c"));
    if let Err(e) = fs::write(&out_path, &code) {
        eprintln!(
            "{}: {}",
            "error".red().bold(),
            format!("Failed to write {}: {}", out_path.display(), e).red()
        );
        return ExitCode::FAILURE;
    }
    eprintln!("Generated: {}", out_path.display());
    ExitCode::SUCCESS
}
