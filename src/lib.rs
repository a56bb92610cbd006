//! SRC Compiler Library
//!
//! Compiles SRC source to a standalone executable by generating C and
//! handing it to a system C compiler. [`compile_file`] is the one-shot
//! entry point; [`compile_file_with_config`] exposes the knobs in
//! [`CompilerConfig`] (optimisation level, `-c`/`-R`/`-v`, which C
//! compiler to invoke).

pub mod ast;
pub mod builtins;
pub mod codegen;
pub mod config;
pub mod error;
pub mod lexer;
pub mod optimizer;
pub mod parser;
pub mod source;
pub mod symtab;
pub mod token;
pub mod token_stream;
pub mod typechecker;
pub mod types;

pub use ast::ProgramDecl;
pub use config::{CompilerConfig, OptimizationLevel};
pub use error::CompileError;
pub use parser::Parser;

use std::fs;
use std::path::Path;
use std::process::Command;

/// The runtime's header and implementation, embedded at build time so
/// the compiled binary needs no separate install step to find them.
static RUNTIME_HEADER: &str = include_str!("../runtime/runtime.h");
static RUNTIME_SOURCE: &str = include_str!("../runtime/runtime.c");

/// Compile a `.src` source file to an executable, using the default
/// configuration (level 0, no `-c`/`-R`/`-v`).
pub fn compile_file(source_path: &Path, output_path: &Path) -> Result<(), CompileError> {
    compile_file_with_config(source_path, output_path, &CompilerConfig::default())
}

/// Parse and type-check `source`, returning the checked AST without
/// optimising, generating, or invoking a toolchain. Exposed for tools
/// (linters, IDE integrations) that only need front-end diagnostics.
pub fn check_source(source: &str) -> Result<ProgramDecl, CompileError> {
    let mut program = Parser::new(source)?.parse()?;
    typechecker::check_program(&mut program)?;
    Ok(program)
}

/// Run the full pipeline — parse, type check, optimise, generate C —
/// and return the generated source without invoking a toolchain.
pub fn compile_to_c(source: &str, config: &CompilerConfig) -> Result<String, CompileError> {
    let mut program = check_source(source)?;
    optimizer::optimize(&mut program, config.optimization_level);
    codegen::generate(&program, config.verbose)
}

/// Compile a `.src` source file to an executable (or, with
/// `config.emit_c_only`, to a `.c` file) with a custom configuration.
pub fn compile_file_with_config(
    source_path: &Path,
    output_path: &Path,
    config: &CompilerConfig,
) -> Result<(), CompileError> {
    let source = fs::read_to_string(source_path)
        .map_err(|e| CompileError::io(format!("failed to read '{}': {}", source_path.display(), e)))?;

    let c_source = compile_to_c(&source, config)?;

    if config.emit_c_only {
        fs::write(output_path, c_source).map_err(|e| {
            CompileError::io(format!("failed to write '{}': {}", output_path.display(), e))
        })?;
        return Ok(());
    }

    invoke_toolchain(&c_source, output_path, config)
}

/// Write the generated C (and, unless `-R`, the runtime) to a temporary
/// directory and invoke the configured C compiler to link a final
/// executable at `output_path`.
fn invoke_toolchain(
    c_source: &str,
    output_path: &Path,
    config: &CompilerConfig,
) -> Result<(), CompileError> {
    check_cc_available(&config.cc)?;

    let dir = tempfile_dir()?;
    let c_path = dir.path().join("program.c");
    fs::write(&c_path, c_source).map_err(|e| CompileError::io(e.to_string()))?;
    fs::write(dir.path().join("runtime.h"), RUNTIME_HEADER)
        .map_err(|e| CompileError::io(e.to_string()))?;

    let mut cc = Command::new(&config.cc);
    cc.arg(&c_path).arg("-I").arg(dir.path()).arg("-o").arg(output_path);

    if !config.no_runtime {
        let runtime_c = dir.path().join("runtime.c");
        fs::write(&runtime_c, RUNTIME_SOURCE).map_err(|e| CompileError::io(e.to_string()))?;
        cc.arg(&runtime_c);
    }

    let output = cc
        .output()
        .map_err(|e| CompileError::toolchain(format!("failed to run '{}': {}", config.cc, e)))?;

    if !output.status.success() {
        return Err(CompileError::toolchain(format!(
            "{} failed:\n{}",
            config.cc,
            String::from_utf8_lossy(&output.stderr)
        )));
    }
    Ok(())
}

fn tempfile_dir() -> Result<tempfile::TempDir, CompileError> {
    tempfile::tempdir().map_err(|e| CompileError::io(format!("failed to create a temp directory: {}", e)))
}

/// Check that the configured C compiler is callable at all. A missing
/// or broken toolchain is reported as a toolchain error (exit code 3),
/// not a plain I/O failure.
fn check_cc_available(cc: &str) -> Result<(), CompileError> {
    let output = Command::new(cc).arg("--version").output().map_err(|e| {
        CompileError::toolchain(format!(
            "failed to run '{}': {}. Is a C compiler installed and on PATH?",
            cc, e
        ))
    })?;
    if !output.status.success() {
        return Err(CompileError::toolchain(format!("'{} --version' failed", cc)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_to_c_emits_runtime_include() {
        let c = compile_to_c("program p is begin return; end program", &CompilerConfig::default())
            .unwrap();
        assert!(c.contains("#include \"runtime.h\""));
    }

    #[test]
    fn compile_to_c_surfaces_semantic_errors() {
        let err = compile_to_c("program p is begin x := 1; return; end program", &CompilerConfig::default())
            .unwrap_err();
        assert!(matches!(err, CompileError::Semantic { .. }));
    }
}
