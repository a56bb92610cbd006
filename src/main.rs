//! SRC Compiler CLI.

use clap::Parser as ClapParser;
use std::path::{Path, PathBuf};
use std::process;

#[derive(ClapParser)]
#[command(name = "srcc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Ahead-of-time compiler for the SRC language, emitting portable C")]
struct Cli {
    /// Input .src source file
    input: PathBuf,

    /// Output path (defaults to the input's file stem, or stem.c with -c)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Optimisation level (0-2)
    #[arg(short = 'O', long = "opt", value_parser = clap::value_parser!(u8).range(0..=2), default_value_t = 0)]
    optimization_level: u8,

    /// Emit the generated C and stop; do not invoke a toolchain
    #[arg(short = 'c', long = "emit-c")]
    emit_c: bool,

    /// Do not link the bundled get/put runtime
    #[arg(short = 'R', long = "no-runtime")]
    no_runtime: bool,

    /// Annotate the generated C with a source-line comment per statement
    #[arg(short = 'v', long = "verbose-assembly")]
    verbose: bool,

    /// C compiler driver to invoke (defaults to $CC, or clang)
    #[arg(long)]
    cc: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input, cli.emit_c));

    let mut config = srcc::CompilerConfig::new()
        .with_optimization_level(cli.optimization_level)
        .with_emit_c_only(cli.emit_c)
        .with_no_runtime(cli.no_runtime)
        .with_verbose(cli.verbose);
    if let Some(cc) = cli.cc {
        config = config.with_cc(cc);
    }

    match srcc::compile_file_with_config(&cli.input, &output, &config) {
        Ok(()) => {
            println!("compiled {} -> {}", cli.input.display(), output.display());
        }
        Err(e) => {
            eprintln!("{}", e.report(&cli.input));
            process::exit(e.exit_code());
        }
    }
}

fn default_output_path(input: &Path, emit_c: bool) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    if emit_c {
        PathBuf::from(stem).with_extension("c")
    } else {
        PathBuf::from(stem)
    }
}
