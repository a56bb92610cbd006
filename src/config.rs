//! Compiler configuration.
//!
//! [`CompilerConfig`] collects everything that varies between
//! invocations of [`crate::compile_file`] — optimisation level, the C
//! toolchain to invoke, and the output-shaping flags `-c`/`-R`/`-v` —
//! so the CLI and any embedder can build one the same way.

use std::env;

/// How far the optimiser is allowed to go. See [`crate::optimizer`].
pub type OptimizationLevel = u8;

#[derive(Debug, Clone)]
pub struct CompilerConfig {
    pub optimization_level: OptimizationLevel,
    /// `-v`: annotate the generated C with a `// line N` comment above
    /// each lowered statement.
    pub verbose: bool,
    /// `-c`: stop after writing the generated C file, never invoke a
    /// toolchain.
    pub emit_c_only: bool,
    /// `-R`: skip compiling and linking the bundled runtime; the caller
    /// is responsible for supplying `getBool`/`putInteger`/etc. some
    /// other way.
    pub no_runtime: bool,
    /// The C compiler driver to invoke, e.g. `"clang"` or `"cc"`.
    pub cc: String,
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_optimization_level(mut self, level: OptimizationLevel) -> Self {
        self.optimization_level = level;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_emit_c_only(mut self, emit_c_only: bool) -> Self {
        self.emit_c_only = emit_c_only;
        self
    }

    pub fn with_no_runtime(mut self, no_runtime: bool) -> Self {
        self.no_runtime = no_runtime;
        self
    }

    pub fn with_cc(mut self, cc: impl Into<String>) -> Self {
        self.cc = cc.into();
        self
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            optimization_level: 0,
            verbose: false,
            emit_c_only: false,
            no_runtime: false,
            cc: env::var("CC").unwrap_or_else(|_| "clang".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = CompilerConfig::new()
            .with_optimization_level(2)
            .with_emit_c_only(true);
        assert_eq!(config.optimization_level, 2);
        assert!(config.emit_c_only);
        assert!(!config.no_runtime);
    }
}
