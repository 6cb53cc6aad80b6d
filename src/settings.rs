//! Harness defaults and tool locations.
//!
//! Paths are relative to the working directory, which is expected to be the test suite repository
//! root (the directory containing `iree_tests/`).

use std::env;
use std::path::{Path, PathBuf};

use iree_suite_core::TestConfig;
use iree_suite_core::config::{CONFIG_FILES_ENV, DEFAULT_CONFIG_FILE, resolve_config_sources};

/// Compiler program used when none is given.
pub const DEFAULT_COMPILER: &str = "iree-compile";

/// Runtime program used when none is given.
pub const DEFAULT_RUNNER: &str = "iree-run-module";

/// Suite generated from the ONNX node tests.
pub const DEFAULT_TEST_ROOT: &str = "iree_tests/onnx/node/generated";

pub const DEFAULT_COMPILE_SUCCESSES_FILE: &str = "iree_tests/onnx/node/compile_successes.txt";
pub const DEFAULT_COMPILE_FAILURES_FILE: &str = "iree_tests/onnx/node/compile_failures.txt";

/// Batch mode attempts at most this many tests unless told otherwise.
pub const DEFAULT_BATCH_MAX_TESTS: usize = 20;

/// Programs invoked for the compile and run stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub compiler: String,
    pub runner: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            compiler: DEFAULT_COMPILER.to_string(),
            runner: DEFAULT_RUNNER.to_string(),
        }
    }
}

impl ToolPaths {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compiler(mut self, compiler: impl Into<String>) -> Self {
        self.compiler = compiler.into();
        self
    }

    pub fn with_runner(mut self, runner: impl Into<String>) -> Self {
        self.runner = runner.into();
        self
    }
}

/// Configuration files for this process: `explicit`, else `IREE_TEST_CONFIG_FILES`, else the in-tree
/// default.
pub fn config_sources(explicit: &[PathBuf]) -> Vec<PathBuf> {
    let env_value = env::var(CONFIG_FILES_ENV).ok();
    resolve_config_sources(explicit, env_value.as_deref(), Path::new(DEFAULT_CONFIG_FILE))
}

/// Compile configuration used by batch mode when no config file is given: `llvm-cpu` on
/// `local-task`, no expectation lists.
pub fn batch_cpu_config() -> TestConfig {
    TestConfig::new(
        "cpu",
        vec!["--iree-hal-target-backends=llvm-cpu".to_string()],
        vec!["--device=local-task".to_string()],
    )
}
