//! CLI module for the IREE test suite harness
//!
//! ## Commands
//!
//! - `run [PATH...]` - Compile and run every (test case, configuration) pair (pytest-style session)
//! - `list [PATH...]` - Show the collected test specs without running anything
//! - `compile-batch [PATH]` - Compile the first N test cases and write pass/fail lists
//!
//! ## Modules
//!
//! - `commands` - Config loading, spec collection and `list`
//! - `test_runner` - Test session execution and reporting
//! - `batch` - Batch compile driver
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod batch;
pub mod commands;
pub mod test_runner;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

use crate::executor::ExpectedFailurePolicy;
use crate::settings::{
    DEFAULT_BATCH_MAX_TESTS, DEFAULT_COMPILE_FAILURES_FILE, DEFAULT_COMPILE_SUCCESSES_FILE, DEFAULT_COMPILER,
    DEFAULT_RUNNER, DEFAULT_TEST_ROOT, ToolPaths,
};
use crate::version::SUITE_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Compile-and-run harness for IREE model test suites
#[derive(Parser, Debug)]
#[command(name = "iree-suite")]
#[command(version = SUITE_VERSION)]
#[command(about = "Compile-and-run harness for IREE model test suites", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Which tests to collect.
#[derive(Args, Debug, Clone)]
pub struct SuiteArgs {
    /// Test suite directories, each holding one directory per test case
    #[arg(value_name = "PATH", default_value = DEFAULT_TEST_ROOT)]
    pub paths: Vec<PathBuf>,
    /// Test configuration file (repeatable, overrides IREE_TEST_CONFIG_FILES)
    #[arg(long = "config", value_name = "FILE")]
    pub configs: Vec<PathBuf>,
    /// Filter tests by keyword expression
    #[arg(short = 'k', value_name = "EXPR")]
    pub filter: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile and run every test under every configuration
    Run {
        #[command(flatten)]
        suite: SuiteArgs,
        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
        /// Stop on first failure
        #[arg(short = 'x', long = "exitfirst")]
        stop_on_fail: bool,
        /// Compiler program
        #[arg(long, value_name = "PROGRAM", default_value = DEFAULT_COMPILER)]
        compiler: String,
        /// Runtime program
        #[arg(long, value_name = "PROGRAM", default_value = DEFAULT_RUNNER)]
        runner: String,
        /// Do not invoke tools for stages the configuration expects to fail
        #[arg(long)]
        trust_expected_failures: bool,
    },

    /// List collected tests and their expectations without running them
    List {
        #[command(flatten)]
        suite: SuiteArgs,
    },

    /// Compile the first N tests with one configuration and record which compiled
    CompileBatch {
        /// Test suite directory
        #[arg(value_name = "PATH", default_value = DEFAULT_TEST_ROOT)]
        path: PathBuf,
        /// Take compile flags from this configuration file instead of the built-in CPU configuration
        #[arg(long = "config", value_name = "FILE")]
        config: Option<PathBuf>,
        /// Maximum number of tests to compile
        #[arg(long, value_name = "N", default_value_t = DEFAULT_BATCH_MAX_TESTS)]
        max_tests: usize,
        /// Where to write the names of tests that compiled
        #[arg(long, value_name = "FILE", default_value = DEFAULT_COMPILE_SUCCESSES_FILE)]
        successes: PathBuf,
        /// Where to write the names of tests that failed to compile
        #[arg(long, value_name = "FILE", default_value = DEFAULT_COMPILE_FAILURES_FILE)]
        failures: PathBuf,
        /// Compiler program
        #[arg(long, value_name = "PROGRAM", default_value = DEFAULT_COMPILER)]
        compiler: String,
        /// Exit with a failure code if any test failed to compile
        #[arg(long)]
        strict: bool,
    },
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Run {
            suite,
            verbose,
            stop_on_fail,
            compiler,
            runner,
            trust_expected_failures,
        } => {
            let tools = ToolPaths::new().with_compiler(compiler).with_runner(runner);
            let options = test_runner::SessionOptions {
                verbose,
                stop_on_fail,
                policy: if trust_expected_failures {
                    ExpectedFailurePolicy::Trust
                } else {
                    ExpectedFailurePolicy::Verify
                },
            };
            test_runner::run_tests(&suite, &tools, &options)
        }
        Command::List { suite } => commands::list_tests(&suite),
        Command::CompileBatch {
            path,
            config,
            max_tests,
            successes,
            failures,
            compiler,
            strict,
        } => {
            let tools = ToolPaths::new().with_compiler(compiler);
            let options = batch::BatchOptions {
                root: path,
                config,
                max_tests,
                successes_file: successes,
                failures_file: failures,
                strict,
            };
            batch::compile_batch(&options, &tools)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
