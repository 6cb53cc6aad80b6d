//! Test session runner (pytest-style)
//!
//! Every collected [`TestSpec`] is one test item. Items run sequentially through an [`Executor`] and
//! their [`Outcome`]s are translated into the session vocabulary: PASSED, FAILED, XFAIL and XPASS.
//!
//! ## TestReporter Trait
//!
//! The test runner uses a `TestReporter` trait to separate reporting from
//! execution. This allows for custom output formats (JSON, TAP, etc.) by
//! implementing the trait.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use iree_suite_core::TestSpec;

use super::commands::collect_specs;
use super::{CliError, CliResult, ExitCode, SuiteArgs};
use crate::executor::{ExpectedFailurePolicy, Executor, Outcome, Stage, xfail_reason};
use crate::settings::ToolPaths;
use crate::tools::ProcessToolRunner;

// ============================================================================
// Test Reporter Trait
// ============================================================================

/// Trait for reporting test execution results.
///
/// Implement this trait to customize test output format (JSON, TAP, etc.)
pub trait TestReporter {
    /// Called once all specs have been collected
    fn on_collection_complete(&mut self, test_count: usize);

    /// Called when a test run begins
    fn on_test_start(&mut self, _spec: &TestSpec) {}

    /// Called when a test completes
    fn on_test_complete(&mut self, spec: &TestSpec, result: &TestResult);

    /// Called when all tests have completed
    fn on_run_complete(&mut self, summary: &TestSummary);
}

/// Options for a test session.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    pub verbose: bool,
    pub stop_on_fail: bool,
    pub policy: ExpectedFailurePolicy,
}

/// Result of running a single test
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestResult {
    Passed(Duration),
    /// Compiled; the configuration skips the run stage
    CompiledOnly(Duration),
    Failed(Duration, String),
    XFailed(Duration, String),
    /// Succeeded where the configuration expects a failure
    XPassed(Duration, String),
}

impl TestResult {
    pub fn from_outcome(outcome: &Outcome, duration: Duration) -> Self {
        match outcome {
            Outcome::Passed => TestResult::Passed(duration),
            Outcome::RunSkipped => TestResult::CompiledOnly(duration),
            Outcome::Failed(failure) => TestResult::Failed(duration, failure.to_string()),
            Outcome::XFailed { stage, .. } => TestResult::XFailed(duration, xfail_reason(*stage).to_string()),
            Outcome::XPassed { stage, invocation } => {
                let what = match stage {
                    Stage::Compile => "Compilation",
                    Stage::Run => "Run",
                };
                TestResult::XPassed(
                    duration,
                    format!(
                        "{} succeeded but the configuration expects it to fail\n\nInvoked with:\n  {}",
                        what,
                        invocation.command_line()
                    ),
                )
            }
        }
    }

    /// Failures and unexpected passes both fail the session.
    pub fn is_failure(&self) -> bool {
        matches!(self, TestResult::Failed(..) | TestResult::XPassed(..))
    }
}

/// Summary of test run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub xfailed: usize,
    pub xpassed: usize,
    pub duration: Duration,
}

impl TestSummary {
    pub fn record(&mut self, result: &TestResult) {
        self.total += 1;
        match result {
            TestResult::Passed(_) | TestResult::CompiledOnly(_) => self.passed += 1,
            TestResult::Failed(..) => self.failed += 1,
            TestResult::XFailed(..) => self.xfailed += 1,
            TestResult::XPassed(..) => self.xpassed += 1,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.xpassed > 0
    }

    /// `3 passed, 1 failed, 2 xfailed` (zero counts omitted).
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if self.passed > 0 {
            parts.push(format!("{} passed", self.passed));
        }
        if self.failed > 0 {
            parts.push(format!("{} failed", self.failed));
        }
        if self.xfailed > 0 {
            parts.push(format!("{} xfailed", self.xfailed));
        }
        if self.xpassed > 0 {
            parts.push(format!("{} xpassed", self.xpassed));
        }
        if parts.is_empty() {
            "no tests ran".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Default console reporter (pytest-style)
#[derive(Default)]
pub struct ConsoleReporter {
    pub verbose: bool,
    /// (location, message) for the FAILURES section
    failures: Vec<(String, String)>,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            failures: Vec::new(),
        }
    }
}

fn status_text(result: &TestResult, verbose: bool) -> String {
    let timed = |label: &str, color: &str, d: &Duration| {
        if verbose {
            format!("{}{}\x1b[0m ({:.0}ms)", color, label, d.as_millis())
        } else {
            format!("{}{}\x1b[0m", color, label)
        }
    };

    match result {
        TestResult::Passed(d) => timed("PASSED", "\x1b[32m", d),
        TestResult::CompiledOnly(d) => format!("{} (run skipped)", timed("PASSED", "\x1b[32m", d)),
        TestResult::Failed(d, _) => timed("FAILED", "\x1b[31m", d),
        TestResult::XFailed(_, reason) => format!("\x1b[33mXFAIL\x1b[0m ({})", reason),
        TestResult::XPassed(..) => "\x1b[31mXPASS\x1b[0m".to_string(),
    }
}

impl TestReporter for ConsoleReporter {
    fn on_collection_complete(&mut self, test_count: usize) {
        println!("\x1b[1m=================== test session starts ===================\x1b[0m");
        println!("collected {} item(s)", test_count);
        println!();
    }

    fn on_test_start(&mut self, spec: &TestSpec) {
        if self.verbose {
            print!("{} ... ", spec.id());
            let _ = io::stdout().flush();
        }
    }

    fn on_test_complete(&mut self, spec: &TestSpec, result: &TestResult) {
        let status = status_text(result, self.verbose);
        if self.verbose {
            println!("{}", status);
        } else {
            println!("{} {}", spec.id(), status);
        }

        match result {
            TestResult::Failed(_, message) | TestResult::XPassed(_, message) => {
                let location = format!("{}::{}", spec.test_dir().display(), spec.id());
                self.failures.push((location, message.clone()));
            }
            _ => {}
        }
    }

    fn on_run_complete(&mut self, summary: &TestSummary) {
        if !self.failures.is_empty() {
            println!();
            println!("\x1b[1;31m=================== FAILURES ===================\x1b[0m");
            for (location, message) in &self.failures {
                println!();
                println!("\x1b[1m___________ {} ___________\x1b[0m", location);
                println!();
                for line in message.lines() {
                    println!("    {}", line);
                }
            }
        }

        println!();
        let summary_color = if summary.has_failures() {
            "\x1b[1;31m"
        } else {
            "\x1b[1;32m"
        };
        println!(
            "{}=================== {} in {:.2}s ===================\x1b[0m",
            summary_color,
            summary.describe(),
            summary.duration.as_secs_f64()
        );
    }
}

/// Execute `specs` in order, reporting each result.
///
/// With `stop_on_fail` the session ends after the first failure or unexpected pass.
pub fn run_specs(
    specs: &[TestSpec],
    executor: &Executor<'_>,
    reporter: &mut dyn TestReporter,
    stop_on_fail: bool,
) -> TestSummary {
    let start_time = Instant::now();
    let mut summary = TestSummary::default();

    reporter.on_collection_complete(specs.len());

    for spec in specs {
        reporter.on_test_start(spec);

        let test_start = Instant::now();
        let outcome = executor.execute(spec);
        let result = TestResult::from_outcome(&outcome, test_start.elapsed());

        summary.record(&result);
        reporter.on_test_complete(spec, &result);

        if stop_on_fail && result.is_failure() {
            break;
        }
    }

    summary.duration = start_time.elapsed();
    reporter.on_run_complete(&summary);
    summary
}

/// Run all tests under `suite` against every loaded configuration.
pub fn run_tests(suite: &SuiteArgs, tools: &ToolPaths, options: &SessionOptions) -> CliResult<ExitCode> {
    let specs = collect_specs(suite)?;

    if specs.is_empty() {
        eprintln!("No tests collected");
        return Ok(ExitCode::SUCCESS); // "no tests collected" is not a failure
    }

    let runner = ProcessToolRunner;
    let executor = Executor::new(&runner, tools).with_policy(options.policy);
    let mut reporter = ConsoleReporter::new(options.verbose);

    let summary = run_specs(&specs, &executor, &mut reporter, options.stop_on_fail);

    if summary.has_failures() {
        // Summary already printed
        Err(CliError::new("", ExitCode::FAILURE))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
