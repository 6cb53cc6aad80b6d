//! Spec execution
//!
//! Runs the compile stage and then, unless skipped, the run stage for a single [`TestSpec`], and
//! classifies the result against the spec's expectations.
//!
//! ## Expected failures
//!
//! With [`ExpectedFailurePolicy::Verify`] (the default) a stage that is expected to fail is still
//! invoked. A tool that then succeeds yields [`Outcome::XPassed`], which marks an expectation list
//! entry that has gone stale. [`ExpectedFailurePolicy::Trust`] skips such stages entirely.
//!
//! ## Artifacts
//!
//! The compiled module (`model_<config>.vmfb`) and the config flagfile are written next to the
//! model and overwritten on every run. Nothing is cleaned up.

use std::fmt;
use std::path::PathBuf;

use iree_suite_core::TestSpec;

use crate::flagfile::write_config_flagfile;
use crate::settings::ToolPaths;
use crate::tools::{ToolInvocation, ToolOutput, ToolRunner};

/// Pipeline stage of a spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Compile,
    Run,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Compile => write!(f, "compile"),
            Stage::Run => write!(f, "run"),
        }
    }
}

/// What to do with a stage the configuration expects to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpectedFailurePolicy {
    /// Invoke the tool anyway and reclassify by its exit code.
    #[default]
    Verify,
    /// Record the expected failure without invoking the tool.
    Trust,
}

/// A tool exited unsuccessfully (or never started).
///
/// Carries everything needed to reproduce the call by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolFailure {
    pub stage: Stage,
    pub invocation: ToolInvocation,
    pub exit_code: Option<i32>,
    pub stderr: String,
}

impl ToolFailure {
    pub fn new(stage: Stage, invocation: ToolInvocation, output: ToolOutput) -> Self {
        Self {
            stage,
            invocation,
            exit_code: output.exit_code,
            stderr: output.stderr,
        }
    }
}

impl fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self
            .exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "none".to_string());

        writeln!(f, "Error invoking {}", self.invocation.program)?;
        writeln!(f, "Error code: {}", code)?;
        writeln!(f, "Stderr diagnostics:")?;
        writeln!(f, "{}", self.stderr.trim_end())?;
        writeln!(f)?;
        writeln!(f, "Invoked with:")?;
        write!(f, "  {}", self.invocation.command_line())?;
        if let Some(dir) = &self.invocation.current_dir {
            write!(f, "\n\nWorking directory: {}", dir.display())?;
        }
        Ok(())
    }
}

impl std::error::Error for ToolFailure {}

/// Result of executing one spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Compiled and ran as expected.
    Passed,
    /// Compiled as expected; the configuration skips the run stage.
    RunSkipped,
    /// Failed exactly where the configuration said it would. `failure` is `None` when the tool was not
    /// invoked ([`ExpectedFailurePolicy::Trust`]).
    XFailed { stage: Stage, failure: Option<ToolFailure> },
    /// A stage expected to succeed failed.
    Failed(ToolFailure),
    /// A stage expected to fail succeeded.
    XPassed { stage: Stage, invocation: ToolInvocation },
}

/// Three-way classification of an [`Outcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeClass {
    Success,
    ExpectedFailure,
    UnexpectedFailure,
}

impl Outcome {
    pub fn class(&self) -> OutcomeClass {
        match self {
            Outcome::Passed | Outcome::RunSkipped => OutcomeClass::Success,
            Outcome::XFailed { .. } => OutcomeClass::ExpectedFailure,
            Outcome::Failed(_) | Outcome::XPassed { .. } => OutcomeClass::UnexpectedFailure,
        }
    }
}

/// Human-readable reason for an expected failure at `stage`.
pub fn xfail_reason(stage: Stage) -> &'static str {
    match stage {
        Stage::Compile => "Expected compilation to fail",
        Stage::Run => "Expected run to fail",
    }
}

/// Executes specs one at a time through a [`ToolRunner`].
pub struct Executor<'a> {
    runner: &'a dyn ToolRunner,
    tools: &'a ToolPaths,
    policy: ExpectedFailurePolicy,
}

impl<'a> Executor<'a> {
    pub fn new(runner: &'a dyn ToolRunner, tools: &'a ToolPaths) -> Self {
        Self {
            runner,
            tools,
            policy: ExpectedFailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ExpectedFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// `<compiler> <model> [compile flags...] -o <model_<config>.vmfb>`
    pub fn compile_invocation(&self, spec: &TestSpec) -> ToolInvocation {
        ToolInvocation::new(&self.tools.compiler)
            .path_arg(&spec.model_path)
            .args(spec.compile_flags.iter().cloned())
            .arg("-o")
            .path_arg(&spec.compiled_module_path())
    }

    /// `<runner> --module=<vmfb> --flagfile=<test_data_flags.txt> [run flags...]`, run from the test
    /// directory since data flagfiles name their inputs by relative path.
    pub fn run_invocation(&self, spec: &TestSpec) -> ToolInvocation {
        let invocation = ToolInvocation::new(&self.tools.runner)
            .arg(format!("--module={}", spec.compiled_module_path().display()))
            .arg(format!("--flagfile={}", spec.data_flagfile_path.display()))
            .args(spec.run_flags.iter().cloned());

        match spec.data_flagfile_path.parent() {
            Some(dir) => invocation.current_dir(dir),
            None => invocation,
        }
    }

    /// Run the compile stage only.
    pub fn compile(&self, spec: &TestSpec) -> Result<ToolOutput, ToolFailure> {
        self.invoke(Stage::Compile, &self.compile_invocation(spec))
    }

    /// Write `config_<config>_flags.txt` for a compiled spec.
    ///
    /// A write failure is logged and otherwise ignored; the run stage does not read this file.
    pub fn write_config_flagfile(&self, spec: &TestSpec) -> Option<PathBuf> {
        let path = spec.config_flagfile_path();
        match write_config_flagfile(&path, &spec.run_flags, &spec.compiled_module_name()) {
            Ok(()) => Some(path),
            Err(e) => {
                tracing::warn!(test = %spec.id(), "{}", e);
                None
            }
        }
    }

    /// Execute both stages of `spec` and classify the result.
    #[tracing::instrument(skip_all, fields(test = %spec.id()))]
    pub fn execute(&self, spec: &TestSpec) -> Outcome {
        if !spec.expect_compile_success && self.policy == ExpectedFailurePolicy::Trust {
            return Outcome::XFailed {
                stage: Stage::Compile,
                failure: None,
            };
        }

        let compile = self.compile_invocation(spec);
        match (self.invoke(Stage::Compile, &compile), spec.expect_compile_success) {
            (Ok(_), true) => {}
            (Ok(_), false) => {
                return Outcome::XPassed {
                    stage: Stage::Compile,
                    invocation: compile,
                };
            }
            (Err(failure), true) => return Outcome::Failed(failure),
            (Err(failure), false) => {
                return Outcome::XFailed {
                    stage: Stage::Compile,
                    failure: Some(failure),
                };
            }
        }

        self.write_config_flagfile(spec);

        if spec.skip_run {
            return Outcome::RunSkipped;
        }

        if !spec.expect_run_success && self.policy == ExpectedFailurePolicy::Trust {
            return Outcome::XFailed {
                stage: Stage::Run,
                failure: None,
            };
        }

        let run = self.run_invocation(spec);
        match (self.invoke(Stage::Run, &run), spec.expect_run_success) {
            (Ok(_), true) => Outcome::Passed,
            (Ok(_), false) => Outcome::XPassed {
                stage: Stage::Run,
                invocation: run,
            },
            (Err(failure), true) => Outcome::Failed(failure),
            (Err(failure), false) => Outcome::XFailed {
                stage: Stage::Run,
                failure: Some(failure),
            },
        }
    }

    fn invoke(&self, stage: Stage, invocation: &ToolInvocation) -> Result<ToolOutput, ToolFailure> {
        tracing::debug!(%stage, command = %invocation, "invoking tool");

        let output = self
            .runner
            .invoke(invocation)
            .unwrap_or_else(|e| ToolOutput::spawn_failure(&invocation.program, &e));

        tracing::debug!(%stage, exit_code = ?output.exit_code, "tool finished");

        if output.success() {
            Ok(output)
        } else {
            Err(ToolFailure::new(stage, invocation.clone(), output))
        }
    }
}
