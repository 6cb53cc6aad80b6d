//! Batch compile driver
//!
//! Compiles the first N discovered test cases with a single configuration and records which ones
//! compiled. Nothing is run. The two lists it writes seed the expectation lists of a new
//! configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use iree_suite_core::{TestCase, TestConfig, TestSpec, discover};

use super::{CliError, CliResult, ExitCode};
use crate::executor::Executor;
use crate::settings::{ToolPaths, batch_cpu_config};
use crate::tools::ProcessToolRunner;

const RULE: &str = "******************************************************************";

/// Options for `compile-batch`.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub root: PathBuf,
    /// Configuration file to take flags from; the built-in CPU configuration otherwise
    pub config: Option<PathBuf>,
    pub max_tests: usize,
    pub successes_file: PathBuf,
    pub failures_file: PathBuf,
    /// Exit with a failure code if anything failed to compile
    pub strict: bool,
}

/// Names of the attempted test cases, split by compile result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub passed: Vec<String>,
    pub failed: Vec<String>,
}

impl BatchReport {
    /// Sort and deduplicate both lists.
    fn finish(mut self) -> Self {
        self.passed.sort();
        self.passed.dedup();
        self.failed.sort();
        self.failed.dedup();
        self
    }

    pub fn attempted(&self) -> usize {
        self.passed.len() + self.failed.len()
    }
}

/// The configuration batch mode compiles with. Expectation lists never apply in batch mode.
pub fn batch_config(explicit: Option<&Path>) -> CliResult<TestConfig> {
    let Some(path) = explicit else {
        return Ok(batch_cpu_config());
    };
    let loaded =
        TestConfig::from_file(path).map_err(|e| CliError::failure(format!("Error loading test configs: {}", e)))?;
    Ok(TestConfig::new(loaded.config_name, loaded.compile_flags, loaded.run_flags))
}

/// Compile at most `max_tests` of `cases`, in order.
///
/// A successful compile also writes the config flagfile next to the compiled module.
pub fn compile_cases(cases: &[TestCase], config: &TestConfig, executor: &Executor<'_>, max_tests: usize) -> BatchReport {
    let count = cases.len().min(max_tests);
    let mut report = BatchReport::default();

    for (i, case) in cases.iter().take(count).enumerate() {
        println!("[{:04}/{}]: Compiling {}", i, count, case.name);

        let Some(spec) = TestSpec::new(case, config) else {
            continue;
        };
        match executor.compile(&spec) {
            Ok(_) => {
                executor.write_config_flagfile(&spec);
                report.passed.push(case.name.clone());
            }
            Err(failure) => {
                tracing::debug!(test = %case.name, exit_code = ?failure.exit_code, "compile failed");
                report.failed.push(case.name.clone());
            }
        }
    }

    report.finish()
}

/// One name per line, no trailing newline.
pub fn render_list(names: &[String]) -> String {
    names.join("\n")
}

/// Write both lists, replacing whatever was there.
pub fn write_lists(report: &BatchReport, successes_file: &Path, failures_file: &Path) -> CliResult<()> {
    for (path, names) in [(successes_file, &report.passed), (failures_file, &report.failed)] {
        fs::write(path, render_list(names))
            .map_err(|e| CliError::failure(format!("Error writing '{}': {}", path.display(), e)))?;
    }
    Ok(())
}

/// `compile-batch` entry point.
pub fn compile_batch(options: &BatchOptions, tools: &ToolPaths) -> CliResult<ExitCode> {
    let config = batch_config(options.config.as_deref())?;
    let cases = discover(&options.root).map_err(|e| CliError::failure(format!("Error: {}", e)))?;

    println!("Compiling tests in '{}'", options.root.display());
    println!("{}", RULE);

    let runner = ProcessToolRunner;
    let executor = Executor::new(&runner, tools);
    let report = compile_cases(&cases, &config, &executor, options.max_tests);
    println!("{}", RULE);

    write_lists(&report, &options.successes_file, &options.failures_file)?;

    println!("Compile pass count: {}", report.passed.len());
    println!("Compile fail count: {}", report.failed.len());

    if options.strict && !report.failed.is_empty() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tools::{ToolInvocation, ToolOutput, ToolRunner};
    use std::cell::RefCell;
    use std::io;
    use tempfile::TempDir;

    /// Fails to compile any model whose path contains one of `failing`.
    struct CompileOnlyRunner {
        failing: Vec<&'static str>,
        calls: RefCell<Vec<ToolInvocation>>,
    }

    impl CompileOnlyRunner {
        fn new(failing: Vec<&'static str>) -> Self {
            Self {
                failing,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl ToolRunner for CompileOnlyRunner {
        fn invoke(&self, invocation: &ToolInvocation) -> io::Result<ToolOutput> {
            self.calls.borrow_mut().push(invocation.clone());
            let model = invocation.args.first().cloned().unwrap_or_default();
            let failed = self.failing.iter().any(|name| model.contains(&format!("/{}/", name)));
            Ok(ToolOutput {
                exit_code: Some(if failed { 1 } else { 0 }),
                ..ToolOutput::default()
            })
        }
    }

    fn make_suite(root: &Path, names: &[String]) -> Vec<TestCase> {
        for name in names {
            let dir = root.join(name);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("model.mlir"), "module {}").unwrap();
            fs::write(dir.join("test_data_flags.txt"), "--input=@input_0.npy\n").unwrap();
        }
        discover(root).unwrap()
    }

    #[test]
    fn test_batch_is_capped_and_lists_are_disjoint() {
        let tmp = TempDir::new().unwrap();
        let names: Vec<String> = (0..50).map(|i| format!("test_{:02}", i)).collect();
        let cases = make_suite(tmp.path(), &names);

        let runner = CompileOnlyRunner::new(vec!["test_03", "test_11", "test_40"]);
        let tools = ToolPaths::default();
        let executor = Executor::new(&runner, &tools);
        let report = compile_cases(&cases, &batch_cpu_config(), &executor, 20);

        assert_eq!(report.attempted(), 20);
        assert_eq!(report.failed, vec!["test_03", "test_11"]);
        assert!(report.passed.iter().all(|n| !report.failed.contains(n)));
        assert!(report.passed.windows(2).all(|w| w[0] < w[1]));
        assert!(runner.calls.borrow().iter().all(|c| c.program == "iree-compile"));
    }

    #[test]
    fn test_batch_writes_config_flagfile_on_success() {
        let tmp = TempDir::new().unwrap();
        let cases = make_suite(tmp.path(), &["test_abs".to_string(), "test_add".to_string()]);

        let runner = CompileOnlyRunner::new(vec!["test_add"]);
        let tools = ToolPaths::default();
        let executor = Executor::new(&runner, &tools);
        compile_cases(&cases, &batch_cpu_config(), &executor, 20);

        let written = fs::read_to_string(tmp.path().join("test_abs").join("config_cpu_flags.txt")).unwrap();
        assert_eq!(written, "--device=local-task\n--module=model_cpu.vmfb\n");
        assert!(!tmp.path().join("test_add").join("config_cpu_flags.txt").exists());
    }

    #[test]
    fn test_batch_ignores_expectation_lists() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("vulkan.json");
        fs::write(
            &config_path,
            r#"{
                "config_name": "vulkan",
                "iree_compile_flags": ["--iree-hal-target-backends=vulkan-spirv"],
                "iree_run_module_flags": ["--device=vulkan"],
                "skip_compile_tests": ["test_abs"],
                "skip_run_tests": [],
                "expected_compile_failures": ["test_add"],
                "expected_run_failures": []
            }"#,
        )
        .unwrap();

        let config = batch_config(Some(&config_path)).unwrap();
        assert_eq!(config.config_name, "vulkan");
        assert_eq!(config.compile_flags, vec!["--iree-hal-target-backends=vulkan-spirv"]);
        assert!(config.skip_compile.is_empty());
        assert!(config.expected_compile_failures.is_empty());
    }

    #[test]
    fn test_batch_config_defaults_to_cpu() {
        assert_eq!(batch_config(None).unwrap(), batch_cpu_config());
    }

    #[test]
    fn test_write_lists() {
        let tmp = TempDir::new().unwrap();
        let report = BatchReport {
            passed: vec!["test_abs".to_string(), "test_add".to_string()],
            failed: vec![],
        };
        let successes = tmp.path().join("compile_successes.txt");
        let failures = tmp.path().join("compile_failures.txt");
        write_lists(&report, &successes, &failures).unwrap();

        insta::assert_snapshot!(fs::read_to_string(&successes).unwrap(), @r"
        test_abs
        test_add
        ");
        assert_eq!(fs::read_to_string(&failures).unwrap(), "");
    }

    #[test]
    fn test_finish_sorts_and_dedups() {
        let report = BatchReport {
            passed: vec!["b".to_string(), "a".to_string(), "b".to_string()],
            failed: vec![],
        }
        .finish();
        assert_eq!(report.passed, vec!["a", "b"]);
    }
}
