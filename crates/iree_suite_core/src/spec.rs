//! Test specs: one test case joined with one configuration.

use std::path::PathBuf;

use crate::config::TestConfig;
use crate::discovery::TestCase;

/// Everything needed to compile and run one test case under one configuration.
///
/// Specs are plain values. They are built once by [`build_specs`] and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSpec {
    pub test_name: String,
    pub model_path: PathBuf,
    pub data_flagfile_path: PathBuf,

    pub config_name: String,
    pub compile_flags: Vec<String>,
    pub run_flags: Vec<String>,

    pub expect_compile_success: bool,
    pub expect_run_success: bool,
    pub skip_run: bool,
}

impl TestSpec {
    /// Join a test case with a configuration, or `None` if the configuration skips compiling it.
    pub fn new(case: &TestCase, config: &TestConfig) -> Option<Self> {
        let name = &case.name;
        if config.skip_compile.contains(name) {
            return None;
        }

        Some(Self {
            test_name: name.clone(),
            model_path: case.model_path(),
            data_flagfile_path: case.data_flagfile_path(),
            config_name: config.config_name.clone(),
            compile_flags: config.compile_flags.clone(),
            run_flags: config.run_flags.clone(),
            expect_compile_success: !config.expected_compile_failures.contains(name),
            expect_run_success: !config.expected_run_failures.contains(name),
            skip_run: config.skip_run.contains(name),
        })
    }

    /// Display identifier, `test_abs[cpu]`.
    pub fn id(&self) -> String {
        format!("{}[{}]", self.test_name, self.config_name)
    }

    /// Directory holding the test case's files.
    pub fn test_dir(&self) -> PathBuf {
        self.model_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_default()
    }

    /// File name of the compiled module, `model_<config>.vmfb`.
    pub fn compiled_module_name(&self) -> String {
        format!("model_{}.vmfb", self.config_name)
    }

    /// The compiled module sits next to the model so configurations never collide.
    pub fn compiled_module_path(&self) -> PathBuf {
        self.test_dir().join(self.compiled_module_name())
    }

    /// Side artifact `config_<config>_flags.txt` written after a successful compile.
    pub fn config_flagfile_path(&self) -> PathBuf {
        self.test_dir().join(format!("config_{}_flags.txt", self.config_name))
    }
}

/// Cross product of test cases and configurations, test-case-major.
///
/// Pairs listed in a configuration's `skip_compile_tests` produce no spec.
#[tracing::instrument(skip_all, fields(case_count = cases.len(), config_count = configs.len()))]
pub fn build_specs(cases: &[TestCase], configs: &[TestConfig]) -> Vec<TestSpec> {
    cases
        .iter()
        .flat_map(|case| configs.iter().filter_map(move |config| TestSpec::new(case, config)))
        .collect()
}

/// Keep the specs whose id contains `keyword` (everything when `keyword` is `None`).
pub fn filter_specs(specs: Vec<TestSpec>, keyword: Option<&str>) -> Vec<TestSpec> {
    match keyword {
        Some(keyword) => specs.into_iter().filter(|s| s.id().contains(keyword)).collect(),
        None => specs,
    }
}
