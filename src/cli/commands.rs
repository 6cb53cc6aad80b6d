//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::path::PathBuf;

use iree_suite_core::{TestCase, TestConfig, TestSpec, build_specs, discover, filter_specs, load_configs};

use super::{CliError, CliResult, ExitCode, SuiteArgs};
use crate::settings::config_sources;

/// Load the test configurations for this process.
///
/// Any error aborts the command before a single spec is built.
pub fn load_test_configs(explicit: &[PathBuf]) -> CliResult<Vec<TestConfig>> {
    let sources = config_sources(explicit);
    load_configs(&sources).map_err(|e| CliError::failure(format!("Error loading test configs: {}", e)))
}

/// Discover test cases under each root, in the order the roots were given.
pub fn discover_cases(roots: &[PathBuf]) -> CliResult<Vec<TestCase>> {
    let mut cases = Vec::new();
    for root in roots {
        let found = discover(root).map_err(|e| CliError::failure(format!("Error: {}", e)))?;
        cases.extend(found);
    }
    Ok(cases)
}

/// Configs, then discovery, then the cross product, then the keyword filter.
pub fn collect_specs(suite: &SuiteArgs) -> CliResult<Vec<TestSpec>> {
    let configs = load_test_configs(&suite.configs)?;
    let cases = discover_cases(&suite.paths)?;
    let specs = build_specs(&cases, &configs);
    Ok(filter_specs(specs, suite.filter.as_deref()))
}

/// Short expectation markers for a spec, e.g. `["xfail-compile", "skip-run"]`.
pub fn spec_markers(spec: &TestSpec) -> Vec<&'static str> {
    let mut markers = Vec::new();
    if !spec.expect_compile_success {
        markers.push("xfail-compile");
    }
    if spec.skip_run {
        markers.push("skip-run");
    } else if !spec.expect_run_success {
        markers.push("xfail-run");
    }
    markers
}

/// One line per spec: `<id>` followed by its markers, if any.
pub fn format_spec_line(spec: &TestSpec) -> String {
    let markers = spec_markers(spec);
    if markers.is_empty() {
        spec.id()
    } else {
        format!("{} ({})", spec.id(), markers.join(", "))
    }
}

/// Print the collected specs without running them.
pub fn list_tests(suite: &SuiteArgs) -> CliResult<ExitCode> {
    let specs = collect_specs(suite)?;

    for spec in &specs {
        println!("{}", format_spec_line(spec));
    }
    println!();
    println!("collected {} item(s)", specs.len());

    Ok(ExitCode::SUCCESS)
}
