//! Configuration loading from files on disk, including the CLI's collection path.

use std::fs;
use std::path::{Path, PathBuf};

use iree_suite::cli::SuiteArgs;
use iree_suite::cli::commands::collect_specs;
use iree_suite_core::{ConfigLoadError, load_configs};
use tempfile::TempDir;

fn write_config(dir: &Path, file: &str, name: &str, expected_compile_failures: &[&str]) -> PathBuf {
    let path = dir.join(file);
    let doc = serde_json::json!({
        "config_name": name,
        "iree_compile_flags": ["--iree-hal-target-backends=llvm-cpu"],
        "iree_run_module_flags": ["--device=local-task"],
        "skip_compile_tests": [],
        "skip_run_tests": [],
        "expected_compile_failures": expected_compile_failures,
        "expected_run_failures": [],
    });
    fs::write(&path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();
    path
}

fn make_case(root: &Path, name: &str) {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("model.mlir"), "module {}").unwrap();
    fs::write(dir.join("test_data_flags.txt"), "").unwrap();
}

#[test]
fn configs_load_in_source_order() {
    let tmp = TempDir::new().unwrap();
    let vulkan = write_config(tmp.path(), "config_vulkan.json", "vulkan", &[]);
    let cpu = write_config(tmp.path(), "config_cpu.json", "cpu", &["test_abs"]);

    let configs = load_configs(&[vulkan, cpu]).unwrap();

    let names: Vec<&str> = configs.iter().map(|c| c.config_name.as_str()).collect();
    assert_eq!(names, vec!["vulkan", "cpu"]);
    assert!(configs[1].expected_compile_failures.contains("test_abs"));
}

#[test]
fn duplicate_config_names_are_rejected() {
    let tmp = TempDir::new().unwrap();
    let a = write_config(tmp.path(), "a.json", "cpu", &[]);
    let b = write_config(tmp.path(), "b.json", "cpu", &[]);

    let err = load_configs(&[a.clone(), b.clone()]).unwrap_err();

    match err {
        ConfigLoadError::DuplicateName { name, first, second } => {
            assert_eq!(name, "cpu");
            assert_eq!(first, a);
            assert_eq!(second, b);
        }
        other => panic!("expected duplicate name error, got {:?}", other),
    }
}

#[test]
fn missing_run_flags_fails_before_any_spec_is_built() {
    let tmp = TempDir::new().unwrap();
    let suite_root = tmp.path().join("suite");
    make_case(&suite_root, "test_abs");

    let broken = tmp.path().join("config_cpu.json");
    fs::write(
        &broken,
        r#"{
            "config_name": "cpu",
            "iree_compile_flags": ["--iree-hal-target-backends=llvm-cpu"],
            "skip_compile_tests": [],
            "skip_run_tests": [],
            "expected_compile_failures": [],
            "expected_run_failures": []
        }"#,
    )
    .unwrap();

    let direct = load_configs(std::slice::from_ref(&broken)).unwrap_err();
    assert!(matches!(direct, ConfigLoadError::Parse { .. }));
    assert!(direct.to_string().contains("iree_run_module_flags"));

    let suite = SuiteArgs {
        paths: vec![suite_root],
        configs: vec![broken],
        filter: None,
    };
    let err = collect_specs(&suite).unwrap_err();
    assert!(err.message.starts_with("Error loading test configs: "));
}

#[test]
fn collection_crosses_cases_with_configs() {
    let tmp = TempDir::new().unwrap();
    let suite_root = tmp.path().join("suite");
    make_case(&suite_root, "test_add");
    make_case(&suite_root, "test_abs");
    let cpu = write_config(tmp.path(), "cpu.json", "cpu", &["test_abs"]);
    let vulkan = write_config(tmp.path(), "vulkan.json", "vulkan", &[]);

    let suite = SuiteArgs {
        paths: vec![suite_root.clone()],
        configs: vec![cpu.clone(), vulkan.clone()],
        filter: None,
    };
    let specs = collect_specs(&suite).unwrap();
    let ids: Vec<String> = specs.iter().map(|s| s.id()).collect();
    assert_eq!(
        ids,
        vec!["test_abs[cpu]", "test_abs[vulkan]", "test_add[cpu]", "test_add[vulkan]"]
    );
    assert!(!specs[0].expect_compile_success);
    assert!(specs[1].expect_compile_success);

    let filtered = collect_specs(&SuiteArgs {
        paths: vec![suite_root],
        configs: vec![cpu, vulkan],
        filter: Some("vulkan".to_string()),
    })
    .unwrap();
    assert_eq!(filtered.len(), 2);
}
