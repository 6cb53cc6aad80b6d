//! Test configuration documents.
//!
//! A configuration is a named bundle of compiler flags, runtime flags and per-test expectation
//! overrides. The same corpus is exercised once per loaded configuration.
//!
//! ## Document schema
//!
//! ```json
//! {
//!   "config_name": "cpu",
//!   "iree_compile_flags": ["--iree-hal-target-backends=llvm-cpu"],
//!   "iree_run_module_flags": ["--device=local-task"],
//!   "skip_compile_tests": [],
//!   "skip_run_tests": [],
//!   "expected_compile_failures": ["test_abs"],
//!   "expected_run_failures": ["test_add"]
//! }
//! ```
//!
//! Every field is required. Unknown extra fields are ignored.
//!
//! ## Source resolution
//!
//! See [`resolve_config_sources`]: explicit paths, then `IREE_TEST_CONFIG_FILES`, then the in-tree
//! default.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding a semicolon-delimited list of configuration file paths.
pub const CONFIG_FILES_ENV: &str = "IREE_TEST_CONFIG_FILES";

/// In-tree configuration used when neither the command line nor the environment names any.
pub const DEFAULT_CONFIG_FILE: &str = "iree_tests/configs/config_cpu.json";

/// Errors raised while loading configuration documents.
///
/// All of these are fatal: a run never proceeds with a partial configuration set.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config file '{}': {message}", .path.display())]
    Invalid { path: PathBuf, message: String },

    #[error(
        "duplicate config_name '{name}' in '{}' (already loaded from '{}')",
        .second.display(),
        .first.display()
    )]
    DuplicateName { name: String, first: PathBuf, second: PathBuf },
}

/// One test configuration, immutable after loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestConfig {
    pub config_name: String,
    #[serde(rename = "iree_compile_flags")]
    pub compile_flags: Vec<String>,
    #[serde(rename = "iree_run_module_flags")]
    pub run_flags: Vec<String>,
    #[serde(rename = "skip_compile_tests")]
    pub skip_compile: BTreeSet<String>,
    #[serde(rename = "skip_run_tests")]
    pub skip_run: BTreeSet<String>,
    pub expected_compile_failures: BTreeSet<String>,
    pub expected_run_failures: BTreeSet<String>,
}

impl TestConfig {
    /// Create a configuration with flags and empty expectation lists.
    pub fn new(config_name: impl Into<String>, compile_flags: Vec<String>, run_flags: Vec<String>) -> Self {
        Self {
            config_name: config_name.into(),
            compile_flags,
            run_flags,
            skip_compile: BTreeSet::new(),
            skip_run: BTreeSet::new(),
            expected_compile_failures: BTreeSet::new(),
            expected_run_failures: BTreeSet::new(),
        }
    }

    /// Parse a single configuration document.
    ///
    /// `origin` is only used to label errors.
    pub fn from_json_str(text: &str, origin: &Path) -> Result<Self, ConfigLoadError> {
        let config: TestConfig = serde_json::from_str(text).map_err(|source| ConfigLoadError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;

        if config.config_name.trim().is_empty() {
            return Err(ConfigLoadError::Invalid {
                path: origin.to_path_buf(),
                message: "config_name must not be empty".to_string(),
            });
        }

        Ok(config)
    }

    /// Read and parse a configuration document from disk.
    pub fn from_file(path: &Path) -> Result<Self, ConfigLoadError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text, path)
    }

    pub fn with_skip_compile<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_compile.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_skip_run<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_run.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_expected_compile_failures<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expected_compile_failures.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_expected_run_failures<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expected_run_failures.extend(names.into_iter().map(Into::into));
        self
    }
}

/// Pick the configuration files for this run.
///
/// Precedence: `explicit` paths (command line), then the semicolon-delimited `env_value`, then
/// `default`. Empty segments in the environment value are ignored, so `"a.json;;b.json;"` names two
/// files and `""` names none.
pub fn resolve_config_sources(explicit: &[PathBuf], env_value: Option<&str>, default: &Path) -> Vec<PathBuf> {
    if !explicit.is_empty() {
        return explicit.to_vec();
    }

    let from_env: Vec<PathBuf> = env_value
        .unwrap_or("")
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect();

    if from_env.is_empty() {
        vec![default.to_path_buf()]
    } else {
        from_env
    }
}

/// Load every configuration in `sources`, in order.
///
/// Stops at the first failing document.
#[tracing::instrument(skip_all, fields(source_count = sources.len()))]
pub fn load_configs(sources: &[PathBuf]) -> Result<Vec<TestConfig>, ConfigLoadError> {
    let mut configs = Vec::with_capacity(sources.len());
    let mut seen: HashMap<String, PathBuf> = HashMap::new();

    for path in sources {
        let config = TestConfig::from_file(path)?;
        if let Some(first) = seen.get(&config.config_name) {
            return Err(ConfigLoadError::DuplicateName {
                name: config.config_name,
                first: first.clone(),
                second: path.clone(),
            });
        }
        tracing::debug!(config = %config.config_name, path = %path.display(), "loaded test config");
        seen.insert(config.config_name.clone(), path.clone());
        configs.push(config);
    }

    Ok(configs)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CPU_CONFIG: &str = r#"{
        "config_name": "cpu",
        "iree_compile_flags": ["--iree-hal-target-backends=llvm-cpu"],
        "iree_run_module_flags": ["--device=local-task"],
        "skip_compile_tests": ["test_slow"],
        "skip_run_tests": [],
        "expected_compile_failures": ["test_abs"],
        "expected_run_failures": ["test_add"]
    }"#;

    #[test]
    fn test_parse_full_document() {
        let config = TestConfig::from_json_str(CPU_CONFIG, Path::new("cpu.json")).unwrap();
        assert_eq!(config.config_name, "cpu");
        assert_eq!(config.compile_flags, vec!["--iree-hal-target-backends=llvm-cpu"]);
        assert_eq!(config.run_flags, vec!["--device=local-task"]);
        assert!(config.skip_compile.contains("test_slow"));
        assert!(config.skip_run.is_empty());
        assert!(config.expected_compile_failures.contains("test_abs"));
        assert!(config.expected_run_failures.contains("test_add"));
    }

    #[test]
    fn test_flag_order_is_preserved() {
        let text = r#"{
            "config_name": "vulkan",
            "iree_compile_flags": ["--b", "--a", "--c"],
            "iree_run_module_flags": ["--z", "--y"],
            "skip_compile_tests": [],
            "skip_run_tests": [],
            "expected_compile_failures": [],
            "expected_run_failures": []
        }"#;
        let config = TestConfig::from_json_str(text, Path::new("vulkan.json")).unwrap();
        assert_eq!(config.compile_flags, vec!["--b", "--a", "--c"]);
        assert_eq!(config.run_flags, vec!["--z", "--y"]);
    }

    #[test]
    fn test_missing_field_is_parse_error() {
        let text = r#"{
            "config_name": "cpu",
            "iree_compile_flags": [],
            "skip_compile_tests": [],
            "skip_run_tests": [],
            "expected_compile_failures": [],
            "expected_run_failures": []
        }"#;
        let err = TestConfig::from_json_str(text, Path::new("cpu.json")).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Parse { .. }));
        assert!(err.to_string().contains("iree_run_module_flags"));
    }

    #[test]
    fn test_wrong_field_type_is_parse_error() {
        let text = CPU_CONFIG.replace(r#"["--device=local-task"]"#, r#""--device=local-task""#);
        let err = TestConfig::from_json_str(&text, Path::new("cpu.json")).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Parse { .. }));
    }

    #[test]
    fn test_empty_config_name_is_invalid() {
        let text = CPU_CONFIG.replace(r#""config_name": "cpu""#, r#""config_name": "  ""#);
        let err = TestConfig::from_json_str(&text, Path::new("cpu.json")).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Invalid { .. }));
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let text = CPU_CONFIG.replacen('{', r#"{ "comment": "tracked upstream","#, 1);
        assert!(TestConfig::from_json_str(&text, Path::new("cpu.json")).is_ok());
    }

    #[test]
    fn test_resolve_prefers_explicit_paths() {
        let explicit = vec![PathBuf::from("a.json")];
        let sources = resolve_config_sources(&explicit, Some("b.json;c.json"), Path::new("default.json"));
        assert_eq!(sources, explicit);
    }

    #[test]
    fn test_resolve_splits_env_value() {
        let sources = resolve_config_sources(&[], Some("b.json;;c.json;"), Path::new("default.json"));
        assert_eq!(sources, vec![PathBuf::from("b.json"), PathBuf::from("c.json")]);
    }

    #[test]
    fn test_resolve_falls_back_to_default() {
        let default = Path::new("default.json");
        assert_eq!(resolve_config_sources(&[], None, default), vec![default.to_path_buf()]);
        assert_eq!(resolve_config_sources(&[], Some(""), default), vec![default.to_path_buf()]);
        assert_eq!(resolve_config_sources(&[], Some(" ; "), default), vec![default.to_path_buf()]);
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let missing = std::env::temp_dir().join("iree_suite_missing_config_does_not_exist.json");
        let err = load_configs(&[missing]).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Read { .. }));
    }

    #[test]
    fn test_builders_extend_sets() {
        let config = TestConfig::new("cpu", vec![], vec![])
            .with_skip_compile(["a"])
            .with_skip_run(["b"])
            .with_expected_compile_failures(["c", "c"])
            .with_expected_run_failures(["d"]);
        assert_eq!(config.skip_compile.len(), 1);
        assert_eq!(config.skip_run.len(), 1);
        assert_eq!(config.expected_compile_failures.len(), 1);
        assert_eq!(config.expected_run_failures.len(), 1);
    }
}
