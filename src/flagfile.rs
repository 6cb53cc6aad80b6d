//! Flagfiles written next to compiled modules.
//!
//! A flagfile lists one command-line flag per line. After a successful compile the harness writes
//! `config_<name>_flags.txt` so a failing case can be reproduced by hand:
//!
//! ```text
//! cd iree_tests/onnx/node/generated/test_abs
//! iree-run-module --flagfile=config_cpu_flags.txt --flagfile=test_data_flags.txt
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlagfileError {
    #[error("failed to write flagfile '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Render flags one per line, each line newline-terminated.
pub fn render_flagfile<S: AsRef<str>>(flags: &[S]) -> String {
    flags.iter().map(|f| format!("{}\n", f.as_ref())).collect()
}

/// Contents of a config flagfile: the configuration's run flags, then the compiled module.
///
/// The module is referenced by file name only since the flagfile lives in the same directory.
pub fn config_flagfile_contents(run_flags: &[String], module_file_name: &str) -> String {
    let mut flags: Vec<String> = run_flags.to_vec();
    flags.push(format!("--module={}", module_file_name));
    render_flagfile(&flags)
}

/// Write (or overwrite) a config flagfile.
pub fn write_config_flagfile(path: &Path, run_flags: &[String], module_file_name: &str) -> Result<(), FlagfileError> {
    fs::write(path, config_flagfile_contents(run_flags, module_file_name)).map_err(|source| FlagfileError::Write {
        path: path.to_path_buf(),
        source,
    })
}
