//! Test case discovery.
//!
//! A test case is a directory directly under the suite root that contains both marker files:
//!
//! ```text
//! <root>/
//!   test_abs/
//!     model.mlir            <- program to compile
//!     test_data_flags.txt   <- runtime flags naming the input/expected output files
//!     input_0.npy ...
//! ```
//!
//! Discovery looks exactly one level deep.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Marker file holding the program to compile.
pub const MODEL_FILE_NAME: &str = "model.mlir";

/// Marker file holding the runtime flags for the test's input and expected output data.
pub const DATA_FLAGFILE_NAME: &str = "test_data_flags.txt";

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to read test root '{}': {source}", .path.display())]
    ReadRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A discovered test case directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestCase {
    /// Directory name, used as the identifier in expectation lists
    pub name: String,
    pub dir: PathBuf,
}

impl TestCase {
    pub fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE_NAME)
    }

    pub fn data_flagfile_path(&self) -> PathBuf {
        self.dir.join(DATA_FLAGFILE_NAME)
    }
}

/// Find all test cases directly under `root`, sorted by name.
///
/// Directories with a model but no data flagfile are reported and skipped. Anything else that does
/// not look like a test case is skipped silently.
#[tracing::instrument(skip_all, fields(root = %root.display()))]
pub fn discover(root: &Path) -> Result<Vec<TestCase>, DiscoveryError> {
    let read_error = |source| DiscoveryError::ReadRoot {
        path: root.to_path_buf(),
        source,
    };
    // Tools run with the test directory as working directory, so case paths must not be relative.
    let root = std::path::absolute(root).map_err(read_error)?;
    let entries = fs::read_dir(&root).map_err(read_error)?;

    let mut cases = Vec::new();
    for entry in entries.flatten() {
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }
        let Some(name) = dir.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            tracing::debug!(path = %dir.display(), "skipping directory with non UTF-8 name");
            continue;
        };

        if !dir.join(MODEL_FILE_NAME).is_file() {
            tracing::debug!(test = %name, "no {} found, not a test case", MODEL_FILE_NAME);
            continue;
        }
        if !dir.join(DATA_FLAGFILE_NAME).is_file() {
            tracing::info!("Missing {} for test '{}'", DATA_FLAGFILE_NAME, name);
            continue;
        }

        cases.push(TestCase { name, dir });
    }

    cases.sort();
    tracing::info!("Found {} tests", cases.len());
    Ok(cases)
}
