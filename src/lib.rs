#![forbid(unsafe_code)]
//! IREE model test suite harness
//!
//! Drives `iree-compile` and `iree-run-module` over a directory of generated model tests and
//! classifies every (test case, configuration) pair against the configuration's expectation lists.
//!
//! The pipeline is `discover → build_specs → execute → report`:
//!
//! - discovery and spec building come from [`iree_suite_core`]
//! - [`executor`] runs one spec through the external tools behind the [`tools::ToolRunner`] seam
//! - [`cli`] reports sessions (`run`, `list`) and the batch compile driver (`compile-batch`)
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod executor;
pub mod flagfile;
pub mod settings;
pub mod tools;
pub mod version;

pub use iree_suite_core::{TestCase, TestConfig, TestSpec, build_specs, discover, load_configs};

pub use executor::{ExpectedFailurePolicy, Executor, Outcome, OutcomeClass, Stage, ToolFailure};
pub use settings::ToolPaths;
pub use tools::{ProcessToolRunner, ToolInvocation, ToolOutput, ToolRunner};
