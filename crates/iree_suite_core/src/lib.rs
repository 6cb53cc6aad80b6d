#![forbid(unsafe_code)]
//! Shared data model for the IREE model test suite.
//!
//! This crate owns everything that can be decided without spawning a process:
//!
//! - [`config`]: test configuration documents (compile/run flags plus expectation lists)
//! - [`discovery`]: finding test case directories on disk
//! - [`spec`]: joining test cases with configurations into immutable [`spec::TestSpec`] values
//!
//! The pipeline is `discover → build_specs → execute → report`. Execution and reporting live in the
//! `iree_suite` crate, which depends on this one (never the other way around).

pub mod config;
pub mod discovery;
pub mod spec;

pub use config::{ConfigLoadError, TestConfig, load_configs, resolve_config_sources};
pub use discovery::{DiscoveryError, TestCase, discover};
pub use spec::{TestSpec, build_specs, filter_specs};
