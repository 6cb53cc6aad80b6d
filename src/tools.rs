//! External tool boundary
//!
//! The compiler and the runtime are opaque programs. Everything this crate knows about them is a
//! command line, a working directory, an exit code and the captured output streams.
//!
//! [`ToolRunner`] is the seam: the default [`ProcessToolRunner`] spawns real processes, tests plug in
//! scripted runners.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// One fully-specified tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append a path argument (lossy for non UTF-8 paths).
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy())
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Program and arguments joined by spaces, suitable for pasting into a shell as a reproducer.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command_line())
    }
}

/// Captured result of a finished tool call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolOutput {
    /// `None` when the process was killed by a signal or never started
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Output standing in for a process that could not be spawned at all.
    ///
    /// A missing or non-executable tool is reported exactly like a tool that rejected its input.
    pub fn spawn_failure(program: &str, err: &io::Error) -> Self {
        Self {
            exit_code: None,
            stdout: String::new(),
            stderr: format!("failed to start '{}': {}", program, err),
        }
    }
}

/// Runs tool invocations. Every call blocks until the tool exits.
pub trait ToolRunner {
    fn invoke(&self, invocation: &ToolInvocation) -> io::Result<ToolOutput>;
}

/// Spawns real processes with `std::process::Command`, capturing stdout and stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessToolRunner;

impl ToolRunner for ProcessToolRunner {
    fn invoke(&self, invocation: &ToolInvocation) -> io::Result<ToolOutput> {
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        if let Some(dir) = &invocation.current_dir {
            command.current_dir(dir);
        }

        let output = command.output()?;
        Ok(ToolOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_joins_program_and_args() {
        let inv = ToolInvocation::new("iree-compile")
            .path_arg(Path::new("/suite/test_abs/model.mlir"))
            .args(["--iree-hal-target-backends=llvm-cpu"])
            .arg("-o")
            .arg("/suite/test_abs/model_cpu.vmfb");
        assert_eq!(
            inv.command_line(),
            "iree-compile /suite/test_abs/model.mlir --iree-hal-target-backends=llvm-cpu -o /suite/test_abs/model_cpu.vmfb"
        );
        assert_eq!(inv.to_string(), inv.command_line());
    }

    #[test]
    fn test_spawn_failure_has_no_exit_code() {
        let err = io::Error::new(io::ErrorKind::NotFound, "No such file or directory");
        let output = ToolOutput::spawn_failure("iree-compile", &err);
        assert!(!output.success());
        assert_eq!(output.exit_code, None);
        assert!(output.stderr.contains("iree-compile"));
    }

    #[test]
    fn test_missing_program_is_io_error() {
        let inv = ToolInvocation::new("iree-suite-definitely-not-a-real-program");
        assert!(ProcessToolRunner.invoke(&inv).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_process_runner_captures_exit_code_and_stderr() {
        let inv = ToolInvocation::new("sh").args(["-c", "echo diagnostics >&2; exit 3"]);
        let output = ProcessToolRunner.invoke(&inv).unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stderr.trim(), "diagnostics");
        assert!(!output.success());
    }

    #[cfg(unix)]
    #[test]
    fn test_process_runner_uses_current_dir() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("marker.txt"), "here").unwrap();
        let inv = ToolInvocation::new("sh")
            .args(["-c", "cat marker.txt"])
            .current_dir(tmp.path());
        let output = ProcessToolRunner.invoke(&inv).unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, "here");
    }
}
