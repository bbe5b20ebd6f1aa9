//! External Process Module
//!
//! Blocking execution of an external tool with an explicit argument vector.
//! Both output streams are captured; `Command::output` drains them
//! concurrently, so a chatty decoder cannot fill a pipe and stall.
//!
//! Spawn failures are returned as the raw [`std::io::Error`] so callers can
//! tell "the executable is gone" (`ErrorKind::NotFound`) from other failures.

use crate::logging::log_external_tool;
use crate::path_safety::display_command;
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::debug;

/// A program plus its argument vector. Never passed through a shell.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

/// Outcome of a process that was spawned and waited on.
#[derive(Debug, Clone)]
pub struct ExternalCommandResult {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl ExternalCommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Trimmed stderr, falling back to stdout when stderr is empty.
    pub fn diagnostics(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}

impl ExternalCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// The command line as it would be typed, for logs and error reports.
    pub fn command_line(&self) -> String {
        display_command(&self.program, &self.args)
    }

    /// Spawns the program, waits for it and captures both streams.
    pub fn run(&self) -> io::Result<ExternalCommandResult> {
        let command_line = self.command_line();
        debug!(command = %command_line, "Executing external command");

        let start = Instant::now();
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .output()?;
        let duration = start.elapsed();

        let result = ExternalCommandResult {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration,
        };

        log_external_tool(
            &self.program.to_string_lossy(),
            &command_line,
            result.diagnostics(),
            result.exit_code,
            duration,
        );

        Ok(result)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_run_success_captures_stdout() {
        let result = ExternalCommand::new("/bin/sh")
            .args(["-c", "echo hello"])
            .run()
            .unwrap();
        assert!(result.success());
        assert_eq!(result.stdout.trim(), "hello");
        assert_eq!(result.diagnostics(), "hello");
    }

    #[test]
    fn test_run_failure_reports_exit_code_and_stderr() {
        let result = ExternalCommand::new("/bin/sh")
            .args(["-c", "echo broken stream >&2; exit 3"])
            .run()
            .unwrap();
        assert!(!result.success());
        assert_eq!(result.exit_code, Some(3));
        assert_eq!(result.diagnostics(), "broken stream");
    }

    #[test]
    fn test_missing_program_is_not_found() {
        let err = ExternalCommand::new("/nonexistent/decoder-xyz")
            .arg("-o")
            .run()
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_command_line_rendering() {
        let cmd = ExternalCommand::new("/usr/bin/vgmstream-cli")
            .args(["-F", "-o"])
            .arg("/out/a b.wav")
            .arg("/in/a.snu");
        assert_eq!(
            cmd.command_line(),
            "/usr/bin/vgmstream-cli -F -o \"/out/a b.wav\" /in/a.snu"
        );
        assert_eq!(cmd.get_args().len(), 4);
    }
}
