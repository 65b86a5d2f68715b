use std::ffi::OsString;
use std::fmt;
use std::fs::File;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use wait_timeout::ChildExt;

/// A program plus its argument list, run from an explicit directory.
/// Arguments are passed through as-is, no shell is involved.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub cwd: PathBuf,
}

impl Invocation {
    pub fn new(program: impl Into<OsString>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).current_dir(&self.cwd);
        cmd
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessResult {
    Success,
    Failure(i32),
    Timeout,
    Signal(i32),
}

impl From<ExitStatus> for ProcessResult {
    fn from(status: ExitStatus) -> Self {
        match (status.code(), status.signal()) {
            (Some(0), _) => ProcessResult::Success,
            (Some(code), _) => ProcessResult::Failure(code),
            (None, Some(signal)) => ProcessResult::Signal(signal),
            (None, None) => ProcessResult::Failure(-1),
        }
    }
}

impl fmt::Display for ProcessResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessResult::Success => write!(f, "exited normally"),
            ProcessResult::Failure(code) => write!(f, "exited with status {code}"),
            ProcessResult::Timeout => write!(f, "timed out"),
            ProcessResult::Signal(signal) => {
                write!(f, "terminated by {}", signal_name(*signal))
            }
        }
    }
}

fn signal_name(signal: i32) -> String {
    match signal {
        libc::SIGABRT => "SIGABRT".to_string(),
        libc::SIGFPE => "SIGFPE".to_string(),
        libc::SIGKILL => "SIGKILL".to_string(),
        libc::SIGSEGV => "SIGSEGV".to_string(),
        libc::SIGBUS => "SIGBUS".to_string(),
        libc::SIGTERM => "SIGTERM".to_string(),
        libc::SIGUSR2 => "SIGUSR2".to_string(),
        other => format!("signal {other}"),
    }
}

/// Exit status of a finished process plus its stdout followed by its stderr.
#[derive(Debug)]
pub struct Captured {
    pub status: ExitStatus,
    pub text: String,
}

impl Captured {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Runs to completion, collecting both output streams.
pub fn capture(invocation: &Invocation) -> Result<Captured> {
    let output = invocation
        .command()
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("Failed to run `{invocation}`"))?;

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));

    Ok(Captured {
        status: output.status,
        text,
    })
}

/// Runs with stdout and stderr written to files. With a `timeout`, a child
/// still running at the deadline is killed and reported as `Timeout`.
pub fn run_redirected(
    invocation: &Invocation,
    stdout_path: &Path,
    stderr_path: &Path,
    timeout: Option<Duration>,
) -> Result<ProcessResult> {
    let stdout = File::create(stdout_path)
        .with_context(|| format!("Failed to create {}", stdout_path.display()))?;
    let stderr = File::create(stderr_path)
        .with_context(|| format!("Failed to create {}", stderr_path.display()))?;

    let mut child = invocation
        .command()
        .stdin(Stdio::null())
        .stdout(stdout)
        .stderr(stderr)
        .spawn()
        .with_context(|| format!("Failed to spawn `{invocation}`"))?;

    let status = match timeout {
        Some(limit) => match child.wait_timeout(limit)? {
            Some(status) => status,
            None => {
                child.kill()?;
                child.wait()?;
                return Ok(ProcessResult::Timeout);
            }
        },
        None => child.wait()?,
    };

    Ok(ProcessResult::from(status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempdir::TempDir;

    #[test]
    fn display_joins_program_and_args() {
        let inv = Invocation::new("javac", ".").arg("Main.java");
        assert_eq!(inv.to_string(), "javac Main.java");
    }

    #[test]
    fn capture_collects_stdout_then_stderr() {
        let dir = TempDir::new("grade_process").unwrap();
        let inv = Invocation::new("sh", dir.path())
            .args(["-c", "echo out; echo err >&2; exit 3"]);

        let captured = capture(&inv).unwrap();
        assert!(!captured.success());
        assert_eq!(captured.status.code(), Some(3));
        assert_eq!(captured.text, "out\nerr\n");
    }

    #[test]
    fn capture_reports_missing_program() {
        let inv = Invocation::new("definitely-not-a-real-program-xyz", ".");
        assert!(capture(&inv).is_err());
    }

    #[test]
    fn run_redirected_writes_stdout_to_file() {
        let dir = TempDir::new("grade_process").unwrap();
        let out = dir.path().join("out");
        let err = dir.path().join("err");
        let inv = Invocation::new("echo", dir.path()).args(["a-b", "c"]);

        let result = run_redirected(&inv, &out, &err, None).unwrap();
        assert_eq!(result, ProcessResult::Success);
        assert_eq!(fs::read_to_string(&out).unwrap(), "a-b c\n");
    }

    #[test]
    fn run_redirected_kills_on_timeout() {
        let dir = TempDir::new("grade_process").unwrap();
        let out = dir.path().join("out");
        let err = dir.path().join("err");
        let inv = Invocation::new("sleep", dir.path()).arg("5");

        let result =
            run_redirected(&inv, &out, &err, Some(Duration::from_millis(100))).unwrap();
        assert_eq!(result, ProcessResult::Timeout);
    }

    #[test]
    fn run_redirected_reports_signals() {
        let dir = TempDir::new("grade_process").unwrap();
        let out = dir.path().join("out");
        let err = dir.path().join("err");
        let inv = Invocation::new("sh", dir.path()).args(["-c", "kill -SEGV $$"]);

        let result = run_redirected(&inv, &out, &err, None).unwrap();
        assert_eq!(result, ProcessResult::Signal(libc::SIGSEGV));
        assert_eq!(result.to_string(), "terminated by SIGSEGV");
    }
}
