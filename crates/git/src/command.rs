//! Running the git executable

use snap_core::{Result, SnapshotError};
use std::ffi::OsStr;
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Output, Stdio};

/// Environment variable naming the git executable to use
pub const GIT_ENV: &str = "WORLDSNAP_GIT";

fn git_executable() -> String {
    std::env::var(GIT_ENV).unwrap_or_else(|_| "git".to_string())
}

/// Whether a usable git executable is installed
pub fn git_available() -> bool {
    Command::new(git_executable())
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Captured result of a git invocation
#[derive(Debug, Clone)]
pub struct GitOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl GitOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

#[cfg(windows)]
const NULL_DEVICE: &str = "NUL";
#[cfg(not(windows))]
const NULL_DEVICE: &str = "/dev/null";

/// Settings that keep committed and checked out bytes identical
const BYTE_EXACT_CONFIG: [&str; 3] = ["core.autocrlf=false", "core.eol=lf", "core.safecrlf=false"];

/// Builder for a single git invocation
///
/// Output is forced to the C locale so error messages can be matched, and
/// credential prompts are disabled so a missing credential fails instead of
/// blocking. System and global git config are ignored and line ending
/// conversion is off, so snapshots store and restore files byte for byte.
pub struct GitCommand {
    command: Command,
    description: String,
    input: Option<String>,
}

impl GitCommand {
    /// `description` is used as the error context if the command fails
    pub fn new(description: impl Into<String>) -> Self {
        let mut command = Command::new(git_executable());
        command
            .env("LC_ALL", "C")
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .env("GIT_CONFIG_GLOBAL", NULL_DEVICE)
            .stdin(Stdio::null());
        for setting in BYTE_EXACT_CONFIG {
            command.arg("-c").arg(setting);
        }
        Self {
            command,
            description: description.into(),
            input: None,
        }
    }

    pub fn git_dir(mut self, git_dir: &Path) -> Self {
        self.command.arg("--git-dir").arg(git_dir);
        self
    }

    pub fn work_tree(mut self, work_tree: &Path) -> Self {
        self.command.arg("--work-tree").arg(work_tree);
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.command.current_dir(dir);
        self
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.command.arg(arg);
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.command.args(args);
        self
    }

    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.command.env(key, value);
        self
    }

    /// Feed `input` to the command's stdin
    pub fn input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    /// Run and capture output, whatever the exit status
    pub fn output(mut self) -> Result<GitOutput> {
        tracing::debug!(command = ?self.command, "Running git");
        let output = match self.input.take() {
            Some(input) => run_with_input(&mut self.command, input),
            None => self.command.output(),
        }
        .map_err(|e| SnapshotError::io(format!("{}: failed to run git", self.description), e))?;

        Ok(GitOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Run and return stdout, failing on a non-zero exit status
    pub fn run(self) -> Result<String> {
        let description = self.description.clone();
        let output = self.output()?;
        if !output.success() {
            return Err(failure(&description, &output));
        }
        Ok(output.stdout)
    }
}

/// Spawn `command` and write `input` from a separate thread so a full
/// stdout pipe cannot block the writer
fn run_with_input(command: &mut Command, input: String) -> io::Result<Output> {
    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    let stdin = child.stdin.take();
    let writer = std::thread::spawn(move || {
        if let Some(mut stdin) = stdin {
            // A broken pipe shows up as git's own exit status
            let _ = stdin.write_all(input.as_bytes());
        }
    });
    let output = child.wait_with_output()?;
    let _ = writer.join();
    Ok(output)
}

/// Turn a failed invocation into an I/O error carrying git's message
pub fn failure(description: &str, output: &GitOutput) -> SnapshotError {
    let stderr = output.stderr.trim();
    let message = if stderr.is_empty() {
        format!("git exited with status {:?}", output.code)
    } else {
        stderr.to_string()
    };
    SnapshotError::io_message(description, message)
}

/// Explain a failed remote operation in terms of its likely cause
pub fn remote_failure(description: &str, output: &GitOutput) -> SnapshotError {
    let stderr = output.stderr.trim();
    let lower = stderr.to_lowercase();

    let cause = if lower.contains("authentication") || lower.contains("permission denied") {
        "authentication failed"
    } else if lower.contains("could not read from remote") || lower.contains("does not appear to be a git repository") {
        "remote repository not found"
    } else if lower.contains("rejected") || lower.contains("non-fast-forward") {
        "rejected by remote"
    } else if lower.contains("could not resolve host")
        || lower.contains("connection")
        || lower.contains("timed out")
        || lower.contains("network")
    {
        "network error"
    } else {
        return failure(description, output);
    };

    SnapshotError::io_message(format!("{} ({})", description, cause), stderr.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(code: i32, stderr: &str) -> GitOutput {
        GitOutput {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn test_failure_uses_stderr() {
        let err = failure("delete branch", &output(1, "error: boom\n"));
        assert_eq!(err.to_string(), "delete branch: error: boom");

        let err = failure("delete branch", &output(128, ""));
        assert!(err.to_string().contains("status Some(128)"));
    }

    #[test]
    fn test_remote_failure_classification() {
        let err = remote_failure(
            "push",
            &output(128, "fatal: Authentication failed for 'https://example.com/w.git/'"),
        );
        assert!(err.to_string().starts_with("push (authentication failed)"));

        let err = remote_failure("push", &output(128, "ssh: Could not resolve hostname nope"));
        assert!(err.to_string().starts_with("push (network error)"));

        let err = remote_failure("push", &output(1, "something else"));
        assert_eq!(err.to_string(), "push: something else");
    }
}
