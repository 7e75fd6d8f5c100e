//! External command execution.
//!
//! Every toolchain binary this crate drives (`javac`, `aapt`, `jarsigner`,
//! `zipalign`, the SDK `android` tool) goes through the [`CommandRunner`]
//! seam. The production implementation spawns real processes; tests
//! substitute scripted runners to assert what would have been executed
//! without needing a toolchain installed.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use crate::error::CommandError;

/// Captured result of a completed external command.
#[derive(Debug, Clone)]
pub struct Output {
    /// Accumulated standard output, lossily decoded as UTF-8.
    pub stdout: String,
    /// Accumulated standard error, lossily decoded as UTF-8.
    pub stderr: String,
    /// Exit code, if the process was not killed by a signal.
    pub code: Option<i32>,
}

/// Per-invocation options for a command run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Working directory for the spawned process. Callers that depend on
    /// working-directory state must serialize their own invocations.
    pub cwd: Option<PathBuf>,
}

/// Abstraction over spawning an external process and waiting for it.
///
/// A non-zero exit status is reported as [`CommandError::Failed`] carrying
/// the command, its arguments and captured stderr. The runner never retries
/// and never interprets tool-specific output; that is the caller's job.
/// Implementations hold no shared state, so concurrent calls from
/// independent callers are safe.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Runs `program` with `args`, capturing stdout and stderr, and waits
    /// for completion.
    async fn run(
        &self,
        program: &str,
        args: &[String],
        opts: &RunOptions,
    ) -> Result<Output, CommandError>;
}

/// Production runner backed by [`tokio::process::Command`].
///
/// Bare program names are resolved through `PATH` before spawning so that a
/// missing tool surfaces as a spawn failure with the lookup diagnostic
/// instead of a raw OS error.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    fn resolve(program: &str) -> Result<PathBuf, CommandError> {
        let as_path = Path::new(program);
        if as_path.components().count() > 1 {
            return Ok(as_path.to_path_buf());
        }
        which::which(program).map_err(|e| CommandError::Spawn {
            program: program.to_string(),
            reason: e.to_string(),
        })
    }
}

impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        opts: &RunOptions,
    ) -> Result<Output, CommandError> {
        let resolved = Self::resolve(program)?;

        let mut command = tokio::process::Command::new(&resolved);
        command.args(args).stdin(Stdio::null());
        if let Some(cwd) = &opts.cwd {
            command.current_dir(cwd);
        }

        log::debug!("running {} {}", resolved.display(), args.join(" "));

        let raw = command.output().await.map_err(|e| CommandError::Spawn {
            program: program.to_string(),
            reason: e.to_string(),
        })?;

        let output = Output {
            stdout: String::from_utf8_lossy(&raw.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&raw.stderr).into_owned(),
            code: raw.status.code(),
        };

        if raw.status.success() {
            Ok(output)
        } else {
            Err(CommandError::Failed {
                program: program.to_string(),
                args: args.to_vec(),
                code: output.code,
                stderr: output.stderr,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_of_successful_command() {
        let runner = ProcessRunner;
        let out = runner
            .run("echo", &["hello".to_string()], &RunOptions::default())
            .await
            .unwrap();
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.code, Some(0));
    }

    #[tokio::test]
    async fn nonzero_exit_reports_failure_with_context() {
        let runner = ProcessRunner;
        let err = runner
            .run(
                "sh",
                &["-c".to_string(), "echo oops >&2; exit 3".to_string()],
                &RunOptions::default(),
            )
            .await
            .unwrap_err();
        match err {
            CommandError::Failed {
                program,
                code,
                stderr,
                ..
            } => {
                assert_eq!(program, "sh");
                assert_eq!(code, Some(3));
                assert!(stderr.contains("oops"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_program_is_a_spawn_error() {
        let runner = ProcessRunner;
        let err = runner
            .run(
                "definitely-not-a-real-tool-5309",
                &[],
                &RunOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }

    #[tokio::test]
    async fn cwd_option_is_honored() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessRunner;
        let out = runner
            .run(
                "pwd",
                &[],
                &RunOptions {
                    cwd: Some(dir.path().to_path_buf()),
                },
            )
            .await
            .unwrap();
        let reported = std::fs::canonicalize(out.stdout.trim()).unwrap();
        let expected = std::fs::canonicalize(dir.path()).unwrap();
        assert_eq!(reported, expected);
    }
}
