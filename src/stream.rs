//! Child-process plumbing: spawn pandoc, feed stdin, drain stdout/stderr.
//!
//! ## Why drive all three pipes at once?
//!
//! pandoc starts writing output before it has read all of its input. If we
//! wrote the whole source first and only then read stdout, a large document
//! would fill the stdout pipe, pandoc would block on its write, stop reading
//! stdin, and both sides would wait forever. [`PandocProcess::finish`]
//! therefore writes stdin while `wait_with_output` drains stdout and stderr,
//! and completes once the process has exited *and* both pipes hit EOF.

use crate::config::PandocConfig;
use crate::error::PandocError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tracing::debug;

/// A running pandoc child with all three standard streams piped.
///
/// Returned by [`crate::Pandoc::stream`] for callers that want to drive the
/// pipes themselves. Dropping it kills the child.
#[derive(Debug)]
pub struct PandocProcess {
    child: Child,
    program: PathBuf,
    args: Vec<OsString>,
}

impl PandocProcess {
    /// Spawn `config.pandoc_bin` with `args`. Nothing is written or read yet.
    pub(crate) fn spawn(config: &PandocConfig, args: Vec<OsString>) -> Result<Self, PandocError> {
        let program = config.pandoc_bin.clone();
        debug!("Spawning {} {:?}", program.display(), args);

        let mut cmd = Command::new(&program);
        cmd.args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(ref dir) = config.working_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &config.env {
            cmd.env(key, value);
        }

        let child = cmd.spawn().map_err(|source| PandocError::Spawn {
            path: program.clone(),
            source,
        })?;

        Ok(Self {
            child,
            program,
            args,
        })
    }

    /// The binary that was started.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// The argument vector pandoc was started with, paths included byte for
    /// byte.
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// OS process id, `None` once the child has been reaped.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Take ownership of pandoc's stdin. Drop it to signal end of input.
    pub fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.child.stdin.take()
    }

    /// Take ownership of pandoc's stdout.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Take ownership of pandoc's stderr.
    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.child.stderr.take()
    }

    /// Kill the child and wait for it to exit.
    ///
    /// A conversion whose process is killed this way reports
    /// [`PandocError::Terminated`] (on Unix) from [`PandocProcess::finish`].
    pub async fn kill(&mut self) -> Result<(), PandocError> {
        self.child.kill().await?;
        Ok(())
    }

    /// Hand back the raw tokio child.
    pub fn into_child(self) -> Child {
        self.child
    }

    /// Write `input` (if any) to stdin, close it, and collect everything
    /// pandoc writes until it exits.
    ///
    /// A broken pipe on stdin is not an error by itself: pandoc may exit
    /// before consuming its input, and its exit status and stderr say why.
    pub async fn finish(self, input: Option<&[u8]>) -> Result<ProcessOutput, PandocError> {
        let PandocProcess { mut child, .. } = self;
        let stdin = child.stdin.take();

        let feed = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            if let Some(bytes) = input {
                ignore_broken_pipe(stdin.write_all(bytes).await)?;
            }
            ignore_broken_pipe(stdin.shutdown().await)
            // `stdin` dropped here: pandoc sees EOF.
        };

        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;
        fed?;

        Ok(ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status,
        })
    }
}

fn ignore_broken_pipe(result: std::io::Result<()>) -> std::io::Result<()> {
    match result {
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
            debug!("pandoc closed stdin early");
            Ok(())
        }
        other => other,
    }
}

/// Everything a finished pandoc process produced.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Accumulated stdout, in arrival order.
    pub stdout: String,
    /// Accumulated stderr, in arrival order.
    pub stderr: String,
    /// How the process ended.
    pub status: ExitStatus,
}

impl ProcessOutput {
    /// Exit code, or `None` when the process was killed by a signal.
    pub fn exit_code(&self) -> Option<i32> {
        self.status.code()
    }

    /// Apply the success policy:
    ///
    /// 1. exit code ≠ 0 → [`PandocError::NonZeroExit`]
    /// 2. no exit code  → [`PandocError::Terminated`]
    /// 3. exit 0 but stderr non-empty → [`PandocError::Diagnostic`]
    /// 4. otherwise → `Ok(stdout)`
    ///
    /// Rule 3 is strict on purpose: warnings pandoc prints on success are
    /// surfaced as failures rather than dropped.
    pub fn into_result(self) -> Result<String, PandocError> {
        match self.status.code() {
            Some(0) => {}
            Some(code) => {
                return Err(PandocError::NonZeroExit {
                    code,
                    stderr: self.stderr,
                })
            }
            None => {
                return Err(PandocError::Terminated {
                    stderr: self.stderr,
                })
            }
        }

        if !self.stderr.is_empty() {
            return Err(PandocError::Diagnostic(self.stderr));
        }

        Ok(self.stdout)
    }
}
