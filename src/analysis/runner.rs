//! Process runner seam for the analysis bridge
//!
//! The real runner spawns the program directly from an argument vector. No
//! shell is involved, so no value is ever interpreted as shell syntax.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{ChildStderr, Command};
use tracing::debug;

/// Upper bound on buffered stderr; the remainder is drained and discarded
pub const MAX_STDERR_CAPTURE: u64 = 64 * 1024;

/// How long stderr may stay open once the analyzer itself has exited
pub const STDERR_GRACE: Duration = Duration::from_millis(200);

/// A fully resolved program invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub working_dir: PathBuf,
}

/// What the bridge keeps from a finished process
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs one invocation to completion
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<ProcessOutput>;
}

/// Spawns real child processes with tokio
///
/// Dropping the returned future kills the child, which is how a timeout
/// requests termination.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner;

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<ProcessOutput> {
        debug!(
            "Spawning {:?} with {} args in {:?}",
            invocation.program,
            invocation.args.len(),
            invocation.working_dir
        );

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut captured = Vec::new();
        let status = {
            let capture = capture_stderr(child.stderr.take(), &mut captured);
            tokio::pin!(capture);
            let mut capture_done = false;

            let status = loop {
                tokio::select! {
                    status = child.wait() => break status?,
                    result = &mut capture, if !capture_done => {
                        capture_done = true;
                        if let Err(e) = result {
                            debug!("Stopped reading analyzer stderr: {}", e);
                        }
                    }
                }
            };

            // Background helpers can keep the pipe open after the analyzer exits
            if !capture_done && tokio::time::timeout(STDERR_GRACE, &mut capture).await.is_err() {
                debug!(
                    "Analyzer stderr still open {:?} after exit, keeping what was read",
                    STDERR_GRACE
                );
            }
            status
        };

        Ok(ProcessOutput {
            exit_code: status.code(),
            stderr: String::from_utf8_lossy(&captured).into_owned(),
        })
    }
}

/// Read up to [`MAX_STDERR_CAPTURE`] bytes into `buf`, then drain the rest
async fn capture_stderr(pipe: Option<ChildStderr>, buf: &mut Vec<u8>) -> std::io::Result<()> {
    let Some(mut pipe) = pipe else {
        return Ok(());
    };
    (&mut pipe).take(MAX_STDERR_CAPTURE).read_to_end(buf).await?;
    tokio::io::copy(&mut pipe, &mut tokio::io::sink()).await?;
    Ok(())
}
