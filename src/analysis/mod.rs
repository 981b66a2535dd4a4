//! Subprocess bridge to the external drift analyzer
//!
//! A run walks a fixed sequence of gates before anything is spawned:
//!
//! ```text
//! feature flag -> analyzer exists -> input snapshot exists -> run
//! ```
//!
//! The analyzer receives the input and output paths as two positional
//! arguments, runs in the snapshot directory, and must write an
//! [`AnalysisResult`] document to the output path. Any previous output is
//! removed before the spawn, and runs on one bridge never overlap. Every
//! failure is a variant of [`AnalysisError`] with a stable
//! [`kind`](AnalysisError::kind).

pub mod runner;

pub use runner::{Invocation, ProcessOutput, ProcessRunner, TokioProcessRunner};

use crate::config::BridgeConfig;
use crate::snapshot::SnapshotStore;
use crate::types::AnalysisResult;
use crate::utils::string::clamp_chars;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Longest stderr excerpt carried in a failure
pub const MAX_STDERR_EXCERPT: usize = 500;

/// How to get the analyzer onto the machine
pub const INSTALL_HINT: &str =
    "install DrCodePT with `pipx install drcodept` or point HEARTH_ANALYZER_PATH at it";

/// Closed set of analysis failures
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("drift analysis is not enabled; set HEARTH_ENABLE_ANALYSIS=true to allow it")]
    NotEnabled,

    #[error("analyzer not installed at {}; {hint}", .path.display())]
    ProgramMissing { path: PathBuf, hint: String },

    #[error("no exported snapshot at {}; export family data first", .0.display())]
    InputMissing(PathBuf),

    #[error("failed to start analyzer: {0}")]
    Spawn(std::io::Error),

    #[error("analyzer exited with {}: {stderr}", exit_label(.code))]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("analyzer timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("failed to parse output: {0}")]
    UnparsableOutput(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl AnalysisError {
    /// Stable machine tag for callers that branch on the failure
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::NotEnabled => "not_enabled",
            AnalysisError::ProgramMissing { .. } => "not_installed",
            AnalysisError::InputMissing(_) => "no_input",
            AnalysisError::Spawn(_) => "spawn_failed",
            AnalysisError::NonZeroExit { .. } => "nonzero_exit",
            AnalysisError::Timeout(_) => "timeout",
            AnalysisError::UnparsableOutput(_) => "unparsable_output",
        }
    }
}

impl From<AnalysisError> for AnalysisResult {
    fn from(err: AnalysisError) -> Self {
        AnalysisResult::failure(err.kind(), err.to_string())
    }
}

/// Feature-gated runner of the external analyzer
pub struct AnalysisBridge {
    enabled: bool,
    program: PathBuf,
    timeout: Duration,
    store: Arc<SnapshotStore>,
    runner: Arc<dyn ProcessRunner>,
    /// Held from the input check until the output has been read back
    run_lock: Mutex<()>,
}

impl AnalysisBridge {
    pub fn new(config: &BridgeConfig, store: Arc<SnapshotStore>) -> Self {
        Self::with_runner(config, store, Arc::new(TokioProcessRunner))
    }

    /// Bridge with a custom process runner
    pub fn with_runner(
        config: &BridgeConfig,
        store: Arc<SnapshotStore>,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        Self {
            enabled: config.enable_analysis,
            program: config.analyzer_path.clone(),
            timeout: config.analysis_timeout(),
            store,
            runner,
            run_lock: Mutex::new(()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Run the analyzer against the current input snapshot
    pub async fn run(&self) -> Result<AnalysisResult, AnalysisError> {
        if !self.enabled {
            return Err(AnalysisError::NotEnabled);
        }

        if !tokio::fs::try_exists(&self.program).await.unwrap_or(false) {
            return Err(AnalysisError::ProgramMissing {
                path: self.program.clone(),
                hint: INSTALL_HINT.to_string(),
            });
        }

        let _run = self.run_lock.lock().await;

        if !self.store.input_exists().await {
            return Err(AnalysisError::InputMissing(
                self.store.input_path().to_path_buf(),
            ));
        }

        // A run that writes nothing must not pick up an older result
        self.store.remove_output().await.map_err(AnalysisError::Spawn)?;

        let invocation = Invocation {
            program: self.program.clone(),
            args: vec![
                self.store.input_path().into(),
                self.store.output_path().into(),
            ],
            working_dir: self.store.base_dir().to_path_buf(),
        };

        info!("Running drift analyzer {:?}", self.program);

        let output = match tokio::time::timeout(self.timeout, self.runner.run(&invocation)).await
        {
            Ok(result) => result.map_err(AnalysisError::Spawn)?,
            Err(_) => {
                warn!("Drift analyzer timed out after {:?}", self.timeout);
                return Err(AnalysisError::Timeout(self.timeout));
            }
        };

        if !output.success() {
            warn!("Drift analyzer failed with {:?}", output.exit_code);
            return Err(AnalysisError::NonZeroExit {
                code: output.exit_code,
                stderr: clamp_chars(output.stderr.trim(), MAX_STDERR_EXCERPT),
            });
        }

        let _guard = self.store.lock_output().await;
        let text = self
            .store
            .read_output()
            .await
            .map_err(|e| AnalysisError::UnparsableOutput(e.to_string()))?
            .ok_or_else(|| {
                AnalysisError::UnparsableOutput("analyzer wrote no output file".to_string())
            })?;

        let result: AnalysisResult = serde_json::from_str(&text)
            .map_err(|e| AnalysisError::UnparsableOutput(e.to_string()))?;

        info!("Drift analysis finished (success: {})", result.success);
        Ok(result)
    }

    /// Like [`run`](Self::run) but folds failures into the result shape
    pub async fn run_analysis(&self) -> AnalysisResult {
        self.run().await.unwrap_or_else(AnalysisResult::from)
    }

    /// Read a previously produced result without running anything
    ///
    /// `None` means no output file exists; this never fails.
    pub async fn read_result(&self) -> Option<AnalysisResult> {
        match self.store.read_output().await {
            Ok(Some(text)) => Some(serde_json::from_str(&text).unwrap_or_else(|e| {
                AnalysisError::UnparsableOutput(e.to_string()).into()
            })),
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to read analysis output: {}", e);
                None
            }
        }
    }

    /// Remove both snapshot files, ignoring errors
    pub async fn cleanup(&self) {
        self.store.cleanup().await;
    }
}
