//! Configuration for the capability bridge
//!
//! Layered, lowest precedence first: built-in defaults, an optional TOML
//! file, then `HEARTH_*` environment variables.
//!
//! ```toml
//! base_dir = "/var/lib/hearth"
//! enable_analysis = true
//! analyzer_path = "/opt/drcodept/bin/drcodept"
//! analysis_timeout_secs = 60
//! ```

use crate::error::Result;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Environment prefix for every configuration key
pub const ENV_PREFIX: &str = "HEARTH";

/// Input snapshot file name, relative to `base_dir`
pub const INPUT_FILE_NAME: &str = "family_snapshot.json";

/// Output/result file name, relative to `base_dir`
pub const OUTPUT_FILE_NAME: &str = "analysis_output.json";

/// Bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Directory holding both snapshot files; also the analyzer's working directory
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Feature flag gating the subprocess bridge
    #[serde(default)]
    pub enable_analysis: bool,

    /// Fixed path of the external analysis program
    #[serde(default = "default_analyzer_path")]
    pub analyzer_path: PathBuf,

    /// Hard wall-clock limit for one analysis run
    #[serde(default = "default_analysis_timeout")]
    pub analysis_timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            enable_analysis: false,
            analyzer_path: default_analyzer_path(),
            analysis_timeout_secs: default_analysis_timeout(),
        }
    }
}

fn default_base_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hearth")
}

fn default_analyzer_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".drcodept")
        .join("bin")
        .join("drcodept")
}

fn default_analysis_timeout() -> u64 {
    120
}

impl BridgeConfig {
    /// Load configuration from defaults, an optional file and the environment
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let defaults = Self::default();

        let mut builder = Config::builder()
            .set_default("base_dir", defaults.base_dir.to_string_lossy().to_string())?
            .set_default("enable_analysis", defaults.enable_analysis)?
            .set_default(
                "analyzer_path",
                defaults.analyzer_path.to_string_lossy().to_string(),
            )?
            .set_default("analysis_timeout_secs", defaults.analysis_timeout_secs as i64)?;

        if let Some(path) = file {
            debug!("Loading configuration file: {:?}", path);
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }

        let config: Self = builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()?;

        debug!("Effective configuration: {:?}", config);
        Ok(config)
    }

    /// Defaults rooted at a specific directory
    pub fn for_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    /// Path of the sanitized input snapshot
    pub fn input_path(&self) -> PathBuf {
        self.base_dir.join(INPUT_FILE_NAME)
    }

    /// Path of the analysis/suggestion output
    pub fn output_path(&self) -> PathBuf {
        self.base_dir.join(OUTPUT_FILE_NAME)
    }

    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_secs(self.analysis_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clear_env() {
        for key in [
            "HEARTH_BASE_DIR",
            "HEARTH_ENABLE_ANALYSIS",
            "HEARTH_ANALYZER_PATH",
            "HEARTH_ANALYSIS_TIMEOUT_SECS",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = BridgeConfig::load(None).unwrap();
        assert!(!config.enable_analysis);
        assert_eq!(config.analysis_timeout_secs, 120);
        assert!(config.input_path().ends_with(INPUT_FILE_NAME));
        assert!(config.output_path().ends_with(OUTPUT_FILE_NAME));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        std::env::set_var("HEARTH_BASE_DIR", "/tmp/hearth-env");
        std::env::set_var("HEARTH_ENABLE_ANALYSIS", "true");
        std::env::set_var("HEARTH_ANALYSIS_TIMEOUT_SECS", "7");

        let config = BridgeConfig::load(None).unwrap();
        clear_env();

        assert_eq!(config.base_dir, PathBuf::from("/tmp/hearth-env"));
        assert!(config.enable_analysis);
        assert_eq!(config.analysis_timeout(), Duration::from_secs(7));
    }

    #[test]
    #[serial]
    fn test_file_then_env() {
        clear_env();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "base_dir = \"/srv/hearth\"").unwrap();
        writeln!(file, "analysis_timeout_secs = 30").unwrap();

        std::env::set_var("HEARTH_ANALYSIS_TIMEOUT_SECS", "45");
        let config = BridgeConfig::load(Some(file.path())).unwrap();
        clear_env();

        assert_eq!(config.base_dir, PathBuf::from("/srv/hearth"));
        assert_eq!(config.analysis_timeout_secs, 45);
    }
}
