//! TOML configuration for step-fuse.

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use fuse_kernel::KernelSettings;
use serde::{Deserialize, Serialize};

use crate::error::CliError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// step-fuse configuration loaded from TOML. Every field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FuseConfig {
    /// Surface model, imported first.
    pub surface: PathBuf,
    /// Volume model, imported second.
    pub volume: PathBuf,
    /// Directory for the BREP output. Unset means the working directory.
    pub output_dir: Option<PathBuf>,
    /// Run the connect pass on the worker pool.
    pub run_parallel: bool,
    pub fuse_tolerance: f64,
    pub connect_tolerance: f64,
    /// Faceting tolerance as a fraction of the model's bounding-box diameter.
    pub tessellation_ratio: f64,
    pub log_level: Option<LogLevel>,
}

impl Default for FuseConfig {
    fn default() -> Self {
        let kernel = KernelSettings::default();
        Self {
            surface: PathBuf::from("last_dura.step"),
            volume: PathBuf::from("last_diff.step"),
            output_dir: None,
            run_parallel: true,
            fuse_tolerance: kernel.fuse_tolerance,
            connect_tolerance: kernel.connect_tolerance,
            tessellation_ratio: kernel.tessellation_ratio,
            log_level: None,
        }
    }
}

impl FuseConfig {
    /// Read `path`, or return the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: FuseConfig = toml::from_str(&content).map_err(|source| CliError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Tolerances must be finite and positive.
    pub fn validate(&self) -> Result<(), CliError> {
        for (name, value) in [
            ("fuse_tolerance", self.fuse_tolerance),
            ("connect_tolerance", self.connect_tolerance),
            ("tessellation_ratio", self.tessellation_ratio),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(CliError::Usage(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        Ok(())
    }
}
