use std::path::PathBuf;
use std::process::ExitCode;

use fuse_kernel::KernelError;
use fuse_ops::OpError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("{0}")]
    Read(KernelError),
    #[error("{0}")]
    Geometry(KernelError),
    #[error("{0}")]
    Write(KernelError),
}

impl CliError {
    /// Process status: 1 for bad input, 2 when the geometry work or the export fails.
    pub fn status(&self) -> u8 {
        match self {
            CliError::Usage(_)
            | CliError::ConfigRead { .. }
            | CliError::ConfigParse { .. }
            | CliError::Read(_) => 1,
            CliError::Geometry(_) | CliError::Write(_) => 2,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.status())
    }
}

impl From<KernelError> for CliError {
    fn from(err: KernelError) -> Self {
        match err {
            KernelError::ReadFailed { .. } => CliError::Read(err),
            KernelError::WriteFailed { .. } => CliError::Write(err),
            _ => CliError::Geometry(err),
        }
    }
}

impl From<OpError> for CliError {
    fn from(err: OpError) -> Self {
        match err {
            OpError::Kernel(err) => err.into(),
            OpError::InvalidParameter { reason } => CliError::Usage(reason),
        }
    }
}
