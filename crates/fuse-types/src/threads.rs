use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

/// Number of worker threads handed to the geometry kernel.
/// Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct ThreadCount(NonZeroUsize);

impl ThreadCount {
    pub fn new(count: usize) -> Result<Self, ThreadCountError> {
        NonZeroUsize::new(count)
            .map(Self)
            .ok_or(ThreadCountError::Zero)
    }

    pub fn get(self) -> usize {
        self.0.get()
    }

    /// Name of the BREP file a run with this thread count produces.
    pub fn brep_file_name(self) -> String {
        format!("connected_shape_{}.brep", self.0)
    }
}

impl fmt::Display for ThreadCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ThreadCount {
    type Err = ThreadCountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let count: usize = s
            .trim()
            .parse()
            .map_err(|_| ThreadCountError::NotANumber {
                input: s.to_string(),
            })?;
        Self::new(count)
    }
}

impl TryFrom<usize> for ThreadCount {
    type Error = ThreadCountError;

    fn try_from(count: usize) -> Result<Self, Self::Error> {
        Self::new(count)
    }
}

impl From<ThreadCount> for usize {
    fn from(count: ThreadCount) -> Self {
        count.get()
    }
}

/// Rejected thread-count input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ThreadCountError {
    #[error("thread count must be a positive integer, got {input:?}")]
    NotANumber { input: String },

    #[error("thread count must be at least 1")]
    Zero,
}
