use std::path::PathBuf;
use thiserror::Error;

/// Failures raised while building tables or sampling histories.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("empty table: {0}")]
    EmptyTable(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no interaction target for draw {draw} at energy {energy}")]
    TargetSelection { energy: f64, draw: f64 },

    #[error("{routine} did not accept a sample after {iterations} attempts")]
    SamplingExhausted {
        routine: &'static str,
        iterations: usize,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidInput(message.into())
    }
}
