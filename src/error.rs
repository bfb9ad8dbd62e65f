use std::{
    num::{ParseFloatError, ParseIntError},
    path::PathBuf,
    str::Utf8Error,
};
use thiserror::Error;

pub type SvmResult<T> = std::result::Result<T, SvmError>;

#[derive(Debug, Error)]
pub enum SvmError {
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Utf8(#[from] Utf8Error),
    #[error(transparent)]
    ParseInt(#[from] ParseIntError),
    #[error(transparent)]
    ParseFloat(#[from] ParseFloatError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
    #[error("{}:{line}: {reason}", path.display())]
    MalformedInputLine {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    #[error(
        "Expected sample columns \"mother\", \"father\" and \"child\" in trio mode: {}",
        path.display()
    )]
    MissingTrioColumns { path: PathBuf },
    #[error("{names} tool names given, but {files} call files present")]
    ToolNameCountMismatch { names: usize, files: usize },
    #[error("Invalid mode \"{value}\": expected fixed_distance, overlap or significant")]
    UnknownMode { value: String },
    #[error("A chromosome-lengths file (--chrom-lengths) is required in significant mode")]
    MissingChromosomeLengths,
    #[error("Invalid gzip header: {}", path.display())]
    InvalidGzipHeader { path: PathBuf },
}

impl SvmError {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    pub fn malformed_line(
        path: impl Into<PathBuf>,
        line: usize,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedInputLine {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }
}

#[macro_export]
macro_rules! svm_error {
    ($($arg:tt)*) => {
        $crate::error::SvmError::message(format!($($arg)*))
    };
}
