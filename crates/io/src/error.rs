use std::path::PathBuf;

use thiserror::Error;

/// Failures reading an input table or writing a report artifact.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file type '{extension}' for {}", .path.display())]
    Unsupported { path: PathBuf, extension: String },

    #[error("{}: malformed delimited text: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{}: {message}", .path.display())]
    Spreadsheet { path: PathBuf, message: String },

    #[error("cannot write {}: {message}", .path.display())]
    Write { path: PathBuf, message: String },
}

impl IoError {
    pub(crate) fn write(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::Write {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Read { path, .. }
            | Self::Unsupported { path, .. }
            | Self::Csv { path, .. }
            | Self::Spreadsheet { path, .. }
            | Self::Write { path, .. } => path,
        }
    }
}
