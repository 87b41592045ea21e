use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WavError {
    #[error("sample rate {rate} Hz cannot be stored in a wav header")]
    InvalidSampleRate { rate: u32 },
    #[error("payload of {bytes} bytes does not fit a wav header")]
    PayloadTooLarge { bytes: usize },
    #[error("malformed wav header: {reason}")]
    MalformedHeader { reason: String },
    #[error("failed to create output file: {path:?}")]
    SinkNotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to create output directory: {path:?}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write wav data to {path:?}")]
    WriteFailed {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },
}

impl WavError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedHeader {
            reason: reason.into(),
        }
    }

    pub(crate) fn with_path(self, path: &std::path::Path) -> Self {
        match self {
            Self::WriteFailed { path: None, source } => Self::WriteFailed {
                path: Some(path.to_path_buf()),
                source,
            },
            other => other,
        }
    }
}
