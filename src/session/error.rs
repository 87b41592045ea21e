use thiserror::Error;

use crate::audio_pipeline::{AccumulationError, ResampleError};
use crate::engine::EngineError;
use crate::wav::WavError;

/// 呼び出し側へ提示する失敗の分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    ResampleFailed,
    BufferGrowthFailed,
    NoAccumulatedAudio,
    SinkNotWritable,
    DirectoryCreationFailed,
    WriteFailed,
    ProducerSignaledFailure,
    Cancelled,
    UnsupportedSampleRate,
    EngineUnavailable,
    InvalidTransition,
    Internal,
}

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("resampling failed in session {session_id}")]
    ResampleFailed {
        session_id: String,
        #[source]
        source: ResampleError,
    },
    #[error("accumulation buffer growth failed in session {session_id}")]
    BufferGrowthFailed {
        session_id: String,
        #[source]
        source: AccumulationError,
    },
    #[error("session {session_id} finished without any audio")]
    NoAccumulatedAudio { session_id: String },
    #[error("writing wav output for session {session_id} failed")]
    Output {
        session_id: String,
        #[source]
        source: WavError,
    },
    #[error("speech engine reported failure in session {session_id}: {reason}")]
    ProducerSignaledFailure { session_id: String, reason: String },
    #[error("session {session_id} was cancelled")]
    Cancelled { session_id: String },
    #[error("unsupported target sample rate {rate} Hz (supported: {supported:?})")]
    UnsupportedSampleRate { rate: u32, supported: Vec<u32> },
    #[error("speech engine could not start session {session_id}")]
    Engine {
        session_id: String,
        #[source]
        source: EngineError,
    },
    #[error("session {session_id} cannot {event} while {state}")]
    InvalidTransition {
        session_id: String,
        state: &'static str,
        event: &'static str,
    },
    #[error("session {session_id} worker stopped unexpectedly: {message}")]
    WorkerLost { session_id: String, message: String },
}

impl SynthesisError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::ResampleFailed { .. } => FailureKind::ResampleFailed,
            Self::BufferGrowthFailed { .. } => FailureKind::BufferGrowthFailed,
            Self::NoAccumulatedAudio { .. } => FailureKind::NoAccumulatedAudio,
            Self::Output { source, .. } => match source {
                WavError::SinkNotWritable { .. } => FailureKind::SinkNotWritable,
                WavError::DirectoryCreationFailed { .. } => FailureKind::DirectoryCreationFailed,
                WavError::WriteFailed { .. }
                | WavError::InvalidSampleRate { .. }
                | WavError::PayloadTooLarge { .. }
                | WavError::MalformedHeader { .. } => FailureKind::WriteFailed,
            },
            Self::ProducerSignaledFailure { .. } => FailureKind::ProducerSignaledFailure,
            Self::Cancelled { .. } => FailureKind::Cancelled,
            Self::UnsupportedSampleRate { .. } => FailureKind::UnsupportedSampleRate,
            Self::Engine { .. } => FailureKind::EngineUnavailable,
            Self::InvalidTransition { .. } => FailureKind::InvalidTransition,
            Self::WorkerLost { .. } => FailureKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn output_errors_keep_io_cause() {
        let err = SynthesisError::Output {
            session_id: "s".into(),
            source: WavError::DirectoryCreationFailed {
                path: "/nope".into(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            },
        };
        assert_eq!(err.kind(), FailureKind::DirectoryCreationFailed);
        let cause = err.source().and_then(|wav| wav.source());
        assert!(cause.is_some());
    }

    #[test]
    fn mid_write_failure_maps_to_write_failed() {
        let err = SynthesisError::Output {
            session_id: "s".into(),
            source: WavError::WriteFailed {
                path: Some("out.wav".into()),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            },
        };
        assert_eq!(err.kind(), FailureKind::WriteFailed);
    }
}
