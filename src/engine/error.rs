use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("unknown voice: {voice}")]
    UnknownVoice { voice: String },
    #[error("speech engine failed to start: {message}")]
    StartFailed { message: String },
    #[error("session {session_id} no longer accepts audio")]
    SessionClosed { session_id: String },
}
