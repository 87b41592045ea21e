pub mod audio_pipeline;
pub mod config;
pub mod engine;
pub mod session;
pub mod synthesizer;
pub mod wav;

pub use config::ConfigSet;
pub use session::{FailureKind, SynthesisError, SynthesisReport};
pub use synthesizer::SpeechSynthesizer;
