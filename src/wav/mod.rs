//! 16bit モノラル PCM WAV の書き出し
mod encoder;
mod error;
mod header;

pub use encoder::{OutputSink, WavEncoder, DEFAULT_CHUNK_BYTES};
pub use error::WavError;
pub use header::{WavHeader, BITS_PER_SAMPLE, CHANNELS, HEADER_LEN};
