//! 合成音声の変換ステージ
//!
//! エンジン出力の `AudioBuffer` を `LinearResampler` でターゲットレートへ揃え、
//! `AccumulationBuffer` に到着順で蓄積し、最後に `quantizer` で 16bit PCM にする。
mod accumulator;
mod buffer;
pub mod quantizer;
mod resampler;

pub use accumulator::{AccumulationBuffer, AccumulationError};
pub use buffer::AudioBuffer;
pub use quantizer::{quantize_i16, quantize_into, quantize_sample};
pub use resampler::{LinearResampler, ResampleError};
