use thiserror::Error;

use super::AudioBuffer;

#[derive(Debug, Error, PartialEq)]
pub enum ResampleError {
    #[error("invalid sample rate: {rate} Hz")]
    InvalidRate { rate: f64 },
    #[error("buffer at {actual} Hz fed to a {expected} Hz resampler")]
    RateMismatch { expected: f64, actual: f64 },
}

/// 線形補間ベースのストリーミングリサンプラ
///
/// 出力フレーム `k` は入力ストリーム全体での位置 `k * in / out` に置かれる。
/// チャンク境界をまたぐ補間のため、直前チャンクの末尾サンプルと出力済みフレーム数を保持する。
/// そのため合計出力長は入力の分割方法に依存しない。
#[derive(Debug, Clone)]
pub struct LinearResampler {
    input_rate: f64,
    output_rate: f64,
    consumed: u64,
    emitted: u64,
    previous: Option<f32>,
}

impl LinearResampler {
    /// 入出力サンプルレートを指定して作成
    pub fn new(input_rate: f64, output_rate: f64) -> Result<Self, ResampleError> {
        for rate in [input_rate, output_rate] {
            if !(rate.is_finite() && rate > 0.0) {
                return Err(ResampleError::InvalidRate { rate });
            }
        }
        Ok(Self {
            input_rate,
            output_rate,
            consumed: 0,
            emitted: 0,
            previous: None,
        })
    }

    pub fn input_rate(&self) -> f64 {
        self.input_rate
    }

    pub fn output_rate(&self) -> f64 {
        self.output_rate
    }

    pub fn is_passthrough(&self) -> bool {
        self.input_rate == self.output_rate
    }

    /// バッファを出力レートへ変換（同一レートならそのまま返す）
    pub fn process(&mut self, buffer: AudioBuffer) -> Result<AudioBuffer, ResampleError> {
        if buffer.sample_rate() != self.input_rate {
            return Err(ResampleError::RateMismatch {
                expected: self.input_rate,
                actual: buffer.sample_rate(),
            });
        }
        if self.is_passthrough() {
            return Ok(AudioBuffer::new(self.output_rate, buffer.into_samples()));
        }
        let output = self.resample(buffer.samples());
        Ok(AudioBuffer::new(self.output_rate, output))
    }

    /// 次のチャンクを変換する
    ///
    /// 右隣のサンプルが未着の出力フレームは次のチャンク（または `flush`）まで保留される。
    pub fn resample(&mut self, samples: &[f32]) -> Vec<f32> {
        if self.is_passthrough() {
            return samples.to_vec();
        }
        let Some(&last) = samples.last() else {
            return Vec::new();
        };

        let start = self.consumed;
        let end = start + samples.len() as u64;
        let first = samples[0];
        let previous = self.previous.unwrap_or(first);
        let at = |index: i64| -> f32 {
            if index < 0 {
                previous
            } else {
                samples.get(index as usize).copied().unwrap_or(last)
            }
        };

        let mut output = Vec::new();
        while self.emitted_before(end - 1) {
            let position = self.emitted as f64 * self.input_rate / self.output_rate - start as f64;
            let base = (position.floor() as i64).max(-1);
            let frac = (position - base as f64).clamp(0.0, 1.0) as f32;
            let a = at(base);
            let b = at(base + 1);
            output.push(a + (b - a) * frac);
            self.emitted += 1;
        }

        self.consumed = end;
        self.previous = Some(last);
        output
    }

    /// ストリーム終端。保留中の出力フレームを末尾サンプルで埋めて返し、状態を初期化する
    pub fn flush(&mut self) -> Vec<f32> {
        let mut output = Vec::new();
        if let Some(last) = self.previous {
            while self.emitted_before(self.consumed) {
                output.push(last);
                self.emitted += 1;
            }
        }
        self.reset();
        output
    }

    /// 単発の変換（新しいストリームとして変換し終端まで出力する）
    pub fn resample_once(&self, samples: &[f32]) -> Vec<f32> {
        let mut stream = self.clone();
        stream.reset();
        let mut output = stream.resample(samples);
        output.extend(stream.flush());
        output
    }

    pub fn reset(&mut self) {
        self.consumed = 0;
        self.emitted = 0;
        self.previous = None;
    }

    // 次の出力フレームの位置が入力フレーム `frame` より前か（整数積で比較）
    fn emitted_before(&self, frame: u64) -> bool {
        (self.emitted as f64) * self.input_rate < (frame as f64) * self.output_rate
    }
}
