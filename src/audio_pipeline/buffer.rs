use std::time::Duration;

/// エンジンが生成するモノラル f32 音声チャンク
///
/// 生成後は変更されず、ステージ間で所有権ごと受け渡されます。
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: f64,
    samples: Vec<f32>,
}

impl AudioBuffer {
    /// サンプルレート（Hz）とサンプル列から作成
    pub fn new(sample_rate: f64, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            samples,
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// フレーム数（モノラルなのでサンプル数と同じ）
    pub fn frame_count(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// 再生時間（レートが不正な場合はゼロ）
    pub fn duration(&self) -> Duration {
        if self.sample_rate > 0.0 && self.sample_rate.is_finite() {
            Duration::from_secs_f64(self.frame_count() as f64 / self.sample_rate)
        } else {
            Duration::ZERO
        }
    }
}
