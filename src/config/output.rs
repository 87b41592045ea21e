//! 出力WAVに関する設定値
use serde::Deserialize;

use super::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// 新しいセッションが使うターゲットサンプルレート
    pub target_sample_rate_hz: u32,
    /// 選択可能なサンプルレート一覧
    pub supported_sample_rates_hz: Vec<u32>,
    /// 1回の書き込みで渡すバイト数
    pub write_chunk_bytes: usize,
}

impl OutputConfig {
    pub fn is_supported(&self, rate: u32) -> bool {
        self.supported_sample_rates_hz.contains(&rate)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.supported_sample_rates_hz.is_empty() {
            return Err(ConfigError::invalid(
                "supported_sample_rates_hz",
                "at least one rate is required",
            ));
        }
        if self.supported_sample_rates_hz.contains(&0) {
            return Err(ConfigError::invalid(
                "supported_sample_rates_hz",
                "rates must be positive",
            ));
        }
        if !self.is_supported(self.target_sample_rate_hz) {
            return Err(ConfigError::invalid(
                "target_sample_rate_hz",
                format!(
                    "{} Hz is not one of {:?}",
                    self.target_sample_rate_hz, self.supported_sample_rates_hz
                ),
            ));
        }
        if self.write_chunk_bytes < 2 {
            return Err(ConfigError::invalid(
                "write_chunk_bytes",
                "must hold at least one 16-bit sample",
            ));
        }
        Ok(())
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            target_sample_rate_hz: 16_000,
            supported_sample_rates_hz: vec![8_000, 16_000, 32_000],
            write_chunk_bytes: 64 * 1024,
        }
    }
}
