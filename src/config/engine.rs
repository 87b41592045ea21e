use serde::Deserialize;

use super::ConfigError;

/// 内蔵トーンエンジンの設定
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// エンジンが出力するネイティブサンプルレート
    pub native_sample_rate_hz: f64,
    /// 1チャンクあたりのフレーム数
    pub chunk_frames: usize,
    /// 1文字あたりの発話秒数
    pub seconds_per_character: f32,
    /// チャンク間の待ち時間（ミリ秒、0で待たない）
    #[serde(default)]
    pub chunk_interval_ms: u64,
    pub voices: Vec<String>,
}

impl EngineConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !(self.native_sample_rate_hz.is_finite() && self.native_sample_rate_hz > 0.0) {
            return Err(ConfigError::invalid(
                "native_sample_rate_hz",
                "must be a positive number",
            ));
        }
        if self.chunk_frames == 0 {
            return Err(ConfigError::invalid("chunk_frames", "must be positive"));
        }
        if self.voices.is_empty() {
            return Err(ConfigError::invalid("voices", "at least one voice is required"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            native_sample_rate_hz: 22_050.0,
            chunk_frames: 1_024,
            seconds_per_character: 0.06,
            chunk_interval_ms: 0,
            voices: vec!["tone.low".to_string(), "tone.high".to_string()],
        }
    }
}
