//! 合成セッション（蓄積バッファ・進捗）の設定値
use serde::Deserialize;

use super::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// 蓄積バッファの初期容量（秒）
    pub initial_capacity_secs: f32,
    /// 容量不足時に掛ける係数（> 1.0）
    pub growth_factor: f32,
    /// 1セッションで蓄積できる最大長（秒）。未設定なら上限なし
    #[serde(default)]
    pub max_duration_secs: Option<f32>,
    /// 進捗見積もり用の1文字あたり秒数
    pub estimated_seconds_per_character: f32,
}

impl SessionConfig {
    /// ターゲットレートでの初期容量（フレーム）
    pub fn initial_capacity_frames(&self, sample_rate: u32) -> usize {
        seconds_to_frames(self.initial_capacity_secs, sample_rate)
    }

    /// ターゲットレートでの上限（フレーム）
    pub fn max_frames(&self, sample_rate: u32) -> Option<usize> {
        self.max_duration_secs
            .map(|secs| seconds_to_frames(secs, sample_rate))
    }

    /// 文字数から見積もったフレーム数（表示用の目安）
    pub fn estimated_frames(&self, characters: usize, sample_rate: u32) -> u64 {
        (characters as f64
            * self.estimated_seconds_per_character.max(0.0) as f64
            * sample_rate as f64) as u64
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_capacity_secs.is_finite() && self.initial_capacity_secs >= 0.0) {
            return Err(ConfigError::invalid(
                "initial_capacity_secs",
                "must be a non-negative number",
            ));
        }
        if !(self.growth_factor.is_finite() && self.growth_factor > 1.0) {
            return Err(ConfigError::invalid("growth_factor", "must be greater than 1.0"));
        }
        if let Some(max) = self.max_duration_secs {
            if !(max.is_finite() && max > 0.0) {
                return Err(ConfigError::invalid(
                    "max_duration_secs",
                    "must be a positive number",
                ));
            }
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_capacity_secs: 30.0,
            growth_factor: 1.5,
            max_duration_secs: None,
            estimated_seconds_per_character: 0.07,
        }
    }
}

fn seconds_to_frames(secs: f32, sample_rate: u32) -> usize {
    (secs.max(0.0) as f64 * sample_rate as f64).ceil() as usize
}
