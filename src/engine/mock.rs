use std::f32::consts::TAU;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::audio_pipeline::AudioBuffer;
use crate::config::EngineConfig;

use super::{EngineError, ProducerHandle, SpeechEngine, SpeechRequest, VoiceId};

/// 文字数に比例した長さの正弦波を返すエンジン
///
/// 実エンジンの代わりにデモやテストで使う。声ごとに周波数が異なる。
#[derive(Debug, Clone)]
pub struct ToneEngine {
    config: EngineConfig,
}

impl ToneEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    fn frequency_for(&self, voice: &VoiceId) -> Result<f32, EngineError> {
        self.config
            .voices
            .iter()
            .position(|name| name == voice.as_str())
            .map(|index| 220.0 * (index as f32 + 1.0))
            .ok_or_else(|| EngineError::UnknownVoice {
                voice: voice.to_string(),
            })
    }
}

#[async_trait]
impl SpeechEngine for ToneEngine {
    fn voices(&self) -> Vec<VoiceId> {
        self.config.voices.iter().map(VoiceId::new).collect()
    }

    async fn start(
        &self,
        request: SpeechRequest,
        producer: ProducerHandle,
    ) -> Result<(), EngineError> {
        let frequency = self.frequency_for(&request.voice)?;
        let rate = self.config.native_sample_rate_hz;
        let total_frames = (request.text.chars().count() as f64
            * self.config.seconds_per_character as f64
            * rate) as usize;
        let chunk_frames = self.config.chunk_frames.max(1);
        let interval = Duration::from_millis(self.config.chunk_interval_ms);

        tokio::spawn(async move {
            let step = TAU * frequency / rate as f32;
            let mut produced = 0_usize;
            while produced < total_frames {
                let len = chunk_frames.min(total_frames - produced);
                let samples = (produced..produced + len)
                    .map(|n| 0.5 * (step * n as f32).sin())
                    .collect();
                if producer.deliver(AudioBuffer::new(rate, samples)).is_err() {
                    debug!(session_id = producer.session_id(), "session closed, stopping tone");
                    return;
                }
                produced += len;
                if !interval.is_zero() {
                    tokio::time::sleep(interval).await;
                }
            }
            let _ = producer.finish();
        });

        Ok(())
    }
}

/// 台本どおりにチャンクを届けた後の振る舞い
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptOutcome {
    /// 正常終了を通知
    Finish,
    /// 失敗を通知
    Fail(String),
    /// 終了通知なしでハンドルを破棄
    Disconnect,
    /// 終了通知せずハンドルを保持し続ける
    Hold,
}

/// 決められたチャンク列を届けるエンジン
#[derive(Debug)]
pub struct ScriptedEngine {
    chunks: Vec<AudioBuffer>,
    outcome: ScriptOutcome,
    held: Mutex<Vec<ProducerHandle>>,
}

impl ScriptedEngine {
    pub fn new(chunks: Vec<AudioBuffer>, outcome: ScriptOutcome) -> Self {
        Self {
            chunks,
            outcome,
            held: Mutex::new(Vec::new()),
        }
    }

    /// `Hold` で保持しているハンドル数
    pub fn held_handles(&self) -> usize {
        self.held.lock().len()
    }
}

#[async_trait]
impl SpeechEngine for ScriptedEngine {
    fn voices(&self) -> Vec<VoiceId> {
        vec![VoiceId::new("scripted")]
    }

    async fn start(
        &self,
        _request: SpeechRequest,
        producer: ProducerHandle,
    ) -> Result<(), EngineError> {
        let chunks = self.chunks.clone();
        let outcome = self.outcome.clone();
        if outcome == ScriptOutcome::Hold {
            self.held.lock().push(producer.clone());
        }

        tokio::spawn(async move {
            for chunk in chunks {
                if producer.deliver(chunk).is_err() {
                    return;
                }
                tokio::task::yield_now().await;
            }
            match outcome {
                ScriptOutcome::Finish => {
                    let _ = producer.finish();
                }
                ScriptOutcome::Fail(reason) => {
                    let _ = producer.fail(reason);
                }
                ScriptOutcome::Disconnect | ScriptOutcome::Hold => {}
            }
        });

        Ok(())
    }
}
