//! 呼び出し側インタフェース
//!
//! `SpeechSynthesizer` は `SpeechEngine` 実装を保持し、リクエストごとに独立した
//! セッションを作成します。セッション間で状態は共有しません（共有するのは
//! 次回以降のセッションに適用されるターゲットサンプルレートのみ）。
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{ConfigSet, OutputConfig, SessionConfig};
use crate::engine::{SpeechEngine, SpeechRequest, VoiceId};
use crate::session::{
    spawn_preview, spawn_save, PreviewReport, SessionHandle, SynthesisError, SynthesisReport,
    SynthesisSession,
};
use crate::wav::WavEncoder;

pub struct SpeechSynthesizer<E>
where
    E: SpeechEngine + 'static,
{
    engine: Arc<E>,
    output: OutputConfig,
    session: SessionConfig,
    target_sample_rate: RwLock<u32>,
}

impl<E> SpeechSynthesizer<E>
where
    E: SpeechEngine + 'static,
{
    /// エンジンと設定を受け取り、シンセサイザを生成
    pub fn new(engine: E, output: OutputConfig, session: SessionConfig) -> Self {
        let target_sample_rate = RwLock::new(output.target_sample_rate_hz);
        Self {
            engine: Arc::new(engine),
            output,
            session,
            target_sample_rate,
        }
    }

    pub fn from_config(engine: E, config: &ConfigSet) -> Self {
        Self::new(engine, config.output.clone(), config.session.clone())
    }

    pub fn engine(&self) -> Arc<E> {
        self.engine.clone()
    }

    pub fn voices(&self) -> Vec<VoiceId> {
        self.engine.voices()
    }

    pub fn target_sample_rate(&self) -> u32 {
        *self.target_sample_rate.read()
    }

    /// 次回以降のセッションのターゲットレートを変更（実行中のセッションには影響しない）
    pub fn set_target_sample_rate(&self, rate: u32) -> Result<(), SynthesisError> {
        if !self.output.is_supported(rate) {
            return Err(SynthesisError::UnsupportedSampleRate {
                rate,
                supported: self.output.supported_sample_rates_hz.clone(),
            });
        }
        *self.target_sample_rate.write() = rate;
        info!(sample_rate = rate, "target sample rate updated");
        Ok(())
    }

    /// 保存せずに合成だけ行う（試聴用）
    pub async fn preview_speech(
        &self,
        text: &str,
        voice: impl Into<VoiceId>,
    ) -> Result<PreviewReport, SynthesisError> {
        let request = SpeechRequest::new(text, voice);
        let session_id = new_session_id("preview");
        let handle = spawn_preview(session_id, None);
        self.start_engine(&handle, request).await?;
        handle.wait().await
    }

    /// 保存セッションを開始し、キャンセルや進捗取得に使えるハンドルを返す
    pub async fn start_save(
        &self,
        text: &str,
        voice: impl Into<VoiceId>,
        destination: impl AsRef<Path>,
    ) -> Result<SessionHandle<SynthesisReport>, SynthesisError> {
        let request = SpeechRequest::new(text, voice);
        let sample_rate = self.target_sample_rate();
        let session_id = new_session_id("save");
        let estimated = self
            .session
            .estimated_frames(request.text.chars().count(), sample_rate);

        let session = SynthesisSession::new(session_id, sample_rate, self.session.clone());
        let handle = spawn_save(
            session,
            destination.as_ref().to_path_buf(),
            WavEncoder::new(self.output.write_chunk_bytes),
            Some(estimated),
        );
        self.start_engine(&handle, request).await?;
        Ok(handle)
    }

    /// 合成してWAVとして保存する
    pub async fn synthesize_and_save(
        &self,
        text: &str,
        voice: impl Into<VoiceId>,
        destination: impl AsRef<Path>,
    ) -> Result<SynthesisReport, SynthesisError> {
        self.start_save(text, voice, destination).await?.wait().await
    }

    async fn start_engine<T>(
        &self,
        handle: &SessionHandle<T>,
        request: SpeechRequest,
    ) -> Result<(), SynthesisError> {
        let voice = request.voice.clone();
        match self.engine.start(request, handle.producer()).await {
            Ok(()) => {
                info!(session_id = handle.session_id(), voice = %voice, "synthesis started");
                Ok(())
            }
            Err(source) => {
                warn!(
                    session_id = handle.session_id(),
                    voice = %voice,
                    error = %source,
                    "speech engine failed to start"
                );
                handle.cancel();
                Err(SynthesisError::Engine {
                    session_id: handle.session_id().to_string(),
                    source,
                })
            }
        }
    }
}

fn new_session_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ScriptOutcome, ScriptedEngine};
    use crate::session::FailureKind;

    fn synthesizer() -> SpeechSynthesizer<ScriptedEngine> {
        SpeechSynthesizer::new(
            ScriptedEngine::new(Vec::new(), ScriptOutcome::Finish),
            OutputConfig::default(),
            SessionConfig::default(),
        )
    }

    #[test]
    fn rejects_unsupported_rate() {
        let synth = synthesizer();
        let err = synth.set_target_sample_rate(44_100).unwrap_err();
        assert_eq!(err.kind(), FailureKind::UnsupportedSampleRate);
        assert_eq!(synth.target_sample_rate(), 16_000);

        synth.set_target_sample_rate(8_000).unwrap();
        assert_eq!(synth.target_sample_rate(), 8_000);
    }

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(new_session_id("save"), new_session_id("save"));
    }
}
