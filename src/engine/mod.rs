//! 音声合成エンジン（外部コンポーネント）との境界
//!
//! `SpeechEngine` はテキストと声を受け取って合成を開始し、
//! 生成したチャンクを自身のスケジュールで `ProducerHandle` へ届けます。
//! 終了時は `finish` か `fail` のどちらかを一度だけ呼ぶ想定です。
mod error;
mod mock;
mod producer;

use std::fmt;

use async_trait::async_trait;

pub use error::EngineError;
pub use mock::{ScriptOutcome, ScriptedEngine, ToneEngine};
pub use producer::{ProducerEvent, ProducerHandle};

/// 声の識別子
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VoiceId(String);

impl VoiceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VoiceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// 合成リクエスト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRequest {
    pub text: String,
    pub voice: VoiceId,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, voice: impl Into<VoiceId>) -> Self {
        Self {
            text: text.into(),
            voice: voice.into(),
        }
    }
}

/// 合成エンジン最小インタフェース
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// 利用可能な声の一覧
    fn voices(&self) -> Vec<VoiceId>;

    /// 合成を開始する。チャンクの数・サイズ・タイミングはエンジン次第
    async fn start(&self, request: SpeechRequest, producer: ProducerHandle)
        -> Result<(), EngineError>;
}
