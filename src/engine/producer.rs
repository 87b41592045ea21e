//! エンジン→セッション間のコールバック受け口
//!
//! - `ProducerEvent` はエンジンから届くチャンク/終了/失敗の通知
//! - `ProducerHandle` は任意のスレッドから同期的に呼べる送信側ハンドル
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::audio_pipeline::AudioBuffer;

use super::error::EngineError;

/// エンジンからの通知
#[derive(Debug, Clone, PartialEq)]
pub enum ProducerEvent {
    Chunk(AudioBuffer),
    Finished,
    Failed { reason: String },
}

/// セッションへ音声を届けるハンドル
///
/// 送信は非同期ランタイム外のコールバックからも呼べる（ブロックしない）。
/// セッションが受付を終えた後は `EngineError::SessionClosed` を返す。
#[derive(Debug, Clone)]
pub struct ProducerHandle {
    session_id: Arc<str>,
    event_tx: mpsc::UnboundedSender<ProducerEvent>,
}

impl ProducerHandle {
    /// セッションIDに紐づく送受信チャネルを作成
    pub fn channel(
        session_id: impl Into<String>,
    ) -> (Self, mpsc::UnboundedReceiver<ProducerEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let handle = Self {
            session_id: Arc::from(session_id.into()),
            event_tx,
        };
        (handle, event_rx)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// 音声チャンクを届ける（長さ0のチャンクも許容、セッション側で無視される）
    pub fn deliver(&self, buffer: AudioBuffer) -> Result<(), EngineError> {
        self.send(ProducerEvent::Chunk(buffer))
    }

    /// 正常終了を通知
    pub fn finish(&self) -> Result<(), EngineError> {
        self.send(ProducerEvent::Finished)
    }

    /// エラーまたはキャンセルを通知
    pub fn fail(&self, reason: impl Into<String>) -> Result<(), EngineError> {
        self.send(ProducerEvent::Failed {
            reason: reason.into(),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.event_tx.is_closed()
    }

    fn send(&self, event: ProducerEvent) -> Result<(), EngineError> {
        self.event_tx
            .send(event)
            .map_err(|_| EngineError::SessionClosed {
                session_id: self.session_id.to_string(),
            })
    }
}
