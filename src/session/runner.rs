//! セッションを専用タスクで駆動する
//!
//! エンジンのコールバックは `ProducerHandle` 経由で無制限チャネルへ積まれ、
//! 1つのタスクだけがそれを順に取り出してセッションを変更する。
//! キャンセル（または `SessionHandle` の破棄）で受付を停止する。
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::{ProducerEvent, ProducerHandle};
use crate::wav::WavEncoder;

use super::{PreviewReport, SynthesisError, SynthesisReport, SynthesisSession};

const DISCONNECTED: &str = "producer disconnected without completing";

/// 表示用の進捗
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionProgress {
    pub accumulated_frames: u64,
    /// 文字数からの概算（目安であり保証しない）
    pub estimated_frames: Option<u64>,
}

impl SessionProgress {
    /// 0.0..=1.0 の概算進捗
    pub fn fraction(&self) -> Option<f32> {
        self.estimated_frames
            .filter(|estimate| *estimate > 0)
            .map(|estimate| (self.accumulated_frames as f64 / estimate as f64).min(1.0) as f32)
    }
}

/// 実行中セッションへのハンドル
#[derive(Debug)]
pub struct SessionHandle<T> {
    session_id: String,
    producer: ProducerHandle,
    cancel_tx: watch::Sender<bool>,
    progress_rx: watch::Receiver<SessionProgress>,
    task: JoinHandle<Result<T, SynthesisError>>,
}

impl<T> SessionHandle<T> {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// エンジンへ渡すコールバック受け口
    pub fn producer(&self) -> ProducerHandle {
        self.producer.clone()
    }

    pub fn progress(&self) -> watch::Receiver<SessionProgress> {
        self.progress_rx.clone()
    }

    /// 受付を停止して蓄積バッファを解放する。書き込み中の場合はその完了を待つ
    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }

    /// 終端状態まで待機
    pub async fn wait(self) -> Result<T, SynthesisError> {
        let Self {
            session_id,
            producer,
            cancel_tx,
            progress_rx,
            task,
        } = self;
        // 自分の送信側を手放し、エンジン側のハンドルが全て破棄されたことを検知できるようにする
        drop(producer);
        drop(progress_rx);
        let result = task.await;
        drop(cancel_tx);
        result.unwrap_or_else(|join_err| {
            Err(SynthesisError::WorkerLost {
                session_id,
                message: join_err.to_string(),
            })
        })
    }
}

/// 保存セッションを開始する（エンジンの起動は呼び出し側）
pub fn spawn_save(
    session: SynthesisSession,
    destination: PathBuf,
    encoder: WavEncoder,
    estimated_frames: Option<u64>,
) -> SessionHandle<SynthesisReport> {
    let session_id = session.id().to_string();
    spawn_with(session_id, estimated_frames, move |events, cancel_rx, progress_tx| {
        drive_save(session, events, cancel_rx, progress_tx, destination, encoder)
    })
}

/// 試聴セッションを開始する。WAV パイプラインは通さず、到着した音声を数えるだけ
pub fn spawn_preview(
    session_id: impl Into<String>,
    estimated_frames: Option<u64>,
) -> SessionHandle<PreviewReport> {
    let session_id = session_id.into();
    let id = session_id.clone();
    spawn_with(session_id, estimated_frames, move |events, cancel_rx, progress_tx| {
        drive_preview(id, events, cancel_rx, progress_tx)
    })
}

fn spawn_with<T, F, Fut>(
    session_id: String,
    estimated_frames: Option<u64>,
    drive: F,
) -> SessionHandle<T>
where
    T: Send + 'static,
    F: FnOnce(
        mpsc::UnboundedReceiver<ProducerEvent>,
        watch::Receiver<bool>,
        watch::Sender<SessionProgress>,
    ) -> Fut,
    Fut: std::future::Future<Output = Result<T, SynthesisError>> + Send + 'static,
{
    let (producer, events) = ProducerHandle::channel(session_id.clone());
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let (progress_tx, progress_rx) = watch::channel(SessionProgress {
        accumulated_frames: 0,
        estimated_frames,
    });
    let task = tokio::spawn(drive(events, cancel_rx, progress_tx));

    SessionHandle {
        session_id,
        producer,
        cancel_tx,
        progress_rx,
        task,
    }
}

async fn drive_save(
    session: SynthesisSession,
    events: mpsc::UnboundedReceiver<ProducerEvent>,
    cancel_rx: watch::Receiver<bool>,
    progress_tx: watch::Sender<SessionProgress>,
    destination: PathBuf,
    encoder: WavEncoder,
) -> Result<SynthesisReport, SynthesisError> {
    let session_id = session.id().to_string();
    let result = run_save(session, events, cancel_rx, progress_tx, &destination, encoder).await;

    // 失敗したセッションの出力先に以前のファイルを残さない
    if result.is_err() {
        match WavEncoder::discard(&destination).await {
            Ok(true) => info!(
                session_id = %session_id,
                path = %destination.display(),
                "removed stale file at destination of failed session"
            ),
            Ok(false) => {}
            Err(err) => warn!(
                session_id = %session_id,
                error = %err,
                "failed to remove stale file at destination"
            ),
        }
    }
    result
}

async fn run_save(
    mut session: SynthesisSession,
    mut events: mpsc::UnboundedReceiver<ProducerEvent>,
    mut cancel_rx: watch::Receiver<bool>,
    progress_tx: watch::Sender<SessionProgress>,
    destination: &Path,
    encoder: WavEncoder,
) -> Result<SynthesisReport, SynthesisError> {
    session.start()?;

    loop {
        let event = tokio::select! {
            biased;
            _ = cancel_rx.changed() => {
                events.close();
                info!(session_id = session.id(), "session cancelled by caller");
                return Err(session.cancel());
            }
            event = events.recv() => event,
        };

        match event {
            Some(ProducerEvent::Chunk(buffer)) => {
                if let Err(err) = session.accept(buffer) {
                    events.close();
                    return Err(err);
                }
                let frames = session.accumulated_frames() as u64;
                progress_tx.send_modify(|progress| progress.accumulated_frames = frames);
            }
            Some(ProducerEvent::Finished) => break,
            Some(ProducerEvent::Failed { reason }) => {
                events.close();
                let session_id = session.id().to_string();
                return Err(session.fail(SynthesisError::ProducerSignaledFailure {
                    session_id,
                    reason,
                }));
            }
            None => {
                let session_id = session.id().to_string();
                return Err(session.fail(SynthesisError::ProducerSignaledFailure {
                    session_id,
                    reason: DISCONNECTED.to_string(),
                }));
            }
        }
    }

    // 完了後に届いた通知は受け付けない。書き込みはキャンセルされても最後まで行う
    events.close();
    debug!(
        session_id = session.id(),
        frames = session.accumulated_frames(),
        chunks = session.chunks_accepted(),
        "producer finished, finalizing"
    );
    session.finalize(destination, &encoder).await
}

async fn drive_preview(
    session_id: String,
    mut events: mpsc::UnboundedReceiver<ProducerEvent>,
    mut cancel_rx: watch::Receiver<bool>,
    progress_tx: watch::Sender<SessionProgress>,
) -> Result<PreviewReport, SynthesisError> {
    let mut chunks = 0_usize;
    let mut frames = 0_usize;
    let mut duration = Duration::ZERO;

    loop {
        let event = tokio::select! {
            biased;
            _ = cancel_rx.changed() => {
                events.close();
                return Err(SynthesisError::Cancelled { session_id });
            }
            event = events.recv() => event,
        };

        match event {
            Some(ProducerEvent::Chunk(buffer)) => {
                if buffer.is_empty() {
                    continue;
                }
                chunks += 1;
                frames += buffer.frame_count();
                duration += buffer.duration();
                let total = frames as u64;
                progress_tx.send_modify(|progress| progress.accumulated_frames = total);
            }
            Some(ProducerEvent::Finished) => break,
            Some(ProducerEvent::Failed { reason }) => {
                events.close();
                warn!(session_id = %session_id, reason = %reason, "preview failed");
                return Err(SynthesisError::ProducerSignaledFailure { session_id, reason });
            }
            None => {
                return Err(SynthesisError::ProducerSignaledFailure {
                    session_id,
                    reason: DISCONNECTED.to_string(),
                })
            }
        }
    }

    events.close();
    if frames == 0 {
        return Err(SynthesisError::NoAccumulatedAudio { session_id });
    }
    info!(session_id = %session_id, chunks, frames, "preview complete");
    Ok(PreviewReport {
        session_id,
        chunks,
        frames,
        duration,
    })
}
