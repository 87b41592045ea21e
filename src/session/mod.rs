//! 合成セッション（1回の保存/試聴リクエスト）
//!
//! - `SynthesisSession` は状態機械と蓄積バッファを保持し、`&mut self` でのみ変更される
//! - `runner` がセッションを専用タスクへ移し、エンジンからの通知を到着順に適用する
//! - 失敗は即座にセッションを終了させ、蓄積バッファを解放する
mod error;
mod runner;
mod state;

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::audio_pipeline::{AccumulationBuffer, AudioBuffer, LinearResampler};
use crate::config::SessionConfig;
use crate::wav::WavEncoder;

pub use error::{FailureKind, SynthesisError};
pub use runner::{spawn_preview, spawn_save, SessionHandle, SessionProgress};
pub use state::SessionState;

/// 保存に成功したセッションの結果
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisReport {
    pub session_id: String,
    pub path: PathBuf,
    pub sample_rate: u32,
    pub frames: usize,
    pub data_bytes: u32,
    pub duration: Duration,
}

/// 試聴セッションの結果
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewReport {
    pub session_id: String,
    pub chunks: usize,
    pub frames: usize,
    pub duration: Duration,
}

#[derive(Debug)]
pub struct SynthesisSession {
    id: String,
    target_sample_rate: u32,
    config: SessionConfig,
    accumulation: Option<AccumulationBuffer>,
    /// 現在のネイティブレート用。レートが変わったら末尾を出し切って作り直す
    resampler: Option<LinearResampler>,
    state: SessionState,
    chunks_accepted: usize,
}

impl SynthesisSession {
    pub fn new(id: impl Into<String>, target_sample_rate: u32, config: SessionConfig) -> Self {
        Self {
            id: id.into(),
            target_sample_rate,
            config,
            accumulation: None,
            resampler: None,
            state: SessionState::Idle,
            chunks_accepted: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn target_sample_rate(&self) -> u32 {
        self.target_sample_rate
    }

    /// 蓄積済みフレーム数（バッファ解放後は0）
    pub fn accumulated_frames(&self) -> usize {
        self.accumulation.as_ref().map_or(0, AccumulationBuffer::len)
    }

    pub fn chunks_accepted(&self) -> usize {
        self.chunks_accepted
    }

    /// Idle -> Accumulating。初期容量で蓄積バッファを確保する
    pub fn start(&mut self) -> Result<(), SynthesisError> {
        self.ensure(SessionState::Accumulating, "start")?;

        let capacity = self.config.initial_capacity_frames(self.target_sample_rate);
        let buffer = AccumulationBuffer::with_capacity(capacity, self.config.growth_factor as f64)
            .map(|buffer| match self.config.max_frames(self.target_sample_rate) {
                Some(limit) => buffer.with_limit(limit.max(capacity)),
                None => buffer,
            })
            .map_err(|source| SynthesisError::BufferGrowthFailed {
                session_id: self.id.clone(),
                source,
            });

        match buffer {
            Ok(buffer) => {
                self.accumulation = Some(buffer);
                self.state = SessionState::Accumulating;
                info!(
                    session_id = %self.id,
                    sample_rate = self.target_sample_rate,
                    capacity_frames = capacity,
                    "session started"
                );
                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// チャンクをリサンプルして末尾に追記する（長さ0のチャンクは無視）
    ///
    /// 失敗した場合セッションは Failed へ遷移する。戻り値は追記したフレーム数。
    pub fn accept(&mut self, buffer: AudioBuffer) -> Result<usize, SynthesisError> {
        self.ensure(SessionState::Accumulating, "accept audio")?;
        if buffer.is_empty() {
            debug!(session_id = %self.id, "ignoring empty chunk");
            return Ok(0);
        }

        let native_rate = buffer.sample_rate();
        let resampled = match self.resampler_for(native_rate) {
            Ok(resampler) => resampler.process(buffer),
            Err(err) => return Err(self.fail(err)),
        };
        let resampled = match resampled {
            Ok(resampled) => resampled,
            Err(source) => {
                let err = SynthesisError::ResampleFailed {
                    session_id: self.id.clone(),
                    source,
                };
                return Err(self.fail(err));
            }
        };

        let appended = self
            .append_resampled(resampled.samples())
            .map(|_| resampled.frame_count());

        match appended {
            Ok(frames) => {
                self.chunks_accepted += 1;
                debug!(
                    session_id = %self.id,
                    native_rate,
                    frames,
                    total_frames = self.accumulated_frames(),
                    "chunk accumulated"
                );
                Ok(frames)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Accumulating -> Finalizing -> Succeeded/Failed
    ///
    /// 蓄積バッファはここで一度だけ読み出され、結果に関わらず解放される。
    pub async fn finalize(
        &mut self,
        destination: &Path,
        encoder: &WavEncoder,
    ) -> Result<SynthesisReport, SynthesisError> {
        self.ensure(SessionState::Finalizing, "finalize")?;
        if let Err(err) = self.flush_resampler() {
            return Err(self.fail(err));
        }
        self.state = SessionState::Finalizing;

        let accumulation = match self.accumulation.take() {
            Some(accumulation) if !accumulation.is_empty() => accumulation,
            _ => {
                return Err(self.fail(SynthesisError::NoAccumulatedAudio {
                    session_id: self.id.clone(),
                }))
            }
        };

        let samples = accumulation.snapshot();
        let written = encoder
            .write_file(destination, samples, self.target_sample_rate)
            .await;
        let frames = samples.len();
        drop(accumulation);

        match written {
            Ok(header) => {
                self.state = SessionState::Succeeded;
                let report = SynthesisReport {
                    session_id: self.id.clone(),
                    path: destination.to_path_buf(),
                    sample_rate: header.sample_rate(),
                    frames,
                    data_bytes: header.data_size(),
                    duration: Duration::from_secs_f64(
                        frames as f64 / self.target_sample_rate as f64,
                    ),
                };
                info!(
                    session_id = %self.id,
                    path = %destination.display(),
                    frames,
                    data_bytes = report.data_bytes,
                    "wav saved"
                );
                Ok(report)
            }
            Err(source) => Err(self.fail(SynthesisError::Output {
                session_id: self.id.clone(),
                source,
            })),
        }
    }

    /// ネイティブレートに対応するリサンプラを返す
    ///
    /// 直前と異なるレートのチャンクが届いた場合、旧リサンプラの保留分を追記してから切り替える。
    fn resampler_for(&mut self, native_rate: f64) -> Result<&mut LinearResampler, SynthesisError> {
        if self
            .resampler
            .as_ref()
            .is_some_and(|resampler| resampler.input_rate() != native_rate)
        {
            self.flush_resampler()?;
        }
        if self.resampler.is_none() {
            let resampler = LinearResampler::new(native_rate, self.target_sample_rate as f64)
                .map_err(|source| SynthesisError::ResampleFailed {
                    session_id: self.id.clone(),
                    source,
                })?;
            debug!(session_id = %self.id, native_rate, "resampler created");
            self.resampler = Some(resampler);
        }
        self.resampler.as_mut().ok_or_else(|| SynthesisError::WorkerLost {
            session_id: self.id.clone(),
            message: "resampler missing after creation".to_string(),
        })
    }

    fn flush_resampler(&mut self) -> Result<(), SynthesisError> {
        match self.resampler.take() {
            Some(mut resampler) => {
                let tail = resampler.flush();
                self.append_resampled(&tail)
            }
            None => Ok(()),
        }
    }

    fn append_resampled(&mut self, samples: &[f32]) -> Result<(), SynthesisError> {
        match self.accumulation.as_mut() {
            Some(accumulation) => {
                accumulation
                    .append(samples)
                    .map_err(|source| SynthesisError::BufferGrowthFailed {
                        session_id: self.id.clone(),
                        source,
                    })
            }
            None => Err(SynthesisError::WorkerLost {
                session_id: self.id.clone(),
                message: "accumulation buffer missing while accumulating".to_string(),
            }),
        }
    }

    /// 呼び出し側の中断。以後の追記を受け付けず、バッファを解放する
    pub fn cancel(&mut self) -> SynthesisError {
        self.fail(SynthesisError::Cancelled {
            session_id: self.id.clone(),
        })
    }

    /// Failed へ遷移してバッファを解放し、同じエラーを返す
    ///
    /// 既に終端状態なら状態は変えない。
    pub fn fail(&mut self, error: SynthesisError) -> SynthesisError {
        self.accumulation = None;
        self.resampler = None;
        if self.state.is_terminal() {
            return error;
        }
        warn!(
            session_id = %self.id,
            state = self.state.name(),
            kind = ?error.kind(),
            error = %error,
            "session failed"
        );
        self.state = SessionState::Failed {
            kind: error.kind(),
            reason: error.to_string(),
        };
        error
    }

    fn ensure(&self, next: SessionState, event: &'static str) -> Result<(), SynthesisError> {
        if self.state.can_transition_to(&next) {
            Ok(())
        } else {
            Err(SynthesisError::InvalidTransition {
                session_id: self.id.clone(),
                state: self.state.name(),
                event,
            })
        }
    }
}
