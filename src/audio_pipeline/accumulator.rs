use std::collections::TryReserveError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccumulationError {
    #[error("growth to {requested_frames} frames exceeds the limit of {limit_frames} frames")]
    LimitExceeded {
        requested_frames: usize,
        limit_frames: usize,
    },
    #[error("failed to allocate {requested_frames} frames")]
    Allocation {
        requested_frames: usize,
        #[source]
        source: TryReserveError,
    },
    #[error("frame count overflow while appending {incoming} frames to {length}")]
    Overflow { length: usize, incoming: usize },
}

/// 追記専用の伸長可能なサンプルストア
///
/// - `len() <= capacity()` を常に満たす
/// - 容量は `growth_factor` 倍ずつ単調に増加し、既存サンプルは保持される
/// - 伸長に失敗した場合は内容・容量とも変更しない
#[derive(Debug)]
pub struct AccumulationBuffer {
    storage: Vec<f32>,
    capacity_frames: usize,
    growth_factor: f64,
    limit_frames: Option<usize>,
}

impl AccumulationBuffer {
    /// 初期容量で確保（失敗時は伸長失敗と同じエラー）
    pub fn with_capacity(
        capacity_frames: usize,
        growth_factor: f64,
    ) -> Result<Self, AccumulationError> {
        let mut storage = Vec::new();
        storage
            .try_reserve_exact(capacity_frames)
            .map_err(|source| AccumulationError::Allocation {
                requested_frames: capacity_frames,
                source,
            })?;
        Ok(Self {
            storage,
            capacity_frames,
            growth_factor: if growth_factor > 1.0 { growth_factor } else { 1.5 },
            limit_frames: None,
        })
    }

    /// 容量の上限（フレーム数）を設定
    pub fn with_limit(mut self, limit_frames: usize) -> Self {
        self.limit_frames = Some(limit_frames);
        self
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity_frames
    }

    /// 現在の末尾へフレームを追記（空入力は何もしない）
    pub fn append(&mut self, frames: &[f32]) -> Result<(), AccumulationError> {
        if frames.is_empty() {
            return Ok(());
        }

        let length = self.storage.len();
        let required = length
            .checked_add(frames.len())
            .ok_or(AccumulationError::Overflow {
                length,
                incoming: frames.len(),
            })?;
        if required > self.capacity_frames {
            self.grow_to_fit(required)?;
        }

        self.storage.extend_from_slice(frames);
        Ok(())
    }

    /// 有効なサンプルのみを返す（未使用の容量は含まない）
    pub fn snapshot(&self) -> &[f32] {
        &self.storage
    }

    fn grow_to_fit(&mut self, required: usize) -> Result<(), AccumulationError> {
        let mut capacity = self.capacity_frames.max(1);
        while capacity < required {
            let grown = (capacity as f64 * self.growth_factor).ceil() as usize;
            capacity = grown.max(capacity + 1);
        }

        if let Some(limit) = self.limit_frames {
            if required > limit {
                return Err(AccumulationError::LimitExceeded {
                    requested_frames: required,
                    limit_frames: limit,
                });
            }
            capacity = capacity.min(limit);
        }

        // try_reserve_exact は失敗時に既存の確保領域を変更しない
        self.storage
            .try_reserve_exact(capacity - self.storage.len())
            .map_err(|source| AccumulationError::Allocation {
                requested_frames: capacity,
                source,
            })?;
        self.capacity_frames = capacity;
        Ok(())
    }
}
