use super::WavError;

pub const HEADER_LEN: usize = 44;
pub const CHANNELS: u16 = 1;
pub const BITS_PER_SAMPLE: u16 = 16;
const PCM_FORMAT: u16 = 1;
const FMT_CHUNK_SIZE: u32 = 16;

/// 44バイトの標準 PCM WAV ヘッダ（モノラル 16bit 固定）
///
/// 保持するのは `sample_rate` と `data_size` のみで、他のフィールドはそこから導出する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    sample_rate: u32,
    data_size: u32,
}

impl WavHeader {
    /// `data_bytes` は PCM ペイロードのバイト数
    pub fn new(sample_rate: u32, data_bytes: usize) -> Result<Self, WavError> {
        let block_align = u32::from(CHANNELS * BITS_PER_SAMPLE / 8);
        if sample_rate == 0 || sample_rate.checked_mul(block_align).is_none() {
            return Err(WavError::InvalidSampleRate { rate: sample_rate });
        }
        let data_size = u32::try_from(data_bytes)
            .ok()
            .filter(|size| size.checked_add(36).is_some())
            .ok_or(WavError::PayloadTooLarge { bytes: data_bytes })?;
        Ok(Self {
            sample_rate,
            data_size,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn data_size(&self) -> u32 {
        self.data_size
    }

    pub fn chunk_size(&self) -> u32 {
        36 + self.data_size
    }

    pub fn block_align(&self) -> u16 {
        CHANNELS * BITS_PER_SAMPLE / 8
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * u32::from(self.block_align())
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..4].copy_from_slice(b"RIFF");
        buf[4..8].copy_from_slice(&self.chunk_size().to_le_bytes());
        buf[8..12].copy_from_slice(b"WAVE");

        // fmt sub-chunk
        buf[12..16].copy_from_slice(b"fmt ");
        buf[16..20].copy_from_slice(&FMT_CHUNK_SIZE.to_le_bytes());
        buf[20..22].copy_from_slice(&PCM_FORMAT.to_le_bytes());
        buf[22..24].copy_from_slice(&CHANNELS.to_le_bytes());
        buf[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        buf[28..32].copy_from_slice(&self.byte_rate().to_le_bytes());
        buf[32..34].copy_from_slice(&self.block_align().to_le_bytes());
        buf[34..36].copy_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

        // data sub-chunk
        buf[36..40].copy_from_slice(b"data");
        buf[40..44].copy_from_slice(&self.data_size.to_le_bytes());
        buf
    }

    /// ヘッダを解析し、導出フィールドの整合性を検証
    pub fn parse(bytes: &[u8]) -> Result<Self, WavError> {
        if bytes.len() < HEADER_LEN {
            return Err(WavError::malformed(format!(
                "expected {HEADER_LEN} header bytes, got {}",
                bytes.len()
            )));
        }

        for (range, tag) in [(0..4, b"RIFF"), (8..12, b"WAVE"), (12..16, b"fmt "), (36..40, b"data")] {
            if &bytes[range.clone()] != tag {
                return Err(WavError::malformed(format!(
                    "missing {:?} tag at offset {}",
                    String::from_utf8_lossy(tag),
                    range.start
                )));
            }
        }

        let u16_at = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);
        let u32_at =
            |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);

        if u32_at(16) != FMT_CHUNK_SIZE || u16_at(20) != PCM_FORMAT {
            return Err(WavError::malformed("not a canonical PCM fmt chunk"));
        }
        if u16_at(22) != CHANNELS || u16_at(34) != BITS_PER_SAMPLE {
            return Err(WavError::malformed(format!(
                "unsupported layout: channels={} bits={}",
                u16_at(22),
                u16_at(34)
            )));
        }

        let header = Self::new(u32_at(24), u32_at(40) as usize)?;
        if u32_at(4) != header.chunk_size()
            || u32_at(28) != header.byte_rate()
            || u16_at(32) != header.block_align()
        {
            return Err(WavError::malformed("derived fields do not match data size"));
        }
        Ok(header)
    }
}
