use bytes::{BufMut, BytesMut};

/// f32 サンプル（-1.0..1.0）を 16bit 整数へ変換
///
/// 範囲外はクリップする。負側は 32768、正側は 32767 を掛けるため
/// `-1.0 -> -32768`, `1.0 -> 32767` となる。NaN は 0 になる。
pub fn quantize_sample(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    let scaled = if clamped < 0.0 {
        clamped * 32768.0
    } else {
        clamped * i16::MAX as f32
    };
    scaled.round() as i16
}

/// リトルエンディアン 16bit PCM を `out` の末尾へ追記
pub fn quantize_into(samples: &[f32], out: &mut BytesMut) {
    out.reserve(samples.len() * 2);
    for &sample in samples {
        out.put_i16_le(quantize_sample(sample));
    }
}

/// サンプル列全体をリトルエンディアン 16bit PCM バイト列へ変換
pub fn quantize_i16(samples: &[f32]) -> Vec<u8> {
    let mut out = BytesMut::with_capacity(samples.len() * 2);
    quantize_into(samples, &mut out);
    out.to_vec()
}
