use tts_wav_export::audio_pipeline::quantize_i16;

#[test]
fn clamps_at_and_beyond_boundaries() {
    let bytes = quantize_i16(&[-1.5, -1.0, 0.0, 1.0, 1.5]);

    let mut expected = Vec::new();
    for value in [-32768_i16, -32768, 0, 32767, 32767] {
        expected.extend_from_slice(&value.to_le_bytes());
    }
    assert_eq!(bytes, expected);
}

#[test]
fn output_is_two_bytes_per_sample() {
    assert!(quantize_i16(&[]).is_empty());
    assert_eq!(quantize_i16(&[0.25; 33]).len(), 66);
}
