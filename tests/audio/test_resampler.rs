use tts_wav_export::audio_pipeline::{AudioBuffer, LinearResampler};

fn ramp(len: usize) -> Vec<f32> {
    (0..len).map(|i| i as f32 / len as f32).collect()
}

fn chunked(resampler: &mut LinearResampler, input: &[f32], chunk: usize) -> Vec<f32> {
    let mut output = Vec::new();
    for part in input.chunks(chunk) {
        output.extend(resampler.resample(part));
    }
    output.extend(resampler.flush());
    output
}

#[test]
fn downsampling_reduces_length_and_preserves_edges() {
    let resampler = LinearResampler::new(48_000.0, 16_000.0).unwrap();
    let input = ramp(480);
    let output = resampler.resample_once(&input);

    assert_eq!(output.len(), 160);
    assert!((output[0] - input[0]).abs() < 1e-6);
    assert!((output.last().copied().unwrap() - input.last().copied().unwrap()).abs() < 5e-2);
}

#[test]
fn upsampling_increases_length() {
    let resampler = LinearResampler::new(16_000.0, 48_000.0).unwrap();
    let output = resampler.resample_once(&ramp(160));

    assert_eq!(output.len(), 480);
}

#[test]
fn same_rate_is_lossless_passthrough() {
    let mut resampler = LinearResampler::new(22_050.0, 22_050.0).unwrap();
    let input: Vec<f32> = vec![0.1, -0.333_333_3, 1.5, f32::MIN_POSITIVE, -0.0];
    let output = resampler
        .process(AudioBuffer::new(22_050.0, input.clone()))
        .unwrap();

    assert_eq!(output.sample_rate(), 22_050.0);
    let bits = |v: &[f32]| v.iter().map(|s| s.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(output.samples()), bits(&input));
}

#[test]
fn empty_input_yields_empty_output() {
    let mut resampler = LinearResampler::new(44_100.0, 8_000.0).unwrap();
    let output = resampler
        .process(AudioBuffer::new(44_100.0, Vec::new()))
        .unwrap();
    assert!(output.is_empty());
    assert_eq!(output.sample_rate(), 8_000.0);
}

#[test]
fn non_integer_ratio_length_is_rounded_up() {
    let resampler = LinearResampler::new(22_050.0, 16_000.0).unwrap();
    // 1000 * 16000 / 22050 = 725.6
    assert_eq!(resampler.resample_once(&ramp(1_000)).len(), 726);
}

#[test]
fn chunk_size_does_not_change_output() {
    let input = ramp(22_050);
    let whole = LinearResampler::new(22_050.0, 16_000.0)
        .unwrap()
        .resample_once(&input);
    assert_eq!(whole.len(), 16_000);

    for chunk in [1, 2, 100] {
        let mut resampler = LinearResampler::new(22_050.0, 16_000.0).unwrap();
        let output = chunked(&mut resampler, &input, chunk);
        assert!(
            output.len().abs_diff(whole.len()) <= 1,
            "chunk={chunk}: {} frames vs {}",
            output.len(),
            whole.len()
        );
        let max_diff = output
            .iter()
            .zip(&whole)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0_f32, f32::max);
        assert!(max_diff < 1e-4, "chunk={chunk}: max diff {max_diff}");
    }
}

#[test]
fn upsampling_in_single_frame_chunks_matches_whole_buffer() {
    let input = ramp(160);
    let whole = LinearResampler::new(8_000.0, 44_100.0)
        .unwrap()
        .resample_once(&input);

    let mut resampler = LinearResampler::new(8_000.0, 44_100.0).unwrap();
    let output = chunked(&mut resampler, &input, 1);
    assert_eq!(output.len(), whole.len());
}
