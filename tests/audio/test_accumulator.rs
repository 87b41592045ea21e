use tts_wav_export::audio_pipeline::AccumulationBuffer;

fn chunk(start: usize, len: usize) -> Vec<f32> {
    (start..start + len).map(|i| i as f32 * 1e-4).collect()
}

#[test]
fn snapshot_is_concatenation_in_delivery_order() {
    let sequences: [&[usize]; 4] = [&[], &[1], &[7, 0, 3, 12], &[100, 250, 1, 49, 600]];

    for lengths in sequences {
        let mut buffer = AccumulationBuffer::with_capacity(8, 1.5).unwrap();
        let mut expected = Vec::new();
        let mut offset = 0;
        for &len in lengths {
            let frames = chunk(offset, len);
            buffer.append(&frames).unwrap();
            expected.extend_from_slice(&frames);
            offset += len;
        }

        assert_eq!(buffer.len(), lengths.iter().sum::<usize>());
        assert_eq!(buffer.snapshot(), expected.as_slice());
        assert!(buffer.len() <= buffer.capacity());
    }
}

#[test]
fn growth_preserves_previous_samples() {
    let mut buffer = AccumulationBuffer::with_capacity(16, 1.5).unwrap();
    let first = chunk(0, 16);
    buffer.append(&first).unwrap();
    let before = buffer.capacity();

    let second = chunk(16, 40);
    buffer.append(&second).unwrap();
    assert!(buffer.capacity() > before);

    let bits: Vec<u32> = buffer.snapshot()[..16].iter().map(|s| s.to_bits()).collect();
    let expected: Vec<u32> = first.iter().map(|s| s.to_bits()).collect();
    assert_eq!(bits, expected);
    assert_eq!(&buffer.snapshot()[16..], second.as_slice());
}

#[test]
fn capacity_only_increases() {
    let mut buffer = AccumulationBuffer::with_capacity(1, 2.0).unwrap();
    let mut last = buffer.capacity();
    for len in [1, 3, 0, 9, 2, 30] {
        buffer.append(&chunk(0, len)).unwrap();
        assert!(buffer.capacity() >= last);
        last = buffer.capacity();
    }
}
