use tts_wav_export::wav::{WavHeader, HEADER_LEN};

#[test]
fn header_arithmetic_round_trips() {
    for rate in [8_000_u32, 16_000, 22_050, 32_000, 44_100, 48_000, 1] {
        for data_bytes in [2_usize, 1_000, 7_000, 65_536, 10_000_000] {
            let bytes = WavHeader::new(rate, data_bytes).unwrap().to_bytes();
            assert_eq!(bytes.len(), HEADER_LEN);

            let decoded = WavHeader::parse(&bytes).unwrap();
            let u32_at = |at: usize| u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap());
            let u16_at = |at: usize| u16::from_le_bytes(bytes[at..at + 2].try_into().unwrap());

            assert_eq!(u32_at(4), 36 + data_bytes as u32);
            assert_eq!(u32_at(24), rate);
            assert_eq!(u32_at(28), rate * 2);
            assert_eq!(u16_at(32), 2);
            assert_eq!(u32_at(40), data_bytes as u32);
            assert_eq!(decoded.sample_rate(), rate);
            assert_eq!(decoded.data_size() as usize, data_bytes);
        }
    }
}

#[test]
fn fixed_fields_are_canonical() {
    let bytes = WavHeader::new(16_000, 4).unwrap().to_bytes();
    assert_eq!(&bytes[0..4], b"RIFF");
    assert_eq!(&bytes[8..16], b"WAVEfmt ");
    assert_eq!(&bytes[16..20], &16u32.to_le_bytes());
    assert_eq!(&bytes[20..22], &1u16.to_le_bytes());
    assert_eq!(&bytes[22..24], &1u16.to_le_bytes());
    assert_eq!(&bytes[34..36], &16u16.to_le_bytes());
    assert_eq!(&bytes[36..40], b"data");
}
