#![allow(dead_code)]

use std::path::Path;

use tts_wav_export::audio_pipeline::AudioBuffer;
use tts_wav_export::config::{ConfigSet, EngineConfig, OutputConfig, SessionConfig};
use tts_wav_export::engine::{ScriptOutcome, ScriptedEngine, ToneEngine};
use tts_wav_export::wav::{WavHeader, HEADER_LEN};
use tts_wav_export::SpeechSynthesizer;

pub fn test_config() -> ConfigSet {
    ConfigSet::load_from_dir("config").expect("failed to load config")
}

pub fn buffer(rate: f64, frames: usize) -> AudioBuffer {
    let samples = (0..frames)
        .map(|n| ((n % 200) as f32 / 100.0) - 1.0)
        .collect();
    AudioBuffer::new(rate, samples)
}

pub fn scripted(
    chunks: Vec<AudioBuffer>,
    outcome: ScriptOutcome,
) -> SpeechSynthesizer<ScriptedEngine> {
    let config = test_config();
    SpeechSynthesizer::new(
        ScriptedEngine::new(chunks, outcome),
        config.output,
        config.session,
    )
}

pub fn tone(engine: EngineConfig) -> SpeechSynthesizer<ToneEngine> {
    SpeechSynthesizer::new(
        ToneEngine::new(engine),
        OutputConfig::default(),
        SessionConfig::default(),
    )
}

/// ファイルを読み込みヘッダとペイロード長を検証
pub fn read_wav(path: &Path) -> (WavHeader, Vec<u8>) {
    let bytes = std::fs::read(path).expect("read wav");
    let header = WavHeader::parse(&bytes).expect("parse header");
    assert_eq!(bytes.len(), HEADER_LEN + header.data_size() as usize);
    (header, bytes[HEADER_LEN..].to_vec())
}

pub fn leftover_files(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|entry| entry.file_name().to_string_lossy().to_string())
                .collect()
        })
        .unwrap_or_default()
}
