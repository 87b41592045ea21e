use std::path::PathBuf;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tts_wav_export::config::ConfigSet;
use tts_wav_export::engine::{ToneEngine, VoiceId};
use tts_wav_export::SpeechSynthesizer;

/// 使い方: tts_wav_export <output.wav> [text] [voice]
#[tokio::main]
async fn main() {
    init_tracing();

    let config = match ConfigSet::load_from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = ?err, "failed to load configuration");
            std::process::exit(1);
        }
    };
    info!(root = ?config.root(), "configuration loaded");

    let mut args = std::env::args().skip(1);
    let Some(destination) = args.next().map(PathBuf::from) else {
        error!("usage: tts_wav_export <output.wav> [text] [voice]");
        std::process::exit(2);
    };
    let text = args
        .next()
        .unwrap_or_else(|| "The quick brown fox jumps over the lazy dog.".to_string());

    let engine = ToneEngine::new(config.engine.clone());
    let synthesizer = SpeechSynthesizer::from_config(engine, &config);
    let voice = args
        .next()
        .map(VoiceId::new)
        .or_else(|| synthesizer.voices().into_iter().next())
        .unwrap_or_else(|| VoiceId::new("default"));

    match synthesizer
        .synthesize_and_save(&text, voice, &destination)
        .await
    {
        Ok(report) => info!(
            path = %report.path.display(),
            sample_rate = report.sample_rate,
            frames = report.frames,
            duration_ms = report.duration.as_millis() as u64,
            "synthesis saved"
        ),
        Err(err) => {
            error!(kind = ?err.kind(), error = %err, "synthesis failed");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install tracing subscriber: {err}");
    }
}
