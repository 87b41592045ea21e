use std::future::Future;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::audio_pipeline::quantize_into;

use super::header::WavHeader;
use super::WavError;

/// 既定の書き込みチャンク（64 KiB）
pub const DEFAULT_CHUNK_BYTES: usize = 64 * 1024;

/// ヘッダ + PCM を一定サイズのチャンクに分けて書き出すエンコーダ
///
/// 書き込み中のメモリ使用量はチャンクサイズで上限が決まり、音声長に依存しない。
#[derive(Debug, Clone, Copy)]
pub struct WavEncoder {
    chunk_bytes: usize,
}

impl Default for WavEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_BYTES)
    }
}

impl WavEncoder {
    /// チャンクサイズは偶数（16bit 単位）に切り下げ、最低2バイト
    pub fn new(chunk_bytes: usize) -> Self {
        Self {
            chunk_bytes: (chunk_bytes & !1).max(2),
        }
    }

    pub fn chunk_bytes(&self) -> usize {
        self.chunk_bytes
    }

    /// 量子化済み PCM バイト列をヘッダ付きで書き出す
    ///
    /// `pcm.len()` は偶数であること。途中で失敗した場合、`sink` の内容は不定。
    pub async fn encode<W>(
        &self,
        pcm: &[u8],
        sample_rate: u32,
        sink: &mut W,
    ) -> Result<WavHeader, WavError>
    where
        W: AsyncWrite + Unpin,
    {
        debug_assert!(pcm.len() % 2 == 0, "pcm payload must hold whole 16-bit samples");
        let header = WavHeader::new(sample_rate, pcm.len())?;
        write_chunk(sink, &header.to_bytes()).await?;
        for chunk in pcm.chunks(self.chunk_bytes) {
            write_chunk(sink, chunk).await?;
        }
        sink.flush().await.map_err(write_failed)?;
        Ok(header)
    }

    /// f32 サンプルをチャンク単位で量子化しながら書き出す
    pub async fn encode_samples<W>(
        &self,
        samples: &[f32],
        sample_rate: u32,
        sink: &mut W,
    ) -> Result<WavHeader, WavError>
    where
        W: AsyncWrite + Unpin,
    {
        let data_bytes = samples
            .len()
            .checked_mul(2)
            .ok_or(WavError::PayloadTooLarge { bytes: usize::MAX })?;
        let header = WavHeader::new(sample_rate, data_bytes)?;
        write_chunk(sink, &header.to_bytes()).await?;

        let mut scratch = BytesMut::with_capacity(self.chunk_bytes);
        for chunk in samples.chunks(self.chunk_bytes / 2) {
            scratch.clear();
            quantize_into(chunk, &mut scratch);
            write_chunk(sink, &scratch).await?;
        }
        sink.flush().await.map_err(write_failed)?;
        Ok(header)
    }

    /// 出力先ファイルへ書き出す
    ///
    /// 親ディレクトリを作成し、`<name>.<uuid>.part` に書き込んでから出力先へリネームする。
    /// 失敗時は一時ファイルを削除するため、出力先に不完全なファイルは残らない。
    pub async fn write_file(
        &self,
        destination: &Path,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<WavHeader, WavError> {
        self.write_file_with(destination, samples, sample_rate, |partial| async move {
            fs::File::create(partial).await
        })
        .await
    }

    /// `open` が返すシンク経由で書き出す（一時ファイルの作成は `open` が行う）
    pub async fn write_file_with<S, F, Fut>(
        &self,
        destination: &Path,
        samples: &[f32],
        sample_rate: u32,
        open: F,
    ) -> Result<WavHeader, WavError>
    where
        S: OutputSink,
        F: FnOnce(PathBuf) -> Fut,
        Fut: Future<Output = std::io::Result<S>>,
    {
        let partial = partial_path(destination)?;

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| WavError::DirectoryCreationFailed {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        if fs::metadata(destination)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
        {
            return Err(WavError::SinkNotWritable {
                path: destination.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "destination is a directory",
                ),
            });
        }

        let mut sink = open(partial.clone())
            .await
            .map_err(|source| WavError::SinkNotWritable {
                path: destination.to_path_buf(),
                source,
            })?;

        let result = async {
            let header = self.encode_samples(samples, sample_rate, &mut sink).await?;
            sink.sync().await.map_err(write_failed)?;
            drop(sink);
            fs::rename(&partial, destination)
                .await
                .map_err(write_failed)?;
            Ok::<_, WavError>(header)
        }
        .await;

        match result {
            Ok(header) => {
                debug!(
                    path = %destination.display(),
                    data_bytes = header.data_size(),
                    "wav file written"
                );
                Ok(header)
            }
            Err(err) => {
                remove_if_present(&partial).await;
                Err(err.with_path(destination))
            }
        }
    }

    /// 失敗したセッションの出力先に残っている通常ファイルを削除する
    ///
    /// ディレクトリ等には触れない。削除した場合 `true`。
    pub async fn discard(destination: &Path) -> Result<bool, WavError> {
        match fs::symlink_metadata(destination).await {
            Ok(meta) if meta.is_file() => fs::remove_file(destination)
                .await
                .map(|_| true)
                .map_err(|source| WavError::WriteFailed {
                    path: Some(destination.to_path_buf()),
                    source,
                }),
            _ => Ok(false),
        }
    }
}

/// WAV の書き込み先。`sync` で内容を永続化してからリネームされる
#[async_trait]
pub trait OutputSink: AsyncWrite + Unpin + Send {
    async fn sync(&mut self) -> std::io::Result<()>;
}

#[async_trait]
impl OutputSink for fs::File {
    async fn sync(&mut self) -> std::io::Result<()> {
        self.sync_all().await
    }
}

async fn remove_if_present(path: &Path) {
    if let Err(err) = fs::remove_file(path).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            warn!(
                path = %path.display(),
                error = %err,
                "failed to remove partial wav file"
            );
        }
    }
}

async fn write_chunk<W>(sink: &mut W, chunk: &[u8]) -> Result<(), WavError>
where
    W: AsyncWrite + Unpin,
{
    sink.write_all(chunk).await.map_err(write_failed)
}

fn write_failed(source: std::io::Error) -> WavError {
    WavError::WriteFailed { path: None, source }
}

fn partial_path(destination: &Path) -> Result<PathBuf, WavError> {
    let name = destination
        .file_name()
        .ok_or_else(|| WavError::SinkNotWritable {
            path: destination.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "destination has no file name",
            ),
        })?;
    let mut partial = name.to_os_string();
    partial.push(format!(".{}.part", Uuid::new_v4().simple()));
    Ok(destination.with_file_name(partial))
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use super::*;

    #[test]
    fn chunk_size_is_even() {
        assert_eq!(WavEncoder::new(7).chunk_bytes(), 6);
        assert_eq!(WavEncoder::new(0).chunk_bytes(), 2);
    }

    #[tokio::test]
    async fn encode_writes_header_then_payload() {
        let pcm = [1u8, 0, 2, 0, 3, 0];
        let mut sink = Vec::new();
        let header = WavEncoder::new(2).encode(&pcm, 8_000, &mut sink).await.unwrap();
        assert_eq!(header.data_size(), 6);
        assert_eq!(sink.len(), 50);
        assert_eq!(&sink[44..], &pcm);
    }

    #[tokio::test]
    async fn encode_samples_matches_whole_buffer_quantization() {
        let samples: Vec<f32> = (0..1001).map(|i| (i as f32 / 500.0) - 1.0).collect();
        let mut chunked = Vec::new();
        WavEncoder::new(64)
            .encode_samples(&samples, 16_000, &mut chunked)
            .await
            .unwrap();

        let mut whole = Vec::new();
        WavEncoder::default()
            .encode(&crate::audio_pipeline::quantize_i16(&samples), 16_000, &mut whole)
            .await
            .unwrap();
        assert_eq!(chunked, whole);
    }

    #[test]
    fn partial_path_is_unique_per_write() {
        let first = partial_path(Path::new("out/speech.wav")).unwrap();
        let second = partial_path(Path::new("out/speech.wav")).unwrap();
        assert_ne!(first, second);
        assert_eq!(first.parent(), Some(Path::new("out")));
        let name = first.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("speech.wav."));
        assert!(name.ends_with(".part"));
        assert!(partial_path(Path::new("/")).is_err());
    }

    /// 指定バイト数を書いた後に失敗するシンク
    struct FailingSink {
        inner: fs::File,
        remaining: usize,
    }

    impl AsyncWrite for FailingSink {
        fn poll_write(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            if self.remaining == 0 {
                return Poll::Ready(Err(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk full",
                )));
            }
            let len = buf.len().min(self.remaining);
            let this = &mut *self;
            match Pin::new(&mut this.inner).poll_write(cx, &buf[..len]) {
                Poll::Ready(Ok(written)) => {
                    this.remaining -= written;
                    Poll::Ready(Ok(written))
                }
                other => other,
            }
        }

        fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Pin::new(&mut self.inner).poll_flush(cx)
        }

        fn poll_shutdown(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
        ) -> Poll<std::io::Result<()>> {
            Pin::new(&mut self.inner).poll_shutdown(cx)
        }
    }

    #[async_trait]
    impl OutputSink for FailingSink {
        async fn sync(&mut self) -> std::io::Result<()> {
            self.inner.sync_all().await
        }
    }

    #[tokio::test]
    async fn failing_sink_reports_write_failed() {
        let dir = tempfile::TempDir::new().unwrap();
        let inner = fs::File::create(dir.path().join("sink.bin")).await.unwrap();
        let mut sink = FailingSink {
            inner,
            remaining: 100,
        };
        let err = WavEncoder::new(64)
            .encode_samples(&[0.5; 1_000], 16_000, &mut sink)
            .await
            .unwrap_err();
        assert!(matches!(err, WavError::WriteFailed { path: None, .. }));
    }

    #[tokio::test]
    async fn mid_write_failure_leaves_no_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let destination = dir.path().join("speech.wav");
        let err = WavEncoder::new(64)
            .write_file_with(&destination, &[0.5; 1_000], 16_000, |partial| async move {
                let inner = fs::File::create(partial).await?;
                Ok::<_, std::io::Error>(FailingSink {
                    inner,
                    remaining: 200,
                })
            })
            .await
            .unwrap_err();

        match err {
            WavError::WriteFailed { path, .. } => {
                assert_eq!(path.as_deref(), Some(destination.as_path()))
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!destination.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn discard_removes_only_regular_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let stale = dir.path().join("old.wav");
        std::fs::write(&stale, b"RIFF").unwrap();
        assert!(WavEncoder::discard(&stale).await.unwrap());
        assert!(!stale.exists());

        assert!(!WavEncoder::discard(dir.path()).await.unwrap());
        assert!(dir.path().is_dir());
        assert!(!WavEncoder::discard(&stale).await.unwrap());
    }
}
