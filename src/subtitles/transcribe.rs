//! Speech-to-text fallback using ffmpeg and the whisper.cpp CLI.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::tools::get_tool_path;

#[async_trait]
pub trait Transcriber: Send + Sync {
    fn name(&self) -> &'static str;

    /// Transcribe `media` into an SRT file at `dest`, returning `dest`.
    ///
    /// Long-running; no timeout is applied.
    async fn transcribe(&self, media: &Path, dest: &Path) -> anyhow::Result<PathBuf>;
}

#[derive(Debug, Clone)]
pub struct WhisperTranscriber {
    whisper: Option<PathBuf>,
    ffmpeg: Option<PathBuf>,
    model: PathBuf,
    translate: bool,
    threads: Option<u32>,
}

impl WhisperTranscriber {
    pub fn new(model: impl Into<PathBuf>) -> Self {
        Self {
            whisper: None,
            ffmpeg: None,
            model: model.into(),
            translate: false,
            threads: None,
        }
    }

    pub fn with_whisper_path(mut self, path: Option<PathBuf>) -> Self {
        self.whisper = path;
        self
    }

    pub fn with_ffmpeg_path(mut self, path: Option<PathBuf>) -> Self {
        self.ffmpeg = path;
        self
    }

    pub fn with_translate(mut self, translate: bool) -> Self {
        self.translate = translate;
        self
    }

    pub fn with_threads(mut self, threads: Option<u32>) -> Self {
        self.threads = threads;
        self
    }

    async fn extract_audio(&self, media: &Path, wav: &Path) -> anyhow::Result<()> {
        let ffmpeg = get_tool_path("ffmpeg", self.ffmpeg.as_deref())?;
        let output = Command::new(ffmpeg)
            .args(["-y", "-hide_banner", "-loglevel", "error", "-i"])
            .arg(media)
            .args(["-ar", "16000", "-ac", "1", "-c:a", "pcm_s16le"])
            .arg(wav)
            .output()
            .await
            .context("Failed to spawn ffmpeg")?;

        if !output.status.success() {
            bail!(
                "ffmpeg audio extraction failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }

    /// Run whisper on `wav`, writing `<out_base>.srt`.
    async fn run_whisper(&self, wav: &Path, out_base: &Path) -> anyhow::Result<PathBuf> {
        let whisper = get_tool_path("whisper-cli", self.whisper.as_deref())?;
        let mut cmd = Command::new(whisper);
        cmd.arg("--model")
            .arg(&self.model)
            .arg("--file")
            .arg(wav)
            .arg("-osrt")
            .arg("--output-file")
            .arg(out_base)
            .arg("--no-prints");
        if self.translate {
            cmd.arg("-tr");
        }
        if let Some(threads) = self.threads.filter(|t| *t > 0) {
            cmd.arg("--threads").arg(threads.to_string());
        }

        let output = cmd.output().await.context("Failed to spawn whisper-cli")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
            bail!(
                "whisper-cli failed: {}",
                tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
            );
        }

        let srt = out_base.with_extension("srt");
        if !srt.exists() {
            bail!("Expected SRT file not found at {:?}", srt);
        }
        Ok(srt)
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    fn name(&self) -> &'static str {
        "whisper"
    }

    async fn transcribe(&self, media: &Path, dest: &Path) -> anyhow::Result<PathBuf> {
        if dest.exists() {
            debug!(dest = %dest.display(), "Transcript already exists, skipping");
            return Ok(dest.to_path_buf());
        }

        let work = tempfile::tempdir().context("Failed to create transcription work dir")?;
        let wav = work.path().join("audio.wav");

        info!(media = %media.display(), "Transcribing audio");
        self.extract_audio(media, &wav).await?;
        let srt = self.run_whisper(&wav, &work.path().join("transcript")).await?;

        move_file(&srt, dest).await?;
        Ok(dest.to_path_buf())
    }
}

/// Rename `src` to `dest`, copying across filesystems when rename fails.
pub async fn move_file(src: &Path, dest: &Path) -> anyhow::Result<()> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    if tokio::fs::rename(src, dest).await.is_ok() {
        return Ok(());
    }

    tokio::fs::copy(src, dest)
        .await
        .with_context(|| format!("Failed to copy {:?} to {:?}", src, dest))?;
    tokio::fs::remove_file(src).await?;
    Ok(())
}
