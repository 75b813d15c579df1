//! FFmpeg execution adapter
//!
//! Cuts a segment out of a downloaded file and re-encodes it. Stream copy is
//! never used: arbitrary cut points inside a GOP cannot be rewrapped
//! losslessly, and the source codec may not fit the output container.

use std::ffi::{OsStr, OsString};
use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use crate::adapters::process::run_streaming;
use crate::adapters::toml_config::AppConfig;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// FFmpeg-based execution adapter
pub struct FFmpegAdapter {
    program: OsString,
    video_codec: String,
    audio_codec: String,
}

impl FFmpegAdapter {
    /// Create new FFmpeg adapter
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.transcoder_path).with_codecs(&config.video_codec, &config.audio_codec)
    }

    /// Set the video/audio encoder pair
    pub fn with_codecs(mut self, video: impl Into<String>, audio: impl Into<String>) -> Self {
        self.video_codec = video.into();
        self.audio_codec = audio.into();
        self
    }

    /// Build command arguments
    pub fn build_args(&self, input: &Path, range: &TimeRange, output: &Path) -> Vec<OsString> {
        vec![
            "-hide_banner".into(),
            "-nostdin".into(),
            "-y".into(),
            "-i".into(),
            input.as_os_str().to_os_string(),
            "-ss".into(),
            range.start.format_hms().into(),
            "-to".into(),
            range.end.format_hms().into(),
            "-c:v".into(),
            self.video_codec.clone().into(),
            "-c:a".into(),
            self.audio_codec.clone().into(),
            "-movflags".into(),
            "+faststart".into(),
            output.as_os_str().to_os_string(),
        ]
    }
}

#[async_trait]
impl TranscodePort for FFmpegAdapter {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn trim(
        &self,
        input: &Path,
        range: &TimeRange,
        output: &Path,
    ) -> Result<ProcessReport, DomainError> {
        let args = self.build_args(input, range, output);
        info!(
            start = %range.start,
            end = %range.end,
            output = %output.display(),
            "running ffmpeg"
        );
        run_streaming(self.name(), OsStr::new(&self.program), args).await
    }
}
