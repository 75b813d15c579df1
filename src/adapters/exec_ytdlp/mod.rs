//! yt-dlp extraction adapter
//!
//! Runs one yt-dlp process per attempt with a single format selector.

use std::ffi::{OsStr, OsString};
use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use crate::adapters::process::run_streaming;
use crate::adapters::toml_config::AppConfig;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// yt-dlp based extraction adapter
pub struct YtDlpAdapter {
    program: OsString,
    user_agent: String,
    check_certificates: bool,
    merge_format: Option<String>,
}

impl YtDlpAdapter {
    /// Create new yt-dlp adapter
    pub fn new(program: impl Into<OsString>, user_agent: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            user_agent: user_agent.into(),
            check_certificates: false,
            merge_format: None,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.extractor_path, &config.user_agent)
            .with_certificate_checks(config.check_certificates)
            .with_merge_format(config.output_extension.trim_start_matches('.'))
    }

    /// Enable TLS certificate verification
    pub fn with_certificate_checks(mut self, enabled: bool) -> Self {
        self.check_certificates = enabled;
        self
    }

    /// Container used when separate video and audio streams are merged
    pub fn with_merge_format(mut self, format: impl Into<String>) -> Self {
        self.merge_format = Some(format.into());
        self
    }

    /// Build command arguments
    pub fn build_args(
        &self,
        source_link: &str,
        selector: &FormatSelector,
        output: &Path,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();

        if !self.check_certificates {
            args.push("--no-check-certificates".into());
        }
        args.push("--user-agent".into());
        args.push(self.user_agent.clone().into());
        // One link never fans out into a playlist download
        args.push("--no-playlist".into());
        args.push("--no-progress".into());
        args.push("-f".into());
        args.push(selector.as_str().into());
        if let Some(format) = &self.merge_format {
            args.push("--merge-output-format".into());
            args.push(format.into());
        }
        args.push("-o".into());
        args.push(output_template(output));
        // Separates options from a link that may start with '-'
        args.push("--".into());
        args.push(source_link.into());
        args
    }
}

/// `-o` takes an output template where `%` starts a field, so literal
/// percent signs in the path are doubled
fn output_template(output: &Path) -> OsString {
    if let Some(path) = output.to_str() {
        return path.replace('%', "%%").into();
    }

    #[cfg(unix)]
    {
        use std::os::unix::ffi::{OsStrExt, OsStringExt};

        let mut escaped = Vec::with_capacity(output.as_os_str().len());
        for &byte in output.as_os_str().as_bytes() {
            if byte == b'%' {
                escaped.push(b'%');
            }
            escaped.push(byte);
        }
        OsString::from_vec(escaped)
    }

    #[cfg(not(unix))]
    {
        output.as_os_str().to_os_string()
    }
}

#[async_trait]
impl ExtractPort for YtDlpAdapter {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn fetch(
        &self,
        source_link: &str,
        selector: &FormatSelector,
        output: &Path,
    ) -> Result<ProcessReport, DomainError> {
        let args = self.build_args(source_link, selector, output);
        info!(
            selector = %selector,
            output = %output.display(),
            "running yt-dlp"
        );
        run_streaming(self.name(), OsStr::new(&self.program), args).await
    }
}
