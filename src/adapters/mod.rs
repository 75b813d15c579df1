// Adapters - External system implementations

pub mod exec_ffmpeg;
pub mod exec_ytdlp;
pub mod json_store;
pub mod process;
pub mod toml_config;
pub mod tracing_log;

// Re-export adapters
pub use exec_ffmpeg::FFmpegAdapter;
pub use exec_ytdlp::YtDlpAdapter;
pub use json_store::JsonArtifactStore;
pub use toml_config::{AppConfig, TomlConfigAdapter};
pub use tracing_log::{init_tracing, LogFormat};
