//! Configuration initialization and hierarchy management

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::adapters::{AppConfig, TomlConfigAdapter};
use crate::cli::{Cli, Commands};
use crate::domain::errors::DomainError;
use crate::domain::rules::FormatLadder;
use crate::error::ClipCutError;

/// Environment variables and the config keys they override
pub const ENV_MAPPINGS: &[(&str, &str)] = &[
    ("CLIPCUT_DOWNLOADS_DIR", "downloads_dir"),
    ("CLIPCUT_STORE_PATH", "store_path"),
    ("CLIPCUT_EXTRACTOR_PATH", "extractor_path"),
    ("CLIPCUT_TRANSCODER_PATH", "transcoder_path"),
    ("CLIPCUT_FORMAT_LADDER", "format_ladder"),
    ("CLIPCUT_MIN_FILE_BYTES", "min_file_bytes"),
    ("CLIPCUT_USER_AGENT", "user_agent"),
    ("CLIPCUT_CHECK_CERTIFICATES", "check_certificates"),
    ("CLIPCUT_VIDEO_CODEC", "video_codec"),
    ("CLIPCUT_AUDIO_CODEC", "audio_codec"),
    ("CLIPCUT_OUTPUT_EXTENSION", "output_extension"),
    ("CLIPCUT_JOB_TIMEOUT_SECS", "job_timeout_secs"),
    ("CLIPCUT_MAX_CONCURRENT_JOBS", "max_concurrent_jobs"),
];

/// Initialize configuration hierarchy following precedence: CLI > Env > File > Defaults
pub fn initialize_configuration_hierarchy(cli: &Cli) -> Result<AppConfig> {
    info!("Initializing configuration hierarchy");

    let mut config = load_config_file(cli.config.clone())?;

    let env_overrides = apply_env_overrides(&mut config, |key| std::env::var(key).ok())
        .map_err(ClipCutError::from)?;
    if env_overrides > 0 {
        info!("Applied {} environment variable overrides", env_overrides);
    }

    let cli_overrides = apply_cli_configuration_overrides(&mut config, cli)
        .map_err(ClipCutError::from)?;
    if cli_overrides > 0 {
        info!("Applied {} CLI configuration overrides", cli_overrides);
    }

    config.validate().map_err(ClipCutError::from)?;
    Ok(config)
}

/// Load the explicit config file, or the first default one found
fn load_config_file(explicit: Option<PathBuf>) -> Result<AppConfig> {
    let path = match explicit {
        Some(path) => path,
        None => match TomlConfigAdapter::find_default_file() {
            Some(path) => path,
            None => {
                info!("No configuration file found, using defaults");
                return Ok(AppConfig::default());
            }
        },
    };

    info!("Loading configuration from: {}", path.display());
    TomlConfigAdapter::load_file(&path)
        .map_err(ClipCutError::from)
        .with_context(|| format!("Loading {}", path.display()))
}

/// Apply `CLIPCUT_*` variables found through `lookup`. Returns how many were applied.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<usize, DomainError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut applied = 0;
    for (env_var, key) in ENV_MAPPINGS {
        let Some(value) = lookup(env_var) else {
            continue;
        };
        info!("Found environment override: {} = {}", env_var, value);
        set_key(config, key, &value)
            .map_err(|e| DomainError::InvalidConfig(format!("{}: {}", env_var, e)))?;
        applied += 1;
    }
    Ok(applied)
}

fn set_key(config: &mut AppConfig, key: &str, value: &str) -> Result<(), String> {
    fn number<T: std::str::FromStr>(value: &str) -> Result<T, String> {
        value
            .trim()
            .parse()
            .map_err(|_| format!("'{}' is not a valid number", value))
    }

    match key {
        "downloads_dir" => config.downloads_dir = PathBuf::from(value),
        "store_path" => config.store_path = Some(PathBuf::from(value)),
        "extractor_path" => config.extractor_path = value.to_string(),
        "transcoder_path" => config.transcoder_path = value.to_string(),
        "format_ladder" => {
            config.format_ladder = FormatLadder::parse(value)
                .map_err(|e| e.to_string())?
                .to_tokens()
        }
        "min_file_bytes" => config.min_file_bytes = number(value)?,
        "user_agent" => config.user_agent = value.to_string(),
        "check_certificates" => {
            config.check_certificates = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(format!("'{}' is not a valid boolean", value)),
            }
        }
        "video_codec" => config.video_codec = value.to_string(),
        "audio_codec" => config.audio_codec = value.to_string(),
        "output_extension" => config.output_extension = value.to_string(),
        "job_timeout_secs" => config.job_timeout_secs = number(value)?,
        "max_concurrent_jobs" => config.max_concurrent_jobs = number(value)?,
        other => return Err(format!("unknown config key '{}'", other)),
    }
    Ok(())
}

/// Apply CLI argument overrides to configuration
fn apply_cli_configuration_overrides(config: &mut AppConfig, cli: &Cli) -> Result<usize, DomainError> {
    let mut cli_overrides = 0;

    if let Some(dir) = &cli.downloads_dir {
        info!("CLI override: downloads_dir = {}", dir.display());
        config.downloads_dir = dir.clone();
        cli_overrides += 1;
    }

    match &cli.command {
        Commands::Download(args) => {
            if let Some(ladder) = &args.format_ladder {
                info!("CLI override: format_ladder = {}", ladder);
                config.format_ladder = FormatLadder::parse(ladder)?.to_tokens();
                cli_overrides += 1;
            }
        }
        Commands::Batch(args) => {
            if let Some(jobs) = args.jobs {
                info!("CLI override: max_concurrent_jobs = {}", jobs);
                config.max_concurrent_jobs = jobs;
                cli_overrides += 1;
            }
        }
        _ => {}
    }

    Ok(cli_overrides)
}
