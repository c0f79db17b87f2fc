mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = ["./datamosh.toml", "~/.config/datamosh/config.toml"];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration.
///
/// Run again after command-line overrides are applied. An inverted effect
/// window is not rejected here; the pipeline reports it before doing any work.
pub fn validate_config(config: &Config) -> Result<()> {
    let mosh = &config.mosh;

    if mosh.fps == 0 {
        anyhow::bail!("fps must be greater than 0");
    }

    for (name, value) in [
        ("video_start", mosh.video_start),
        ("video_end", mosh.video_end),
        ("effect_start", mosh.effect_start),
        ("effect_end", mosh.effect_end),
    ] {
        if !value.is_finite() {
            anyhow::bail!("{} must be a finite number of seconds, got {}", name, value);
        }
    }

    if mosh.video_start < 0.0 {
        anyhow::bail!("video_start must not be negative, got {}", mosh.video_start);
    }

    if mosh.video_end <= mosh.video_start {
        anyhow::bail!(
            "video_end ({}) must be after video_start ({})",
            mosh.video_end,
            mosh.video_start
        );
    }

    if let Some(width) = config.output.width {
        if width == 0 || width % 2 != 0 {
            anyhow::bail!("output width must be a positive even number, got {}", width);
        }
    }

    if let Some(ref ffmpeg) = config.tools.ffmpeg_path {
        if !ffmpeg.exists() {
            tracing::warn!("Configured ffmpeg path does not exist: {:?}", ffmpeg);
        }
    }

    Ok(())
}
