mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    parse_config(&content).with_context(|| format!("Invalid config file: {:?}", path))
}

/// Parse and validate configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config> {
    let mut config: Config = toml::from_str(content).context("Failed to parse config")?;

    normalize_extensions(&mut config.conversion.extensions);
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./convid.toml",
        "./config.toml",
        "~/.config/convid/config.toml",
    ];

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

/// Lowercase extensions, strip leading dots, drop blanks and duplicates.
fn normalize_extensions(extensions: &mut Vec<String>) {
    let mut seen = Vec::with_capacity(extensions.len());
    for ext in extensions.drain(..) {
        let ext = ext.trim().trim_start_matches('.').to_lowercase();
        if !ext.is_empty() && !seen.contains(&ext) {
            seen.push(ext);
        }
    }
    *extensions = seen;
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.conversion.extensions.is_empty() {
        anyhow::bail!("conversion.extensions cannot be empty");
    }

    if let Some(ref dir) = config.conversion.output_dir {
        if dir.is_file() {
            anyhow::bail!("conversion.output_dir is a file: {:?}", dir);
        }
    }

    for (name, path) in [
        ("ffmpeg", &config.tools.ffmpeg_path),
        ("ffprobe", &config.tools.ffprobe_path),
    ] {
        if let Some(path) = path {
            if !path.exists() {
                tracing::warn!("Configured {} path does not exist: {:?}", name, path);
            }
        }
    }

    config.policy.validate()?;

    Ok(())
}
