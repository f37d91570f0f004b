mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config = parse_config(&content)
        .with_context(|| format!("Failed to load config file: {:?}", path))?;

    Ok(config)
}

/// Parse and validate configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Invalid TOML")?;
    validate_config(&config)?;
    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./config.toml",
        "./cinecache.toml",
        "~/.config/cinecache/config.toml",
        "/etc/cinecache/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.auth.enabled && config.auth.access_code.as_deref().unwrap_or("").is_empty() {
        anyhow::bail!("Auth is enabled but no access code is set");
    }

    if config.archive.enabled && config.archive.api_key.as_deref().unwrap_or("").is_empty() {
        anyhow::bail!("Subtitle archive is enabled but has no API key");
    }

    if config.library.extensions.is_empty() {
        anyhow::bail!("At least one media extension must be configured");
    }

    if config.subtitles.max_words == 0 {
        anyhow::bail!("subtitles.max_words must be at least 1");
    }

    if !config.library.media_dir.exists() {
        tracing::warn!("Media directory does not exist: {:?}", config.library.media_dir);
    }

    Ok(())
}
