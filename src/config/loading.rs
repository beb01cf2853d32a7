//! Configuration loading from TOML files and tag strings

use anyhow::Result;
use std::collections::HashMap;

use super::types::Config;

/// Load configuration from a TOML file
///
/// Not validated here: command-line flags are merged in afterwards and the
/// combined result is validated by the caller.
pub fn load_config(config_path: &str) -> Result<Config> {
    let config_content = std::fs::read_to_string(config_path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", config_path, e))?;

    let config: Config = toml::from_str(&config_content)
        .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", config_path, e))?;

    tracing::debug!("Loaded configuration from {}", config_path);
    Ok(config)
}

/// Parse `tag1=value1,tag2=value2` into a tag map
///
/// Keys and values are trimmed. An empty string yields no tags.
pub fn parse_tags(s: &str) -> Result<HashMap<String, String>> {
    let mut tags = HashMap::new();
    if s.trim().is_empty() {
        return Ok(tags);
    }

    for tag in s.split(',') {
        let (key, value) = tag
            .split_once('=')
            .filter(|(_, value)| !value.contains('='))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Invalid tag '{}': tags must be formatted as \"tag=value,tag2=value...\"",
                    tag
                )
            })?;
        tags.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(tags)
}
