use anyhow::{Context, Result};
use arch_tree::{ArchConfig, DEFAULT_CONFIG_NAME};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Load the editor configuration: `path` when given, otherwise
/// `arch.config.json` in `cwd`, otherwise the defaults.
pub fn load(path: Option<&Path>, cwd: &Path) -> Result<ArchConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let candidate = cwd.join(DEFAULT_CONFIG_NAME);
            if !candidate.exists() {
                debug!("No {} found, using defaults", DEFAULT_CONFIG_NAME);
                return Ok(ArchConfig::default());
            }
            candidate
        }
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Cannot read config file {}", path.display()))?;
    let config = ArchConfig::from_json(&content)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    debug!(path = %path.display(), "Loaded configuration");
    Ok(config)
}
