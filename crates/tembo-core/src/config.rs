use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Tunables for the archive and the queries built on it.
///
/// Every field has a default, so an empty or partial TOML file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ArchiveConfig {
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Edge length of one spatial grid cell, in coordinate units.
    #[serde(default = "default_cell_size")]
    pub cell_size: f64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            cell_size: default_cell_size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Furthest distance the nearest-source search expands to.
    #[serde(default = "default_max_radius")]
    pub max_radius: f64,
    /// Generations an ancestry walk follows before truncating.
    #[serde(default = "default_max_timeline_depth")]
    pub max_timeline_depth: usize,
    /// Default period for migration anniversary alerts, in years.
    #[serde(default = "default_anniversary_period")]
    pub anniversary_period: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_radius: default_max_radius(),
            max_timeline_depth: default_max_timeline_depth(),
            anniversary_period: default_anniversary_period(),
        }
    }
}

const fn default_cell_size() -> f64 {
    1.0
}

const fn default_max_radius() -> f64 {
    64.0
}

const fn default_max_timeline_depth() -> usize {
    64
}

const fn default_anniversary_period() -> u32 {
    5
}

impl ArchiveConfig {
    /// Reject values the index and search code cannot work with.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if !(self.index.cell_size.is_finite() && self.index.cell_size > 0.0) {
            bail!("index.cell_size must be a positive number");
        }
        if !(self.search.max_radius.is_finite() && self.search.max_radius > 0.0) {
            bail!("search.max_radius must be a positive number");
        }
        if self.search.max_timeline_depth == 0 {
            bail!("search.max_timeline_depth must be > 0");
        }
        if self.search.anniversary_period == 0 {
            bail!("search.anniversary_period must be > 0");
        }
        Ok(())
    }
}

/// Load and validate a config file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or fails validation.
pub fn load_config(path: &Path) -> Result<ArchiveConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<ArchiveConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config in {}", path.display()))?;
    Ok(config)
}

/// Location of the per-user config file, if the platform has a config dir.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tembo/config.toml"))
}

/// Resolve the effective config.
///
/// Precedence: an explicit path (must exist), then the user config file if
/// present, then defaults.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be loaded.
pub fn resolve_config(explicit: Option<&Path>) -> Result<ArchiveConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }

    match user_config_path() {
        Some(path) if path.exists() => load_config(&path),
        _ => Ok(ArchiveConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        assert!(ArchiveConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "[index]\ncell_size = 2.5")?;
        let config = load_config(file.path())?;
        assert!((config.index.cell_size - 2.5).abs() < f64::EPSILON);
        assert_eq!(config.search, SearchConfig::default());
        Ok(())
    }

    #[test]
    fn invalid_values_are_rejected() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "[search]\nanniversary_period = 0")?;
        let err = load_config(file.path()).err();
        assert!(err.is_some_and(|e| format!("{e:#}").contains("anniversary_period")));
        Ok(())
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let missing = Path::new("/definitely/not/here/tembo.toml");
        assert!(resolve_config(Some(missing)).is_err());
    }
}
