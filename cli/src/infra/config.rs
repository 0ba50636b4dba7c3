//! Infrastructure implementations of the `ConfigStore` and
//! `CatalogueSource` ports.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use studentbox_common::StudentboxConfig;

use crate::application::ports::{CatalogueSource, ConfigStore};
use crate::domain::RuntimeCatalogue;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "STUDENTBOX_CONFIG";

/// Production implementation of `ConfigStore` that reads a YAML file on disk.
pub struct YamlConfigStore;

impl ConfigStore for YamlConfigStore {
    fn load(&self) -> Result<StudentboxConfig> {
        let path = self.path()?;
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(StudentboxConfig::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        serde_yaml::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
    }

    fn path(&self) -> Result<PathBuf> {
        if let Ok(val) = std::env::var(CONFIG_ENV) {
            return Ok(PathBuf::from(val));
        }
        let dir =
            dirs::config_dir().ok_or_else(|| anyhow::anyhow!("cannot determine config directory"))?;
        Ok(dir.join("studentbox").join("config.yaml"))
    }
}

/// Built-in runtimes plus an optional YAML catalogue file.
pub struct YamlCatalogue;

impl CatalogueSource for YamlCatalogue {
    fn load(&self, extra: Option<&Path>) -> Result<RuntimeCatalogue> {
        let mut catalogue = RuntimeCatalogue::builtin().context("built-in runtime catalogue")?;
        if let Some(path) = extra {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            let file = RuntimeCatalogue::from_yaml(&content)
                .with_context(|| format!("cannot load runtimes from {}", path.display()))?;
            catalogue.merge(file);
        }
        Ok(catalogue)
    }
}
