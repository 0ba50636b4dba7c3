//! Effective settings: config file, CLI flags and environment defaults
//! merged in that order of increasing precedence (flags win).
//!
//! Pure functions only — no I/O, no async, no filesystem access. The
//! environment-derived defaults are passed in by the caller.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use studentbox_common::StudentboxConfig;

use crate::domain::error::ConfigError;

/// Default data directory, relative to the host path.
pub const DEFAULT_DATA_PATH: &str = "./data";

/// Values read from the process environment, used when neither the config
/// file nor a flag sets a field.
#[derive(Debug, Clone)]
pub struct EnvDefaults {
    /// `$XDG_RUNTIME_DIR`, if set.
    pub runtime_dir: Option<PathBuf>,
    /// Current working directory.
    pub cwd: PathBuf,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct FlagOverrides {
    pub socket: Option<String>,
    pub host_path: Option<PathBuf>,
    pub data_path: Option<PathBuf>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub socket: String,
    pub host_path: PathBuf,
    pub data_path: PathBuf,
    pub images: BTreeMap<String, String>,
    pub runtimes_file: Option<PathBuf>,
}

/// Default podman socket URL: `unix://$XDG_RUNTIME_DIR/podman/podman.sock`,
/// with `/tmp` standing in for an unset runtime directory.
pub fn default_socket(runtime_dir: Option<&Path>) -> String {
    let dir = runtime_dir.unwrap_or_else(|| Path::new("/tmp"));
    format!("unix://{}/podman/podman.sock", dir.display())
}

/// Merge config file, flags and defaults.
pub fn resolve_settings(
    file: &StudentboxConfig,
    flags: &FlagOverrides,
    defaults: &EnvDefaults,
) -> Settings {
    Settings {
        socket: flags
            .socket
            .clone()
            .or_else(|| file.socket.clone())
            .unwrap_or_else(|| default_socket(defaults.runtime_dir.as_deref())),
        host_path: flags
            .host_path
            .clone()
            .or_else(|| file.host_path.clone())
            .unwrap_or_else(|| defaults.cwd.clone()),
        data_path: flags
            .data_path
            .clone()
            .or_else(|| file.data_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH)),
        images: file.images.clone(),
        runtimes_file: file.runtimes_file.clone(),
    }
}

/// Parse `KEY=VALUE` assignments given with `--env`.
///
/// Each entry must contain `=` and may neither start nor end with it. The
/// value is everything after the first `=`.
///
/// # Errors
///
/// Returns `InvalidEnvAssignment` for the first malformed entry.
pub fn parse_env_assignments(values: &[String]) -> Result<BTreeMap<String, String>, ConfigError> {
    values
        .iter()
        .map(|raw| match raw.split_once('=') {
            Some((k, v)) if !k.is_empty() && !raw.ends_with('=') => {
                Ok((k.to_string(), v.to_string()))
            }
            _ => Err(ConfigError::InvalidEnvAssignment(raw.clone())),
        })
        .collect()
}

// ── Unit tests ───────────────────────────────────────────────────────────────
