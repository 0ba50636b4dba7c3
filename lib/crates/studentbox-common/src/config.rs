use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// On-disk configuration (`~/.config/studentbox/config.yaml`).
///
/// Every field is optional; unset fields fall back to the defaults resolved
/// by the CLI (socket under `$XDG_RUNTIME_DIR`, data path `./data`, host path
/// = current directory).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StudentboxConfig {
    /// Podman service URL, e.g. `unix:///run/user/1000/podman/podman.sock`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socket: Option<String>,

    /// Absolute parent directory of `data_path` on the daemon's host
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_path: Option<PathBuf>,

    /// Project data directory, relative to `host_path`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_path: Option<PathBuf>,

    /// Allow-listed images: short id -> fully qualified reference
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub images: BTreeMap<String, String>,

    /// Extra runtime catalogue merged over the built-in runtimes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtimes_file: Option<PathBuf>,
}
