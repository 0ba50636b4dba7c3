use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A container carrying the ownership label, as reported by the daemon.
///
/// Only `user` and `project` identify it; the daemon id is informative and
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManagedContainer {
    pub id: String,
    pub name: String,
    pub user: String,
    pub project: String,
    /// Daemon state string: created, running, exited, ...
    pub state: String,
    /// Name of the pod the container belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PortBinding>,
}

/// A published port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortBinding {
    pub host_ip: String,
    pub host_port: u16,
    pub container_port: u16,
    pub protocol: String,
}

impl PortBinding {
    /// `ip:port` as shown to operators; an unbound ip renders as `0.0.0.0`.
    #[must_use]
    pub fn display_addr(&self) -> String {
        let ip = if self.host_ip.is_empty() {
            "0.0.0.0"
        } else {
            self.host_ip.as_str()
        };
        format!("{ip}:{}", self.host_port)
    }
}

/// JSON output of `studentbox list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListOutput {
    pub containers: Vec<ManagedContainer>,
}

/// JSON output of `studentbox status`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusOutput {
    pub user: String,
    pub project: String,
    /// container name -> daemon state
    pub containers: BTreeMap<String, String>,
}

/// JSON output of `studentbox envs`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvsOutput {
    pub user: String,
    pub project: String,
    /// container name -> variable name -> value
    pub containers: BTreeMap<String, BTreeMap<String, String>>,
}
