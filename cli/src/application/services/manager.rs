//! Application service — orchestration manager.
//!
//! Owns the daemon connection, the data directory layout and the image
//! allow-list. Discovery, inspection and teardown live here; the spawn
//! use-cases are in [`super::spawn`].
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use studentbox_common::{ManagedContainer, labels};

use crate::application::ports::{ContainerDaemon, HostDirectories};
use crate::domain::ModifierRegistry;
use crate::domain::error::ManagerError;

/// Construction parameters of a [`Manager`].
#[derive(Debug, Clone, Default)]
pub struct ManagerOptions {
    /// Absolute parent directory of `data_path` on the daemon's host,
    /// e.g. `/home/studentbox`.
    pub host_path: PathBuf,
    /// Data directory relative to `host_path`, e.g. `data`. Also this
    /// process's path to the same directory.
    pub data_path: PathBuf,
    /// Allow-listed images: short id -> fully qualified reference.
    pub images: BTreeMap<String, String>,
}

/// Creates, discovers and removes the containers and pods of
/// (user, project) pairs.
///
/// Identity is the ownership label triple plus the deterministic names; the
/// daemon's ids are only used within a single call.
pub struct Manager<D, H> {
    pub(super) daemon: D,
    pub(super) dirs: H,
    pub(super) host_path: PathBuf,
    pub(super) data_path: PathBuf,
    pub(super) images: BTreeMap<String, String>,
    pub(super) registry: ModifierRegistry,
}

impl<D: ContainerDaemon, H: HostDirectories> Manager<D, H> {
    /// Validate the options and create the data directory.
    ///
    /// # Errors
    ///
    /// Returns `HostPathNotAbsolute` if the host path is empty or relative,
    /// and `DataPathNotWritable` (or the creation error) if the data
    /// directory cannot be used.
    pub fn new(daemon: D, dirs: H, opts: ManagerOptions) -> Result<Self> {
        let ManagerOptions {
            host_path,
            data_path,
            images,
        } = opts;

        if host_path.as_os_str().is_empty() || !host_path.is_absolute() {
            return Err(
                ManagerError::HostPathNotAbsolute(host_path.display().to_string()).into(),
            );
        }

        dirs.ensure_exists(&data_path)
            .with_context(|| format!("failed to create data directory {}", data_path.display()))?;
        if !dirs.is_writable(&data_path) {
            return Err(ManagerError::DataPathNotWritable {
                path: data_path.display().to_string(),
            }
            .into());
        }

        if images.is_empty() {
            tracing::warn!("no allow-listed images configured, single container spawn is disabled");
        }

        Ok(Self {
            daemon,
            dirs,
            host_path,
            data_path,
            images,
            registry: ModifierRegistry::builtin(),
        })
    }

    /// Replace the modifier registry used to derive environment variables.
    #[must_use]
    pub fn with_registry(mut self, registry: ModifierRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// The daemon connection.
    pub fn daemon(&self) -> &D {
        &self.daemon
    }

    /// The host directory adapter.
    pub fn dirs(&self) -> &H {
        &self.dirs
    }

    pub fn host_path(&self) -> &Path {
        &self.host_path
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Allow-listed images: short id -> reference.
    pub fn images(&self) -> &BTreeMap<String, String> {
        &self.images
    }

    /// Every container carrying the ownership label. Empty when none exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the daemon query fails.
    pub async fn list_all(&self) -> Result<Vec<ManagedContainer>> {
        self.daemon
            .list_containers(&labels::owned_filter())
            .await
            .context("failed to list containers")
    }

    /// Whether the pod `sb-{user}-{project}` or the standalone container
    /// `{user}-{project}` exists.
    ///
    /// # Errors
    ///
    /// Returns an error if an existence check fails.
    pub async fn exists(&self, user: &str, project: &str) -> Result<bool> {
        let pod = self
            .daemon
            .pod_exists(&labels::pod_name(user, project))
            .await
            .context("failed to check if pod exists")?;
        if pod {
            return Ok(true);
        }
        self.daemon
            .container_exists(&labels::standalone_name(user, project))
            .await
            .context("failed to check if container exists")
    }

    /// Containers of one (user, project) pair.
    ///
    /// # Errors
    ///
    /// Returns `ManagerError::ContainerNotFound` when neither the pod nor
    /// the standalone container exists, or the daemon error.
    pub async fn list_for(&self, user: &str, project: &str) -> Result<Vec<ManagedContainer>> {
        validate_pair(user, project)?;
        if !self.exists(user, project).await? {
            return Err(ManagerError::ContainerNotFound {
                user: user.to_string(),
                project: project.to_string(),
            }
            .into());
        }
        self.daemon
            .list_containers(&labels::scoped_filter(user, project))
            .await
            .context("failed to list containers")
    }

    /// Daemon state of each container of (user, project), by container name.
    ///
    /// # Errors
    ///
    /// Same as [`Manager::list_for`], plus inspection failures.
    pub async fn status(&self, user: &str, project: &str) -> Result<BTreeMap<String, String>> {
        let mut states = BTreeMap::new();
        for container in self.list_for(user, project).await? {
            let details = self
                .daemon
                .inspect_container(&container.name)
                .await
                .with_context(|| format!("failed to inspect container {}", container.name))?;
            states.insert(container.name, details.state);
        }
        Ok(states)
    }

    /// Live environment of each container of (user, project), as the daemon
    /// reports it: container name -> variable -> value.
    ///
    /// # Errors
    ///
    /// Same as [`Manager::list_for`], plus inspection failures.
    pub async fn get_env_vars(
        &self,
        user: &str,
        project: &str,
    ) -> Result<BTreeMap<String, BTreeMap<String, String>>> {
        let mut envs = BTreeMap::new();
        for container in self.list_for(user, project).await? {
            let details = self
                .daemon
                .inspect_container(&container.name)
                .await
                .with_context(|| format!("failed to inspect container {}", container.name))?;
            envs.insert(container.name, env_map(&details.env));
        }
        Ok(envs)
    }

    /// Forcibly remove everything of (user, project): its pod, then any
    /// labelled container outside that pod. Returns the number of removed
    /// objects.
    ///
    /// # Errors
    ///
    /// Returns `ManagerError::ContainerNotFound` when nothing exists, or the
    /// first daemon failure.
    pub async fn remove(&self, user: &str, project: &str) -> Result<usize> {
        validate_pair(user, project)?;
        let pod = labels::pod_name(user, project);
        let pod_exists = self
            .daemon
            .pod_exists(&pod)
            .await
            .context("failed to check if pod exists")?;
        let containers = self
            .daemon
            .list_containers(&labels::scoped_filter(user, project))
            .await
            .context("failed to list containers")?;

        if !pod_exists && containers.is_empty() {
            return Err(ManagerError::ContainerNotFound {
                user: user.to_string(),
                project: project.to_string(),
            }
            .into());
        }

        let mut removed = 0;
        if pod_exists {
            self.daemon
                .remove_pod(&pod)
                .await
                .with_context(|| format!("failed to remove pod {pod}"))?;
            tracing::info!(pod = %pod, "removed pod");
            removed += 1;
        }
        for container in containers
            .iter()
            .filter(|c| !pod_exists || c.pod.as_deref() != Some(pod.as_str()))
        {
            self.daemon
                .remove_container(&container.id)
                .await
                .with_context(|| format!("failed to remove container {}", container.name))?;
            tracing::info!(container = %container.name, "removed container");
            removed += 1;
        }
        Ok(removed)
    }
}

/// Reject user or project names unfit for object names and label filters.
///
/// # Errors
///
/// Returns `ManagerError::InvalidIdentity` naming the offending field.
pub fn validate_pair(user: &str, project: &str) -> Result<()> {
    for (field, value) in [("user", user), ("project", project)] {
        labels::validate_identity(value).map_err(|reason| ManagerError::InvalidIdentity {
            field,
            value: value.to_string(),
            reason,
        })?;
    }
    Ok(())
}

/// `KEY=VALUE` entries to a map; entries without `=` are dropped.
pub fn env_map(entries: &[String]) -> BTreeMap<String, String> {
    entries
        .iter()
        .filter_map(|e| e.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
