//! Daemon-facing creation specs and the builder turning an [`Image`]
//! template into a [`ContainerSpec`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use studentbox_common::labels;

use crate::domain::envvar::ModifierRegistry;
use crate::domain::error::SpecError;
use crate::domain::runtime::Image;

/// A bind mount: host directory -> container path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub source: PathBuf,
    pub destination: String,
}

/// Everything the daemon needs to create one container.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    /// Pod id or name to join.
    pub pod: Option<String>,
    /// Keep stdin open on a pseudo-terminal so the container can be attached to.
    pub terminal: bool,
    pub env: BTreeMap<String, String>,
    pub mounts: Vec<Mount>,
    pub labels: BTreeMap<String, String>,
}

/// Everything the daemon needs to create one pod shell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PodSpec {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    /// Container ports published on the host.
    pub ports: Vec<u16>,
}

impl PodSpec {
    /// The pod shell of `(user, project)`, stamped with the ownership labels.
    pub fn new(user: &str, project: &str, ports: &[u16]) -> Self {
        Self {
            name: labels::pod_name(user, project),
            labels: labels::ownership_labels(user, project).into_iter().collect(),
            ports: ports.to_vec(),
        }
    }
}

/// Build the container spec of `image`.
///
/// Caller overrides that the image does not declare pass through verbatim;
/// declared variables are derived through `registry` and win over a raw
/// override of the same name. Each mount `name` is bound from
/// `mount_base/name`. The result carries the ownership labels of
/// `(user, project)`; `name` and `pod` are left for the caller.
///
/// # Errors
///
/// Returns `SpecError::EnvVar` naming the first variable whose derivation
/// fails.
pub fn build(
    image: &Image,
    mount_base: &Path,
    overrides: &BTreeMap<String, String>,
    registry: &ModifierRegistry,
    user: &str,
    project: &str,
) -> Result<ContainerSpec, SpecError> {
    let mut env = overrides.clone();
    for var in &image.env {
        let value = registry
            .derive(var, overrides.get(&var.name).map(String::as_str))
            .map_err(|source| SpecError::EnvVar {
                var: var.name.clone(),
                source,
            })?;
        env.insert(var.name.clone(), value);
    }

    let mounts = image
        .mounts
        .iter()
        .map(|(name, destination)| Mount {
            source: mount_base.join(name),
            destination: destination.clone(),
        })
        .collect();

    Ok(ContainerSpec {
        name: String::new(),
        image: image.reference.clone(),
        pod: None,
        terminal: true,
        env,
        mounts,
        labels: labels::ownership_labels(user, project).into_iter().collect(),
    })
}
