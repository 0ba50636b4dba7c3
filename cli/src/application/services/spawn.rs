//! Application service — spawn use-cases.
//!
//! A single allow-listed container, or a pod of several containers that
//! share a network namespace. A pod spawn either leaves every member
//! running or leaves nothing behind: each creation records its
//! compensation in a [`Saga`].
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use studentbox_common::labels;

use crate::application::ports::{ContainerDaemon, HostDirectories, ProgressReporter};
use crate::application::services::manager::{Manager, validate_pair};
use crate::application::services::saga::{Compensation, Saga};
use crate::domain::error::ManagerError;
use crate::domain::runtime::{Image, Runtime};
use crate::domain::spec::{self, ContainerSpec, PodSpec};
use crate::domain::paths;

/// One explicitly requested pod member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerOptions {
    /// Allow-list key of the image. Doubles as the member's short name.
    pub image: String,
    /// Mount logical name -> absolute path inside the container.
    pub mounts: BTreeMap<String, String>,
    /// Overrides for this member only, applied over the pod-wide ones.
    pub env: BTreeMap<String, String>,
}

/// What a pod is made of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PodMembers {
    /// Every image of a catalogue runtime.
    Runtime(Runtime),
    /// Allow-listed images given one by one.
    Containers(Vec<ContainerOptions>),
}

/// Request to spawn the pod of (user, project).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodOptions {
    pub user: String,
    pub project: String,
    /// Caller overrides passed to every member.
    pub env: BTreeMap<String, String>,
    /// Container ports published on the pod.
    pub ports: Vec<u16>,
    pub members: PodMembers,
}

impl PodOptions {
    /// Spawn every image of `runtime`, publishing the runtime's ports.
    pub fn from_runtime(
        user: &str,
        project: &str,
        runtime: Runtime,
        env: BTreeMap<String, String>,
    ) -> Self {
        Self {
            user: user.to_string(),
            project: project.to_string(),
            env,
            ports: runtime.ports.clone(),
            members: PodMembers::Runtime(runtime),
        }
    }
}

impl<D: ContainerDaemon, H: HostDirectories> Manager<D, H> {
    /// Spawn the standalone container `{user}-{project}` from the
    /// allow-listed image `image_key`. Returns the container id.
    ///
    /// # Errors
    ///
    /// Returns `ImageNotAllowed` for an unknown key, `AlreadyExists` if the
    /// container exists, or the first daemon failure. A container that was
    /// created but failed to start is removed.
    pub async fn spawn_single(&self, user: &str, project: &str, image_key: &str) -> Result<String> {
        validate_pair(user, project)?;
        let reference = self
            .images
            .get(image_key)
            .ok_or_else(|| ManagerError::ImageNotAllowed(image_key.to_string()))?;

        let name = labels::standalone_name(user, project);
        if self
            .daemon
            .container_exists(&name)
            .await
            .context("failed to check if container exists")?
        {
            return Err(ManagerError::AlreadyExists(name).into());
        }

        let mut container = spec::build(
            &Image::bare(reference, image_key),
            Path::new(""),
            &BTreeMap::new(),
            &self.registry,
            user,
            project,
        )?;
        container.name.clone_from(&name);

        self.ensure_image(reference).await?;

        let mut saga = Saga::new();
        match self.create_and_start(&container, &mut saga).await {
            Ok(id) => {
                saga.commit();
                tracing::info!(container = %name, %id, "spawned container");
                Ok(id)
            }
            Err(err) => Err(self.rollback(saga, err).await),
        }
    }

    /// Spawn the pod `sb-{user}-{project}` and every member in it. Returns
    /// the pod id.
    ///
    /// Every member spec is built and every mount directory created before
    /// the daemon is touched. Any failure after the pod shell exists
    /// removes what was created, newest first.
    ///
    /// # Errors
    ///
    /// Returns `EmptyPod`, `ImageNotAllowed`, `AlreadyExists`, the first
    /// variable derivation failure, or the first daemon failure (with any
    /// rollback failure attached).
    pub async fn spawn_pod(
        &self,
        opts: &PodOptions,
        reporter: &impl ProgressReporter,
    ) -> Result<String> {
        let PodOptions {
            user,
            project,
            env,
            ports,
            members,
        } = opts;
        validate_pair(user, project)?;

        let images = self.member_images(members, env)?;
        if images.is_empty() {
            return Err(ManagerError::EmptyPod.into());
        }

        let pod = PodSpec::new(user, project, ports);
        if self
            .daemon
            .pod_exists(&pod.name)
            .await
            .context("failed to check if pod exists")?
        {
            return Err(ManagerError::AlreadyExists(pod.name).into());
        }

        let mount_base = paths::project_dir(&self.host_path, &self.data_path, user, project);
        let mut containers = Vec::with_capacity(images.len());
        for (image, overrides) in &images {
            let mut container =
                spec::build(image, &mount_base, overrides, &self.registry, user, project)
                    .with_context(|| format!("failed to prepare container {}", image.short_name))?;
            container.name = labels::member_name(user, project, &image.short_name);
            containers.push((image.reference.as_str(), container));
        }

        reporter.step("preparing data directories...");
        for (image, _) in &images {
            for mount in image.mounts.keys() {
                let dir = paths::local_mount_dir(&self.data_path, user, project, mount);
                self.dirs
                    .ensure_exists(&dir)
                    .with_context(|| format!("failed to create directory {}", dir.display()))?;
            }
        }

        let mut saga = Saga::new();
        match self.provision_pod(&pod, containers, &mut saga, reporter).await {
            Ok(id) => {
                saga.commit();
                reporter.success(&format!("pod {} is running", pod.name));
                tracing::info!(pod = %pod.name, %id, "spawned pod");
                Ok(id)
            }
            Err(err) => {
                reporter.warn("spawn failed, rolling back");
                Err(self.rollback(saga, err).await)
            }
        }
    }

    // ── Internals ────────────────────────────────────────────────────────────

    /// Resolve the members to (image, effective overrides) pairs.
    fn member_images(
        &self,
        members: &PodMembers,
        pod_env: &BTreeMap<String, String>,
    ) -> Result<Vec<(Image, BTreeMap<String, String>)>> {
        match members {
            PodMembers::Runtime(runtime) => Ok(runtime
                .images
                .values()
                .map(|image| (image.clone(), pod_env.clone()))
                .collect()),
            PodMembers::Containers(list) => list
                .iter()
                .map(|member| {
                    let reference = self
                        .images
                        .get(&member.image)
                        .ok_or_else(|| ManagerError::ImageNotAllowed(member.image.clone()))?;
                    let mut image = Image::bare(reference, &member.image);
                    image.mounts.clone_from(&member.mounts);
                    let mut overrides = pod_env.clone();
                    overrides.extend(member.env.clone());
                    Ok((image, overrides))
                })
                .collect(),
        }
    }

    async fn provision_pod(
        &self,
        pod: &PodSpec,
        containers: Vec<(&str, ContainerSpec)>,
        saga: &mut Saga,
        reporter: &impl ProgressReporter,
    ) -> Result<String> {
        reporter.step(&format!("creating pod {}...", pod.name));
        let pod_id = self
            .daemon
            .create_pod(pod)
            .await
            .with_context(|| format!("failed to create pod {}", pod.name))?;
        saga.record(Compensation::RemovePod(pod_id.clone()));

        for (reference, mut container) in containers {
            reporter.step(&format!("starting {}...", container.name));
            self.ensure_image(reference).await?;
            container.pod = Some(pod_id.clone());
            self.create_and_start(&container, saga).await?;
        }
        Ok(pod_id)
    }

    async fn create_and_start(&self, container: &ContainerSpec, saga: &mut Saga) -> Result<String> {
        let id = self
            .daemon
            .create_container(container)
            .await
            .with_context(|| format!("failed to create container {}", container.name))?;
        saga.record(Compensation::RemoveContainer(id.clone()));
        self.daemon
            .start_container(&id)
            .await
            .with_context(|| format!("failed to start container {}", container.name))?;
        Ok(id)
    }

    async fn ensure_image(&self, reference: &str) -> Result<()> {
        let present = self
            .daemon
            .image_exists(reference)
            .await
            .with_context(|| format!("failed to check image {reference}"))?;
        if !present {
            tracing::info!(image = %reference, "pulling image");
            self.daemon
                .pull_image(reference)
                .await
                .with_context(|| format!("failed to pull image {reference}"))?;
        }
        Ok(())
    }

    async fn rollback(&self, saga: Saga, err: anyhow::Error) -> anyhow::Error {
        tracing::error!(error = %format!("{err:#}"), "spawn failed");
        let failures = saga.unwind(&self.daemon).await;
        if failures.is_empty() {
            return err;
        }
        let details = failures
            .iter()
            .map(|f| format!("{f:#}"))
            .collect::<Vec<_>>()
            .join("; ");
        err.context(format!("rollback incomplete: {details}"))
    }
}
