//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and `studentbox_common` —
//! never from `crate::infra`, `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::Output;

use anyhow::Result;
use studentbox_common::{ManagedContainer, PortBinding, StudentboxConfig};

use crate::domain::{ContainerSpec, PodSpec, RuntimeCatalogue};

// ── Value Types ───────────────────────────────────────────────────────────────

/// Live view of one container, as inspected on the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContainerDetails {
    pub id: String,
    pub name: String,
    /// Daemon state string: created, running, exited, ...
    pub state: String,
    /// Raw `KEY=VALUE` entries of the container environment.
    pub env: Vec<String>,
    pub ports: Vec<PortBinding>,
}

// ── Daemon Port Traits ────────────────────────────────────────────────────────

/// Read-only queries against the container daemon.
#[allow(async_fn_in_trait)]
pub trait ContainerInspector {
    /// List containers (running or not) matching every `key=value` label filter.
    async fn list_containers(&self, label_filters: &[String]) -> Result<Vec<ManagedContainer>>;
    /// Whether a container with this name exists.
    async fn container_exists(&self, name: &str) -> Result<bool>;
    /// Whether a pod with this name exists.
    async fn pod_exists(&self, name: &str) -> Result<bool>;
    /// Inspect a container by name or id.
    async fn inspect_container(&self, name: &str) -> Result<ContainerDetails>;
}

/// Mutating calls: create, start, remove.
#[allow(async_fn_in_trait)]
pub trait ContainerLifecycle {
    /// Create a pod shell and return its id.
    async fn create_pod(&self, spec: &PodSpec) -> Result<String>;
    /// Create a container and return its id. Daemon warnings are logged.
    async fn create_container(&self, spec: &ContainerSpec) -> Result<String>;
    /// Start a created container.
    async fn start_container(&self, id: &str) -> Result<()>;
    /// Forcibly remove a container, running or not.
    async fn remove_container(&self, id: &str) -> Result<()>;
    /// Forcibly remove a pod and every container in it.
    async fn remove_pod(&self, id: &str) -> Result<()>;
}

/// Local image store of the daemon.
#[allow(async_fn_in_trait)]
pub trait ImageStore {
    /// Whether the image is present locally.
    async fn image_exists(&self, reference: &str) -> Result<bool>;
    /// Pull the image from its registry.
    async fn pull_image(&self, reference: &str) -> Result<()>;
}

/// Composite trait — any type implementing all three sub-traits is a `ContainerDaemon`.
pub trait ContainerDaemon: ContainerInspector + ContainerLifecycle + ImageStore {}

/// Blanket implementation: any type implementing all three sub-traits is a `ContainerDaemon`.
impl<T> ContainerDaemon for T where T: ContainerInspector + ContainerLifecycle + ImageStore {}

// ── Host Directory Port ───────────────────────────────────────────────────────

/// Directories backing bind mounts.
pub trait HostDirectories {
    /// Create `path` and its parents (mode 0755) if missing. No-op if it is
    /// already a directory.
    ///
    /// # Errors
    ///
    /// Fails if `path` exists but is not a directory, or on permission errors.
    fn ensure_exists(&self, path: &Path) -> Result<()>;
    /// Whether new files can be created in `path`.
    fn is_writable(&self, path: &Path) -> bool;
}

// ── Configuration Ports ───────────────────────────────────────────────────────

/// Abstracts config file I/O so services can be tested without touching
/// the real filesystem.
pub trait ConfigStore {
    /// Load the config file; a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    fn load(&self) -> Result<StudentboxConfig>;
    /// Path of the config file.
    ///
    /// # Errors
    ///
    /// Returns an error if no config directory can be determined.
    fn path(&self) -> Result<PathBuf>;
}

/// Source of the runtimes available to `spawn`.
pub trait CatalogueSource {
    /// The built-in runtimes, with those of `extra` (a YAML catalogue file)
    /// merged over them.
    ///
    /// # Errors
    ///
    /// Returns an error if `extra` cannot be read or parsed.
    fn load(&self, extra: Option<&Path>) -> Result<RuntimeCatalogue>;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: std::time::Duration,
    ) -> Result<Output>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

/// Reporter that drops every event.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {
    fn step(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warn(&self, _: &str) {}
}
