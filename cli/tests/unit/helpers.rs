//! Shared test helpers: an in-memory container daemon, host directory fakes
//! and process output constructors.

#![allow(dead_code, clippy::expect_used)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::sync::Mutex;

use anyhow::Result;
use studentbox_cli::application::ports::{
    ContainerDetails, ContainerInspector, ContainerLifecycle, HostDirectories, ImageStore,
};
use studentbox_cli::application::services::{Manager, ManagerOptions};
use studentbox_cli::domain::{ContainerSpec, PodSpec};
use studentbox_common::{ManagedContainer, PortBinding, labels};

// ── ExitStatus / Output construction ─────────────────────────────────────────

/// Build an `ExitStatus` from a logical exit code (0 = success).
///
/// The raw wait-status encodes the exit code in bits 8–15.
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(code: i32, stderr: &[u8]) -> Output {
    Output {
        status: exit_status(code),
        stdout: Vec::new(),
        stderr: stderr.to_vec(),
    }
}

// ── In-memory daemon ─────────────────────────────────────────────────────────

/// Daemon call kinds that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Op {
    CreatePod,
    CreateContainer,
    StartContainer,
    Pull,
    RemoveContainer,
    RemovePod,
}

#[derive(Debug, Clone)]
pub struct FakePod {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub ports: Vec<u16>,
}

#[derive(Debug, Clone)]
pub struct FakeContainer {
    pub name: String,
    pub image: String,
    /// Pod id.
    pub pod: Option<String>,
    pub labels: BTreeMap<String, String>,
    pub env: BTreeMap<String, String>,
    pub mounts: Vec<(PathBuf, String)>,
    pub terminal: bool,
    pub state: String,
}

#[derive(Debug, Default)]
pub struct DaemonState {
    pub pods: BTreeMap<String, FakePod>,
    pub containers: BTreeMap<String, FakeContainer>,
    pub images: BTreeSet<String>,
    next_id: u32,
    counts: BTreeMap<Op, usize>,
    /// (op, n): the n-th call (1-based) of `op` fails.
    failures: Vec<(Op, usize)>,
}

impl DaemonState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{:04}", self.next_id)
    }

    /// Count the call and fail it if it was scheduled to.
    fn call(&mut self, op: Op) -> Result<()> {
        let n = self.counts.entry(op).or_insert(0);
        *n += 1;
        let n = *n;
        if self.failures.contains(&(op, n)) {
            anyhow::bail!("injected {op:?} failure #{n}");
        }
        Ok(())
    }

    fn pod_id(&self, id_or_name: &str) -> Option<String> {
        if self.pods.contains_key(id_or_name) {
            return Some(id_or_name.to_string());
        }
        self.pods
            .iter()
            .find(|(_, p)| p.name == id_or_name)
            .map(|(id, _)| id.clone())
    }

    fn container_id(&self, id_or_name: &str) -> Option<String> {
        if self.containers.contains_key(id_or_name) {
            return Some(id_or_name.to_string());
        }
        self.containers
            .iter()
            .find(|(_, c)| c.name == id_or_name)
            .map(|(id, _)| id.clone())
    }
}

/// Container daemon kept in memory, with scheduled failures and a call log.
#[derive(Debug, Default)]
pub struct FakeDaemon {
    pub state: Mutex<DaemonState>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeDaemon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `n`-th call (1-based) of `op` fail.
    #[must_use]
    pub fn failing(self, op: Op, n: usize) -> Self {
        self.state.lock().expect("lock").failures.push((op, n));
        self
    }

    /// Pretend `reference` is already in the local image store.
    #[must_use]
    pub fn with_image(self, reference: &str) -> Self {
        self.state
            .lock()
            .expect("lock")
            .images
            .insert(reference.to_string());
        self
    }

    /// Add a running container as if created by an earlier spawn.
    #[must_use]
    pub fn with_container(self, name: &str, user: &str, project: &str, env: &[(&str, &str)]) -> Self {
        {
            let mut st = self.state.lock().expect("lock");
            let id = st.next_id("ctr");
            st.containers.insert(
                id,
                FakeContainer {
                    name: name.to_string(),
                    image: "registry/preexisting".into(),
                    pod: None,
                    labels: labels::ownership_labels(user, project).into_iter().collect(),
                    env: env
                        .iter()
                        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                        .collect(),
                    mounts: Vec::new(),
                    terminal: true,
                    state: "running".into(),
                },
            );
        }
        self
    }

    /// Add a container with no ownership label.
    #[must_use]
    pub fn with_foreign_container(self, name: &str) -> Self {
        {
            let mut st = self.state.lock().expect("lock");
            let id = st.next_id("ctr");
            st.containers.insert(
                id,
                FakeContainer {
                    name: name.to_string(),
                    image: "registry/other".into(),
                    pod: None,
                    labels: BTreeMap::new(),
                    env: BTreeMap::new(),
                    mounts: Vec::new(),
                    terminal: false,
                    state: "running".into(),
                },
            );
        }
        self
    }

    /// Objects (pods and containers) labelled for (user, project).
    pub fn owned_objects(&self, user: &str, project: &str) -> usize {
        let st = self.state.lock().expect("lock");
        let owned = |l: &BTreeMap<String, String>| {
            l.get(labels::keys::USER).map(String::as_str) == Some(user)
                && l.get(labels::keys::PROJECT).map(String::as_str) == Some(project)
                && l.get(labels::keys::OWNED).map(String::as_str) == Some(labels::OWNED_VALUE)
        };
        st.pods.values().filter(|p| owned(&p.labels)).count()
            + st.containers.values().filter(|c| owned(&c.labels)).count()
    }

    pub fn container(&self, name: &str) -> Option<FakeContainer> {
        let st = self.state.lock().expect("lock");
        st.containers.values().find(|c| c.name == name).cloned()
    }

    pub fn pod(&self, name: &str) -> Option<FakePod> {
        let st = self.state.lock().expect("lock");
        st.pods.values().find(|p| p.name == name).cloned()
    }

    pub fn total_objects(&self) -> usize {
        let st = self.state.lock().expect("lock");
        st.pods.len() + st.containers.len()
    }

    /// Names of the mutating calls, in order.
    pub fn mutations(&self) -> Vec<String> {
        self.calls
            .lock()
            .expect("lock")
            .iter()
            .filter(|c| {
                ["create", "start", "rm", "pod rm", "pod create", "pull"]
                    .iter()
                    .any(|m| c.starts_with(m))
            })
            .cloned()
            .collect()
    }

    fn log(&self, call: String) {
        self.calls.lock().expect("lock").push(call);
    }
}

impl ContainerInspector for FakeDaemon {
    async fn list_containers(&self, label_filters: &[String]) -> Result<Vec<ManagedContainer>> {
        self.log(format!("ps {}", label_filters.join(",")));
        let st = self.state.lock().expect("lock");
        let wanted: Vec<(String, String)> = label_filters
            .iter()
            .filter_map(|f| f.split_once('='))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Ok(st
            .containers
            .iter()
            .filter(|(_, c)| wanted.iter().all(|(k, v)| c.labels.get(k) == Some(v)))
            .map(|(id, c)| ManagedContainer {
                id: id.clone(),
                name: c.name.clone(),
                user: c.labels.get(labels::keys::USER).cloned().unwrap_or_default(),
                project: c.labels.get(labels::keys::PROJECT).cloned().unwrap_or_default(),
                state: c.state.clone(),
                pod: c
                    .pod
                    .as_ref()
                    .and_then(|pid| st.pods.get(pid))
                    .map(|p| p.name.clone()),
                created_at: None,
                ports: c
                    .pod
                    .as_ref()
                    .and_then(|pid| st.pods.get(pid))
                    .map(|p| {
                        p.ports
                            .iter()
                            .map(|port| PortBinding {
                                host_ip: String::new(),
                                host_port: 40000 + port,
                                container_port: *port,
                                protocol: "tcp".into(),
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
            })
            .collect())
    }

    async fn container_exists(&self, name: &str) -> Result<bool> {
        self.log(format!("container exists {name}"));
        Ok(self.state.lock().expect("lock").container_id(name).is_some())
    }

    async fn pod_exists(&self, name: &str) -> Result<bool> {
        self.log(format!("pod exists {name}"));
        Ok(self.state.lock().expect("lock").pod_id(name).is_some())
    }

    async fn inspect_container(&self, name: &str) -> Result<ContainerDetails> {
        self.log(format!("inspect {name}"));
        let st = self.state.lock().expect("lock");
        let id = st
            .container_id(name)
            .ok_or_else(|| anyhow::anyhow!("no such container {name}"))?;
        let c = &st.containers[&id];
        Ok(ContainerDetails {
            id: id.clone(),
            name: c.name.clone(),
            state: c.state.clone(),
            env: c.env.iter().map(|(k, v)| format!("{k}={v}")).collect(),
            ports: Vec::new(),
        })
    }
}

impl ContainerLifecycle for FakeDaemon {
    async fn create_pod(&self, spec: &PodSpec) -> Result<String> {
        self.log(format!("pod create {}", spec.name));
        let mut st = self.state.lock().expect("lock");
        st.call(Op::CreatePod)?;
        if st.pod_id(&spec.name).is_some() {
            anyhow::bail!("pod {} already exists", spec.name);
        }
        let id = st.next_id("pod");
        st.pods.insert(
            id.clone(),
            FakePod {
                name: spec.name.clone(),
                labels: spec.labels.clone(),
                ports: spec.ports.clone(),
            },
        );
        Ok(id)
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String> {
        self.log(format!("create {}", spec.name));
        let mut st = self.state.lock().expect("lock");
        st.call(Op::CreateContainer)?;
        if st.container_id(&spec.name).is_some() {
            anyhow::bail!("container {} already exists", spec.name);
        }
        if !st.images.contains(&spec.image) {
            anyhow::bail!("image {} not present", spec.image);
        }
        let pod = match &spec.pod {
            Some(p) => Some(
                st.pod_id(p)
                    .ok_or_else(|| anyhow::anyhow!("no such pod {p}"))?,
            ),
            None => None,
        };
        let id = st.next_id("ctr");
        st.containers.insert(
            id.clone(),
            FakeContainer {
                name: spec.name.clone(),
                image: spec.image.clone(),
                pod,
                labels: spec.labels.clone(),
                env: spec.env.clone(),
                mounts: spec
                    .mounts
                    .iter()
                    .map(|m| (m.source.clone(), m.destination.clone()))
                    .collect(),
                terminal: spec.terminal,
                state: "created".into(),
            },
        );
        Ok(id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        self.log(format!("start {id}"));
        let mut st = self.state.lock().expect("lock");
        st.call(Op::StartContainer)?;
        let id = st
            .container_id(id)
            .ok_or_else(|| anyhow::anyhow!("no such container {id}"))?;
        if let Some(c) = st.containers.get_mut(&id) {
            c.state = "running".into();
        }
        Ok(())
    }

    async fn remove_container(&self, id: &str) -> Result<()> {
        self.log(format!("rm {id}"));
        let mut st = self.state.lock().expect("lock");
        st.call(Op::RemoveContainer)?;
        let id = st
            .container_id(id)
            .ok_or_else(|| anyhow::anyhow!("no such container {id}"))?;
        st.containers.remove(&id);
        Ok(())
    }

    async fn remove_pod(&self, id: &str) -> Result<()> {
        self.log(format!("pod rm {id}"));
        let mut st = self.state.lock().expect("lock");
        st.call(Op::RemovePod)?;
        let id = st
            .pod_id(id)
            .ok_or_else(|| anyhow::anyhow!("no such pod {id}"))?;
        st.pods.remove(&id);
        st.containers.retain(|_, c| c.pod.as_deref() != Some(id.as_str()));
        Ok(())
    }
}

impl ImageStore for FakeDaemon {
    async fn image_exists(&self, reference: &str) -> Result<bool> {
        self.log(format!("image exists {reference}"));
        Ok(self.state.lock().expect("lock").images.contains(reference))
    }

    async fn pull_image(&self, reference: &str) -> Result<()> {
        self.log(format!("pull {reference}"));
        let mut st = self.state.lock().expect("lock");
        st.call(Op::Pull)?;
        st.images.insert(reference.to_string());
        Ok(())
    }
}

// ── Host directories ─────────────────────────────────────────────────────────

/// Records `ensure_exists` calls instead of touching the filesystem.
#[derive(Debug)]
pub struct FakeDirs {
    pub created: Mutex<Vec<PathBuf>>,
    pub writable: bool,
    /// Paths whose creation fails.
    pub broken: Vec<PathBuf>,
}

impl Default for FakeDirs {
    fn default() -> Self {
        Self {
            created: Mutex::new(Vec::new()),
            writable: true,
            broken: Vec::new(),
        }
    }
}

impl FakeDirs {
    pub fn created(&self) -> Vec<PathBuf> {
        self.created.lock().expect("lock").clone()
    }
}

impl HostDirectories for FakeDirs {
    fn ensure_exists(&self, path: &Path) -> Result<()> {
        if self.broken.iter().any(|b| b == path) {
            anyhow::bail!("permission denied: {}", path.display());
        }
        self.created.lock().expect("lock").push(path.to_path_buf());
        Ok(())
    }

    fn is_writable(&self, _: &Path) -> bool {
        self.writable
    }
}

// ── Manager construction ─────────────────────────────────────────────────────

pub const HOST_PATH: &str = "/srv/studentbox";
pub const DATA_PATH: &str = "data";

/// Allow-list used by the tests: `nginx` and `alpine`.
pub fn allow_list() -> BTreeMap<String, String> {
    [
        ("nginx", "docker.io/library/nginx:latest"),
        ("alpine", "docker.io/library/alpine:latest"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

pub fn options() -> ManagerOptions {
    ManagerOptions {
        host_path: PathBuf::from(HOST_PATH),
        data_path: PathBuf::from(DATA_PATH),
        images: allow_list(),
    }
}

pub fn manager(daemon: FakeDaemon) -> Manager<FakeDaemon, FakeDirs> {
    Manager::new(daemon, FakeDirs::default(), options()).expect("valid options")
}
