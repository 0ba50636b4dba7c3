//! Infrastructure implementation of the container daemon port traits.
//!
//! `PodmanCli<R>` drives a Podman service over its API socket by running
//! `podman --url <socket> ...` through a `CommandRunner`, and decodes the
//! `--format json` output.

use std::collections::BTreeMap;
use std::process::Output;

use anyhow::{Context, Result};
use chrono::DateTime;
use serde::Deserialize;
use studentbox_common::{ManagedContainer, PortBinding, labels};

use crate::application::ports::{
    CommandRunner, ContainerDetails, ContainerInspector, ContainerLifecycle, ImageStore,
};
use crate::domain::{ContainerSpec, PodSpec};
use crate::infra::command_runner::{PULL_TIMEOUT, TokioCommandRunner};

const PODMAN: &str = "podman";

/// Container daemon adapter backed by the `podman` remote client.
///
/// Generic over `R: CommandRunner` so tests can inject a mock runner
/// without spawning real processes.
pub struct PodmanCli<R: CommandRunner> {
    runner: R,
    url: String,
}

impl<R: CommandRunner> PodmanCli<R> {
    /// Adapter talking to the service at `url`, e.g.
    /// `unix:///run/user/1000/podman/podman.sock`.
    pub fn new(runner: R, url: &str) -> Self {
        Self {
            runner,
            url: url.to_string(),
        }
    }

    /// The daemon URL every call connects to.
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn podman(&self, args: &[&str]) -> Result<Output> {
        let mut full = vec!["--url", self.url.as_str()];
        full.extend_from_slice(args);
        self.runner.run(PODMAN, &full).await
    }

    /// Run and require exit status 0; returns trimmed stdout.
    async fn podman_ok(&self, args: &[&str]) -> Result<String> {
        let output = self.podman(args).await?;
        check(&output, args)?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// `podman <kind> exists NAME`: exit 0 is true, 1 is false.
    async fn exists(&self, kind: &str, name: &str) -> Result<bool> {
        let args = [kind, "exists", name];
        let output = self.podman(&args).await?;
        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => {
                check(&output, &args)?;
                Ok(true)
            }
        }
    }
}

impl PodmanCli<TokioCommandRunner> {
    /// Convenience constructor for production use.
    #[must_use]
    pub fn connect(url: &str) -> Self {
        Self::new(TokioCommandRunner::default(), url)
    }
}

fn check(output: &Output, args: &[&str]) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let verb = args.iter().take(2).copied().collect::<Vec<_>>().join(" ");
    anyhow::bail!("podman {verb} failed: {}", stderr.trim())
}

/// Log daemon warnings printed on stderr by a successful call.
fn log_warnings(output: &Output, object: &str) {
    for line in String::from_utf8_lossy(&output.stderr).lines() {
        let line = line.trim();
        if !line.is_empty() {
            tracing::warn!(%object, warning = %line, "daemon warning");
        }
    }
}

// ── JSON wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PsEntry {
    id: String,
    #[serde(default)]
    names: Option<Vec<String>>,
    #[serde(default)]
    labels: Option<BTreeMap<String, String>>,
    #[serde(default)]
    state: String,
    #[serde(default)]
    pod_name: String,
    #[serde(default)]
    created: Option<i64>,
    #[serde(default)]
    ports: Option<Vec<PsPort>>,
}

#[derive(Debug, Deserialize)]
struct PsPort {
    #[serde(default)]
    host_ip: String,
    container_port: u16,
    host_port: u16,
    #[serde(default)]
    range: Option<u16>,
    #[serde(default)]
    protocol: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectEntry {
    id: String,
    name: String,
    state: InspectState,
    config: InspectConfig,
    #[serde(default)]
    network_settings: Option<InspectNetwork>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectState {
    status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectConfig {
    #[serde(default)]
    env: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectNetwork {
    #[serde(default)]
    ports: Option<BTreeMap<String, Option<Vec<InspectHostPort>>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectHostPort {
    #[serde(default)]
    host_ip: String,
    host_port: String,
}

impl PsEntry {
    fn into_container(self) -> ManagedContainer {
        let label_map = self.labels.unwrap_or_default();
        let label = |key: &str| label_map.get(key).cloned().unwrap_or_default();
        let ports = self
            .ports
            .unwrap_or_default()
            .into_iter()
            .flat_map(|p| {
                let range = p.range.unwrap_or(1).max(1);
                (0..range).map(move |offset| PortBinding {
                    host_ip: p.host_ip.clone(),
                    host_port: p.host_port.saturating_add(offset),
                    container_port: p.container_port.saturating_add(offset),
                    protocol: p.protocol.clone(),
                })
            })
            .collect();
        ManagedContainer {
            name: self
                .names
                .and_then(|names| names.into_iter().next())
                .unwrap_or_else(|| self.id.clone()),
            id: self.id,
            user: label(labels::keys::USER),
            project: label(labels::keys::PROJECT),
            state: self.state,
            pod: Some(self.pod_name).filter(|p| !p.is_empty()),
            created_at: self.created.and_then(|secs| DateTime::from_timestamp(secs, 0)),
            ports,
        }
    }
}

impl InspectEntry {
    fn into_details(self) -> ContainerDetails {
        let mut ports = Vec::new();
        let published = self
            .network_settings
            .and_then(|n| n.ports)
            .unwrap_or_default();
        for (key, hosts) in published {
            let (port, protocol) = key.split_once('/').unwrap_or((key.as_str(), "tcp"));
            let Ok(container_port) = port.parse::<u16>() else {
                continue;
            };
            for host in hosts.unwrap_or_default() {
                if let Ok(host_port) = host.host_port.parse::<u16>() {
                    ports.push(PortBinding {
                        host_ip: host.host_ip,
                        host_port,
                        container_port,
                        protocol: protocol.to_string(),
                    });
                }
            }
        }
        ContainerDetails {
            id: self.id,
            name: self.name,
            state: self.state.status,
            env: self.config.env.unwrap_or_default(),
            ports,
        }
    }
}

// ── Argument builders ─────────────────────────────────────────────────────────

fn pod_create_args(spec: &PodSpec) -> Vec<String> {
    let mut args = vec!["pod".into(), "create".into(), "--name".into(), spec.name.clone()];
    for (key, value) in &spec.labels {
        args.push("--label".into());
        args.push(format!("{key}={value}"));
    }
    for port in &spec.ports {
        args.push("--publish".into());
        args.push(port.to_string());
    }
    args
}

fn container_create_args(spec: &ContainerSpec) -> Vec<String> {
    let mut args = vec!["create".into(), "--name".into(), spec.name.clone()];
    if let Some(pod) = &spec.pod {
        args.push("--pod".into());
        args.push(pod.clone());
    }
    if spec.terminal {
        args.push("--interactive".into());
        args.push("--tty".into());
    }
    for (key, value) in &spec.labels {
        args.push("--label".into());
        args.push(format!("{key}={value}"));
    }
    for (key, value) in &spec.env {
        args.push("--env".into());
        args.push(format!("{key}={value}"));
    }
    for mount in &spec.mounts {
        args.push("--volume".into());
        args.push(format!("{}:{}", mount.source.display(), mount.destination));
    }
    args.push(spec.image.clone());
    args
}

// ── Port implementations ──────────────────────────────────────────────────────

impl<R: CommandRunner> ContainerInspector for PodmanCli<R> {
    async fn list_containers(&self, label_filters: &[String]) -> Result<Vec<ManagedContainer>> {
        let filters: Vec<String> = label_filters.iter().map(|f| format!("label={f}")).collect();
        let mut args = vec!["ps", "--all", "--format", "json"];
        for filter in &filters {
            args.push("--filter");
            args.push(filter);
        }
        let stdout = self.podman_ok(&args).await?;
        if stdout.is_empty() {
            return Ok(Vec::new());
        }
        let entries: Vec<PsEntry> =
            serde_json::from_str(&stdout).context("failed to parse podman ps output")?;
        Ok(entries.into_iter().map(PsEntry::into_container).collect())
    }

    async fn container_exists(&self, name: &str) -> Result<bool> {
        self.exists("container", name).await
    }

    async fn pod_exists(&self, name: &str) -> Result<bool> {
        self.exists("pod", name).await
    }

    async fn inspect_container(&self, name: &str) -> Result<ContainerDetails> {
        let stdout = self
            .podman_ok(&["container", "inspect", "--format", "json", name])
            .await?;
        let entries: Vec<InspectEntry> =
            serde_json::from_str(&stdout).context("failed to parse podman inspect output")?;
        entries
            .into_iter()
            .next()
            .map(InspectEntry::into_details)
            .ok_or_else(|| anyhow::anyhow!("podman inspect returned nothing for {name}"))
    }
}

impl<R: CommandRunner> ContainerLifecycle for PodmanCli<R> {
    async fn create_pod(&self, spec: &PodSpec) -> Result<String> {
        let args = pod_create_args(spec);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.podman(&args).await?;
        check(&output, &args)?;
        log_warnings(&output, &spec.name);
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String> {
        let args = container_create_args(spec);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.podman(&args).await?;
        check(&output, &args)?;
        log_warnings(&output, &spec.name);
        let stdout = String::from_utf8_lossy(&output.stdout);
        // The id is the last line; pull progress may precede it.
        stdout
            .lines()
            .map(str::trim)
            .rfind(|l| !l.is_empty())
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("podman create printed no id for {}", spec.name))
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        self.podman_ok(&["start", id]).await.map(drop)
    }

    async fn remove_container(&self, id: &str) -> Result<()> {
        self.podman_ok(&["rm", "--force", id]).await.map(drop)
    }

    async fn remove_pod(&self, id: &str) -> Result<()> {
        self.podman_ok(&["pod", "rm", "--force", id]).await.map(drop)
    }
}

impl<R: CommandRunner> ImageStore for PodmanCli<R> {
    async fn image_exists(&self, reference: &str) -> Result<bool> {
        self.exists("image", reference).await
    }

    async fn pull_image(&self, reference: &str) -> Result<()> {
        let args = ["--url", self.url.as_str(), "pull", "--quiet", reference];
        let output = self
            .runner
            .run_with_timeout(PODMAN, &args, PULL_TIMEOUT)
            .await?;
        check(&output, &args[2..])
    }
}
