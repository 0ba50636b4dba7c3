//! Unit tests for `PodmanCli`: argument construction, exit-code mapping and
//! decoding of `--format json` output.

#![allow(clippy::expect_used)]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::process::Output;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use studentbox_cli::application::ports::{
    CommandRunner, ContainerInspector, ContainerLifecycle, ImageStore,
};
use studentbox_cli::domain::{ContainerSpec, Mount, PodSpec};
use studentbox_cli::infra::command_runner::PULL_TIMEOUT;
use studentbox_cli::infra::podman::PodmanCli;
use studentbox_common::labels;

use crate::helpers::{err_output, ok_output};

const URL: &str = "unix:///run/user/1000/podman/podman.sock";

// ─── ScriptedRunner ───────────────────────────────────────────────────────────

/// A `CommandRunner` that records every call and replays canned outputs in
/// order. Once the script runs out every call succeeds with empty output.
#[derive(Clone, Default)]
struct ScriptedRunner {
    calls: Arc<Mutex<Vec<(String, Vec<String>, Option<Duration>)>>>,
    script: Arc<Mutex<VecDeque<Output>>>,
}

impl ScriptedRunner {
    fn replying(outputs: Vec<Output>) -> Self {
        Self {
            calls: Arc::default(),
            script: Arc::new(Mutex::new(outputs.into())),
        }
    }

    fn args(&self, n: usize) -> Vec<String> {
        self.calls.lock().expect("mutex poisoned")[n].1.clone()
    }

    fn timeout(&self, n: usize) -> Option<Duration> {
        self.calls.lock().expect("mutex poisoned")[n].2
    }

    fn record(&self, program: &str, args: &[&str], timeout: Option<Duration>) -> Output {
        self.calls.lock().expect("mutex poisoned").push((
            program.to_owned(),
            args.iter().map(ToString::to_string).collect(),
            timeout,
        ));
        self.script
            .lock()
            .expect("mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| ok_output(b""))
    }
}

impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        Ok(self.record(program, args, None))
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output> {
        Ok(self.record(program, args, Some(timeout)))
    }
}

fn podman(runner: &ScriptedRunner) -> PodmanCli<ScriptedRunner> {
    PodmanCli::new(runner.clone(), URL)
}

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(ToString::to_string).collect()
}

// ── Connection ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn every_call_targets_the_configured_socket() {
    let runner = ScriptedRunner::default();
    let cli = podman(&runner);
    cli.start_container("abc").await.expect("start");

    let calls = runner.calls.lock().expect("mutex poisoned").clone();
    assert_eq!(calls[0].0, "podman");
    assert_eq!(calls[0].1, strings(&["--url", URL, "start", "abc"]));
    assert_eq!(cli.url(), URL);
}

// ── exists ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn exists_maps_exit_codes() {
    let runner = ScriptedRunner::replying(vec![
        ok_output(b""),
        err_output(1, b""),
        err_output(125, b"Error: cannot connect to Podman"),
    ]);
    let cli = podman(&runner);

    assert!(cli.pod_exists("sb-alice-blog").await.expect("exit 0"));
    assert!(!cli.container_exists("alice-blog").await.expect("exit 1"));
    let err = cli
        .image_exists("nginx")
        .await
        .expect_err("exit 125 is a failure");
    assert!(err.to_string().contains("cannot connect to Podman"), "got: {err}");

    assert_eq!(runner.args(0)[2..], strings(&["pod", "exists", "sb-alice-blog"]));
    assert_eq!(runner.args(1)[2..], strings(&["container", "exists", "alice-blog"]));
    assert_eq!(runner.args(2)[2..], strings(&["image", "exists", "nginx"]));
}

// ── ps ───────────────────────────────────────────────────────────────────────

const PS_JSON: &str = r#"[
  {
    "Id": "0f3c",
    "Names": ["sb-alice-blog-web"],
    "State": "running",
    "PodName": "sb-alice-blog",
    "Created": 1700000000,
    "Labels": {
      "studentbox.container": "true",
      "studentbox.user": "alice",
      "studentbox.project": "blog"
    },
    "Ports": [
      {"host_ip": "", "container_port": 80, "host_port": 8080, "range": 1, "protocol": "tcp"}
    ]
  },
  {
    "Id": "9a1b",
    "Names": null,
    "State": "exited",
    "Labels": null,
    "Ports": null
  }
]"#;

#[tokio::test]
async fn list_decodes_ps_json_and_passes_filters() {
    let runner = ScriptedRunner::replying(vec![ok_output(PS_JSON.as_bytes())]);
    let cli = podman(&runner);
    let filters = labels::scoped_filter("alice", "blog");

    let containers = cli.list_containers(&filters).await.expect("list");
    assert_eq!(containers.len(), 2);

    let web = &containers[0];
    assert_eq!(web.id, "0f3c");
    assert_eq!(web.name, "sb-alice-blog-web");
    assert_eq!(web.user, "alice");
    assert_eq!(web.project, "blog");
    assert_eq!(web.pod.as_deref(), Some("sb-alice-blog"));
    assert_eq!(web.ports[0].host_port, 8080);
    assert_eq!(web.ports[0].container_port, 80);
    assert!(web.created_at.is_some());

    let bare = &containers[1];
    assert_eq!(bare.state, "exited");
    assert!(bare.user.is_empty());
    assert!(bare.ports.is_empty());

    let args = runner.args(0);
    assert_eq!(args[2..6], strings(&["ps", "--all", "--format", "json"]));
    for filter in &filters {
        let expected = format!("label={filter}");
        assert!(args.contains(&expected), "missing filter {expected} in {args:?}");
    }
}

#[tokio::test]
async fn list_with_empty_output_is_empty() {
    let runner = ScriptedRunner::replying(vec![ok_output(b"\n")]);
    assert!(
        podman(&runner)
            .list_containers(&[])
            .await
            .expect("list")
            .is_empty()
    );
}

#[tokio::test]
async fn list_with_garbage_output_fails() {
    let runner = ScriptedRunner::replying(vec![ok_output(b"not json")]);
    let err = podman(&runner)
        .list_containers(&[])
        .await
        .expect_err("garbage");
    assert!(err.to_string().contains("failed to parse podman ps output"));
}

// ── inspect ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn inspect_decodes_environment_and_state() {
    let json = r#"[{
      "Id": "0f3c",
      "Name": "alice-blog",
      "State": {"Status": "running"},
      "Config": {"Env": ["PATH=/usr/bin", "URL=a=b"]},
      "NetworkSettings": {"Ports": {"80/tcp": [{"HostIp": "0.0.0.0", "HostPort": "8080"}]}}
    }]"#;
    let runner = ScriptedRunner::replying(vec![ok_output(json.as_bytes())]);
    let details = podman(&runner)
        .inspect_container("alice-blog")
        .await
        .expect("inspect");

    assert_eq!(details.state, "running");
    assert_eq!(details.env, vec!["PATH=/usr/bin".to_string(), "URL=a=b".to_string()]);
    assert_eq!(details.ports[0].host_port, 8080);
    assert_eq!(details.ports[0].container_port, 80);
    assert_eq!(
        runner.args(0)[2..],
        strings(&["container", "inspect", "--format", "json", "alice-blog"])
    );
}

#[tokio::test]
async fn inspect_missing_container_reports_stderr() {
    let runner = ScriptedRunner::replying(vec![err_output(
        125,
        b"Error: no such container alice-blog",
    )]);
    let err = podman(&runner)
        .inspect_container("alice-blog")
        .await
        .expect_err("missing");
    assert!(err.to_string().contains("no such container alice-blog"));
}

// ── create ───────────────────────────────────────────────────────────────────

fn container_spec() -> ContainerSpec {
    ContainerSpec {
        name: "sb-alice-blog-db".into(),
        image: "registry/lamp.db".into(),
        pod: Some("pod123".into()),
        terminal: true,
        env: [("MYSQL_PASSWORD".to_string(), "s3cr=t".to_string())].into(),
        mounts: vec![Mount {
            source: PathBuf::from("/srv/studentbox/data/alice/blog/data"),
            destination: "/var/lib/mysql".into(),
        }],
        labels: labels::ownership_labels("alice", "blog").into_iter().collect(),
    }
}

#[tokio::test]
async fn create_container_passes_spec_and_returns_last_line() {
    let runner = ScriptedRunner::replying(vec![ok_output(
        b"Trying to pull registry/lamp.db...\nWriting manifest\nc0ffee\n",
    )]);
    let id = podman(&runner)
        .create_container(&container_spec())
        .await
        .expect("create");
    assert_eq!(id, "c0ffee");

    let args = runner.args(0);
    let joined = args.join(" ");
    assert_eq!(args[2], "create");
    assert!(joined.contains("--name sb-alice-blog-db"));
    assert!(joined.contains("--pod pod123"));
    assert!(joined.contains("--interactive --tty"));
    assert!(joined.contains("--env MYSQL_PASSWORD=s3cr=t"));
    assert!(joined.contains("--volume /srv/studentbox/data/alice/blog/data:/var/lib/mysql"));
    assert!(joined.contains(&format!("--label {}=alice", labels::keys::USER)));
    assert_eq!(args.last().map(String::as_str), Some("registry/lamp.db"));
}

#[tokio::test]
async fn create_container_without_id_fails() {
    let runner = ScriptedRunner::replying(vec![ok_output(b"\n")]);
    let err = podman(&runner)
        .create_container(&container_spec())
        .await
        .expect_err("no id");
    assert!(err.to_string().contains("printed no id"));
}

#[tokio::test]
async fn create_pod_publishes_ports_and_returns_id() {
    let runner = ScriptedRunner::replying(vec![ok_output(b"f00d\n")]);
    let spec = PodSpec::new("alice", "blog", &[80, 443]);
    let id = podman(&runner).create_pod(&spec).await.expect("pod");
    assert_eq!(id, "f00d");

    let joined = runner.args(0).join(" ");
    assert!(joined.starts_with(&format!("--url {URL} pod create --name sb-alice-blog")));
    assert!(joined.contains("--publish 80"));
    assert!(joined.contains("--publish 443"));
}

#[tokio::test]
async fn failed_create_surfaces_daemon_message() {
    let runner = ScriptedRunner::replying(vec![err_output(125, b"Error: name in use\n")]);
    let err = podman(&runner)
        .create_pod(&PodSpec::new("alice", "blog", &[]))
        .await
        .expect_err("in use");
    assert_eq!(err.to_string(), "podman pod create failed: Error: name in use");
}

// ── remove / pull ────────────────────────────────────────────────────────────

#[tokio::test]
async fn removal_is_forced() {
    let runner = ScriptedRunner::default();
    let cli = podman(&runner);
    cli.remove_container("c0ffee").await.expect("rm");
    cli.remove_pod("f00d").await.expect("pod rm");
    assert_eq!(runner.args(0)[2..], strings(&["rm", "--force", "c0ffee"]));
    assert_eq!(runner.args(1)[2..], strings(&["pod", "rm", "--force", "f00d"]));
}

#[tokio::test]
async fn pull_uses_long_timeout() {
    let runner = ScriptedRunner::default();
    let cli = podman(&runner);
    cli.pull_image("docker.io/library/nginx:latest")
        .await
        .expect("pull");
    assert_eq!(runner.timeout(0), Some(PULL_TIMEOUT));
    assert_eq!(
        runner.args(0),
        strings(&["--url", URL, "pull", "--quiet", "docker.io/library/nginx:latest"])
    );
}

#[tokio::test]
async fn failed_pull_reports_stderr() {
    let runner = ScriptedRunner::replying(vec![err_output(125, b"manifest unknown")]);
    let err = podman(&runner)
        .pull_image("docker.io/library/nope")
        .await
        .expect_err("pull fails");
    assert_eq!(err.to_string(), "podman pull --quiet failed: manifest unknown");
}
