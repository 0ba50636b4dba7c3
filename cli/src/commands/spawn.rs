//! `studentbox spawn` — spawn the pod of a catalogue runtime.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use studentbox_common::labels;

use crate::app::AppContext;
use crate::application::ports::{ContainerDaemon, HostDirectories, SilentReporter};
use crate::application::services::{Manager, PodOptions};
use crate::commands::Target;
use crate::domain::RuntimeCatalogue;
use crate::domain::config::parse_env_assignments;
use crate::output::json;
use crate::output::reporter::TerminalReporter;

/// Arguments for the spawn command.
#[derive(Args, Debug)]
pub struct SpawnArgs {
    #[command(flatten)]
    pub target: Target,

    /// Runtime to spawn (see `studentbox runtimes`)
    #[arg(short, long)]
    pub runtime: String,

    /// Environment override passed to every container
    #[arg(short, long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,
}

/// Run `studentbox spawn`.
///
/// # Errors
///
/// Returns an error if an `--env` value is malformed, the runtime is
/// unknown, or the spawn fails (in which case nothing is left behind).
pub async fn run(
    app: &AppContext,
    manager: &Manager<impl ContainerDaemon, impl HostDirectories>,
    catalogue: &RuntimeCatalogue,
    args: &SpawnArgs,
) -> Result<ExitCode> {
    let env = parse_env_assignments(&args.env)?;
    let runtime = catalogue.get(&args.runtime)?.clone();
    let Target { user, project } = &args.target;
    let opts = PodOptions::from_runtime(user, project, runtime, env);

    let pod_id = if app.is_json() {
        manager.spawn_pod(&opts, &SilentReporter).await?
    } else {
        manager
            .spawn_pod(&opts, &TerminalReporter::new(&app.output))
            .await?
    };

    if app.is_json() {
        json::print(&serde_json::json!({
            "user": user,
            "project": project,
            "runtime": args.runtime,
            "pod": labels::pod_name(user, project),
            "id": pod_id,
        }))?;
    } else {
        app.output
            .info(&format!("Inspect it: studentbox status -u {user} -p {project}"));
    }
    Ok(ExitCode::SUCCESS)
}
