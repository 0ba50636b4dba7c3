//! `studentbox envs` — live environment of each container of a project.

use std::collections::BTreeMap;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use studentbox_common::EnvsOutput;

use crate::app::AppContext;
use crate::application::ports::{ContainerDaemon, HostDirectories};
use crate::application::services::Manager;
use crate::commands::{Target, handle_not_found};

/// Arguments for the envs command.
#[derive(Args, Debug, Clone)]
pub struct EnvsArgs {
    #[command(flatten)]
    pub target: Target,

    /// Keep containers whose name contains this text (e.g. `-c db`)
    #[arg(short, long)]
    pub container: Option<String>,

    /// Keep variables whose name contains this text, ignoring case
    #[arg(long)]
    pub query: Option<String>,
}

/// Container name -> variable name -> value.
pub type EnvMap = BTreeMap<String, BTreeMap<String, String>>;

/// Apply the `--container` and `--query` filters. Containers left without
/// any variable are dropped.
#[must_use]
pub fn filter_envs(containers: EnvMap, container: Option<&str>, query: Option<&str>) -> EnvMap {
    let query = query.map(str::to_lowercase);
    containers
        .into_iter()
        .filter(|(name, _)| container.is_none_or(|c| name.contains(c)))
        .map(|(name, vars)| {
            let vars = match &query {
                Some(q) => vars
                    .into_iter()
                    .filter(|(key, _)| key.to_lowercase().contains(q.as_str()))
                    .collect(),
                None => vars,
            };
            (name, vars)
        })
        .filter(|(_, vars)| !vars.is_empty())
        .collect()
}

/// Run `studentbox envs`.
///
/// # Errors
///
/// Returns an error if the daemon query fails.
pub async fn run(
    app: &AppContext,
    manager: &Manager<impl ContainerDaemon, impl HostDirectories>,
    args: &EnvsArgs,
) -> Result<ExitCode> {
    let target = &args.target;
    match manager.get_env_vars(&target.user, &target.project).await {
        Ok(containers) => {
            let containers =
                filter_envs(containers, args.container.as_deref(), args.query.as_deref());
            if containers.is_empty() && !app.is_json() {
                app.output.info("No environment variables found.");
                return Ok(ExitCode::SUCCESS);
            }
            app.renderer().render_envs(&EnvsOutput {
                user: target.user.clone(),
                project: target.project.clone(),
                containers,
            })?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => handle_not_found(app, target, err),
    }
}
