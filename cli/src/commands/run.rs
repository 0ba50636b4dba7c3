//! `studentbox run` — spawn one standalone container from an allow-listed image.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use studentbox_common::labels;

use crate::app::AppContext;
use crate::application::ports::{ContainerDaemon, HostDirectories};
use crate::application::services::Manager;
use crate::commands::Target;
use crate::output::json;

/// Arguments for the run command.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub target: Target,

    /// Allow-listed image key (see `images` in the config file)
    #[arg(short, long)]
    pub image: String,
}

/// Run `studentbox run`.
///
/// # Errors
///
/// Returns an error if the image is not allow-listed, the container already
/// exists, or a daemon call fails.
pub async fn run(
    app: &AppContext,
    manager: &Manager<impl ContainerDaemon, impl HostDirectories>,
    args: &RunArgs,
) -> Result<ExitCode> {
    let Target { user, project } = &args.target;
    let id = manager.spawn_single(user, project, &args.image).await?;
    let name = labels::standalone_name(user, project);

    if app.is_json() {
        json::print(&serde_json::json!({
            "user": user,
            "project": project,
            "image": args.image,
            "name": name,
            "id": id,
        }))?;
    } else {
        app.output.success(&format!("Container {name} is running."));
    }
    Ok(ExitCode::SUCCESS)
}
