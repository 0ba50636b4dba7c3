//! `studentbox remove` — forcibly remove everything of a project.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::ports::{ContainerDaemon, HostDirectories};
use crate::application::services::Manager;
use crate::commands::Target;
use crate::output::json;

/// Run `studentbox remove`.
///
/// Data directories are kept; only daemon objects are removed.
///
/// # Errors
///
/// Returns an error if nothing exists for the pair, or a removal fails.
pub async fn run(
    app: &AppContext,
    manager: &Manager<impl ContainerDaemon, impl HostDirectories>,
    target: &Target,
) -> Result<ExitCode> {
    let Target { user, project } = target;

    if app.is_json() && !app.non_interactive {
        anyhow::bail!("refusing to prompt in JSON mode, pass --yes");
    }
    let prompt = format!("Remove every container of {user}/{project}? Data is kept.");
    if !app.non_interactive && !app.confirm(&prompt, false)? {
        app.output.info("Cancelled.");
        return Ok(ExitCode::SUCCESS);
    }

    let removed = manager.remove(user, project).await?;

    if app.is_json() {
        json::print(&serde_json::json!({
            "user": user,
            "project": project,
            "removed": removed,
        }))?;
    } else {
        app.output
            .success(&format!("Removed {user}/{project} ({removed} objects)."));
    }
    Ok(ExitCode::SUCCESS)
}
