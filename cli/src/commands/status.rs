//! `studentbox status` — daemon state of each container of a project.

use std::process::ExitCode;

use anyhow::Result;
use studentbox_common::StatusOutput;

use crate::app::AppContext;
use crate::application::ports::{ContainerDaemon, HostDirectories};
use crate::application::services::Manager;
use crate::commands::{Target, handle_not_found};

/// Run `studentbox status`.
///
/// # Errors
///
/// Returns an error if the daemon query fails.
pub async fn run(
    app: &AppContext,
    manager: &Manager<impl ContainerDaemon, impl HostDirectories>,
    target: &Target,
) -> Result<ExitCode> {
    match manager.status(&target.user, &target.project).await {
        Ok(containers) => {
            app.renderer().render_status(&StatusOutput {
                user: target.user.clone(),
                project: target.project.clone(),
                containers,
            })?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => handle_not_found(app, target, err),
    }
}
