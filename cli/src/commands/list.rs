//! `studentbox list` — every managed container.

use std::process::ExitCode;

use anyhow::Result;
use studentbox_common::ListOutput;

use crate::app::AppContext;
use crate::application::ports::{ContainerDaemon, HostDirectories};
use crate::application::services::Manager;

/// Run `studentbox list`.
///
/// # Errors
///
/// Returns an error if the daemon query fails.
pub async fn run(
    app: &AppContext,
    manager: &Manager<impl ContainerDaemon, impl HostDirectories>,
) -> Result<ExitCode> {
    let containers = manager.list_all().await?;
    app.renderer().render_list(&ListOutput { containers })?;
    Ok(ExitCode::SUCCESS)
}
