//! `studentbox runtimes` — runtimes available to `spawn`.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;

/// Run `studentbox runtimes`.
///
/// # Errors
///
/// Returns an error if the catalogue file cannot be loaded.
pub fn run(app: &AppContext) -> Result<ExitCode> {
    let catalogue = app.catalogue()?;
    app.renderer().render_runtimes(&catalogue)?;
    Ok(ExitCode::SUCCESS)
}
