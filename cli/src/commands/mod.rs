//! Command implementations

pub mod envs;
pub mod list;
pub mod remove;
pub mod run;
pub mod runtimes;
pub mod spawn;
pub mod status;
pub mod version;

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::domain::error::{ConfigError, ManagerError};

/// The (user, project) pair a command acts on.
#[derive(Args, Debug, Clone)]
pub struct Target {
    /// Owner of the environment
    #[arg(short, long)]
    pub user: String,

    /// Project name
    #[arg(short, long)]
    pub project: String,
}

/// Stable machine-readable code of an error, for `--json` output.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    if let Some(e) = err.downcast_ref::<ManagerError>() {
        return match e {
            ManagerError::ContainerNotFound { .. } => "not_found",
            ManagerError::AlreadyExists(_) => "already_exists",
            ManagerError::ImageNotAllowed(_) => "image_not_allowed",
            ManagerError::RuntimeNotFound(_) => "runtime_not_found",
            ManagerError::InvalidIdentity { .. } => "invalid_identity",
            ManagerError::HostPathNotAbsolute(_) | ManagerError::DataPathNotWritable { .. } => {
                "configuration"
            }
            ManagerError::EmptyPod => "empty_pod",
        };
    }
    if err.downcast_ref::<ConfigError>().is_some() {
        return "configuration";
    }
    "error"
}

/// Print the friendly form of a not-found error and fail. Other errors, and
/// every error in JSON mode, propagate unchanged.
fn handle_not_found(app: &AppContext, target: &Target, err: anyhow::Error) -> Result<ExitCode> {
    let not_found = matches!(
        err.downcast_ref::<ManagerError>(),
        Some(ManagerError::ContainerNotFound { .. })
    );
    if !not_found || app.is_json() {
        return Err(err);
    }
    app.output.error(&format!(
        "Nothing is running for {}/{}.",
        target.user, target.project
    ));
    app.output.info(&format!(
        "Create it: studentbox spawn -u {} -p {} -r <runtime>",
        target.user, target.project
    ));
    Ok(ExitCode::FAILURE)
}
