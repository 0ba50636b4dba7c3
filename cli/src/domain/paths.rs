//! Mount directory layout: `{host_path}/{data_path}/{user}/{project}/{mount}`.
//!
//! `host_path` is the daemon host's view and feeds bind-mount sources.
//! `data_path` alone is this process's view of the same directory (the
//! process may itself run in a container with the data directory mounted),
//! and is where directories get created.

use std::path::{Component, Path, PathBuf};

/// Append `rel` below `root`. A root or `.` component in `rel` is skipped,
/// so an absolute `rel` still lands under `root`.
fn nest(root: &Path, rel: &Path) -> PathBuf {
    rel.components()
        .filter(|c| !matches!(c, Component::Prefix(_) | Component::RootDir | Component::CurDir))
        .fold(root.to_path_buf(), |acc, c| acc.join(c))
}

/// Host-side directory holding every mount of a project.
pub fn project_dir(host_root: &Path, data_root: &Path, user: &str, project: &str) -> PathBuf {
    nest(host_root, data_root).join(user).join(project)
}

/// Host-side directory bind-mounted for `mount_name`.
pub fn resolve(
    host_root: &Path,
    data_root: &Path,
    user: &str,
    project: &str,
    mount_name: &str,
) -> PathBuf {
    project_dir(host_root, data_root, user, project).join(mount_name)
}

/// Process-side directory to create for `mount_name`.
pub fn local_mount_dir(data_root: &Path, user: &str, project: &str, mount_name: &str) -> PathBuf {
    data_root.join(user).join(project).join(mount_name)
}
