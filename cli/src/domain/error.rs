//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator. Callers that must branch on a condition recover it
//! with `anyhow::Error::downcast_ref`.

use thiserror::Error;

// ── Environment variable pipeline errors ──────────────────────────────────────

/// Failures raised while deriving an environment variable value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvVarError {
    #[error("unknown modifier \"{0}\"")]
    UnknownModifier(String),

    #[error("modifier \"{name}\" failed with previous value \"{previous}\" and args: \"{}\"", args.join(", "))]
    InvalidParams {
        name: String,
        previous: String,
        args: Vec<String>,
    },

    #[error("value required")]
    ValueRequired,

    #[error("random source unavailable: {0}")]
    RandomSource(String),

    #[error("invalid declaration \"{0}\": expected NAME[:modifier(args)...]")]
    InvalidDeclaration(String),
}

// ── Spec builder errors ───────────────────────────────────────────────────────

/// Failures raised while turning an image template into a container spec.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("environment variable {var}: {source}")]
    EnvVar {
        var: String,
        #[source]
        source: EnvVarError,
    },
}

// ── Manager errors ────────────────────────────────────────────────────────────

/// Conditions of the orchestration manager that callers branch on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManagerError {
    #[error("host path must be an absolute path, current value: \"{0}\"")]
    HostPathNotAbsolute(String),

    #[error("data path {path} is not writable")]
    DataPathNotWritable { path: String },

    #[error("container {user}-{project} doesn't exist")]
    ContainerNotFound { user: String, project: String },

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("image \"{0}\" is not allowed")]
    ImageNotAllowed(String),

    #[error("runtime \"{0}\" not found")]
    RuntimeNotFound(String),

    #[error("invalid {field} \"{value}\": {reason}")]
    InvalidIdentity {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("pod has no containers")]
    EmptyPod,
}

// ── Path errors ───────────────────────────────────────────────────────────────

/// Failures raised by the mount directory resolver.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("{0} exists but is not a directory")]
    NotADirectory(String),

    #[error("cannot create {path}: {source}")]
    Create {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration and CLI input validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid environment variable {0}: expected KEY=VALUE")]
    InvalidEnvAssignment(String),

    #[error("cannot parse runtime catalogue: {0}")]
    InvalidCatalogue(String),
}
