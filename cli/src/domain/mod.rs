//! Domain layer — pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod envvar;
pub mod error;
pub mod paths;
pub mod runtime;
pub mod spec;

pub use config::{EnvDefaults, FlagOverrides, Settings, resolve_settings};
pub use envvar::{EnvVar, ModifierCall, ModifierRegistry};
pub use error::{ConfigError, EnvVarError, ManagerError, PathError, SpecError};
pub use runtime::{Image, Runtime, RuntimeCatalogue};
pub use spec::{ContainerSpec, Mount, PodSpec};
