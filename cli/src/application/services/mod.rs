//! Application services — use-case orchestration.
//!
//! Each service module implements use-cases by composing domain logic with
//! port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports` — never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

pub mod manager;
pub mod saga;
pub mod spawn;

pub use manager::{Manager, ManagerOptions};
pub use spawn::{ContainerOptions, PodMembers, PodOptions};
