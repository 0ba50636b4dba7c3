pub mod config;
pub mod labels;
pub mod types;

pub use config::StudentboxConfig;
pub use labels::{
    keys, member_name, ownership_labels, pod_name, scoped_filter, standalone_name,
    validate_identity, owned_filter, OWNED_VALUE, PREFIX,
};
pub use types::*;
