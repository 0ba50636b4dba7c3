/// Label keys stamped on every object studentbox creates on the daemon
pub mod keys {
    /// Common prefix of every studentbox label
    pub const BASE: &str = "studentbox";

    /// Ownership flag. Value is always [`super::OWNED_VALUE`].
    /// Format: studentbox.container=true
    pub const OWNED: &str = "studentbox.container";

    /// User owning the object
    /// Format: studentbox.user={user}
    pub const USER: &str = "studentbox.user";

    /// Project of the owning user
    /// Format: studentbox.project={project}
    pub const PROJECT: &str = "studentbox.project";
}

/// Value of the ownership label on managed objects
pub const OWNED_VALUE: &str = "true";

/// Prefix of pods and pod-member containers
pub const PREFIX: &str = "sb-";

/// Longest accepted user or project segment.
pub const MAX_IDENTITY_LEN: usize = 63;

/// Deterministic pod name: `sb-{user}-{project}`
pub fn pod_name(user: &str, project: &str) -> String {
    format!("{PREFIX}{user}-{project}")
}

/// Deterministic pod-member container name: `sb-{user}-{project}-{short_name}`
pub fn member_name(user: &str, project: &str, short_name: &str) -> String {
    format!("{}-{short_name}", pod_name(user, project))
}

/// Deterministic standalone container name: `{user}-{project}`
pub fn standalone_name(user: &str, project: &str) -> String {
    format!("{user}-{project}")
}

/// The ownership label triple for a (user, project) pair.
pub fn ownership_labels(user: &str, project: &str) -> Vec<(String, String)> {
    vec![
        (keys::OWNED.to_string(), OWNED_VALUE.to_string()),
        (keys::USER.to_string(), user.to_string()),
        (keys::PROJECT.to_string(), project.to_string()),
    ]
}

/// Label filter matching every managed object.
pub fn owned_filter() -> Vec<String> {
    vec![format!("{}={OWNED_VALUE}", keys::OWNED)]
}

/// Label filter matching the managed objects of one (user, project) pair.
pub fn scoped_filter(user: &str, project: &str) -> Vec<String> {
    ownership_labels(user, project)
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect()
}

/// Validate a user or project segment before it is baked into object names
/// and label filters: `[a-zA-Z0-9][a-zA-Z0-9_.-]*`, at most 63 characters.
/// SECURITY: a `=` or `,` here would widen a label filter to other tenants.
pub fn validate_identity(segment: &str) -> Result<(), &'static str> {
    if segment.is_empty() {
        return Err("must not be empty");
    }
    if segment.len() > MAX_IDENTITY_LEN {
        return Err("must be at most 63 characters");
    }
    if !segment.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        return Err("must start with an ASCII letter or digit");
    }
    if !segment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err("may only contain [a-zA-Z0-9_.-]");
    }
    Ok(())
}
