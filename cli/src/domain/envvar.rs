//! Environment variable derivation pipeline.
//!
//! A declared variable starts from the caller override (when supplied) or its
//! default, then flows through its modifiers in declaration order. Modifiers
//! are looked up by name in a [`ModifierRegistry`] at derivation time, so an
//! unknown name only fails when a spec is built.
//!
//! The only side effect is the OS random source used by `password`.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use rand::RngCore;
use rand::rngs::OsRng;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::error::EnvVarError;

/// Symbols drawn by the `password` modifier: `[0-9A-Za-z-]`.
pub const PASSWORD_ALPHABET: &[u8; 63] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-";

/// Largest multiple of the alphabet size that fits in a byte; bytes at or
/// above it are rejected to keep the draw uniform.
#[allow(clippy::cast_possible_truncation)]
const ACCEPT_BELOW: u8 = (256 / PASSWORD_ALPHABET.len() * PASSWORD_ALPHABET.len()) as u8;

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex")
});

static MODIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)(?:\((.*)\))?$").expect("valid regex")
});

// ── Declarations ─────────────────────────────────────────────────────────────

/// One modifier invocation: name plus positional string parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierCall {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
}

impl ModifierCall {
    pub fn new(name: &str, params: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            params: params.iter().map(|p| (*p).to_string()).collect(),
        }
    }
}

impl fmt::Display for ModifierCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.params.join(","))
    }
}

/// A declared environment variable of an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    #[serde(default)]
    pub default: String,
    #[serde(default)]
    pub modifiers: Vec<ModifierCall>,
}

impl EnvVar {
    /// A variable with a default value and no modifiers.
    pub fn new(name: &str, default: &str) -> Self {
        Self {
            name: name.to_string(),
            default: default.to_string(),
            modifiers: Vec::new(),
        }
    }

    /// Append a modifier invocation.
    #[must_use]
    pub fn with_modifier(mut self, name: &str, params: &[&str]) -> Self {
        self.modifiers.push(ModifierCall::new(name, params));
        self
    }
}

// ── Registry ─────────────────────────────────────────────────────────────────

/// A modifier turns the previous value into the next one.
pub type Modifier = Arc<dyn Fn(&str, &[String]) -> Result<String, EnvVarError> + Send + Sync>;

/// Name -> modifier table consulted during derivation.
///
/// [`ModifierRegistry::builtin`] carries `password` and `failempty`; tests
/// swap entries with [`ModifierRegistry::with`] to make `password`
/// deterministic.
#[derive(Clone)]
pub struct ModifierRegistry {
    modifiers: HashMap<String, Modifier>,
}

impl fmt::Debug for ModifierRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.modifiers.keys().collect();
        names.sort();
        f.debug_struct("ModifierRegistry")
            .field("modifiers", &names)
            .finish()
    }
}

impl Default for ModifierRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ModifierRegistry {
    /// A registry without any modifier.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            modifiers: HashMap::new(),
        }
    }

    /// The registry with the built-in `password` and `failempty` modifiers.
    #[must_use]
    pub fn builtin() -> Self {
        Self::empty()
            .with("password", password)
            .with("failempty", failempty)
    }

    /// Register (or replace) a modifier.
    #[must_use]
    pub fn with<F>(mut self, name: &str, modifier: F) -> Self
    where
        F: Fn(&str, &[String]) -> Result<String, EnvVarError> + Send + Sync + 'static,
    {
        self.modifiers.insert(name.to_string(), Arc::new(modifier));
        self
    }

    /// Whether a modifier is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.modifiers.contains_key(name)
    }

    /// Derive the effective value of `var`.
    ///
    /// Starts from `caller_override` when supplied, else the declared
    /// default, then applies each modifier in declared order.
    ///
    /// # Errors
    ///
    /// Returns the first modifier failure, or `UnknownModifier` when a
    /// modifier name is not registered.
    pub fn derive(&self, var: &EnvVar, caller_override: Option<&str>) -> Result<String, EnvVarError> {
        let mut value = caller_override.unwrap_or(&var.default).to_string();
        for call in &var.modifiers {
            let modifier = self
                .modifiers
                .get(&call.name)
                .ok_or_else(|| EnvVarError::UnknownModifier(call.name.clone()))?;
            value = modifier(&value, &call.params)?;
        }
        Ok(value)
    }
}

// ── Built-in modifiers ───────────────────────────────────────────────────────

/// `password(length)`: keep a non-empty value, otherwise generate a random
/// string of `length` symbols from [`PASSWORD_ALPHABET`].
///
/// # Errors
///
/// `InvalidParams` when `length` is missing or not a non-negative integer.
pub fn password(previous: &str, params: &[String]) -> Result<String, EnvVarError> {
    let invalid = || EnvVarError::InvalidParams {
        name: "password".to_string(),
        previous: previous.to_string(),
        args: params.to_vec(),
    };
    let Some(length) = params.first() else {
        return Err(invalid());
    };
    if !previous.is_empty() {
        return Ok(previous.to_string());
    }
    let length: usize = length.trim().parse().map_err(|_| invalid())?;
    generate_password(length)
}

/// `failempty()`: reject an empty value, pass anything else through.
///
/// # Errors
///
/// `ValueRequired` when `previous` is empty.
pub fn failempty(previous: &str, _params: &[String]) -> Result<String, EnvVarError> {
    if previous.is_empty() {
        return Err(EnvVarError::ValueRequired);
    }
    Ok(previous.to_string())
}

/// Draw `length` symbols from [`PASSWORD_ALPHABET`] using the OS CSPRNG.
///
/// # Errors
///
/// `RandomSource` when the operating system refuses to provide entropy.
pub fn generate_password(length: usize) -> Result<String, EnvVarError> {
    let mut out = String::with_capacity(length);
    let mut buf = [0u8; 64];
    while out.len() < length {
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|e| EnvVarError::RandomSource(e.to_string()))?;
        for &byte in buf.iter().filter(|&&b| b < ACCEPT_BELOW) {
            out.push(char::from(
                PASSWORD_ALPHABET[usize::from(byte) % PASSWORD_ALPHABET.len()],
            ));
            if out.len() == length {
                break;
            }
        }
    }
    Ok(out)
}

// ── Declaration mini-syntax ──────────────────────────────────────────────────

/// Parse `NAME[:modifier(args,...)[:modifier(...)]]`, e.g.
/// `MYSQL_PASSWORD:password(30):failempty`. The default is empty.
///
/// # Errors
///
/// `InvalidDeclaration` when the name or a modifier token is malformed.
pub fn parse_declaration(decl: &str) -> Result<EnvVar, EnvVarError> {
    let invalid = || EnvVarError::InvalidDeclaration(decl.to_string());
    let mut parts = split_top_level(decl.trim(), ':').into_iter();
    let name = parts.next().unwrap_or_default();
    if !NAME_RE.is_match(name) {
        return Err(invalid());
    }
    let mut var = EnvVar::new(name, "");
    for token in parts {
        var.modifiers
            .push(parse_modifier(token).ok_or_else(invalid)?);
    }
    Ok(var)
}

/// Parse a comma-separated list of declarations:
/// `MYSQL_DATABASE,MYSQL_PASSWORD:password(30):failempty`.
///
/// # Errors
///
/// `InvalidDeclaration` for the first malformed entry.
pub fn parse_declarations(list: &str) -> Result<Vec<EnvVar>, EnvVarError> {
    split_top_level(list, ',')
        .into_iter()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(parse_declaration)
        .collect()
}

/// Parse one `name` or `name(a,b)` modifier token.
pub fn parse_modifier(token: &str) -> Option<ModifierCall> {
    let caps = MODIFIER_RE.captures(token.trim())?;
    let name = caps.get(1)?.as_str().to_string();
    let params = match caps.get(2).map(|m| m.as_str().trim()) {
        None | Some("") => Vec::new(),
        Some(args) => args.split(',').map(|a| a.trim().to_string()).collect(),
    };
    Some(ModifierCall { name, params })
}

/// Split on `sep` outside parentheses.
fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                parts.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

// ── Unit tests ───────────────────────────────────────────────────────────────
