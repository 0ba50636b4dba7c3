//! Runtime templates: named bundles of images with their mounts and
//! declared environment variables.
//!
//! Pure data. Templates are parsed from YAML text; reading the file is the
//! caller's job.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use crate::domain::envvar::{EnvVar, parse_declaration, parse_modifier};
use crate::domain::error::{ConfigError, ManagerError};

/// Built-in runtime catalogue, compiled into the binary.
pub const BUILTIN_RUNTIMES: &str = include_str!("../../assets/runtimes.yaml");

/// One image of a runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    /// Fully qualified reference, e.g. `ghcr.io/org/runtime/lamp.web`.
    pub reference: String,
    /// Short name, unique within its runtime. Used in container names.
    pub short_name: String,
    /// Mount logical name -> absolute path inside the container.
    pub mounts: BTreeMap<String, String>,
    /// Declared variables, in declaration order.
    pub env: Vec<EnvVar>,
}

impl Image {
    /// An image with no mounts and no declared variables.
    pub fn bare(reference: &str, short_name: &str) -> Self {
        Self {
            reference: reference.to_string(),
            short_name: short_name.to_string(),
            mounts: BTreeMap::new(),
            env: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_mount(mut self, name: &str, container_path: &str) -> Self {
        self.mounts
            .insert(name.to_string(), container_path.to_string());
        self
    }

    #[must_use]
    pub fn with_env(mut self, var: EnvVar) -> Self {
        self.env.push(var);
        self
    }

    /// Mount logical names of this image.
    pub fn mount_names(&self) -> Vec<String> {
        self.mounts.keys().cloned().collect()
    }
}

/// A named set of images spawned together as one pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Runtime {
    pub name: String,
    /// Keyed by short name.
    pub images: BTreeMap<String, Image>,
    /// Container ports published on the pod.
    pub ports: Vec<u16>,
}

impl Runtime {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            images: BTreeMap::new(),
            ports: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_image(mut self, image: Image) -> Self {
        self.images.insert(image.short_name.clone(), image);
        self
    }

    /// Union of the mount names of every image, de-duplicated.
    pub fn mount_names(&self) -> Vec<String> {
        self.images
            .values()
            .flat_map(|img| img.mounts.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Runtimes available to `spawn`, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeCatalogue {
    runtimes: BTreeMap<String, Runtime>,
}

impl RuntimeCatalogue {
    /// The runtimes compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded catalogue is malformed.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_yaml(BUILTIN_RUNTIMES)
    }

    /// Parse a catalogue file.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCatalogue` if the YAML or an env declaration is malformed.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let raw: BTreeMap<String, RawRuntime> =
            serde_yaml::from_str(text).map_err(|e| ConfigError::InvalidCatalogue(e.to_string()))?;
        let runtimes = raw
            .into_iter()
            .map(|(name, rt)| rt.into_runtime(&name).map(|r| (name, r)))
            .collect::<Result<_, _>>()?;
        Ok(Self { runtimes })
    }

    /// Add `other`'s runtimes, replacing same-named ones.
    pub fn merge(&mut self, other: Self) {
        self.runtimes.extend(other.runtimes);
    }

    pub fn insert(&mut self, runtime: Runtime) {
        self.runtimes.insert(runtime.name.clone(), runtime);
    }

    /// Look up a runtime by name.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeNotFound` if no runtime has that name.
    pub fn get(&self, name: &str) -> Result<&Runtime, ManagerError> {
        self.runtimes
            .get(name)
            .ok_or_else(|| ManagerError::RuntimeNotFound(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Runtime> {
        self.runtimes.values()
    }
}

// ── YAML schema ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawRuntime {
    #[serde(default)]
    ports: Vec<u16>,
    images: BTreeMap<String, RawImage>,
}

#[derive(Debug, Deserialize)]
struct RawImage {
    image: String,
    #[serde(default)]
    mounts: BTreeMap<String, String>,
    #[serde(default)]
    env: Vec<RawEnv>,
}

/// `NAME[:modifier(args)...]` or `{name, default, modifiers}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEnv {
    Short(String),
    Long {
        name: String,
        #[serde(default)]
        default: String,
        #[serde(default)]
        modifiers: Vec<String>,
    },
}

impl RawRuntime {
    fn into_runtime(self, name: &str) -> Result<Runtime, ConfigError> {
        let mut runtime = Runtime::new(name);
        runtime.ports = self.ports;
        for (short_name, raw) in self.images {
            let env = raw
                .env
                .into_iter()
                .map(RawEnv::into_env_var)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| ConfigError::InvalidCatalogue(format!("{name}/{short_name}: {e}")))?;
            runtime.images.insert(
                short_name.clone(),
                Image {
                    reference: raw.image,
                    short_name,
                    mounts: raw.mounts,
                    env,
                },
            );
        }
        Ok(runtime)
    }
}

impl RawEnv {
    fn into_env_var(self) -> Result<EnvVar, String> {
        match self {
            Self::Short(decl) => parse_declaration(&decl).map_err(|e| e.to_string()),
            Self::Long {
                name,
                default,
                modifiers,
            } => {
                let mut var = parse_declaration(&name).map_err(|e| e.to_string())?;
                var.default = default;
                for token in modifiers {
                    let call = parse_modifier(&token)
                        .ok_or_else(|| format!("invalid modifier \"{token}\" on {name}"))?;
                    var.modifiers.push(call);
                }
                Ok(var)
            }
        }
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
