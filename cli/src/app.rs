//! Application context — unified state passed to every command handler.
//!
//! `AppContext` carries the output settings and the resolved configuration.
//! The daemon-backed `Manager` is only built by commands that need it, so
//! `version` and `runtimes` work without a data directory or a daemon.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ports::{CatalogueSource, ConfigStore};
use crate::application::services::{Manager, ManagerOptions};
use crate::domain::{EnvDefaults, FlagOverrides, RuntimeCatalogue, Settings, resolve_settings};
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::YamlCatalogue;
use crate::infra::fs::LocalFs;
use crate::infra::podman::PodmanCli;
use crate::output::{HumanRenderer, JsonRenderer, OutputContext, Renderer};

/// The production manager: podman client plus local filesystem.
pub type PodmanManager = Manager<PodmanCli<TokioCommandRunner>, LocalFs>;

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Behaviour flags.
pub struct BehaviourFlags {
    /// Skip interactive prompts (also set by `CI` / `STUDENTBOX_YES` env vars).
    pub yes: bool,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
    /// Behaviour options.
    pub behaviour: BehaviourFlags,
    /// Connection and path overrides.
    pub overrides: FlagOverrides,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Config file, flags and environment defaults merged.
    pub settings: Settings,
    /// When `true`, skip interactive prompts and use defaults.
    pub non_interactive: bool,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags and the config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded or the current
    /// directory cannot be determined.
    pub fn new(flags: &AppFlags, config_store: &impl ConfigStore) -> Result<Self> {
        let ci_env = std::env::var("CI").is_ok() || std::env::var("STUDENTBOX_YES").is_ok();
        let non_interactive = flags.behaviour.yes || ci_env;

        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };

        let file = config_store.load()?;
        let defaults = EnvDefaults {
            runtime_dir: std::env::var_os("XDG_RUNTIME_DIR").map(PathBuf::from),
            cwd: std::env::current_dir().context("cannot determine current directory")?,
        };
        let settings = resolve_settings(&file, &flags.overrides, &defaults);
        tracing::debug!(?settings, "resolved settings");

        Ok(Self {
            output: OutputContext::new(flags.output.no_color, flags.output.quiet),
            mode,
            settings,
            non_interactive,
        })
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Returns the appropriate `Renderer` variant for the current output mode.
    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        match self.mode {
            OutputMode::Human => Renderer::Human(HumanRenderer::new(&self.output)),
            OutputMode::Json => Renderer::Json(JsonRenderer),
        }
    }

    /// Connect to the configured daemon and prepare the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the host path is not absolute or the data
    /// directory is unusable.
    pub fn manager(&self) -> Result<PodmanManager> {
        Manager::new(
            PodmanCli::connect(&self.settings.socket),
            LocalFs,
            ManagerOptions {
                host_path: self.settings.host_path.clone(),
                data_path: self.settings.data_path.clone(),
                images: self.settings.images.clone(),
            },
        )
    }

    /// Built-in runtimes plus the configured catalogue file.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalogue file cannot be loaded.
    pub fn catalogue(&self) -> Result<RuntimeCatalogue> {
        YamlCatalogue.load(self.settings.runtimes_file.as_deref())
    }

    /// Ask the user for confirmation.
    ///
    /// When `non_interactive` is `true` (CI, `--yes` flag, or `STUDENTBOX_YES`
    /// env), returns `default` immediately without prompting.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY available).
    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.non_interactive {
            return Ok(default);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?;
        Ok(confirmed)
    }
}
