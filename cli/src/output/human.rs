//! Human-readable terminal renderer.

use owo_colors::OwoColorize as _;
use studentbox_common::{EnvsOutput, ListOutput, StatusOutput};

use crate::domain::RuntimeCatalogue;
use crate::output::OutputContext;

/// Renders listing and inspection results as terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        if self.ctx.quiet {
            return;
        }
        self.ctx.info(&format!("studentbox v{version}"));
    }

    /// Render every managed container, one line each.
    pub fn render_list(&self, list: &ListOutput) {
        if list.containers.is_empty() {
            self.ctx.info("No containers.");
            return;
        }
        for c in &list.containers {
            let addr = c
                .ports
                .first()
                .map(|p| format!("  {}", p.display_addr()))
                .unwrap_or_default();
            println!(
                "  {}  {}  {}{}",
                c.name.style(self.ctx.styles.bold),
                format_owner(&c.user, &c.project).style(self.ctx.styles.dim),
                c.state.style(self.ctx.styles.state(&c.state)),
                addr,
            );
        }
    }

    /// Render the state of each container of one project.
    pub fn render_status(&self, status: &StatusOutput) {
        self.ctx
            .header(&format_owner(&status.user, &status.project));
        for (name, state) in &status.containers {
            println!("  {name}  {}", state.style(self.ctx.styles.state(state)));
        }
    }

    /// Render the live environment of each container of one project.
    pub fn render_envs(&self, envs: &EnvsOutput) {
        for (name, vars) in &envs.containers {
            self.ctx.header(&format!("{name}:"));
            for (key, value) in vars {
                self.ctx.kv(key, value);
            }
        }
    }

    /// Render the runtime catalogue.
    pub fn render_runtimes(&self, catalogue: &RuntimeCatalogue) {
        for runtime in catalogue.iter() {
            let ports = if runtime.ports.is_empty() {
                String::new()
            } else {
                format!(
                    " (publishes {})",
                    runtime
                        .ports
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            };
            self.ctx.header(&format!("{}{ports}", runtime.name));
            for image in runtime.images.values() {
                self.ctx.kv(&image.short_name, &image.reference);
            }
        }
    }
}

/// `user/project`, as shown next to a container.
#[must_use]
pub fn format_owner(user: &str, project: &str) -> String {
    format!("{user}/{project}")
}
