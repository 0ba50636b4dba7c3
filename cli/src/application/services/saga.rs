//! Compensating actions for multi-step provisioning.
//!
//! Every daemon call that creates something records how to undo it. If a
//! later step fails, [`Saga::unwind`] runs the recorded compensations in
//! reverse order, so the caller never observes a half-built pod.

use std::fmt;

use anyhow::Result;

use crate::application::ports::ContainerLifecycle;

/// Undo action for one completed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    /// Forcibly remove the pod (and its containers).
    RemovePod(String),
    /// Forcibly remove the container.
    RemoveContainer(String),
}

impl fmt::Display for Compensation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RemovePod(id) => write!(f, "remove pod {id}"),
            Self::RemoveContainer(id) => write!(f, "remove container {id}"),
        }
    }
}

impl Compensation {
    async fn run(&self, daemon: &impl ContainerLifecycle) -> Result<()> {
        match self {
            Self::RemovePod(id) => daemon.remove_pod(id).await,
            Self::RemoveContainer(id) => daemon.remove_container(id).await,
        }
    }
}

/// Ordered log of compensations for the steps completed so far.
#[derive(Debug, Default)]
pub struct Saga {
    compensations: Vec<Compensation>,
}

impl Saga {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the undo action of a step that just succeeded.
    pub fn record(&mut self, compensation: Compensation) {
        self.compensations.push(compensation);
    }

    /// Every step succeeded: forget the compensations.
    pub fn commit(mut self) {
        self.compensations.clear();
    }

    /// Run the compensations newest first.
    ///
    /// Every compensation is attempted even if an earlier one fails; the
    /// failures are returned so the caller can report them.
    pub async fn unwind(self, daemon: &impl ContainerLifecycle) -> Vec<anyhow::Error> {
        let mut failures = Vec::new();
        for compensation in self.compensations.into_iter().rev() {
            tracing::info!(%compensation, "rolling back");
            if let Err(err) = compensation.run(daemon).await {
                tracing::error!(%compensation, error = %err, "rollback step failed");
                failures.push(err.context(format!("failed to {compensation}")));
            }
        }
        failures
    }
}
