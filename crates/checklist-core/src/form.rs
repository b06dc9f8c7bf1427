use tracing::debug;

use crate::alert::Notifier;
use crate::controller::{Outcome, SyncController};
use crate::service::TaskService;

/// The single-line "new task" control.
#[derive(Debug, Clone, Default)]
pub struct FormHandler {
    input: String,
}

impl FormHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, value: impl Into<String>) {
        self.input = value.into();
    }

    /// Clears the control without touching the service.
    pub fn reset(&mut self) {
        self.input.clear();
    }

    /// Sends the trimmed input. The control is cleared only once the service
    /// accepted the task, so a failed request leaves the text for a retry.
    #[tracing::instrument(skip(self, controller))]
    pub fn submit<S, N>(&mut self, controller: &mut SyncController<S, N>) -> Outcome
    where
        S: TaskService,
        N: Notifier,
    {
        let outcome = controller.create(self.input.trim());
        if outcome.reached_service() {
            self.reset();
        } else {
            debug!(?outcome, "keeping form input");
        }
        outcome
    }
}
