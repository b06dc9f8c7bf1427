use chrono::Utc;
use tracing::{error, info, instrument, warn};

use crate::alert::{self, Notifier};
use crate::export::ExportDocument;
use crate::render::{Action, Renderer};
use crate::service::TaskService;
use crate::task::{NewTask, Snapshot, TaskId, TaskPatch};

/// How a controller operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The request and the follow-up reload both succeeded.
    Applied,
    /// Local validation refused the input; nothing was sent.
    Rejected,
    /// The service accepted the change but the reload that follows failed.
    /// The page still shows the previous snapshot.
    ReloadFailed,
    /// The request failed. The user has already been alerted.
    Failed,
}

impl Outcome {
    pub fn is_applied(self) -> bool {
        self == Outcome::Applied
    }

    /// Whether the service accepted the request.
    pub fn reached_service(self) -> bool {
        matches!(self, Outcome::Applied | Outcome::ReloadFailed)
    }
}

/// Owns the last fetched snapshot and keeps the page in step with it.
#[derive(Debug)]
pub struct SyncController<S, N> {
    service: S,
    notifier: N,
    renderer: Renderer,
    snapshot: Snapshot,
}

impl<S, N> SyncController<S, N>
where
    S: TaskService,
    N: Notifier,
{
    pub fn new(service: S, notifier: N, renderer: Renderer) -> Self {
        Self {
            service,
            notifier,
            renderer,
            snapshot: Snapshot::default(),
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    #[instrument(skip(self))]
    pub fn load(&mut self) -> Outcome {
        match self.service.list() {
            Ok(tasks) => {
                self.snapshot = Snapshot::partition(tasks);
                self.renderer
                    .render(&self.snapshot.pending, &self.snapshot.completed);
                self.renderer
                    .update_counts(&self.snapshot.pending, &self.snapshot.completed);
                info!(
                    pending = self.snapshot.pending.len(),
                    completed = self.snapshot.completed.len(),
                    "tasks loaded"
                );
                Outcome::Applied
            }
            Err(err) => {
                error!(error = %format!("{err:#}"), "loading tasks failed");
                self.notifier.alert(alert::LOAD_FAILED);
                Outcome::Failed
            }
        }
    }

    fn reload_after_change(&mut self) -> Outcome {
        match self.load() {
            Outcome::Applied => Outcome::Applied,
            _ => Outcome::ReloadFailed,
        }
    }

    #[instrument(skip(self, text))]
    pub fn create(&mut self, text: &str) -> Outcome {
        let text = text.trim();
        if text.is_empty() {
            warn!("refusing to create a task with empty text");
            self.notifier.alert(alert::EMPTY_INPUT);
            return Outcome::Rejected;
        }

        match self.service.create(&NewTask::pending(text)) {
            Ok(()) => {
                info!("task created");
                self.reload_after_change()
            }
            Err(err) => {
                error!(error = %format!("{err:#}"), "creating task failed");
                self.notifier.alert(alert::CREATE_FAILED);
                Outcome::Failed
            }
        }
    }

    #[instrument(skip(self), fields(id = %id))]
    pub fn remove(&mut self, id: &TaskId) -> Outcome {
        match self.service.delete(id) {
            Ok(()) => {
                info!("task deleted");
                self.reload_after_change()
            }
            Err(err) => {
                error!(error = %format!("{err:#}"), "deleting task failed");
                self.notifier.alert(alert::DELETE_FAILED);
                Outcome::Failed
            }
        }
    }

    #[instrument(skip(self), fields(id = %id))]
    pub fn toggle(&mut self, id: &TaskId, current_completed: bool) -> Outcome {
        let patch = TaskPatch {
            completed: !current_completed,
        };
        match self.service.update(id, patch) {
            Ok(()) => {
                info!(completed = patch.completed, "task updated");
                self.reload_after_change()
            }
            Err(err) => {
                error!(error = %format!("{err:#}"), "updating task failed");
                self.notifier.alert(alert::UPDATE_FAILED);
                Outcome::Failed
            }
        }
    }

    /// Runs whatever a rendered control is bound to.
    pub fn dispatch_action(&mut self, action: &Action) -> Outcome {
        match action {
            Action::Delete(id) => self.remove(id),
            Action::Toggle { id, completed } => self.toggle(id, *completed),
        }
    }

    /// Fetches a fresh copy for export. The held snapshot is left alone.
    #[instrument(skip(self))]
    pub fn export(&mut self) -> Option<ExportDocument> {
        match self.service.list() {
            Ok(tasks) => {
                let fresh = Snapshot::partition(tasks);
                info!(count = fresh.len(), "snapshot fetched for export");
                Some(ExportDocument::new(fresh, Utc::now()))
            }
            Err(err) => {
                error!(error = %format!("{err:#}"), "fetching tasks for export failed");
                self.notifier.alert(alert::EXPORT_FAILED);
                None
            }
        }
    }
}
