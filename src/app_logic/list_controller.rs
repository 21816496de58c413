use super::view_commands::{MessageSeverity, ViewCommand};
use crate::core::config::{ConfigManagerOperations, ViewPreferences};
use crate::core::diff_engine;
use crate::core::models::SortCriterion;
use crate::core::query_engine::DisplayView;
use crate::core::refresh::{RefreshCoordinator, RefreshEvent};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, TryRecvError};

pub const REFRESHING_MESSAGE: &str = "Refreshing...";

/*
 * Presenter for the installed-applications list. It owns the active filter and
 * sort criterion, keeps the currently displayed `DisplayView`, and turns every
 * change (new filter, new sort order, freshly published batch) into an edit
 * script against what is on screen. Refreshes run through the
 * `RefreshCoordinator`; their results come back over channels that
 * `poll_refresh` drains.
 */
pub struct AppListController {
    coordinator: Arc<RefreshCoordinator>,
    config_manager: Arc<dyn ConfigManagerOperations>,
    app_name: String,
    preferences: ViewPreferences,
    view: DisplayView,
    pending_refreshes: Vec<Receiver<RefreshEvent>>,
}

impl AppListController {
    /*
     * Creates the controller and restores the saved view preferences. A
     * preferences file that cannot be read is logged and replaced by defaults.
     */
    pub fn new(
        coordinator: Arc<RefreshCoordinator>,
        config_manager: Arc<dyn ConfigManagerOperations>,
        app_name: &str,
    ) -> Self {
        let preferences = match config_manager.load_view_preferences(app_name) {
            Ok(preferences) => preferences,
            Err(e) => {
                log::warn!("AppListController: Could not load view preferences: {e}. Using defaults.");
                ViewPreferences::default()
            }
        };
        let view = DisplayView {
            records: Vec::new(),
            filter_text: preferences.filter_text.clone(),
            sort_criterion: preferences.sort_criterion,
        };
        AppListController {
            coordinator,
            config_manager,
            app_name: app_name.to_string(),
            preferences,
            view,
            pending_refreshes: Vec::new(),
        }
    }

    pub fn view(&self) -> &DisplayView {
        &self.view
    }

    pub fn preferences(&self) -> &ViewPreferences {
        &self.preferences
    }

    pub fn is_refreshing(&self) -> bool {
        !self.pending_refreshes.is_empty()
    }

    fn persist_preferences(&self) {
        if let Err(e) = self
            .config_manager
            .save_view_preferences(&self.app_name, &self.preferences)
        {
            log::warn!("AppListController: Failed to save view preferences: {e}");
        }
    }

    /*
     * Rebuilds the projection from the store's current batch and emits the edit
     * script that takes the display from the old view to the new one.
     */
    fn rebuild_view(&mut self) -> Vec<ViewCommand> {
        let batch = self.coordinator.store().all();
        let new_view = DisplayView::build(
            &batch,
            &self.preferences.filter_text,
            self.preferences.sort_criterion,
        );
        let edits = diff_engine::diff(&self.view.records, &new_view.records);
        log::debug!(
            "AppListController: View now shows {} of {} records ({} edits).",
            new_view.len(),
            batch.len(),
            edits.len()
        );

        let mut commands = Vec::new();
        if !edits.is_empty() {
            commands.push(ViewCommand::ApplyEdits { edits });
        }
        commands.push(ViewCommand::ShowStatus(format!(
            "Showing {} of {} applications",
            new_view.len(),
            batch.len()
        )));
        self.view = new_view;
        commands
    }

    pub fn set_filter(&mut self, filter_text: &str) -> Vec<ViewCommand> {
        let trimmed = filter_text.trim();
        if trimmed == self.preferences.filter_text {
            return Vec::new();
        }
        log::debug!("AppListController: Filter changed to '{trimmed}'.");
        self.preferences.filter_text = trimmed.to_string();
        self.persist_preferences();
        self.rebuild_view()
    }

    pub fn set_sort(&mut self, criterion: SortCriterion) -> Vec<ViewCommand> {
        if criterion == self.preferences.sort_criterion {
            return Vec::new();
        }
        log::debug!("AppListController: Sort changed to {criterion}.");
        self.preferences.sort_criterion = criterion;
        self.persist_preferences();
        self.rebuild_view()
    }

    /* Starts a background refresh. Its outcome arrives through `poll_refresh`. */
    pub fn request_refresh(&mut self) -> Vec<ViewCommand> {
        let receiver = self.coordinator.request_refresh();
        self.pending_refreshes.push(receiver);
        vec![
            ViewCommand::SetLoading(true),
            ViewCommand::ShowStatus(REFRESHING_MESSAGE.to_string()),
        ]
    }

    /*
     * Collects finished refreshes without blocking and returns the commands they
     * produce. Loading is switched off once no refresh is outstanding.
     */
    pub fn poll_refresh(&mut self) -> Vec<ViewCommand> {
        let outstanding_before = self.pending_refreshes.len();
        let mut events = Vec::new();
        self.pending_refreshes
            .retain(|receiver| match receiver.try_recv() {
                Ok(event) => {
                    events.push(event);
                    false
                }
                Err(TryRecvError::Empty) => true,
                Err(TryRecvError::Disconnected) => {
                    log::warn!("AppListController: Refresh worker vanished without a result.");
                    false
                }
            });

        let mut commands = Vec::new();
        for event in events {
            commands.extend(self.on_refresh_event(event));
        }
        if outstanding_before > 0 && self.pending_refreshes.is_empty() {
            commands.push(ViewCommand::SetLoading(false));
        }
        commands
    }

    /*
     * Reacts to the outcome of one refresh. A published batch updates the view; a
     * failure keeps the current view and reports the problem; a superseded
     * refresh is ignored.
     */
    pub fn on_refresh_event(&mut self, event: RefreshEvent) -> Vec<ViewCommand> {
        match event {
            RefreshEvent::Published {
                generation,
                record_count,
            } => {
                log::debug!(
                    "AppListController: Generation {generation} published {record_count} records."
                );
                self.rebuild_view()
            }
            RefreshEvent::Superseded { generation } => {
                log::debug!("AppListController: Ignoring superseded generation {generation}.");
                Vec::new()
            }
            RefreshEvent::Failed { generation, error } => {
                log::error!("AppListController: Refresh generation {generation} failed: {error}");
                vec![ViewCommand::ShowMessage {
                    severity: MessageSeverity::Error,
                    text: format!("Failed to load apps: {error}"),
                }]
            }
        }
    }
}
