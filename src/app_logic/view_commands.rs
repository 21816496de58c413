/*
 * Commands the application logic hands to the display surface. Controllers never
 * touch a UI toolkit directly; they return a list of these and the front-end
 * executes them in order.
 */
use crate::core::app_details::AppDetails;
use crate::core::diff_engine::EditOp;
use crate::core::models::ApplicationRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSeverity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewCommand {
    /* Incremental update of the displayed list; apply the edits in order. */
    ApplyEdits {
        edits: Vec<EditOp<ApplicationRecord>>,
    },
    SetLoading(bool),
    ShowStatus(String),
    ShowMessage {
        severity: MessageSeverity,
        text: String,
    },
    ShowDetails(Box<AppDetails>),
    ShowManifest(String),
    NavigateBack,
}
