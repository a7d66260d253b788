use thiserror::Error;

use crate::{ComponentId, LayoutError};

/// Caller mistakes at the public API boundary. Runtime faults inside
/// handlers and render code are logged, never surfaced here.
#[derive(Debug, Error)]
pub enum UiError {
    #[error("the UI owning this mailbox has shut down")]
    MailboxClosed,
    #[error("component {0:?} is not live")]
    UnknownComponent(ComponentId),
    #[error("no component named {0:?}")]
    UnknownName(String),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}
