//! Cross-thread handoff into the UI thread.
//!
//! The UI is single-threaded. Background work holds a [`Mailbox`] and posts
//! closures; `Ui::poll` drains them on the UI thread. A mailbox only keeps a
//! weak reference, so posting after the UI is gone fails instead of keeping
//! a dead queue alive.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::component::panic_message;
use crate::{Component, ComponentId, UiError, UiState};

type ComponentJob = Box<dyn FnOnce(&mut dyn Component) + Send>;
type StateJob = Box<dyn FnOnce(&mut UiState) + Send>;

pub(crate) enum Delivery {
    Component(ComponentId, ComponentJob),
    State(StateJob),
}

pub(crate) type Inbox = Arc<Mutex<VecDeque<Delivery>>>;

#[derive(Clone)]
pub struct Mailbox {
    inbox: Weak<Mutex<VecDeque<Delivery>>>,
}

impl std::fmt::Debug for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailbox")
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Mailbox {
    pub(crate) fn new(inbox: &Inbox) -> Self {
        Self {
            inbox: Arc::downgrade(inbox),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inbox.strong_count() == 0
    }

    fn push(&self, delivery: Delivery) -> Result<(), UiError> {
        let inbox = self.inbox.upgrade().ok_or(UiError::MailboxClosed)?;
        inbox.lock().push_back(delivery);
        Ok(())
    }

    /// Runs `job` against component `id` on the UI thread. Dropped with a log
    /// line if the component is gone by then.
    pub fn post_to(
        &self,
        id: ComponentId,
        job: impl FnOnce(&mut dyn Component) + Send + 'static,
    ) -> Result<(), UiError> {
        self.push(Delivery::Component(id, Box::new(job)))
    }

    /// Runs `job` against the whole UI state on the UI thread.
    pub fn post(&self, job: impl FnOnce(&mut UiState) + Send + 'static) -> Result<(), UiError> {
        self.push(Delivery::State(Box::new(job)))
    }
}

/// Runs everything queued so far. Jobs posted while draining wait for the
/// next call.
pub(crate) fn drain(inbox: &Inbox, state: &mut UiState) -> usize {
    let batch = std::mem::take(&mut *inbox.lock());
    let mut delivered = 0;
    for delivery in batch {
        let result = match delivery {
            Delivery::Component(id, job) => match state.get_mut(id) {
                Some(component) => {
                    delivered += 1;
                    panic::catch_unwind(AssertUnwindSafe(|| job(component)))
                }
                None => {
                    log::debug!("dropping delivery to stale {:?}", id);
                    continue;
                }
            },
            Delivery::State(job) => {
                delivered += 1;
                panic::catch_unwind(AssertUnwindSafe(|| job(state)))
            }
        };
        if let Err(payload) = result {
            log::error!("mailbox job panicked: {}", panic_message(payload.as_ref()));
        }
    }
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_after_drop_fails() {
        let inbox: Inbox = Arc::new(Mutex::new(VecDeque::new()));
        let mailbox = Mailbox::new(&inbox);
        assert!(mailbox.post(|_| {}).is_ok());
        drop(inbox);
        assert!(mailbox.is_closed());
        assert!(matches!(mailbox.post(|_| {}), Err(UiError::MailboxClosed)));
    }

    #[test]
    fn test_mailbox_crosses_threads() {
        let inbox: Inbox = Arc::new(Mutex::new(VecDeque::new()));
        let mailbox = Mailbox::new(&inbox);
        let handle = std::thread::spawn(move || {
            mailbox
                .post(|state| state.update_viewport_size(320.0, 240.0))
                .is_ok()
        });
        assert!(handle.join().unwrap());

        let mut state = UiState::default();
        assert_eq!(drain(&inbox, &mut state), 1);
        assert_eq!(state.viewport().width, 320.0);
        assert_eq!(drain(&inbox, &mut state), 0);
    }
}
