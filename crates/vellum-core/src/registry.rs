//! Name and type index over live components, with lifecycle notifications.

use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use slotmap::SecondaryMap;

use crate::component::panic_message;
use crate::{ComponentId, UiState};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Created,
    Mounted,
    Updated,
    Unmounted,
    Destroyed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RegistryEntry {
    pub id: ComponentId,
    pub name: String,
    pub type_name: &'static str,
    pub state: LifecycleState,
}

pub type LifecycleCallback = Rc<dyn Fn(&RegistryEntry)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegistryStats {
    pub total: usize,
    pub by_type: HashMap<&'static str, usize>,
    pub pending_updates: usize,
    pub callbacks: usize,
}

#[derive(Default)]
pub struct Registry {
    entries: SecondaryMap<ComponentId, RegistryEntry>,
    by_name: HashMap<String, ComponentId>,
    by_type: HashMap<&'static str, HashSet<ComponentId>>,
    pending: Vec<ComponentId>,
    pending_set: HashSet<ComponentId>,
    callbacks: Vec<(CallbackId, LifecycleState, LifecycleCallback)>,
    next_callback: u64,
    counters: HashMap<&'static str, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `id` and returns its name. Without an explicit name one is
    /// generated as `"{Type}_{n}"`.
    pub fn register(
        &mut self,
        id: ComponentId,
        type_name: &'static str,
        name: Option<&str>,
    ) -> String {
        if let Some(existing) = self.entries.get(id) {
            log::warn!("{:?} is already registered as {:?}", id, existing.name);
            return existing.name.clone();
        }
        let name = match name {
            Some(n) => n.to_string(),
            None => {
                let n = self.counters.entry(type_name).or_insert(0);
                *n += 1;
                format!("{}_{}", type_name, n)
            }
        };
        if let Some(previous) = self.by_name.insert(name.clone(), id) {
            log::warn!(
                "component name {:?} now refers to {:?} (was {:?})",
                name,
                id,
                previous
            );
        }
        self.by_type.entry(type_name).or_default().insert(id);
        self.entries.insert(
            id,
            RegistryEntry {
                id,
                name: name.clone(),
                type_name,
                state: LifecycleState::Created,
            },
        );
        log::debug!("registered {} as {:?}", type_name, name);
        self.fire(id, LifecycleState::Created);
        name
    }

    pub fn mark_mounted(&mut self, id: ComponentId) -> bool {
        self.transition(id, LifecycleState::Mounted)
    }

    /// Removes `id`. Returns `false` if it was not registered.
    pub fn unregister(&mut self, id: ComponentId) -> bool {
        if !self.entries.contains_key(id) {
            return false;
        }
        self.transition(id, LifecycleState::Unmounted);
        self.transition(id, LifecycleState::Destroyed);
        let Some(entry) = self.entries.remove(id) else {
            return false;
        };
        if self.by_name.get(&entry.name) == Some(&id) {
            self.by_name.remove(&entry.name);
        }
        if let Some(set) = self.by_type.get_mut(entry.type_name) {
            set.remove(&id);
            if set.is_empty() {
                self.by_type.remove(entry.type_name);
            }
        }
        if self.pending_set.remove(&id) {
            self.pending.retain(|p| *p != id);
        }
        log::debug!("unregistered {:?}", entry.name);
        true
    }

    pub fn get_by_name(&self, name: &str) -> Option<ComponentId> {
        self.by_name.get(name).copied()
    }

    pub fn get_by_type(&self, type_name: &str) -> Vec<ComponentId> {
        self.by_type
            .get(type_name)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn entry(&self, id: ComponentId) -> Option<&RegistryEntry> {
        self.entries.get(id)
    }

    pub fn name_of(&self, id: ComponentId) -> Option<&str> {
        self.entries.get(id).map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Queues `id` for the next `process_updates`. Queuing twice is a no-op.
    pub fn mark_for_update(&mut self, id: ComponentId) {
        if self.entries.contains_key(id) && self.pending_set.insert(id) {
            self.pending.push(id);
        }
    }

    /// Runs `update_layout` on every queued component that is still live.
    pub fn process_updates(&mut self, state: &mut UiState) -> usize {
        let queue = std::mem::take(&mut self.pending);
        self.pending_set.clear();
        let mut processed = 0;
        for id in queue {
            let Some(component) = state.get_mut(id) else {
                log::debug!("skipping update for stale {:?}", id);
                continue;
            };
            component.update_layout();
            processed += 1;
            self.transition(id, LifecycleState::Updated);
        }
        processed
    }

    pub fn add_lifecycle_callback(
        &mut self,
        state: LifecycleState,
        callback: impl Fn(&RegistryEntry) + 'static,
    ) -> CallbackId {
        let id = CallbackId(self.next_callback);
        self.next_callback += 1;
        self.callbacks.push((id, state, Rc::new(callback)));
        id
    }

    pub fn remove_lifecycle_callback(&mut self, id: CallbackId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(cid, _, _)| *cid != id);
        self.callbacks.len() != before
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            total: self.entries.len(),
            by_type: self
                .by_type
                .iter()
                .map(|(t, set)| (*t, set.len()))
                .collect(),
            pending_updates: self.pending.len(),
            callbacks: self.callbacks.len(),
        }
    }

    /// Unregisters everything; returns how many entries were removed.
    pub fn cleanup_all(&mut self) -> usize {
        let ids: Vec<ComponentId> = self.entries.keys().collect();
        ids.into_iter().filter(|id| self.unregister(*id)).count()
    }

    fn transition(&mut self, id: ComponentId, state: LifecycleState) -> bool {
        let Some(entry) = self.entries.get_mut(id) else {
            return false;
        };
        entry.state = state;
        self.fire(id, state);
        true
    }

    fn fire(&self, id: ComponentId, state: LifecycleState) {
        let Some(entry) = self.entries.get(id) else {
            return;
        };
        for (_, _, cb) in self.callbacks.iter().filter(|(_, s, _)| *s == state) {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| cb(entry))) {
                log::error!(
                    "{:?} callback for {:?} panicked: {}",
                    state,
                    entry.name,
                    panic_message(payload.as_ref())
                );
            }
        }
    }
}
