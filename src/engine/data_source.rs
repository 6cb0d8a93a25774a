// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Shared state behind every [`DataSource`](crate::traits::DataSource).
//!
//! Change notification is separate from status transitions. A source notifies
//! its change listeners in two cases:
//! * `fire()` while ready (`caused_by_ready_status = false`),
//! * reaching the ready status (`caused_by_ready_status = true`).
//!
//! Writes only mark the source dirty. Reaching the ready status while dirty
//! lands in `WaitingForUncommittedChanges` instead; the next `fire()` clears
//! the flag and completes the transition.

use std::cell::{Cell, RefCell};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use serde_json::Value;

use crate::engine::executable::panic_message;
use crate::engine::{Document, ExecutableState, ListenerId, Status, StatusChange};
use crate::errors::DocumentError;
use crate::observability::messages::executable::ListenerPanicked;
use crate::observability::messages::source::{ChangeListenersNotified, FireDeferred};
use crate::observability::messages::StructuredLog;
use crate::utils::{Fingerprint, DEFAULT_FINGERPRINT_THRESHOLD};

/// Delivered to change listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub source_id: String,
    /// True when the notification comes from reaching the ready status rather
    /// than from an explicit `fire()`.
    pub caused_by_ready_status: bool,
}

pub type ChangeCallback = Rc<dyn Fn(&ChangeEvent)>;

struct ChangeListener {
    id: ListenerId,
    callback: ChangeCallback,
    once: bool,
    tracking_key: Option<String>,
    fingerprint: RefCell<Fingerprint>,
    removed: Cell<bool>,
}

/// Per-source construction options.
#[derive(Debug, Clone)]
pub struct SourceOptions {
    /// Logical name; the id when absent.
    pub name: Option<String>,
    pub fingerprint_threshold: usize,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            name: None,
            fingerprint_threshold: DEFAULT_FINGERPRINT_THRESHOLD,
        }
    }
}

impl SourceOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

pub struct DataSourceCore {
    name: String,
    state: ExecutableState,
    data: RefCell<Option<Document>>,
    dirty: Cell<bool>,
    change_listeners: RefCell<Vec<Rc<ChangeListener>>>,
    next_change_listener_id: Cell<ListenerId>,
    fingerprint_threshold: usize,
}

impl DataSourceCore {
    pub fn new(
        id: impl Into<String>,
        options: SourceOptions,
        ready_status: Status,
        failed_statuses: &'static [Status],
    ) -> Self {
        let id = id.into();
        Self {
            name: options.name.unwrap_or_else(|| id.clone()),
            state: ExecutableState::new(id, ready_status, failed_statuses),
            data: RefCell::new(None),
            dirty: Cell::new(false),
            change_listeners: RefCell::new(Vec::new()),
            next_change_listener_id: Cell::new(1),
            fingerprint_threshold: options.fingerprint_threshold,
        }
    }

    pub fn id(&self) -> &str {
        self.state.owner_id()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &ExecutableState {
        &self.state
    }

    pub fn data(&self) -> Option<Document> {
        self.data.borrow().clone()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Swap in new data without marking the source dirty. Used by loaders,
    /// transformations and model updaters publishing their own results.
    pub fn replace_data(&self, document: Document) {
        *self.data.borrow_mut() = Some(document);
    }

    pub fn set_data(&self, document: Document) {
        self.replace_data(document);
        self.dirty.set(true);
    }

    pub fn write(&self, pointer: &str, value: Value) -> Result<(), DocumentError> {
        let document = self
            .data
            .borrow_mut()
            .get_or_insert_with(|| Document::new(Value::Null))
            .clone();
        document.set(pointer, value)?;
        self.dirty.set(true);
        Ok(())
    }

    pub fn remove(&self, pointer: &str) -> Result<Option<Value>, DocumentError> {
        let Some(document) = self.data() else {
            return Ok(None);
        };
        let removed = document.remove(pointer)?;
        self.dirty.set(true);
        Ok(removed)
    }

    pub(crate) fn clear_dirty(&self) {
        self.dirty.set(false);
    }

    /// Status transition with write coalescing and ready-time notification.
    pub fn set_status(&self, next: Status) -> Option<StatusChange> {
        let ready = self.state.ready_status();
        let next = if next == ready && self.dirty.get() {
            Status::WaitingForUncommittedChanges
        } else {
            next
        };
        let change = self.state.set_status(next)?;
        if change.new == ready {
            self.notify_change_listeners(true);
        }
        Some(change)
    }

    /// Clear the dirty flag and notify change listeners if ready.
    pub fn fire(&self) {
        self.dirty.set(false);
        let status = self.state.status();
        if status == Status::WaitingForUncommittedChanges {
            self.set_status(self.state.ready_status());
        } else if status == self.state.ready_status() {
            self.notify_change_listeners(false);
        } else {
            FireDeferred {
                source_id: self.id(),
                status,
            }
            .log();
        }
    }

    pub fn add_change_listener(
        &self,
        callback: ChangeCallback,
        tracking_key: Option<&str>,
        once: bool,
    ) -> ListenerId {
        let id = self.next_change_listener_id.get();
        self.next_change_listener_id.set(id + 1);
        let fingerprint = match tracking_key {
            Some(pointer) => self.fingerprint(pointer),
            None => Fingerprint::Absent,
        };
        self.change_listeners.borrow_mut().push(Rc::new(ChangeListener {
            id,
            callback,
            once,
            tracking_key: tracking_key.map(str::to_string),
            fingerprint: RefCell::new(fingerprint),
            removed: Cell::new(false),
        }));
        id
    }

    pub fn remove_change_listener(&self, id: ListenerId) -> bool {
        self.remove_change_listener_where(|listener| listener.id == id)
    }

    /// Remove by callback identity (`Rc::ptr_eq`).
    pub fn remove_change_listener_callback(&self, callback: &ChangeCallback) -> bool {
        self.remove_change_listener_where(|listener| Rc::ptr_eq(&listener.callback, callback))
    }

    fn remove_change_listener_where(&self, predicate: impl Fn(&ChangeListener) -> bool) -> bool {
        let mut listeners = self.change_listeners.borrow_mut();
        let Some(position) = listeners.iter().position(|listener| predicate(listener.as_ref())) else {
            return false;
        };
        listeners.remove(position).removed.set(true);
        true
    }

    pub fn change_listener_count(&self) -> usize {
        self.change_listeners.borrow().len()
    }

    fn fingerprint(&self, pointer: &str) -> Fingerprint {
        Fingerprint::of(
            self.data.borrow().as_ref(),
            pointer,
            self.fingerprint_threshold,
        )
    }

    fn notify_change_listeners(&self, caused_by_ready_status: bool) {
        let snapshot: Vec<Rc<ChangeListener>> = self.change_listeners.borrow().clone();
        let event = ChangeEvent {
            source_id: self.id().to_string(),
            caused_by_ready_status,
        };

        let mut notified = 0;
        for listener in &snapshot {
            if listener.removed.get() {
                continue;
            }
            if let Some(pointer) = &listener.tracking_key {
                let current = self.fingerprint(pointer);
                if *listener.fingerprint.borrow() == current {
                    continue;
                }
                *listener.fingerprint.borrow_mut() = current;
            }
            if listener.once {
                listener.removed.set(true);
            }
            notified += 1;
            let callback = listener.callback.clone();
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| callback(&event))) {
                let message = panic_message(payload.as_ref());
                ListenerPanicked {
                    owner_id: self.id(),
                    kind: "change",
                    message: &message,
                }
                .log();
            }
        }

        ChangeListenersNotified {
            source_id: self.id(),
            notified,
            caused_by_ready_status,
        }
        .log();

        if snapshot.iter().any(|listener| listener.removed.get()) {
            self.change_listeners
                .borrow_mut()
                .retain(|listener| !listener.removed.get());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FAILED: &[Status] = &[Status::LoadFailed];

    fn core() -> DataSourceCore {
        let core = DataSourceCore::new("src", SourceOptions::default(), Status::Ready, FAILED);
        core.replace_data(Document::new(json!({"filters": {"region": "emea"}, "n": 1})));
        core
    }

    fn recorder() -> (Rc<RefCell<Vec<bool>>>, ChangeCallback) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let callback: ChangeCallback =
            Rc::new(move |event: &ChangeEvent| sink.borrow_mut().push(event.caused_by_ready_status));
        (seen, callback)
    }

    #[test]
    fn name_defaults_to_id() {
        assert_eq!(core().name(), "src");
        let named = DataSourceCore::new("x", SourceOptions::named("Orders"), Status::Ready, FAILED);
        assert_eq!(named.name(), "Orders");
    }

    #[test]
    fn replace_data_is_not_a_write() {
        let core = core();
        assert!(!core.is_dirty());
        core.write("/n", json!(2)).unwrap();
        assert!(core.is_dirty());
        core.fire();
        assert!(!core.is_dirty());
    }

    #[test]
    fn fire_before_ready_is_deferred_to_the_ready_transition() {
        let core = core();
        let (seen, callback) = recorder();
        core.add_change_listener(callback, None, false);

        core.fire();
        assert!(seen.borrow().is_empty());

        core.set_status(Status::Ready);
        assert_eq!(*seen.borrow(), vec![true]);

        core.fire();
        assert_eq!(*seen.borrow(), vec![true, false]);
    }

    #[test]
    fn ready_while_dirty_waits_for_fire() {
        let core = core();
        let (seen, callback) = recorder();
        core.add_change_listener(callback, None, false);

        core.write("/n", json!(5)).unwrap();
        core.set_status(Status::Ready);
        assert_eq!(core.state().status(), Status::WaitingForUncommittedChanges);
        assert!(seen.borrow().is_empty());

        core.fire();
        assert_eq!(core.state().status(), Status::Ready);
        assert_eq!(*seen.borrow(), vec![true]);
    }

    #[test]
    fn tracked_listener_only_runs_when_its_subtree_changes() {
        let core = core();
        core.set_status(Status::Ready);
        let (seen, callback) = recorder();
        core.add_change_listener(callback, Some("/filters"), false);

        core.write("/n", json!(2)).unwrap();
        core.fire();
        assert!(seen.borrow().is_empty());

        core.write("/filters/region", json!("apac")).unwrap();
        core.fire();
        assert_eq!(seen.borrow().len(), 1);

        core.fire();
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn once_listener_and_removal_by_callback() {
        let core = core();
        core.set_status(Status::Ready);
        let (once_seen, once_cb) = recorder();
        let (kept_seen, kept_cb) = recorder();
        core.add_change_listener(once_cb, None, true);
        core.add_change_listener(kept_cb.clone(), None, false);

        core.fire();
        core.fire();
        assert_eq!(once_seen.borrow().len(), 1);
        assert_eq!(kept_seen.borrow().len(), 2);

        assert!(core.remove_change_listener_callback(&kept_cb));
        core.fire();
        assert_eq!(kept_seen.borrow().len(), 2);
        assert_eq!(core.change_listener_count(), 0);
    }

    #[test]
    fn listener_added_during_notification_waits_for_next_fire() {
        let core = Rc::new(core());
        core.set_status(Status::Ready);
        let (late_seen, late_cb) = recorder();
        let registrar = core.clone();
        core.add_change_listener(
            Rc::new(move |_: &ChangeEvent| {
                registrar.add_change_listener(late_cb.clone(), None, false);
            }),
            None,
            true,
        );

        core.fire();
        assert!(late_seen.borrow().is_empty());
        assert_eq!(core.change_listener_count(), 1);

        core.fire();
        assert_eq!(*late_seen.borrow(), vec![false]);
    }

    #[test]
    fn write_without_data_creates_a_document() {
        let core = DataSourceCore::new("empty", SourceOptions::default(), Status::Ready, FAILED);
        core.write("/a/b", json!(true)).unwrap();
        assert_eq!(core.data().unwrap().snapshot(), json!({"a": {"b": true}}));
        assert_eq!(core.remove("/a/b").unwrap(), Some(json!(true)));
    }
}
