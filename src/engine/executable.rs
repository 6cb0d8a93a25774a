// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Status bookkeeping shared by every executable kind.
//!
//! [`ExecutableState`] owns the current [`Status`] and the status listeners.
//! Kinds embed one and forward to it from their [`Executable`] impl.
//!
//! Notification works on a snapshot of the listener list taken when the
//! transition happens:
//! * a listener added while listeners are running waits for the next transition,
//! * a listener removed while listeners are running is skipped,
//! * a one-shot listener is marked removed before it runs, so a re-entrant
//!   transition cannot invoke it twice.
//!
//! [`Executable`]: crate::traits::Executable

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use tokio::sync::oneshot;

use crate::engine::{Status, StatusChange, StatusFilter};
use crate::observability::messages::executable::{
    ListenerPanicked, StatusChanged, TransitionRejected,
};
use crate::observability::messages::StructuredLog;

pub type ListenerId = u64;

/// Callback invoked with every transition a status listener matches.
pub type StatusCallback = Rc<dyn Fn(&StatusChange)>;

struct StatusListener {
    id: ListenerId,
    filter: StatusFilter,
    once: bool,
    removed: Cell<bool>,
    callback: StatusCallback,
}

pub struct ExecutableState {
    owner_id: String,
    status: Cell<Status>,
    ready_status: Status,
    failed_statuses: &'static [Status],
    listeners: RefCell<Vec<Rc<StatusListener>>>,
    next_listener_id: Cell<ListenerId>,
}

impl ExecutableState {
    /// New state in `Initialized`.
    pub fn new(
        owner_id: impl Into<String>,
        ready_status: Status,
        failed_statuses: &'static [Status],
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            status: Cell::new(Status::Initialized),
            ready_status,
            failed_statuses,
            listeners: RefCell::new(Vec::new()),
            next_listener_id: Cell::new(1),
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn status(&self) -> Status {
        self.status.get()
    }

    pub fn ready_status(&self) -> Status {
        self.ready_status
    }

    pub fn failed_statuses(&self) -> &'static [Status] {
        self.failed_statuses
    }

    pub fn is_ready(&self) -> bool {
        self.status.get() == self.ready_status
    }

    pub fn has_failed(&self) -> bool {
        self.is_failure(self.status.get())
    }

    pub fn is_failure(&self, status: Status) -> bool {
        self.failed_statuses.contains(&status)
    }

    fn is_settled(&self, status: Status) -> bool {
        status == self.ready_status || self.is_failure(status)
    }

    /// Move to `next` and notify matching listeners.
    ///
    /// Returns `None` when the executable already failed; failure statuses are
    /// absorbing and the request is logged and dropped.
    pub fn set_status(&self, next: Status) -> Option<StatusChange> {
        let old = self.status.get();
        if self.is_failure(old) {
            TransitionRejected {
                owner_id: &self.owner_id,
                current: old,
                requested: next,
            }
            .log();
            return None;
        }

        self.status.set(next);
        let change = StatusChange { old, new: next };

        let snapshot: Vec<Rc<StatusListener>> = self
            .listeners
            .borrow()
            .iter()
            .filter(|listener| self.matches(listener.filter, next))
            .cloned()
            .collect();

        StatusChanged {
            owner_id: &self.owner_id,
            old,
            new: next,
            listener_count: snapshot.len(),
        }
        .log();

        for listener in &snapshot {
            if listener.removed.get() {
                continue;
            }
            if listener.once {
                listener.removed.set(true);
            }
            let callback = listener.callback.clone();
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| callback(&change))) {
                let message = panic_message(payload.as_ref());
                ListenerPanicked {
                    owner_id: &self.owner_id,
                    kind: "status",
                    message: &message,
                }
                .log();
            }
        }

        if snapshot.iter().any(|listener| listener.removed.get()) {
            self.listeners
                .borrow_mut()
                .retain(|listener| !listener.removed.get());
        }

        Some(change)
    }

    fn matches(&self, filter: StatusFilter, status: Status) -> bool {
        match filter {
            StatusFilter::Any => true,
            StatusFilter::Only(wanted) => wanted == status,
            StatusFilter::Settled => self.is_settled(status),
        }
    }

    pub fn add_listener(
        &self,
        filter: StatusFilter,
        once: bool,
        callback: StatusCallback,
    ) -> ListenerId {
        let id = self.next_listener_id.get();
        self.next_listener_id.set(id + 1);
        self.listeners.borrow_mut().push(Rc::new(StatusListener {
            id,
            filter,
            once,
            removed: Cell::new(false),
            callback,
        }));
        id
    }

    /// Returns false when no listener has this id.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let Some(position) = listeners.iter().position(|listener| listener.id == id) else {
            return false;
        };
        let listener = listeners.remove(position);
        listener.removed.set(true);
        true
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Resolves with the ready status or the failure status, whichever comes
    /// first. Resolves immediately when already settled.
    pub fn when_settled(&self) -> impl Future<Output = Result<Status, Status>> + 'static {
        let status = self.status.get();
        let settled = if status == self.ready_status {
            Some(Ok(status))
        } else if self.is_failure(status) {
            Some(Err(status))
        } else {
            None
        };
        let pending = match settled {
            Some(_) => None,
            None => Some(self.subscribe_settled()),
        };
        async move {
            match (settled, pending) {
                (Some(outcome), _) => outcome,
                (None, Some(receiver)) => receiver.await.unwrap_or(Err(Status::Null)),
                (None, None) => Err(Status::Null),
            }
        }
    }

    /// Like [`when_settled`](Self::when_settled) but ignores the current
    /// status and waits for the next settling transition.
    pub fn next_settled(&self) -> impl Future<Output = Result<Status, Status>> + 'static {
        let receiver = self.subscribe_settled();
        async move { receiver.await.unwrap_or(Err(Status::Null)) }
    }

    fn subscribe_settled(&self) -> oneshot::Receiver<Result<Status, Status>> {
        let (sender, receiver) = oneshot::channel();
        let sender = RefCell::new(Some(sender));
        let ready_status = self.ready_status;
        self.add_listener(
            StatusFilter::Settled,
            true,
            Rc::new(move |change: &StatusChange| {
                if let Some(sender) = sender.borrow_mut().take() {
                    let outcome = if change.new == ready_status {
                        Ok(change.new)
                    } else {
                        Err(change.new)
                    };
                    let _ = sender.send(outcome);
                }
            }),
        );
        receiver
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
