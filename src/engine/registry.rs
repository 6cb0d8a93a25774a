// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Id-keyed object registry with deferred-registration waiting.
//!
//! Sources can be declared in any order: code that needs a set of ids calls
//! [`ObjectRegistry::with_objects`] and is called back once all of them are
//! registered. [`ObjectRegistry::with_ready_objects`] additionally waits for
//! every object to reach its ready status.
//!
//! The registry is a cheap clonable handle; all clones share one map.
//! Callbacks are never invoked inside `register`; satisfied waiters are
//! deferred to a later scheduler turn after the bookkeeping is done.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use crate::engine::{scheduler, StatusChange, StatusFilter};
use crate::errors::RegistryError;
use crate::observability::messages::registry::{
    DuplicateRegistration, ObjectDeregistered, ObjectRegistered, WaitingForObjects,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{DataSource, Executable};

pub type WaiterId = u64;

struct Waiter {
    remaining: usize,
    callback: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct RegistryInner {
    objects: HashMap<String, Rc<dyn DataSource>>,
    waiters: HashMap<WaiterId, Waiter>,
    interested: HashMap<String, BTreeSet<WaiterId>>,
    next_waiter_id: WaiterId,
}

#[derive(Clone, Default)]
pub struct ObjectRegistry {
    inner: Rc<RefCell<RegistryInner>>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `object` under its id.
    ///
    /// Registering the same object twice is accepted; a different object
    /// under a taken id is a [`RegistryError::DuplicateId`].
    pub fn register(&self, object: Rc<dyn DataSource>) -> Result<(), RegistryError> {
        let id = object.id().to_string();
        let released = {
            let mut inner = self.inner.borrow_mut();
            if let Some(existing) = inner.objects.get(&id) {
                if std::ptr::addr_eq(Rc::as_ptr(existing), Rc::as_ptr(&object)) {
                    return Ok(());
                }
                DuplicateRegistration { object_id: &id }.log();
                return Err(RegistryError::DuplicateId { id });
            }
            inner.objects.insert(id.clone(), object);

            let mut released = Vec::new();
            if let Some(waiter_ids) = inner.interested.remove(&id) {
                for waiter_id in waiter_ids {
                    let satisfied = match inner.waiters.get_mut(&waiter_id) {
                        Some(waiter) => {
                            waiter.remaining -= 1;
                            waiter.remaining == 0
                        }
                        None => false,
                    };
                    if satisfied {
                        if let Some(waiter) = inner.waiters.remove(&waiter_id) {
                            released.push(waiter.callback);
                        }
                    }
                }
            }
            released
        };

        ObjectRegistered {
            object_id: &id,
            released_waiters: released.len(),
        }
        .log();

        for callback in released {
            scheduler::defer(callback);
        }
        Ok(())
    }

    /// Remove the mapping for `id`. Waiters already satisfied are unaffected.
    pub fn deregister(&self, id: &str) -> Option<Rc<dyn DataSource>> {
        let removed = self.inner.borrow_mut().objects.remove(id);
        ObjectDeregistered {
            object_id: id,
            was_present: removed.is_some(),
        }
        .log();
        removed
    }

    pub fn get(&self, id: &str) -> Option<Rc<dyn DataSource>> {
        self.inner.borrow().objects.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.borrow().objects.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pending_waiters(&self) -> usize {
        self.inner.borrow().waiters.len()
    }

    /// Drop every object and every pending waiter.
    pub fn reset(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.objects.clear();
        inner.waiters.clear();
        inner.interested.clear();
    }

    /// Call `callback` on a later turn once every id is registered.
    pub fn with_objects<I, S>(&self, ids: I, callback: impl FnOnce() + 'static)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut inner = self.inner.borrow_mut();
        let missing: Vec<String> = ids
            .into_iter()
            .map(Into::into)
            .collect::<BTreeSet<String>>()
            .into_iter()
            .filter(|id| !inner.objects.contains_key(id))
            .collect();

        if missing.is_empty() {
            drop(inner);
            scheduler::defer(callback);
            return;
        }

        let waiter_id = inner.next_waiter_id;
        inner.next_waiter_id += 1;
        WaitingForObjects {
            waiter_id,
            missing: &missing,
        }
        .log();

        for id in &missing {
            inner
                .interested
                .entry(id.clone())
                .or_default()
                .insert(waiter_id);
        }
        inner.waiters.insert(
            waiter_id,
            Waiter {
                remaining: missing.len(),
                callback: Box::new(callback),
            },
        );
    }

    /// Wait for registration of every id, then for every object to be ready,
    /// and hand the objects to `callback` in the requested order.
    ///
    /// Objects that are not ready are executed (unless `skip_execute`). The
    /// readiness check re-runs from scratch each time the awaited object
    /// becomes ready, because another object may have left its ready status
    /// meanwhile.
    pub fn with_ready_objects<I, S>(
        &self,
        ids: I,
        callback: impl FnOnce(Vec<Rc<dyn DataSource>>) + 'static,
        skip_execute: bool,
    ) where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = BTreeSet::new();
        let ids: Vec<String> = ids
            .into_iter()
            .map(Into::into)
            .filter(|id: &String| seen.insert(id.clone()))
            .collect();
        let registry = self.clone();
        let wait_ids = ids.clone();
        self.with_objects(wait_ids, move || {
            registry.check_ready(ids, Box::new(callback), skip_execute);
        });
    }

    fn check_ready(
        &self,
        ids: Vec<String>,
        callback: Box<dyn FnOnce(Vec<Rc<dyn DataSource>>)>,
        skip_execute: bool,
    ) {
        let objects: Option<Vec<Rc<dyn DataSource>>> = ids.iter().map(|id| self.get(id)).collect();
        let Some(objects) = objects else {
            // Something was deregistered in between; wait for it again.
            let registry = self.clone();
            let wait_ids = ids.clone();
            self.with_objects(wait_ids, move || registry.check_ready(ids, callback, skip_execute));
            return;
        };

        let not_ready: Vec<Rc<dyn DataSource>> = objects
            .iter()
            .filter(|object| !object.is_ready())
            .cloned()
            .collect();

        let Some(first) = not_ready.first().cloned() else {
            callback(objects);
            return;
        };

        if !skip_execute {
            for object in not_ready {
                scheduler::defer(move || object.execute(false));
            }
        }

        let registry = self.clone();
        let pending = RefCell::new(Some((ids, callback)));
        first.add_status_listener(
            StatusFilter::Only(first.ready_status()),
            true,
            Rc::new(move |_: &StatusChange| {
                if let Some((ids, callback)) = pending.borrow_mut().take() {
                    registry.check_ready(ids, callback, skip_execute);
                }
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Status;
    use crate::sources::StaticSource;
    use crate::test_support::{run_local, settle};
    use serde_json::json;
    use std::cell::Cell;

    #[test]
    fn duplicate_ids_are_rejected_but_same_object_is_accepted() {
        let registry = ObjectRegistry::new();
        let first: Rc<dyn DataSource> = StaticSource::new("orders", json!([]));
        let second: Rc<dyn DataSource> = StaticSource::new("orders", json!([]));

        assert!(registry.register(first.clone()).is_ok());
        assert!(registry.register(first.clone()).is_ok());
        assert_eq!(
            registry.register(second),
            Err(RegistryError::DuplicateId {
                id: "orders".to_string()
            })
        );
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn with_objects_fires_once_after_the_last_registration() {
        run_local(async {
            let registry = ObjectRegistry::new();
            let calls = Rc::new(Cell::new(0));
            let counter = calls.clone();
            registry.with_objects(["a", "b", "a"], move || counter.set(counter.get() + 1));

            registry.register(StaticSource::new("a", json!(1))).unwrap();
            settle().await;
            assert_eq!(calls.get(), 0);

            registry.register(StaticSource::new("b", json!(2))).unwrap();
            assert_eq!(calls.get(), 0, "callbacks never run inside register");
            settle().await;
            assert_eq!(calls.get(), 1);
            assert_eq!(registry.pending_waiters(), 0);
        })
        .await;
    }

    #[tokio::test]
    async fn with_objects_defers_even_when_everything_is_present() {
        run_local(async {
            let registry = ObjectRegistry::new();
            registry.register(StaticSource::new("a", json!(1))).unwrap();
            let called = Rc::new(Cell::new(false));
            let flag = called.clone();
            registry.with_objects(["a"], move || flag.set(true));
            assert!(!called.get());
            settle().await;
            assert!(called.get());
        })
        .await;
    }

    #[tokio::test]
    async fn with_ready_objects_executes_and_returns_in_request_order() {
        run_local(async {
            let registry = ObjectRegistry::new();
            let seen = Rc::new(RefCell::new(Vec::new()));
            let sink = seen.clone();
            registry.with_ready_objects(
                ["b", "a"],
                move |objects| {
                    sink.borrow_mut()
                        .extend(objects.iter().map(|object| object.id().to_string()))
                },
                false,
            );

            registry.register(StaticSource::new("a", json!(1))).unwrap();
            registry.register(StaticSource::new("b", json!(2))).unwrap();
            settle().await;

            assert_eq!(*seen.borrow(), vec!["b".to_string(), "a".to_string()]);
        })
        .await;
    }

    #[tokio::test]
    async fn skip_execute_waits_for_someone_else_to_execute() {
        run_local(async {
            let registry = ObjectRegistry::new();
            let source = StaticSource::new("a", json!(1));
            registry.register(source.clone()).unwrap();

            let called = Rc::new(Cell::new(false));
            let flag = called.clone();
            registry.with_ready_objects(["a"], move |_| flag.set(true), true);
            settle().await;
            assert!(!called.get());
            assert_eq!(source.status(), Status::Initialized);

            source.execute(false);
            settle().await;
            assert!(called.get());
        })
        .await;
    }

    #[tokio::test]
    async fn deregister_removes_the_mapping_but_not_waiters() {
        run_local(async {
            let registry = ObjectRegistry::new();
            let calls = Rc::new(Cell::new(0));
            let counter = calls.clone();
            registry.with_objects(["a", "b"], move || counter.set(counter.get() + 1));

            registry.register(StaticSource::new("a", json!(1))).unwrap();
            assert!(registry.deregister("a").is_some());
            assert!(registry.get("a").is_none());
            assert!(!registry.contains("a"));
            assert!(registry.deregister("a").is_none());

            registry.register(StaticSource::new("b", json!(2))).unwrap();
            settle().await;
            assert_eq!(calls.get(), 1);
            assert_eq!(registry.pending_waiters(), 0);
        })
        .await;
    }

    #[tokio::test]
    async fn ready_wait_resumes_after_a_deregistered_object_returns() {
        run_local(async {
            let registry = ObjectRegistry::new();
            registry.register(StaticSource::new("a", json!(1))).unwrap();

            let calls = Rc::new(Cell::new(0));
            let counter = calls.clone();
            registry.with_ready_objects(["a"], move |_| counter.set(counter.get() + 1), false);
            // Gone before the deferred readiness check runs.
            registry.deregister("a");
            settle().await;
            assert_eq!(calls.get(), 0);
            assert_eq!(registry.pending_waiters(), 1);

            let replacement = StaticSource::new("a", json!(2));
            registry.register(replacement.clone()).unwrap();
            settle().await;
            assert_eq!(calls.get(), 1);
            assert!(replacement.is_ready());

            settle().await;
            assert_eq!(calls.get(), 1);
        })
        .await;
    }

    #[tokio::test]
    async fn ready_wait_on_a_deregistered_id_waits_for_registration() {
        run_local(async {
            let registry = ObjectRegistry::new();
            registry.register(StaticSource::new("a", json!(1))).unwrap();
            registry.deregister("a");

            let calls = Rc::new(Cell::new(0));
            let counter = calls.clone();
            registry.with_ready_objects(["a"], move |_| counter.set(counter.get() + 1), false);
            settle().await;
            assert_eq!(calls.get(), 0);

            registry.register(StaticSource::new("a", json!(1))).unwrap();
            settle().await;
            assert_eq!(calls.get(), 1);
        })
        .await;
    }

    #[tokio::test]
    async fn reset_drops_objects_and_waiters() {
        run_local(async {
            let registry = ObjectRegistry::new();
            registry.register(StaticSource::new("a", json!(1))).unwrap();
            registry.with_objects(["missing"], || panic!("reset waiters never run"));
            registry.reset();

            assert!(registry.is_empty());
            assert_eq!(registry.pending_waiters(), 0);
            registry.register(StaticSource::new("missing", json!(1))).unwrap();
            settle().await;
        })
        .await;
    }
}
