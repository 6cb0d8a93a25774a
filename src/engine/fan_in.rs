// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Waiting for a set of data sources to become ready.
//!
//! A [`FanIn`] attaches a settled-listener to every dependency, executes the
//! idle ones and completes once: either all dependencies are ready, or one of
//! them failed. Completion callbacks always run on a later scheduler turn.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use crate::engine::{scheduler, ListenerId, Status, StatusChange, StatusFilter};
use crate::traits::{DataSource, Executable};

pub type ReadyCallback = Box<dyn FnOnce()>;
pub type FailureCallback = Box<dyn FnOnce(&Rc<dyn DataSource>)>;

pub struct FanIn {
    dependencies: Vec<Rc<dyn DataSource>>,
    listeners: RefCell<Vec<ListenerId>>,
    done: Cell<bool>,
    on_ready: RefCell<Option<ReadyCallback>>,
    on_failure: RefCell<Option<FailureCallback>>,
}

impl FanIn {
    /// Start waiting. Duplicate dependencies (by id) count once.
    pub fn start(
        dependencies: Vec<Rc<dyn DataSource>>,
        on_ready: ReadyCallback,
        on_failure: FailureCallback,
    ) {
        let mut seen = HashSet::new();
        let dependencies: Vec<Rc<dyn DataSource>> = dependencies
            .into_iter()
            .filter(|dependency| seen.insert(dependency.id().to_string()))
            .collect();

        if dependencies.is_empty() {
            scheduler::defer(on_ready);
            return;
        }

        let fan_in = Rc::new(FanIn {
            dependencies,
            listeners: RefCell::new(Vec::new()),
            done: Cell::new(false),
            on_ready: RefCell::new(Some(on_ready)),
            on_failure: RefCell::new(Some(on_failure)),
        });

        for dependency in &fan_in.dependencies {
            let evaluator = fan_in.clone();
            let id = dependency.add_status_listener(
                StatusFilter::Settled,
                false,
                Rc::new(move |_: &StatusChange| evaluator.evaluate()),
            );
            fan_in.listeners.borrow_mut().push(id);
        }

        for dependency in &fan_in.dependencies {
            if fan_in.done.get() {
                break;
            }
            if dependency.status().is_idle() {
                dependency.execute(false);
            }
        }

        fan_in.evaluate();
    }

    fn evaluate(&self) {
        if self.done.get() {
            return;
        }

        if let Some(failed) = self
            .dependencies
            .iter()
            .find(|dependency| dependency.has_failed())
            .cloned()
        {
            self.finish();
            if let Some(on_failure) = self.on_failure.borrow_mut().take() {
                scheduler::defer(move || on_failure(&failed));
            }
            return;
        }

        if self.dependencies.iter().all(|dependency| dependency.is_ready()) {
            self.finish();
            if let Some(on_ready) = self.on_ready.borrow_mut().take() {
                scheduler::defer(on_ready);
            }
        }
    }

    fn finish(&self) {
        self.done.set(true);
        let listeners = std::mem::take(&mut *self.listeners.borrow_mut());
        for (dependency, id) in self.dependencies.iter().zip(listeners) {
            dependency.remove_status_listener(id);
        }
    }
}

/// Move `owner` to `target` once every dependency is ready.
///
/// Idle dependencies are executed. If one fails, `on_failure` runs instead and
/// the owner's status is left alone. With no dependencies the transition is
/// still deferred to a later turn.
pub fn synchronized_status_transition<E>(
    owner: &Rc<E>,
    target: Status,
    dependencies: Vec<Rc<dyn DataSource>>,
    on_failure: Option<FailureCallback>,
) where
    E: Executable + ?Sized + 'static,
{
    let weak = Rc::downgrade(owner);
    FanIn::start(
        dependencies,
        Box::new(move || {
            if let Some(owner) = weak.upgrade() {
                owner.set_status(target);
            }
        }),
        Box::new(move |failed: &Rc<dyn DataSource>| {
            if let Some(on_failure) = on_failure {
                on_failure(failed);
            }
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::StaticSource;
    use crate::test_support::{run_local, settle};
    use serde_json::json;

    #[tokio::test]
    async fn executes_idle_dependencies_and_waits_for_all() {
        run_local(async {
            let a: Rc<dyn DataSource> = StaticSource::new("a", json!(1));
            let b: Rc<dyn DataSource> = StaticSource::new("b", json!(2));
            let fired = Rc::new(Cell::new(0));
            let counter = fired.clone();

            FanIn::start(
                vec![a.clone(), b.clone(), a.clone()],
                Box::new(move || counter.set(counter.get() + 1)),
                Box::new(|_: &Rc<dyn DataSource>| panic!("no dependency fails")),
            );
            assert_eq!(fired.get(), 0);

            settle().await;
            assert!(a.is_ready() && b.is_ready());
            assert_eq!(fired.get(), 1);
            assert_eq!(a.state().listener_count(), 0);
        })
        .await;
    }

    #[tokio::test]
    async fn zero_dependencies_still_defers() {
        run_local(async {
            let fired = Rc::new(Cell::new(false));
            let flag = fired.clone();
            FanIn::start(Vec::new(), Box::new(move || flag.set(true)), Box::new(|_: &Rc<dyn DataSource>| {}));
            assert!(!fired.get());
            settle().await;
            assert!(fired.get());
        })
        .await;
    }

    #[tokio::test]
    async fn a_failed_dependency_aborts() {
        run_local(async {
            let ok: Rc<dyn DataSource> = StaticSource::new("ok", json!(null));
            let broken: Rc<dyn DataSource> = StaticSource::new("broken", json!(null));
            broken.set_status(Status::LoadFailed);

            let failed_id = Rc::new(RefCell::new(None));
            let record = failed_id.clone();
            let ready = Rc::new(Cell::new(false));
            let flag = ready.clone();

            FanIn::start(
                vec![ok.clone(), broken.clone()],
                Box::new(move || flag.set(true)),
                Box::new(move |dependency: &Rc<dyn DataSource>| {
                    *record.borrow_mut() = Some(dependency.id().to_string())
                }),
            );
            settle().await;

            assert!(!ready.get());
            assert_eq!(failed_id.borrow().as_deref(), Some("broken"));
        })
        .await;
    }

    #[tokio::test]
    async fn synchronized_transition_sets_the_target_status() {
        run_local(async {
            let owner = StaticSource::new("owner", json!(null));
            let dependency: Rc<dyn DataSource> = StaticSource::new("dep", json!(null));
            synchronized_status_transition(&owner, Status::Loading, vec![dependency.clone()], None);
            assert_eq!(owner.status(), Status::Initialized);

            settle().await;
            assert_eq!(owner.status(), Status::Loading);
        })
        .await;
    }
}
