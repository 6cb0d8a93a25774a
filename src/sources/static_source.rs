// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::rc::{Rc, Weak};

use crate::engine::model_updater::refresh_model_updaters;
use crate::engine::{
    scheduler, DataSourceCore, Document, ExecutableState, ModelUpdaters, SourceOptions, Status,
};
use crate::traits::{DataSource, Executable, UpdatableSource};

const FAILED: &[Status] = &[Status::LoadFailed];

/// In-memory data source.
///
/// `execute()` moves it through `Loading` (and `Loaded` while announced
/// updaters are missing) to `Ready`, applying its model updaters on the way.
pub struct StaticSource {
    me: Weak<StaticSource>,
    core: DataSourceCore,
    updaters: ModelUpdaters,
}

impl StaticSource {
    pub fn new(id: impl Into<String>, data: impl Into<Document>) -> Rc<Self> {
        Self::with_options(id, data, SourceOptions::default())
    }

    pub fn with_options(
        id: impl Into<String>,
        data: impl Into<Document>,
        options: SourceOptions,
    ) -> Rc<Self> {
        let id = id.into();
        let core = DataSourceCore::new(id.clone(), options, Status::Ready, FAILED);
        core.replace_data(data.into());
        Rc::new_cyclic(|me| Self {
            me: me.clone(),
            core,
            updaters: ModelUpdaters::new(id),
        })
    }
}

impl Executable for StaticSource {
    fn id(&self) -> &str {
        self.core.id()
    }

    fn state(&self) -> &ExecutableState {
        self.core.state()
    }

    fn execute_impl(&self, force: bool) {
        let Some(me) = self.me.upgrade() else {
            return;
        };
        let status = self.status();
        if status.is_idle() {
            self.set_status(Status::Loading);
            scheduler::defer(move || refresh_model_updaters(&me, true));
        } else if force && status == Status::Ready {
            refresh_model_updaters(&me, true);
        }
    }

    fn set_status(&self, next: Status) {
        self.core.set_status(next);
    }
}

impl DataSource for StaticSource {
    fn core(&self) -> &DataSourceCore {
        &self.core
    }

    /// On a ready source with automatic updaters a fire re-runs them and
    /// listeners hear about it when the source is ready again.
    fn fire(&self) {
        if self.status() == Status::Ready && self.updaters.has_auto_updaters() {
            if let Some(me) = self.me.upgrade() {
                self.core.clear_dirty();
                refresh_model_updaters(&me, false);
                return;
            }
        }
        self.core.fire();
    }
}

impl UpdatableSource for StaticSource {
    fn updaters(&self) -> &ModelUpdaters {
        &self.updaters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ChangeEvent, StatusChange, StatusFilter};
    use crate::test_support::{run_local, settle};
    use serde_json::json;
    use std::cell::RefCell;

    #[tokio::test]
    async fn execute_loads_asynchronously_then_is_ready() {
        run_local(async {
            let source = StaticSource::new("s", json!({"a": 1}));
            let seen = Rc::new(RefCell::new(Vec::new()));
            let sink = seen.clone();
            source.add_status_listener(
                StatusFilter::Any,
                false,
                Rc::new(move |change: &StatusChange| sink.borrow_mut().push(change.new)),
            );

            source.execute(false);
            assert_eq!(source.status(), Status::Loading);
            settle().await;

            assert!(source.is_ready());
            assert_eq!(*seen.borrow(), vec![Status::Loading, Status::Ready]);
            assert_eq!(source.data().map(|d| d.snapshot()), Some(json!({"a": 1})));
        })
        .await;
    }

    #[tokio::test]
    async fn fire_on_ready_source_notifies_once() {
        run_local(async {
            let source = StaticSource::new("s", json!({}));
            source.execute(false);
            settle().await;

            let events = Rc::new(RefCell::new(Vec::new()));
            let sink = events.clone();
            source.add_change_listener(
                Rc::new(move |event: &ChangeEvent| {
                    sink.borrow_mut().push(event.caused_by_ready_status)
                }),
                None,
                false,
            );

            source.write("/x", json!(1), true).unwrap();
            assert!(!source.is_dirty());
            assert_eq!(*events.borrow(), vec![false]);
        })
        .await;
    }

    #[tokio::test]
    async fn announced_updaters_hold_the_source_in_loaded() {
        run_local(async {
            let source = StaticSource::new("s", json!({}));
            source.announce_updater();
            source.execute(false);
            settle().await;

            assert_eq!(source.status(), Status::Loaded);
            assert!(!source.is_ready());
        })
        .await;
    }
}
