// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Model updaters: ordered chains that post-process a source's own data.
//!
//! An updater is a [`ChainOrchestrator`] whose input is the source it
//! updates. After the source loads (or when it is forced or fired again)
//! the updaters run one after another; each adopts the source's current
//! data as input and its result becomes the source's new data.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::engine::chain::ChainOrchestrator;
use crate::engine::{scheduler, Status};
use crate::errors::ChainError;
use crate::observability::messages::source::{ModelUpdaterFailed, ModelUpdatersApplied};
use crate::observability::messages::StructuredLog;
use crate::traits::{DataSource, Executable, UpdatableSource};

struct UpdaterEntry {
    updater: Rc<ChainOrchestrator>,
    auto_update: bool,
}

pub struct ModelUpdaters {
    owner_id: String,
    entries: RefCell<Vec<UpdaterEntry>>,
    announced: Cell<usize>,
    on_all_added: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl ModelUpdaters {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            entries: RefCell::new(Vec::new()),
            announced: Cell::new(0),
            on_all_added: RefCell::new(None),
        }
    }

    /// Append an updater. Its input must be the owning source.
    pub fn add(&self, updater: Rc<ChainOrchestrator>, auto_update: bool) -> Result<(), ChainError> {
        if updater.input_id() != Some(self.owner_id.as_str()) {
            return Err(ChainError::UpdaterInputMismatch {
                owner: self.owner_id.clone(),
                updater: updater.id().to_string(),
            });
        }
        updater.mark_as_updater_of(&self.owner_id);
        self.entries.borrow_mut().push(UpdaterEntry {
            updater,
            auto_update,
        });

        let pending = self.announced.get();
        if pending > 0 {
            self.announced.set(pending - 1);
            if pending == 1 {
                if let Some(continuation) = self.on_all_added.borrow_mut().take() {
                    scheduler::defer(continuation);
                }
            }
        }
        Ok(())
    }

    pub fn announce(&self) {
        self.announced.set(self.announced.get() + 1);
    }

    pub fn pending_announcements(&self) -> usize {
        self.announced.get()
    }

    /// Park `continuation` until every announced updater has been added.
    pub fn hold(&self, continuation: Box<dyn FnOnce()>) {
        *self.on_all_added.borrow_mut() = Some(continuation);
    }

    pub fn has_auto_updaters(&self) -> bool {
        self.entries.borrow().iter().any(|entry| entry.auto_update)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Updaters to run: all of them for `execute()`, only the automatic
    /// ones otherwise.
    fn selected(&self, caused_by_execute: bool) -> Vec<Rc<ChainOrchestrator>> {
        self.entries
            .borrow()
            .iter()
            .filter(|entry| caused_by_execute || entry.auto_update)
            .map(|entry| entry.updater.clone())
            .collect()
    }
}

/// Run the owner's updaters and move it to its ready status afterwards.
///
/// While announced updaters are still missing the owner parks in `Loaded`
/// and the refresh resumes once the last one is added. Without updaters to
/// run the owner becomes ready directly. A failing updater moves the owner
/// to `LoadFailed`.
pub fn refresh_model_updaters<S>(owner: &Rc<S>, caused_by_execute: bool)
where
    S: UpdatableSource + ?Sized + 'static,
{
    let updaters = owner.updaters();
    if updaters.pending_announcements() > 0 {
        owner.set_status(Status::Loaded);
        let weak = Rc::downgrade(owner);
        updaters.hold(Box::new(move || {
            if let Some(owner) = weak.upgrade() {
                refresh_model_updaters(&owner, caused_by_execute);
            }
        }));
        return;
    }

    let selected = updaters.selected(caused_by_execute);
    if selected.is_empty() {
        owner.set_status(owner.ready_status());
        return;
    }

    owner.set_status(if caused_by_execute {
        Status::RefreshingModelUpdatersCausedByExecute
    } else {
        Status::RefreshingModelUpdaters
    });

    let owner = owner.clone();
    scheduler::spawn(async move {
        for updater in &selected {
            let outcome = if updater.has_failed() {
                Err(updater.status())
            } else {
                let settled = updater.state().next_settled();
                updater.execute(true);
                settled.await
            };

            match outcome {
                Ok(_) => {
                    if let Some(document) = updater.data() {
                        owner.core().replace_data(document);
                    }
                }
                Err(status) => {
                    ModelUpdaterFailed {
                        source_id: owner.id(),
                        updater_id: updater.id(),
                        status,
                    }
                    .log();
                    owner.set_status(Status::LoadFailed);
                    return;
                }
            }
        }

        ModelUpdatersApplied {
            source_id: owner.id(),
            applied: selected.len(),
            caused_by_execute,
        }
        .log();
        owner.set_status(owner.ready_status());
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::chain::{ChainDefinition, ChainOrchestratorBuilder};
    use crate::engine::EngineContext;
    use crate::backends::stub::StubProcessor;
    use crate::sources::StaticSource;
    use serde_json::json;

    fn updater(id: &str, input: Rc<dyn DataSource>) -> Rc<ChainOrchestrator> {
        ChainOrchestratorBuilder::new(id, EngineContext::with_builtins())
            .chain(ChainDefinition::Processor(Rc::new(StubProcessor::named("stub"))))
            .input(input)
            .build()
            .unwrap()
    }

    #[test]
    fn updaters_must_take_the_owner_as_input() {
        let owner: Rc<dyn DataSource> = StaticSource::new("owner", json!({}));
        let other: Rc<dyn DataSource> = StaticSource::new("other", json!({}));
        let updaters = ModelUpdaters::new("owner");

        let result = updaters.add(updater("u1", other), true);
        assert!(matches!(result, Err(ChainError::UpdaterInputMismatch { .. })));
        assert!(updaters.is_empty());

        let good = updater("u2", owner);
        updaters.add(good.clone(), false).unwrap();
        assert_eq!(updaters.len(), 1);
        assert_eq!(good.updater_of().as_deref(), Some("owner"));
        assert!(!updaters.has_auto_updaters());
    }

    #[test]
    fn selection_depends_on_the_cause() {
        let owner: Rc<dyn DataSource> = StaticSource::new("owner", json!({}));
        let updaters = ModelUpdaters::new("owner");
        updaters.add(updater("auto", owner.clone()), true).unwrap();
        updaters.add(updater("manual", owner), false).unwrap();

        let ids = |selected: Vec<Rc<ChainOrchestrator>>| {
            selected
                .iter()
                .map(|u| u.id().to_string())
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(updaters.selected(true)), vec!["auto", "manual"]);
        assert_eq!(ids(updaters.selected(false)), vec!["auto"]);
    }

    #[test]
    fn announcements_count_down_as_updaters_arrive() {
        let owner: Rc<dyn DataSource> = StaticSource::new("owner", json!({}));
        let updaters = ModelUpdaters::new("owner");
        updaters.announce();
        updaters.announce();
        assert_eq!(updaters.pending_announcements(), 2);

        updaters.add(updater("a", owner.clone()), true).unwrap();
        assert_eq!(updaters.pending_announcements(), 1);
        updaters.add(updater("b", owner), true).unwrap();
        assert_eq!(updaters.pending_announcements(), 0);
    }
}
