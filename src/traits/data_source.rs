// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::rc::Rc;

use serde_json::Value;

use crate::engine::chain::ChainOrchestrator;
use crate::engine::{ChangeCallback, DataSourceCore, Document, ListenerId, ModelUpdaters};
use crate::errors::{ChainError, DocumentError};
use crate::traits::Executable;

/// An executable that publishes a document and tracks uncommitted writes.
///
/// Every method has a default that forwards to [`DataSourceCore`]. Kinds
/// override `fire` when firing has extra meaning for them (re-running auto
/// model updaters).
pub trait DataSource: Executable {
    fn core(&self) -> &DataSourceCore;

    fn name(&self) -> &str {
        self.core().name()
    }

    fn data(&self) -> Option<Document> {
        self.core().data()
    }

    fn is_dirty(&self) -> bool {
        self.core().is_dirty()
    }

    fn set_data(&self, document: Document, fire: bool) {
        self.core().set_data(document);
        if fire {
            self.fire();
        }
    }

    fn write(&self, pointer: &str, value: Value, fire: bool) -> Result<(), DocumentError> {
        self.core().write(pointer, value)?;
        if fire {
            self.fire();
        }
        Ok(())
    }

    fn remove(&self, pointer: &str, fire: bool) -> Result<Option<Value>, DocumentError> {
        let removed = self.core().remove(pointer)?;
        if fire {
            self.fire();
        }
        Ok(removed)
    }

    fn fire(&self) {
        self.core().fire();
    }

    /// With a `tracking_key` (a JSON Pointer) the callback only runs when the
    /// watched sub-tree changed since the previous notification.
    fn add_change_listener(
        &self,
        callback: ChangeCallback,
        tracking_key: Option<&str>,
        once: bool,
    ) -> ListenerId {
        self.core().add_change_listener(callback, tracking_key, once)
    }

    fn remove_change_listener(&self, id: ListenerId) -> bool {
        self.core().remove_change_listener(id)
    }

    fn remove_change_listener_callback(&self, callback: &ChangeCallback) -> bool {
        self.core().remove_change_listener_callback(callback)
    }
}

/// A data source that runs model updaters before it reports ready.
pub trait UpdatableSource: DataSource {
    fn updaters(&self) -> &ModelUpdaters;

    /// `auto_update = false` makes the updater run only on `execute()`.
    fn add_updater(
        &self,
        updater: Rc<ChainOrchestrator>,
        auto_update: bool,
    ) -> Result<(), ChainError> {
        self.updaters().add(updater, auto_update)
    }

    /// Hold the source in `Loaded` until one more updater has been added.
    fn announce_updater(&self) {
        self.updaters().announce();
    }
}
