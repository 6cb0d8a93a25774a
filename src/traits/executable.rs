// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::{ExecutableState, ListenerId, Status, StatusCallback, StatusFilter};
use crate::observability::messages::executable::ExecuteSkipped;
use crate::observability::messages::StructuredLog;

/// Anything with a status lifecycle that can be driven by `execute()`.
///
/// Kinds supply `execute_impl`, which advances their private state machine by
/// one logical step, and route `set_status` through whatever bookkeeping they
/// keep next to the status (dirty tracking for data sources).
pub trait Executable {
    fn id(&self) -> &str;

    fn state(&self) -> &ExecutableState;

    /// Advance one logical step. Only called when not ready or when forced.
    fn execute_impl(&self, force: bool);

    fn set_status(&self, next: Status);

    /// No-op when ready and not forced.
    fn execute(&self, force: bool) {
        let state = self.state();
        if state.is_ready() && !force {
            ExecuteSkipped {
                owner_id: self.id(),
                status: state.status(),
            }
            .log();
            return;
        }
        self.execute_impl(force);
    }

    fn status(&self) -> Status {
        self.state().status()
    }

    fn is_ready(&self) -> bool {
        self.state().is_ready()
    }

    fn has_failed(&self) -> bool {
        self.state().has_failed()
    }

    fn ready_status(&self) -> Status {
        self.state().ready_status()
    }

    fn failed_statuses(&self) -> &'static [Status] {
        self.state().failed_statuses()
    }

    fn add_status_listener(
        &self,
        filter: StatusFilter,
        once: bool,
        callback: StatusCallback,
    ) -> ListenerId {
        self.state().add_listener(filter, once, callback)
    }

    fn remove_status_listener(&self, id: ListenerId) -> bool {
        self.state().remove_listener(id)
    }
}
