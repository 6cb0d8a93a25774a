// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for data sources.
//!
//! This module contains message types for logging events related to:
//! * Change notification (`fire`) and write coalescing
//! * Model updater runs and failures
//! * Loading and saving through a transport

use crate::engine::Status;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// `fire()` was called on a source that is not ready; listeners wait for the
/// next ready transition.
///
/// # Log Level
/// `debug!`
pub struct FireDeferred<'a> {
    pub source_id: &'a str,
    pub status: Status,
}

impl Display for FireDeferred<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "'{}' is {}, change notification deferred until ready",
            self.source_id, self.status
        )
    }
}

impl StructuredLog for FireDeferred<'_> {
    fn log(&self) {
        tracing::debug!(source_id = self.source_id, status = %self.status, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("fire", span_name = name, source_id = self.source_id)
    }
}

/// Change listeners were notified.
///
/// # Log Level
/// `debug!`
pub struct ChangeListenersNotified<'a> {
    pub source_id: &'a str,
    pub notified: usize,
    pub caused_by_ready_status: bool,
}

impl Display for ChangeListenersNotified<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "'{}' notified {} change listeners (caused_by_ready_status={})",
            self.source_id, self.notified, self.caused_by_ready_status
        )
    }
}

impl StructuredLog for ChangeListenersNotified<'_> {
    fn log(&self) {
        tracing::debug!(
            source_id = self.source_id,
            notified = self.notified,
            caused_by_ready_status = self.caused_by_ready_status,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "change_notification",
            span_name = name,
            source_id = self.source_id,
            notified = self.notified,
        )
    }
}

/// Model updaters finished and their data was adopted.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use chainwood::observability::messages::source::ModelUpdatersApplied;
///
/// let msg = ModelUpdatersApplied {
///     source_id: "orders",
///     applied: 2,
///     caused_by_execute: true,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ModelUpdatersApplied<'a> {
    pub source_id: &'a str,
    pub applied: usize,
    pub caused_by_execute: bool,
}

impl Display for ModelUpdatersApplied<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "'{}' applied {} model updaters (caused_by_execute={})",
            self.source_id, self.applied, self.caused_by_execute
        )
    }
}

impl StructuredLog for ModelUpdatersApplied<'_> {
    fn log(&self) {
        tracing::info!(
            source_id = self.source_id,
            applied = self.applied,
            caused_by_execute = self.caused_by_execute,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "model_updaters",
            span_name = name,
            source_id = self.source_id,
            caused_by_execute = self.caused_by_execute,
        )
    }
}

/// A model updater ended in a failure status.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ModelUpdaterFailed<'a> {
    pub source_id: &'a str,
    pub updater_id: &'a str,
    pub status: Status,
}

impl Display for ModelUpdaterFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Model updater '{}' of '{}' failed with {}",
            self.updater_id, self.source_id, self.status
        )
    }
}

impl StructuredLog for ModelUpdaterFailed<'_> {
    fn log(&self) {
        tracing::error!(
            source_id = self.source_id,
            updater_id = self.updater_id,
            status = %self.status,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "model_updaters",
            span_name = name,
            source_id = self.source_id,
            updater_id = self.updater_id,
        )
    }
}

/// A transport load or save failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct TransportFailed<'a> {
    pub source_id: &'a str,
    pub operation: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for TransportFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "'{}' {} failed: {}",
            self.source_id, self.operation, self.error
        )
    }
}

impl StructuredLog for TransportFailed<'_> {
    fn log(&self) {
        tracing::error!(
            source_id = self.source_id,
            operation = self.operation,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "transport",
            span_name = name,
            source_id = self.source_id,
            operation = self.operation,
        )
    }
}

/// A transport load or save completed.
///
/// # Log Level
/// `info!`
pub struct TransportCompleted<'a> {
    pub source_id: &'a str,
    pub operation: &'a str,
    pub location: &'a str,
}

impl Display for TransportCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "'{}' {} '{}' completed",
            self.source_id, self.operation, self.location
        )
    }
}

impl StructuredLog for TransportCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            source_id = self.source_id,
            operation = self.operation,
            location = self.location,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "transport",
            span_name = name,
            source_id = self.source_id,
            location = self.location,
        )
    }
}
