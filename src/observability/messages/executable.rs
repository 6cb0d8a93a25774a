// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for executable status transitions.
//!
//! This module contains message types for logging events related to:
//! * Status transitions and the listeners they notify
//! * Transitions rejected because the executable already failed
//! * Listener panics caught at the notification site

use crate::engine::Status;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// An executable moved from one status to another.
///
/// # Log Level
/// `debug!` - High volume, one per transition
pub struct StatusChanged<'a> {
    pub owner_id: &'a str,
    pub old: Status,
    pub new: Status,
    pub listener_count: usize,
}

impl Display for StatusChanged<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "'{}' status {} -> {} ({} listeners)",
            self.owner_id, self.old, self.new, self.listener_count
        )
    }
}

impl StructuredLog for StatusChanged<'_> {
    fn log(&self) {
        tracing::debug!(
            owner_id = self.owner_id,
            old = %self.old,
            new = %self.new,
            listener_count = self.listener_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "status_change",
            span_name = name,
            owner_id = self.owner_id,
            old = %self.old,
            new = %self.new,
        )
    }
}

/// A transition was requested on an executable that already failed.
///
/// # Log Level
/// `warn!` - Failure statuses are absorbing, the request is dropped
///
/// # Example
/// ```
/// use chainwood::engine::Status;
/// use chainwood::observability::messages::executable::TransitionRejected;
///
/// let msg = TransitionRejected {
///     owner_id: "report",
///     current: Status::TransformFailed,
///     requested: Status::Transformed,
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct TransitionRejected<'a> {
    pub owner_id: &'a str,
    pub current: Status,
    pub requested: Status,
}

impl Display for TransitionRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "'{}' ignored transition to {}: already failed with {}",
            self.owner_id, self.requested, self.current
        )
    }
}

impl StructuredLog for TransitionRejected<'_> {
    fn log(&self) {
        tracing::warn!(
            owner_id = self.owner_id,
            current = %self.current,
            requested = %self.requested,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::WARN,
            "span_name",
            name = name,
            owner_id = self.owner_id,
            current = %self.current,
        )
    }
}

/// A status or change listener panicked; the remaining listeners still ran.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ListenerPanicked<'a> {
    pub owner_id: &'a str,
    pub kind: &'a str,
    pub message: &'a str,
}

impl Display for ListenerPanicked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} listener on '{}' panicked: {}",
            self.kind, self.owner_id, self.message
        )
    }
}

impl StructuredLog for ListenerPanicked<'_> {
    fn log(&self) {
        tracing::error!(
            owner_id = self.owner_id,
            kind = self.kind,
            panic_message = self.message,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "listener_panicked",
            span_name = name,
            owner_id = self.owner_id,
            kind = self.kind,
        )
    }
}

/// `execute()` was called on a ready executable without forcing.
///
/// # Log Level
/// `trace!`
pub struct ExecuteSkipped<'a> {
    pub owner_id: &'a str,
    pub status: Status,
}

impl Display for ExecuteSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "'{}' already {}, execute skipped", self.owner_id, self.status)
    }
}

impl StructuredLog for ExecuteSkipped<'_> {
    fn log(&self) {
        tracing::trace!(owner_id = self.owner_id, status = %self.status, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!("execute_skipped", span_name = name, owner_id = self.owner_id)
    }
}
