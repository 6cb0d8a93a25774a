// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the object registry.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// An object was registered and zero or more waiters became satisfied.
///
/// # Log Level
/// `debug!`
///
/// # Example
/// ```
/// use chainwood::observability::messages::registry::ObjectRegistered;
///
/// let msg = ObjectRegistered {
///     object_id: "customers",
///     released_waiters: 1,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct ObjectRegistered<'a> {
    pub object_id: &'a str,
    pub released_waiters: usize,
}

impl Display for ObjectRegistered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Registered '{}', released {} waiters",
            self.object_id, self.released_waiters
        )
    }
}

impl StructuredLog for ObjectRegistered<'_> {
    fn log(&self) {
        tracing::debug!(
            object_id = self.object_id,
            released_waiters = self.released_waiters,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "registry",
            span_name = name,
            object_id = self.object_id,
            released_waiters = self.released_waiters,
        )
    }
}

/// A different object already holds the requested id.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct DuplicateRegistration<'a> {
    pub object_id: &'a str,
}

impl Display for DuplicateRegistration<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Refusing to register '{}': the id is held by another object",
            self.object_id
        )
    }
}

impl StructuredLog for DuplicateRegistration<'_> {
    fn log(&self) {
        tracing::error!(object_id = self.object_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("registry", span_name = name, object_id = self.object_id)
    }
}

/// A group of ids is being awaited.
///
/// # Log Level
/// `debug!`
pub struct WaitingForObjects<'a> {
    pub waiter_id: u64,
    pub missing: &'a [String],
}

impl Display for WaitingForObjects<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Waiter {} waiting for {} objects: {}",
            self.waiter_id,
            self.missing.len(),
            self.missing.join(", ")
        )
    }
}

impl StructuredLog for WaitingForObjects<'_> {
    fn log(&self) {
        tracing::debug!(
            waiter_id = self.waiter_id,
            missing = self.missing.join(","),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("registry_wait", span_name = name, waiter_id = self.waiter_id)
    }
}

/// An id was removed from the registry.
///
/// # Log Level
/// `debug!`
pub struct ObjectDeregistered<'a> {
    pub object_id: &'a str,
    pub was_present: bool,
}

impl Display for ObjectDeregistered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.was_present {
            write!(f, "Deregistered '{}'", self.object_id)
        } else {
            write!(f, "Deregister of unknown id '{}' ignored", self.object_id)
        }
    }
}

impl StructuredLog for ObjectDeregistered<'_> {
    fn log(&self) {
        tracing::debug!(
            object_id = self.object_id,
            was_present = self.was_present,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("registry", span_name = name, object_id = self.object_id)
    }
}
