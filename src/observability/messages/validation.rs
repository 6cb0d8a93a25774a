// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for wiring validation warnings and errors.
//!
//! This module contains message types for logging events related to:
//! * Source reference validation
//! * Cyclic dependency detection
//! * Duplicate source id detection

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Cyclic dependency detected between declared sources.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use chainwood::observability::messages::validation::CyclicDependencyDetected;
///
/// let cycle = vec!["a", "b", "a"];
/// let msg = CyclicDependencyDetected {
///     cycle: &cycle,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct CyclicDependencyDetected<'a> {
    pub cycle: &'a [&'a str],
}

impl Display for CyclicDependencyDetected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Cyclic dependency detected: {}", self.cycle.join(" -> "))
    }
}

impl StructuredLog for CyclicDependencyDetected<'_> {
    fn log(&self) {
        tracing::error!(
            cycle = self.cycle.join(" -> "),
            cycle_length = self.cycle.len(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            cycle = self.cycle.join(" -> "),
            cycle_length = self.cycle.len(),
        )
    }
}

/// A source references an id nothing declares.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct UnresolvedReference<'a> {
    pub source_id: &'a str,
    pub missing_reference: &'a str,
}

impl Display for UnresolvedReference<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Source '{}' references missing source '{}'",
            self.source_id, self.missing_reference
        )
    }
}

impl StructuredLog for UnresolvedReference<'_> {
    fn log(&self) {
        tracing::error!(
            source_id = self.source_id,
            missing_reference = self.missing_reference,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            source_id = self.source_id,
            missing_reference = self.missing_reference,
        )
    }
}

/// Configuration validation started.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ValidationStarted {
    pub source_count: usize,
}

impl Display for ValidationStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting wiring validation for {} sources",
            self.source_count
        )
    }
}

impl StructuredLog for ValidationStarted {
    fn log(&self) {
        tracing::info!(source_count = self.source_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::INFO,
            "span_name",
            name = name,
            source_count = self.source_count,
        )
    }
}

/// Configuration validation completed successfully.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ValidationCompleted {
    pub source_count: usize,
}

impl Display for ValidationCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Wiring validation completed successfully for {} sources",
            self.source_count
        )
    }
}

impl StructuredLog for ValidationCompleted {
    fn log(&self) {
        tracing::info!(source_count = self.source_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::INFO,
            "span_name",
            name = name,
            source_count = self.source_count,
        )
    }
}

/// Configuration validation failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use chainwood::observability::messages::validation::ValidationFailed;
///
/// let msg = ValidationFailed {
///     error_count: 3,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct ValidationFailed {
    pub error_count: usize,
}

impl Display for ValidationFailed {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Wiring validation failed with {} errors",
            self.error_count
        )
    }
}

impl StructuredLog for ValidationFailed {
    fn log(&self) {
        tracing::error!(error_count = self.error_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            error_count = self.error_count,
        )
    }
}
