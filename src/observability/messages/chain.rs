// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for chain orchestrator lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Chain definition loading and parsing
//! * Step model loading and processor construction
//! * Transformation runs (start, completion, failure)
//! * Nested chains produced by meta-transformations

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// The chain definition could not be loaded or parsed.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use chainwood::observability::messages::chain::ChainLoadFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "no phases");
/// let msg = ChainLoadFailed {
///     chain_id: "report",
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct ChainLoadFailed<'a> {
    pub chain_id: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ChainLoadFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Chain '{}' failed to load: {}", self.chain_id, self.error)
    }
}

impl StructuredLog for ChainLoadFailed<'_> {
    fn log(&self) {
        tracing::error!(chain_id = self.chain_id, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("chain_load", span_name = name, chain_id = self.chain_id)
    }
}

/// A step model failed or its processor could not be built.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct StylesheetLoadFailed<'a> {
    pub chain_id: &'a str,
    pub step: &'a str,
    pub reason: &'a str,
}

impl Display for StylesheetLoadFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Chain '{}' could not prepare step '{}': {}",
            self.chain_id, self.step, self.reason
        )
    }
}

impl StructuredLog for StylesheetLoadFailed<'_> {
    fn log(&self) {
        tracing::error!(
            chain_id = self.chain_id,
            step = self.step,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "chain_models",
            span_name = name,
            chain_id = self.chain_id,
            step = self.step,
        )
    }
}

/// Chain loaded and every step processor is built.
///
/// # Log Level
/// `debug!`
pub struct ChainPrepared<'a> {
    pub chain_id: &'a str,
    pub phase_count: usize,
    pub step_count: usize,
}

impl Display for ChainPrepared<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Chain '{}' prepared: {} phases, {} steps",
            self.chain_id, self.phase_count, self.step_count
        )
    }
}

impl StructuredLog for ChainPrepared<'_> {
    fn log(&self) {
        tracing::debug!(
            chain_id = self.chain_id,
            phase_count = self.phase_count,
            step_count = self.step_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("chain_prepared", span_name = name, chain_id = self.chain_id)
    }
}

/// A transformation run completed and its result was published.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ChainTransformed<'a> {
    pub chain_id: &'a str,
    pub step_count: usize,
    pub duration: std::time::Duration,
}

impl Display for ChainTransformed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Chain '{}' transformed through {} steps in {:?}",
            self.chain_id, self.step_count, self.duration
        )
    }
}

impl StructuredLog for ChainTransformed<'_> {
    fn log(&self) {
        tracing::info!(
            chain_id = self.chain_id,
            step_count = self.step_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "chain_transform",
            span_name = name,
            chain_id = self.chain_id,
            step_count = self.step_count,
        )
    }
}

/// A transformation run stopped; nothing was attached.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ChainTransformFailed<'a> {
    pub chain_id: &'a str,
    pub step: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ChainTransformFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Chain '{}' failed at step '{}': {}",
            self.chain_id, self.step, self.error
        )
    }
}

impl StructuredLog for ChainTransformFailed<'_> {
    fn log(&self) {
        tracing::error!(
            chain_id = self.chain_id,
            step = self.step,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "chain_transform",
            span_name = name,
            chain_id = self.chain_id,
            step = self.step,
        )
    }
}

/// A step returned a nested chain that now runs over the same input.
///
/// # Log Level
/// `debug!`
pub struct NestedChainStarted<'a> {
    pub chain_id: &'a str,
    pub child_id: &'a str,
}

impl Display for NestedChainStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Chain '{}' started nested chain '{}'",
            self.chain_id, self.child_id
        )
    }
}

impl StructuredLog for NestedChainStarted<'_> {
    fn log(&self) {
        tracing::debug!(chain_id = self.chain_id, child_id = self.child_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "nested_chain",
            span_name = name,
            chain_id = self.chain_id,
            child_id = self.child_id,
        )
    }
}
