// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for processor invocations.
//!
//! This module contains message types for logging events related to:
//! * Processor construction from step models
//! * Processor execution lifecycle (start, completion, failure)

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Processor execution started.
///
/// # Log Level
/// `debug!`
///
/// # Example
/// ```
/// use chainwood::observability::messages::processor::ProcessorExecutionStarted;
///
/// let msg = ProcessorExecutionStarted {
///     processor: "change_text_case",
///     step: "shout",
///     parameter_count: 2,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct ProcessorExecutionStarted<'a> {
    pub processor: &'a str,
    pub step: &'a str,
    pub parameter_count: usize,
}

impl Display for ProcessorExecutionStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Processor '{}' started for step '{}' with {} parameters",
            self.processor, self.step, self.parameter_count
        )
    }
}

impl StructuredLog for ProcessorExecutionStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            processor = self.processor,
            step = self.step,
            parameter_count = self.parameter_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "processor",
            span_name = name,
            processor = self.processor,
            step = self.step,
        )
    }
}

/// Processor execution completed.
///
/// # Log Level
/// `debug!`
pub struct ProcessorExecutionCompleted<'a> {
    pub processor: &'a str,
    pub step: &'a str,
    pub outcome: &'a str,
    pub duration: std::time::Duration,
}

impl Display for ProcessorExecutionCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Processor '{}' completed step '{}' with {} output in {:?}",
            self.processor, self.step, self.outcome, self.duration
        )
    }
}

impl StructuredLog for ProcessorExecutionCompleted<'_> {
    fn log(&self) {
        tracing::debug!(
            processor = self.processor,
            step = self.step,
            outcome = self.outcome,
            duration_us = self.duration.as_micros() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "processor_completed",
            span_name = name,
            processor = self.processor,
            duration = ?self.duration,
        )
    }
}

/// Processor construction from a ready step model failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use chainwood::observability::messages::processor::ProcessorInstantiationFailed;
///
/// let msg = ProcessorInstantiationFailed {
///     step: "shout",
///     rule: "change_text_case",
///     reason: "unknown case 'sideways'",
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct ProcessorInstantiationFailed<'a> {
    pub step: &'a str,
    pub rule: &'a str,
    pub reason: &'a str,
}

impl Display for ProcessorInstantiationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to build processor for step '{}' (rule '{}'): {}",
            self.step, self.rule, self.reason
        )
    }
}

impl StructuredLog for ProcessorInstantiationFailed<'_> {
    fn log(&self) {
        tracing::error!(
            step = self.step,
            rule = self.rule,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            step = self.step,
            rule = self.rule,
        )
    }
}
