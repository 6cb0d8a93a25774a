// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for consistent, human-readable
//! output and [`StructuredLog`] to attach the same data as tracing fields.
//!
//! # Organization
//!
//! * `executable` - status transitions and listener isolation
//! * `source` - data source change notification and model updaters
//! * `registry` - object registration and waiters
//! * `chain` - chain orchestrator lifecycle
//! * `processor` - processor invocations inside a chain step
//! * `validation` - wiring validation warnings and errors
//!
//! # Usage Pattern
//!
//! ```rust
//! use chainwood::observability::messages::StructuredLog;
//! use chainwood::observability::messages::chain::ChainTransformed;
//!
//! let msg = ChainTransformed {
//!     chain_id: "report",
//!     step_count: 3,
//!     duration: std::time::Duration::from_millis(4),
//! };
//!
//! msg.log();
//! let _span = msg.span("report").entered();
//! ```

use tracing::Span;

pub mod chain;
pub mod executable;
pub mod processor;
pub mod registry;
pub mod source;
pub mod validation;

/// A log message that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a tracing event.
    fn log(&self);

    /// Open a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
