// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Every log line the engine emits is produced by a message struct from
//! [`messages`]. Message types implement `Display` for the human readable text
//! and [`messages::StructuredLog`] to emit it with structured fields at the
//! level that fits the event.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::executable` - status transitions and listener failures
//! * `messages::source` - change notification, model updaters and transports
//! * `messages::registry` - registration and deferred waiters
//! * `messages::chain` - chain loading and transformation
//! * `messages::processor` - individual processor invocations
//! * `messages::validation` - wiring validation
//!
//! # Usage
//!
//! ```rust
//! use chainwood::observability::messages::StructuredLog;
//! use chainwood::observability::messages::registry::ObjectRegistered;
//!
//! let msg = ObjectRegistered {
//!     object_id: "greeting",
//!     released_waiters: 2,
//! };
//!
//! msg.log();
//! ```

pub mod messages;

use tracing_subscriber::EnvFilter;

/// Install a global `fmt` subscriber.
///
/// `RUST_LOG` wins over `default_filter` when set. Calling this more than once
/// is harmless; later calls leave the first subscriber in place.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
