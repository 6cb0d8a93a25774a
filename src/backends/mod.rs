// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in processors and attachment sinks.
//!
//! # Local Backend
//! In-process processors for the built-in rule kinds (text re-casing,
//! reversal, prefix/suffix, merge patches, selection, parameter echo, no-op
//! and nested chains), registered on a [`RuleResolver`] by
//! [`LocalProcessorFactory::register_builtins`].
//!
//! # Sinks
//! Where a finished transformation is attached: standard output or memory.
//!
//! # Stub Backend (Test-Only)
//! Processors with scripted behaviour for engine tests.
//!
//! # Example
//! ```rust
//! use chainwood::backends::local::LocalProcessorFactory;
//! use chainwood::engine::chain::RuleResolver;
//!
//! let mut resolver = RuleResolver::new();
//! LocalProcessorFactory::register_builtins(&mut resolver);
//! assert!(resolver.mapping_names().contains(&"change_text_case"));
//! ```
//!
//! [`RuleResolver`]: crate::engine::chain::RuleResolver
//! [`LocalProcessorFactory::register_builtins`]: local::LocalProcessorFactory::register_builtins

pub mod local;
pub mod sinks;
#[cfg(test)]
pub mod stub;
