// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors for chain construction, parsing and step execution.
//!
//! `MissingDependency` is the only variant that surfaces as a returned error from
//! construction; everything that happens after `execute()` is converted into a
//! terminal status on the orchestrator and logged.

use thiserror::Error;

use crate::engine::Status;
use crate::errors::ProcessorError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// A required piece of the chain is absent: no chain definition, no input,
    /// a referenced source that is not registered or a rule nothing resolves.
    #[error("'{owner}' is missing a required dependency: {what}")]
    MissingDependency { owner: String, what: String },

    /// The chain definition exists but does not have the expected shape.
    #[error("chain definition for '{owner}' is invalid: {reason}")]
    InvalidDefinition { owner: String, reason: String },

    /// Building a processor from a ready step model failed.
    #[error("could not build a processor for step '{step}': {reason}")]
    ProcessorBuild { step: String, reason: String },

    #[error(transparent)]
    Processor(#[from] ProcessorError),

    /// A nested chain produced by a meta-transformation ended in a failure status.
    #[error("nested chain of '{owner}' ended in status {status}")]
    NestedChainFailed { owner: String, status: Status },

    /// A model updater must take the source it updates as its primary input.
    #[error("updater '{updater}' does not use '{owner}' as its input")]
    UpdaterInputMismatch { owner: String, updater: String },
}
