// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors reported by processors while transforming a document.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessorError {
    /// The processor's model did not contain a usable definition.
    #[error("processor '{processor}' has an invalid model: {reason}")]
    InvalidModel { processor: String, reason: String },

    /// The input document cannot be handled by this processor.
    #[error("processor '{processor}' rejected its input: {reason}")]
    InvalidInput { processor: String, reason: String },

    #[error("processor '{processor}' failed: {message}")]
    Failed { processor: String, message: String },
}
