// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors from JSON Pointer based reads and writes on a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("invalid JSON pointer '{pointer}': must be empty or start with '/'")]
    InvalidPointer { pointer: String },

    #[error("cannot descend into '{pointer}': the value there is neither an object nor an array")]
    NotAContainer { pointer: String },

    #[error("array index '{token}' is not valid at '{pointer}'")]
    InvalidIndex { pointer: String, token: String },
}
