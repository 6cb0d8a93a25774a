// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised synchronously by the object registry.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A different object already holds this id.
    #[error("an object is already registered under id '{id}'")]
    DuplicateId { id: String },
}
