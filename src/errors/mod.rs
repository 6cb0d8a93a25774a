// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod chain;
mod config;
mod document;
mod processor;
mod registry;
mod runtime;
mod transport;

pub use chain::ChainError;
pub use config::{ConfigError, ValidationError};
pub use document::DocumentError;
pub use processor::ProcessorError;
pub use registry::RegistryError;
pub use runtime::RuntimeError;
pub use transport::TransportError;

/// Umbrella error for callers that drive the engine end to end (wiring, CLI).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
