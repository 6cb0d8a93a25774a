// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod runtime;
mod validation;


pub use loader::{
    load_and_validate_config, load_config, AttachConfig, ChainConfig, EngineConfig,
    ParameterConfig, SourceConfig, SourceKind, SourceReference, UpdaterConfig,
};
pub use runtime::{Runtime, WiringBuilder};
pub use validation::validate_wiring;
