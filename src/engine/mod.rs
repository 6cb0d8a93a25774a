// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The execution engine: status machines, data sources, the object registry,
//! chains and model updaters.

pub mod chain;
pub mod context;
pub mod data_source;
pub mod document;
pub mod executable;
pub mod fan_in;
pub mod model_updater;
pub mod registry;
pub mod scheduler;
pub mod status;

pub use context::{EngineContext, EngineSettings};
pub use data_source::{ChangeCallback, ChangeEvent, DataSourceCore, SourceOptions};
pub use document::Document;
pub use executable::{ExecutableState, ListenerId, StatusCallback};
pub use fan_in::{synchronized_status_transition, FanIn};
pub use model_updater::{refresh_model_updaters, ModelUpdaters};
pub use registry::ObjectRegistry;
pub use status::{Status, StatusChange, StatusFamily, StatusFilter};
