// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod attachment;
pub mod data_source;
pub mod executable;
pub mod processor;

pub use attachment::{AttachMode, AttachmentSink};
pub use data_source::{DataSource, UpdatableSource};
pub use executable::Executable;
pub use processor::{Processor, StepOutput};
