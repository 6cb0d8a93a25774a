// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::Document;

/// How a transformation result is placed into its sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachMode {
    /// Replace everything the sink shows.
    Replace,
    /// Replace only the named top-level regions of the result.
    PatchRegions(Vec<String>),
}

/// Presentation target for a chain orchestrator's result.
pub trait AttachmentSink {
    fn attach(&self, document: &Document, mode: &AttachMode);
}
