// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::engine::chain::{ChainDefinition, ParameterBag};
use crate::engine::Document;
use crate::errors::ProcessorError;

/// What a single chain step produced.
pub enum StepOutput {
    /// A new document that the next step receives.
    Data(Document),
    /// Nothing; the next step receives the previous output unchanged.
    Empty,
    /// A chain to apply to the same input before continuing.
    NestedChain(ChainDefinition),
}

impl StepOutput {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Data(_) => "data",
            Self::Empty => "empty",
            Self::NestedChain(_) => "nested_chain",
        }
    }
}

/// A transformation engine bound to one step model.
///
/// `transform` completes exactly once per call and may suspend.
#[async_trait(?Send)]
pub trait Processor {
    async fn transform(
        &self,
        input: Document,
        parameters: &ParameterBag,
    ) -> Result<StepOutput, ProcessorError>;

    fn name(&self) -> &'static str;
}
