// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::engine::chain::ParameterBag;
use crate::engine::Document;
use crate::errors::ProcessorError;
use crate::traits::{Processor, StepOutput};

/// Produces nothing, so the next step sees this step's input.
#[derive(Default)]
pub struct NoopProcessor;

#[async_trait(?Send)]
impl Processor for NoopProcessor {
    async fn transform(
        &self,
        _input: Document,
        _parameters: &ParameterBag,
    ) -> Result<StepOutput, ProcessorError> {
        Ok(StepOutput::Empty)
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
