// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use serde_json::Value;

use crate::engine::chain::{ChainDefinition, ParameterBag};
use crate::engine::Document;
use crate::errors::ProcessorError;
use crate::traits::{Processor, StepOutput};

/// A stub processor: returns a fixed document, or `Empty` without one.
pub struct StubProcessor {
    pub name: &'static str,
    pub output: Option<Value>,
}

impl StubProcessor {
    pub fn named(name: &'static str) -> Self {
        Self { name, output: None }
    }

    pub fn returning(output: Value) -> Self {
        Self {
            name: "stub",
            output: Some(output),
        }
    }
}

#[async_trait(?Send)]
impl Processor for StubProcessor {
    async fn transform(
        &self,
        _input: Document,
        _parameters: &ParameterBag,
    ) -> Result<StepOutput, ProcessorError> {
        Ok(match &self.output {
            Some(value) => StepOutput::Data(Document::new(value.clone())),
            None => StepOutput::Empty,
        })
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Hands its input handle straight back.
pub struct PassThroughProcessor;

#[async_trait(?Send)]
impl Processor for PassThroughProcessor {
    async fn transform(
        &self,
        input: Document,
        _parameters: &ParameterBag,
    ) -> Result<StepOutput, ProcessorError> {
        Ok(StepOutput::Data(input))
    }

    fn name(&self) -> &'static str {
        "pass_through"
    }
}

/// A processor that always fails for testing failure scenarios
pub struct FailingProcessor;

#[async_trait(?Send)]
impl Processor for FailingProcessor {
    async fn transform(
        &self,
        _input: Document,
        _parameters: &ParameterBag,
    ) -> Result<StepOutput, ProcessorError> {
        Err(ProcessorError::Failed {
            processor: "failing".to_string(),
            message: "Simulated processor failure".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Returns a nested chain instead of data.
pub struct NestingProcessor {
    pub chain: ChainDefinition,
}

#[async_trait(?Send)]
impl Processor for NestingProcessor {
    async fn transform(
        &self,
        _input: Document,
        _parameters: &ParameterBag,
    ) -> Result<StepOutput, ProcessorError> {
        Ok(StepOutput::NestedChain(self.chain.clone()))
    }

    fn name(&self) -> &'static str {
        "nesting"
    }
}

/// Records what it was called with and appends `label` to the input's
/// `/trail` array in a copy of the input.
pub struct RecordingProcessor {
    pub label: &'static str,
    pub calls: Rc<RefCell<Vec<(Value, ParameterBag)>>>,
}

impl RecordingProcessor {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            calls: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

#[async_trait(?Send)]
impl Processor for RecordingProcessor {
    async fn transform(
        &self,
        input: Document,
        parameters: &ParameterBag,
    ) -> Result<StepOutput, ProcessorError> {
        self.calls
            .borrow_mut()
            .push((input.snapshot(), parameters.clone()));
        let output = input.deep_copy();
        if output.get("/trail").is_none() {
            output
                .set("/trail", Value::Array(Vec::new()))
                .map_err(|e| ProcessorError::InvalidInput {
                    processor: self.label.to_string(),
                    reason: e.to_string(),
                })?;
        }
        output
            .set("/trail/-", Value::String(self.label.to_string()))
            .map_err(|e| ProcessorError::InvalidInput {
                processor: self.label.to_string(),
                reason: e.to_string(),
            })?;
        Ok(StepOutput::Data(output))
    }

    fn name(&self) -> &'static str {
        self.label
    }
}
