// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::engine::chain::ParameterBag;
use crate::engine::Document;
use crate::errors::ProcessorError;
use crate::traits::{Processor, StepOutput};

/// Writes the resolved parameter bag under `/parameters` of a copy of the
/// input.
#[derive(Default)]
pub struct SetParametersProcessor;

#[async_trait(?Send)]
impl Processor for SetParametersProcessor {
    async fn transform(
        &self,
        input: Document,
        parameters: &ParameterBag,
    ) -> Result<StepOutput, ProcessorError> {
        let bag: Map<String, Value> = parameters
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let output = input.deep_copy();
        output
            .set("/parameters", Value::Object(bag))
            .map_err(|e| ProcessorError::InvalidInput {
                processor: self.name().to_string(),
                reason: e.to_string(),
            })?;
        Ok(StepOutput::Data(output))
    }

    fn name(&self) -> &'static str {
        "set_parameters"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn writes_the_bag() {
        let mut parameters = ParameterBag::new();
        parameters.insert("lang".to_string(), json!("en"));

        let output = SetParametersProcessor
            .transform(Document::new(json!({"x": 1})), &parameters)
            .await
            .unwrap();
        let StepOutput::Data(output) = output else {
            panic!("expected data");
        };
        assert_eq!(output.snapshot(), json!({"x": 1, "parameters": {"lang": "en"}}));
    }

    #[tokio::test]
    async fn scalar_inputs_are_rejected() {
        let result = SetParametersProcessor
            .transform(Document::new(json!("text")), &ParameterBag::new())
            .await;
        assert!(matches!(result, Err(ProcessorError::InvalidInput { .. })));
    }
}
