// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use super::map_string_leaves;
use crate::engine::chain::ParameterBag;
use crate::engine::Document;
use crate::errors::ProcessorError;
use crate::traits::{Processor, StepOutput};

/// Reverses every string leaf of the input, by `char`.
#[derive(Default)]
pub struct ReverseTextProcessor;

impl ReverseTextProcessor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait(?Send)]
impl Processor for ReverseTextProcessor {
    async fn transform(
        &self,
        input: Document,
        _parameters: &ParameterBag,
    ) -> Result<StepOutput, ProcessorError> {
        Ok(StepOutput::Data(map_string_leaves(&input, |text| {
            text.chars().rev().collect()
        })))
    }

    fn name(&self) -> &'static str {
        "reverse_text"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn reverses_unicode_text() {
        let output = ReverseTextProcessor::new()
            .transform(Document::new(json!({"a": "héllo", "b": ["ab"]})), &ParameterBag::new())
            .await
            .unwrap();
        let StepOutput::Data(output) = output else {
            panic!("expected data");
        };
        assert_eq!(output.snapshot(), json!({"a": "olléh", "b": ["ba"]}));
    }
}
