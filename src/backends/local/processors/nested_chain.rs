// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::engine::chain::{ChainDefinition, ChainDocument, ParameterBag};
use crate::engine::Document;
use crate::errors::{ChainError, ProcessorError};
use crate::traits::{Processor, StepOutput};

/// Meta-transformation: answers with the chain document held in its model,
/// which the orchestrator then runs over the current input.
pub struct NestedChainProcessor {
    document: ChainDocument,
}

impl NestedChainProcessor {
    pub fn new(document: ChainDocument) -> Self {
        Self { document }
    }

    /// The model must parse as a chain document with at least one step.
    pub fn from_model(step: &str, model: &Document) -> Result<Self, ChainError> {
        let document = ChainDocument::from_value(step, &model.snapshot())?;
        if document.step_count() == 0 {
            return Err(ChainError::InvalidDefinition {
                owner: step.to_string(),
                reason: "nested chain has no steps".to_string(),
            });
        }
        Ok(Self::new(document))
    }
}

#[async_trait(?Send)]
impl Processor for NestedChainProcessor {
    async fn transform(
        &self,
        _input: Document,
        _parameters: &ParameterBag,
    ) -> Result<StepOutput, ProcessorError> {
        Ok(StepOutput::NestedChain(ChainDefinition::Document(
            self.document.clone(),
        )))
    }

    fn name(&self) -> &'static str {
        "chain"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn models_without_steps_are_rejected() {
        assert!(NestedChainProcessor::from_model("s", &Document::new(json!(null))).is_err());
        assert!(NestedChainProcessor::from_model("s", &Document::new(json!([]))).is_err());
        assert!(
            NestedChainProcessor::from_model("s", &Document::new(json!([{"rule": "noop"}]))).is_ok()
        );
    }
}
