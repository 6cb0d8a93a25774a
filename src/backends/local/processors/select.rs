// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::model_config;
use crate::engine::chain::ParameterBag;
use crate::engine::Document;
use crate::errors::ProcessorError;
use crate::traits::{Processor, StepOutput};

/// Model of a `select` step: `{ "pointer": "/a/b" }`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SelectConfig {
    pub pointer: String,
}

/// Outputs the sub-tree at a JSON Pointer, or nothing when it is absent.
pub struct SelectProcessor {
    config: SelectConfig,
}

impl SelectProcessor {
    pub fn new(pointer: impl Into<String>) -> Self {
        Self {
            config: SelectConfig {
                pointer: pointer.into(),
            },
        }
    }

    pub fn from_model(model: &Document) -> Result<Self, ProcessorError> {
        model_config("select", model).map(|config| Self { config })
    }
}

#[async_trait(?Send)]
impl Processor for SelectProcessor {
    async fn transform(
        &self,
        input: Document,
        _parameters: &ParameterBag,
    ) -> Result<StepOutput, ProcessorError> {
        Ok(match input.get(&self.config.pointer) {
            Some(value) => StepOutput::Data(Document::new(value)),
            None => StepOutput::Empty,
        })
    }

    fn name(&self) -> &'static str {
        "select"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn selects_or_forwards() {
        let input = Document::new(json!({"a": {"b": [1, 2]}}));

        let found = SelectProcessor::new("/a/b")
            .transform(input.clone(), &ParameterBag::new())
            .await
            .unwrap();
        assert!(matches!(found, StepOutput::Data(ref d) if d.snapshot() == json!([1, 2])));

        let missing = SelectProcessor::new("/a/zzz")
            .transform(input, &ParameterBag::new())
            .await
            .unwrap();
        assert!(matches!(missing, StepOutput::Empty));
    }

    #[test]
    fn pointer_is_required() {
        assert!(SelectProcessor::from_model(&Document::new(json!(null))).is_err());
    }
}
