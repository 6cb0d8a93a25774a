// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{map_string_leaves, model_config};
use crate::engine::chain::ParameterBag;
use crate::engine::Document;
use crate::errors::ProcessorError;
use crate::traits::{Processor, StepOutput};

/// Model of a `prefix_suffix` step. Either part may be left out.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PrefixSuffixConfig {
    pub prefix: Option<String>,
    pub suffix: Option<String>,
}

/// Wraps every string leaf in a prefix and/or suffix.
pub struct PrefixSuffixProcessor {
    config: PrefixSuffixConfig,
}

impl PrefixSuffixProcessor {
    pub fn new(config: PrefixSuffixConfig) -> Self {
        Self { config }
    }

    pub fn from_model(model: &Document) -> Result<Self, ProcessorError> {
        model_config("prefix_suffix", model).map(Self::new)
    }

    pub fn with_prefix_and_suffix(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self::new(PrefixSuffixConfig {
            prefix: Some(prefix.into()),
            suffix: Some(suffix.into()),
        })
    }
}

#[async_trait(?Send)]
impl Processor for PrefixSuffixProcessor {
    async fn transform(
        &self,
        input: Document,
        _parameters: &ParameterBag,
    ) -> Result<StepOutput, ProcessorError> {
        let prefix = self.config.prefix.as_deref().unwrap_or_default();
        let suffix = self.config.suffix.as_deref().unwrap_or_default();
        Ok(StepOutput::Data(map_string_leaves(&input, |text| {
            format!("{prefix}{text}{suffix}")
        })))
    }

    fn name(&self) -> &'static str {
        "prefix_suffix"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn run(processor: PrefixSuffixProcessor, input: serde_json::Value) -> serde_json::Value {
        match processor
            .transform(Document::new(input), &ParameterBag::new())
            .await
            .unwrap()
        {
            StepOutput::Data(output) => output.snapshot(),
            _ => panic!("expected data"),
        }
    }

    #[tokio::test]
    async fn wraps_with_both_parts() {
        let processor = PrefixSuffixProcessor::with_prefix_and_suffix("[", "]");
        assert_eq!(run(processor, json!(["a", "b"])).await, json!(["[a]", "[b]"]));
    }

    #[tokio::test]
    async fn missing_model_means_no_change() {
        let processor = PrefixSuffixProcessor::from_model(&Document::new(json!(null))).unwrap();
        assert_eq!(run(processor, json!("same")).await, json!("same"));

        let processor =
            PrefixSuffixProcessor::from_model(&Document::new(json!({"suffix": "!"}))).unwrap();
        assert_eq!(run(processor, json!("hey")).await, json!("hey!"));
    }
}
