// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;

use crate::engine::chain::ParameterBag;
use crate::engine::Document;
use crate::errors::ProcessorError;
use crate::traits::{Processor, StepOutput};

/// Applies the step model as a JSON merge patch (RFC 7386) to the input.
pub struct MergeProcessor {
    patch: Value,
}

impl MergeProcessor {
    pub fn new(patch: Value) -> Self {
        Self { patch }
    }

    pub fn from_model(model: &Document) -> Self {
        Self::new(model.snapshot())
    }
}

/// Objects merge key by key, `null` deletes, anything else replaces.
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(serde_json::Map::new());
    }
    if let Value::Object(map) = target {
        for (key, value) in patch {
            if value.is_null() {
                map.remove(key);
            } else {
                merge_patch(map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}

#[async_trait(?Send)]
impl Processor for MergeProcessor {
    async fn transform(
        &self,
        input: Document,
        _parameters: &ParameterBag,
    ) -> Result<StepOutput, ProcessorError> {
        let output = input.deep_copy();
        merge_patch(&mut output.borrow_mut(), &self.patch);
        Ok(StepOutput::Data(output))
    }

    fn name(&self) -> &'static str {
        "merge"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_patch_follows_rfc_7386() {
        let mut target = json!({"a": "b", "c": {"d": "e", "f": "g"}, "keep": 1});
        merge_patch(&mut target, &json!({"a": "z", "c": {"f": null}, "new": [1]}));
        assert_eq!(target, json!({"a": "z", "c": {"d": "e"}, "keep": 1, "new": [1]}));

        let mut scalar = json!("text");
        merge_patch(&mut scalar, &json!({"x": 1}));
        assert_eq!(scalar, json!({"x": 1}));

        let mut replaced = json!({"x": 1});
        merge_patch(&mut replaced, &json!(["list"]));
        assert_eq!(replaced, json!(["list"]));
    }

    #[tokio::test]
    async fn leaves_the_input_untouched() {
        let input = Document::new(json!({"a": 1}));
        let processor = MergeProcessor::new(json!({"b": 2}));
        let StepOutput::Data(output) = processor
            .transform(input.clone(), &ParameterBag::new())
            .await
            .unwrap()
        else {
            panic!("expected data");
        };
        assert_eq!(output.snapshot(), json!({"a": 1, "b": 2}));
        assert_eq!(input.snapshot(), json!({"a": 1}));
    }
}
