// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod change_text_case;
pub mod merge;
pub mod nested_chain;
pub mod noop;
pub mod prefix_suffix;
pub mod reverse_text;
pub mod select;
pub mod set_parameters;

pub use change_text_case::*;
pub use merge::*;
pub use nested_chain::*;
pub use noop::*;
pub use prefix_suffix::*;
pub use reverse_text::*;
pub use select::*;
pub use set_parameters::*;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::engine::Document;
use crate::errors::ProcessorError;

/// Deserialize a step model into a processor configuration. A missing model
/// reads as an empty object.
pub(crate) fn model_config<T: DeserializeOwned>(
    processor: &str,
    model: &Document,
) -> Result<T, ProcessorError> {
    let value = match model.snapshot() {
        Value::Null => Value::Object(Map::new()),
        value => value,
    };
    serde_json::from_value(value).map_err(|e| ProcessorError::InvalidModel {
        processor: processor.to_string(),
        reason: e.to_string(),
    })
}

/// Copy of `input` with `f` applied to every string leaf.
pub(crate) fn map_string_leaves(input: &Document, f: impl Fn(&str) -> String) -> Document {
    let output = input.deep_copy();
    visit_strings(&mut output.borrow_mut(), &f);
    output
}

fn visit_strings(value: &mut Value, f: &dyn Fn(&str) -> String) {
    match value {
        Value::String(text) => *text = f(text),
        Value::Array(items) => items.iter_mut().for_each(|item| visit_strings(item, f)),
        Value::Object(map) => map.values_mut().for_each(|item| visit_strings(item, f)),
        _ => {}
    }
}
