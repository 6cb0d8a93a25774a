// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::traits::{DataSource, Executable};

/// Resolved parameters handed to a processor.
pub type ParameterBag = BTreeMap<String, Value>;

/// A parameter is either a literal or the current data of a source.
#[derive(Clone)]
pub enum ParameterValue {
    Value(Value),
    Source(Rc<dyn DataSource>),
}

impl ParameterValue {
    fn resolve(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Source(source) => source
                .data()
                .map(|document| document.snapshot())
                .unwrap_or(Value::Null),
        }
    }
}

impl fmt::Debug for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Source(source) => f.debug_tuple("Source").field(&source.id()).finish(),
        }
    }
}

impl From<Value> for ParameterValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Rc<dyn DataSource>> for ParameterValue {
    fn from(source: Rc<dyn DataSource>) -> Self {
        Self::Source(source)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Parameters(BTreeMap<String, ParameterValue>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParameterValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Sources whose data feeds a parameter.
    pub fn sources(&self) -> Vec<Rc<dyn DataSource>> {
        self.0
            .values()
            .filter_map(|value| match value {
                ParameterValue::Source(source) => Some(source.clone()),
                ParameterValue::Value(_) => None,
            })
            .collect()
    }

    fn iter(&self) -> impl Iterator<Item = (&String, &ParameterValue)> {
        self.0.iter()
    }
}

fn is_namespace_key(key: &str) -> bool {
    key == "xmlns" || key.starts_with("xmlns:")
}

/// Merge global and step-local parameters for one processor call.
///
/// Step-local values win. Null values and namespace declarations (`xmlns`,
/// `xmlns:*`) are dropped, so a null local value leaves the global one in
/// place.
pub fn build_parameter_bag(global: &Parameters, local: &Parameters) -> ParameterBag {
    let mut bag = ParameterBag::new();
    for (key, value) in global.iter().chain(local.iter()) {
        if is_namespace_key(key) {
            continue;
        }
        let resolved = value.resolve();
        if resolved.is_null() {
            continue;
        }
        bag.insert(key.clone(), resolved);
    }
    bag
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::StaticSource;
    use serde_json::json;

    #[test]
    fn local_overrides_global_and_junk_is_dropped() {
        let mut global = Parameters::new();
        global.insert("lang", json!("en"));
        global.insert("region", json!("emea"));
        global.insert("xmlns", json!("urn:x"));

        let mut local = Parameters::new();
        local.insert("lang", json!("de"));
        local.insert("region", Value::Null);
        local.insert("xmlns:svg", json!("urn:svg"));
        local.insert("empty", Value::Null);

        let bag = build_parameter_bag(&global, &local);
        assert_eq!(bag.get("lang"), Some(&json!("de")));
        assert_eq!(bag.get("region"), Some(&json!("emea")));
        assert!(!bag.contains_key("xmlns"));
        assert!(!bag.contains_key("xmlns:svg"));
        assert!(!bag.contains_key("empty"));
    }

    #[test]
    fn source_parameters_resolve_to_current_data() {
        let filters: Rc<dyn DataSource> = StaticSource::new("filters", json!({"year": 2024}));
        let mut global = Parameters::new();
        global.insert("filters", filters.clone());

        assert_eq!(global.sources().len(), 1);
        let bag = build_parameter_bag(&global, &Parameters::new());
        assert_eq!(bag.get("filters"), Some(&json!({"year": 2024})));
    }
}
