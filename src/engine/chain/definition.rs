// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ChainError;
use crate::traits::{DataSource, Processor};

/// One step of a structured chain: a rule kind plus its model.
///
/// The model is either inline (`definition`) or fetched (`href`).
///
/// # Example
/// ```yaml
/// rule: change_text_case
/// name: shout
/// definition: { case: upper }
/// params: { lang: en }
/// param_sources: { region: filters }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationRule {
    pub rule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// Literal step-local parameters.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, Value>,
    /// Step-local parameters whose value is the data of a registered source.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub param_sources: BTreeMap<String, String>,
}

impl TransformationRule {
    pub fn new(rule: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            name: None,
            definition: None,
            href: None,
            params: BTreeMap::new(),
            param_sources: BTreeMap::new(),
        }
    }

    pub fn with_definition(mut self, definition: Value) -> Self {
        self.definition = Some(definition);
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    pub fn with_param_source(mut self, key: impl Into<String>, source_id: impl Into<String>) -> Self {
        self.param_sources.insert(key.into(), source_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseDocument {
    #[serde(default = "default_phase_name")]
    pub name: String,
    pub steps: Vec<TransformationRule>,
}

fn default_phase_name() -> String {
    "main".to_string()
}

/// Multi-phase chain in its declarative form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainDocument {
    pub phases: Vec<PhaseDocument>,
}

impl ChainDocument {
    /// A single `main` phase holding `rules`.
    pub fn from_rules(rules: Vec<TransformationRule>) -> Self {
        Self {
            phases: vec![PhaseDocument {
                name: default_phase_name(),
                steps: rules,
            }],
        }
    }

    /// Accepts `{ "phases": [...] }` or a bare array of rules.
    pub fn from_value(owner: &str, value: &Value) -> Result<Self, ChainError> {
        let invalid = |reason: String| ChainError::InvalidDefinition {
            owner: owner.to_string(),
            reason,
        };
        match value {
            Value::Array(_) => serde_json::from_value::<Vec<TransformationRule>>(value.clone())
                .map(Self::from_rules)
                .map_err(|e| invalid(e.to_string())),
            Value::Object(map) if map.contains_key("phases") => {
                serde_json::from_value::<ChainDocument>(value.clone())
                    .map_err(|e| invalid(e.to_string()))
            }
            other => Err(invalid(format!(
                "expected a phases object or an array of rules, found {}",
                json_kind(other)
            ))),
        }
    }

    pub fn rules(&self) -> impl Iterator<Item = &TransformationRule> {
        self.phases.iter().flat_map(|phase| phase.steps.iter())
    }

    pub fn step_count(&self) -> usize {
        self.rules().count()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object without phases",
    }
}

/// Where an orchestrator gets its chain from.
#[derive(Clone)]
pub enum ChainDefinition {
    /// An array of rules, run as one phase.
    Rules(Vec<TransformationRule>),
    /// A structured multi-phase document.
    Document(ChainDocument),
    /// A single processor used as a one-step chain.
    Processor(Rc<dyn Processor>),
    /// A source whose data is a chain document.
    Source(Rc<dyn DataSource>),
}

impl ChainDefinition {
    /// Rules known without loading anything.
    pub fn static_rules(&self) -> Vec<&TransformationRule> {
        match self {
            Self::Rules(rules) => rules.iter().collect(),
            Self::Document(document) => document.rules().collect(),
            Self::Processor(_) | Self::Source(_) => Vec::new(),
        }
    }
}

impl fmt::Debug for ChainDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rules(rules) => f.debug_tuple("Rules").field(rules).finish(),
            Self::Document(document) => f.debug_tuple("Document").field(document).finish(),
            Self::Processor(processor) => f.debug_tuple("Processor").field(&processor.name()).finish(),
            Self::Source(source) => f.debug_tuple("Source").field(&source.id()).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_a_bare_rule_array_into_one_phase() {
        let document = ChainDocument::from_value(
            "c",
            &json!([{"rule": "reverse_text"}, {"rule": "noop", "name": "skip"}]),
        )
        .unwrap();
        assert_eq!(document.phases.len(), 1);
        assert_eq!(document.phases[0].name, "main");
        assert_eq!(document.step_count(), 2);
    }

    #[test]
    fn parses_phases() {
        let document = ChainDocument::from_value(
            "c",
            &json!({"phases": [
                {"name": "prepare", "steps": [{"rule": "merge", "definition": {"a": 1}}]},
                {"steps": [{"rule": "select", "definition": {"pointer": "/a"}}]}
            ]}),
        )
        .unwrap();
        assert_eq!(document.phases[0].name, "prepare");
        assert_eq!(document.phases[1].name, "main");
        assert_eq!(document.rules().map(|r| r.rule.as_str()).collect::<Vec<_>>(), vec!["merge", "select"]);
    }

    #[test]
    fn rejects_other_shapes() {
        for value in [json!("text"), json!({"steps": []}), json!(null), json!([{"no_rule": 1}])] {
            assert!(matches!(
                ChainDocument::from_value("c", &value),
                Err(ChainError::InvalidDefinition { .. })
            ));
        }
    }
}
