// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Mapping rule kinds to step models and processors.
//!
//! A [`RuleMapping`] answers three questions for a [`TransformationRule`]:
//! does it apply, which data source holds the step model, and how to build
//! the processor once that model is ready. The resolver tries mappings in
//! registration order and the first match wins.

use std::rc::Rc;

use crate::engine::chain::TransformationRule;
use crate::engine::EngineContext;
use crate::errors::ChainError;
use crate::traits::{DataSource, Processor};

pub type RuleMatcher = Rc<dyn Fn(&TransformationRule) -> bool>;
pub type ModelFactory =
    Rc<dyn Fn(&TransformationRule, &str, &EngineContext) -> Result<Rc<dyn DataSource>, ChainError>>;
pub type TransformerFactory =
    Rc<dyn Fn(&TransformationRule, &Rc<dyn DataSource>) -> Result<Rc<dyn Processor>, ChainError>>;

#[derive(Clone)]
pub struct RuleMapping {
    pub name: String,
    pub matcher: RuleMatcher,
    pub model_factory: ModelFactory,
    pub transformer_factory: TransformerFactory,
}

impl RuleMapping {
    /// Mapping that matches rules whose `rule` field equals `kind`.
    pub fn for_kind(
        kind: impl Into<String>,
        model_factory: ModelFactory,
        transformer_factory: TransformerFactory,
    ) -> Self {
        let kind = kind.into();
        let wanted = kind.clone();
        Self {
            name: kind,
            matcher: Rc::new(move |rule: &TransformationRule| rule.rule == wanted),
            model_factory,
            transformer_factory,
        }
    }

    pub fn matches(&self, rule: &TransformationRule) -> bool {
        (self.matcher)(rule)
    }
}

#[derive(Clone, Default)]
pub struct RuleResolver {
    mappings: Vec<RuleMapping>,
}

impl RuleResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a mapping. Earlier mappings take precedence.
    pub fn register(&mut self, mapping: RuleMapping) {
        self.mappings.push(mapping);
    }

    /// Insert a mapping ahead of everything registered so far.
    pub fn register_first(&mut self, mapping: RuleMapping) {
        self.mappings.insert(0, mapping);
    }

    pub fn resolve(&self, owner: &str, rule: &TransformationRule) -> Result<&RuleMapping, ChainError> {
        self.mappings
            .iter()
            .find(|mapping| mapping.matches(rule))
            .ok_or_else(|| ChainError::MissingDependency {
                owner: owner.to_string(),
                what: format!("no rule mapping resolves rule '{}'", rule.rule),
            })
    }

    pub fn can_resolve(&self, rule: &TransformationRule) -> bool {
        self.mappings.iter().any(|mapping| mapping.matches(rule))
    }

    pub fn mapping_names(&self) -> Vec<&str> {
        self.mappings.iter().map(|mapping| mapping.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::StubProcessor;
    use crate::sources::StaticSource;
    use serde_json::json;

    fn mapping(kind: &str, label: &'static str) -> RuleMapping {
        RuleMapping::for_kind(
            kind,
            Rc::new(|_: &TransformationRule, name: &str, _: &EngineContext| {
                let model: Rc<dyn DataSource> = StaticSource::new(name, json!(null));
                Ok(model)
            }),
            Rc::new(move |_: &TransformationRule, _: &Rc<dyn DataSource>| {
                let processor: Rc<dyn Processor> = Rc::new(StubProcessor::named(label));
                Ok(processor)
            }),
        )
    }

    #[test]
    fn first_matching_mapping_wins() {
        let mut resolver = RuleResolver::new();
        resolver.register(mapping("upper", "first"));
        resolver.register(mapping("upper", "second"));
        resolver.register_first(mapping("upper", "override"));

        let rule = TransformationRule::new("upper");
        let found = resolver.resolve("chain", &rule).unwrap();
        let model: Rc<dyn DataSource> = StaticSource::new("m", json!(null));
        let processor = (found.transformer_factory)(&rule, &model).unwrap();
        assert_eq!(processor.name(), "override");
        assert_eq!(resolver.mapping_names(), vec!["upper", "upper", "upper"]);
    }

    #[test]
    fn unknown_rules_are_a_missing_dependency() {
        let resolver = RuleResolver::new();
        let rule = TransformationRule::new("xslt");
        assert!(!resolver.can_resolve(&rule));
        assert!(matches!(
            resolver.resolve("chain", &rule),
            Err(ChainError::MissingDependency { .. })
        ));
    }
}
