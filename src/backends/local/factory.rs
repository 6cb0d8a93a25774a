// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::rc::Rc;

use serde_json::Value;

use super::processors::*;
use crate::engine::chain::{
    ModelFactory, RuleMapping, RuleResolver, TransformationRule, TransformerFactory,
};
use crate::engine::{Document, EngineContext, SourceOptions};
use crate::errors::ChainError;
use crate::sources::{RemoteSource, StaticSource};
use crate::traits::{DataSource, Processor};

/// Factory for the built-in (in-process) rule kinds.
pub struct LocalProcessorFactory;

impl LocalProcessorFactory {
    /// Register a mapping for every built-in kind, in the order of
    /// [`list_available_implementations`](Self::list_available_implementations).
    pub fn register_builtins(resolver: &mut RuleResolver) {
        for kind in Self::list_available_implementations() {
            resolver.register(Self::mapping(kind));
        }
    }

    pub fn mapping(kind: &'static str) -> RuleMapping {
        let model_factory: ModelFactory = Rc::new(model_for_rule);
        let transformer_factory: TransformerFactory = Rc::new(
            move |rule: &TransformationRule, model: &Rc<dyn DataSource>| {
                let document = model
                    .data()
                    .unwrap_or_else(|| Document::new(Value::Null));
                let step = rule.name.as_deref().unwrap_or(kind);
                Self::create_processor(kind, step, &document)
            },
        );
        RuleMapping::for_kind(kind, model_factory, transformer_factory)
    }

    /// Create a processor of `kind` from its step model.
    ///
    /// - "change_text_case" -> ChangeTextCaseProcessor (`{ "case": ... }`)
    /// - "reverse_text" -> ReverseTextProcessor
    /// - "prefix_suffix" -> PrefixSuffixProcessor (`{ "prefix", "suffix" }`)
    /// - "merge" -> MergeProcessor (the model is the patch)
    /// - "select" -> SelectProcessor (`{ "pointer": ... }`)
    /// - "set_parameters" -> SetParametersProcessor
    /// - "noop" -> NoopProcessor
    /// - "chain" -> NestedChainProcessor (the model is a chain document)
    pub fn create_processor(
        kind: &str,
        step: &str,
        model: &Document,
    ) -> Result<Rc<dyn Processor>, ChainError> {
        let processor: Rc<dyn Processor> = match kind {
            "change_text_case" => Rc::new(ChangeTextCaseProcessor::from_model(model)?),
            "reverse_text" => Rc::new(ReverseTextProcessor::new()),
            "prefix_suffix" => Rc::new(PrefixSuffixProcessor::from_model(model)?),
            "merge" => Rc::new(MergeProcessor::from_model(model)),
            "select" => Rc::new(SelectProcessor::from_model(model)?),
            "set_parameters" => Rc::new(SetParametersProcessor),
            "noop" => Rc::new(NoopProcessor),
            "chain" => Rc::new(NestedChainProcessor::from_model(step, model)?),
            _ => {
                return Err(ChainError::ProcessorBuild {
                    step: step.to_string(),
                    reason: format!("unknown local processor implementation '{kind}'"),
                })
            }
        };
        Ok(processor)
    }

    /// List all available local processor implementations
    pub fn list_available_implementations() -> Vec<&'static str> {
        vec![
            "change_text_case",
            "reverse_text",
            "prefix_suffix",
            "merge",
            "select",
            "set_parameters",
            "noop",
            "chain",
        ]
    }

    /// Check if an implementation is available
    pub fn is_implementation_available(kind: &str) -> bool {
        Self::list_available_implementations().contains(&kind)
    }
}

/// Step model: a remote source when the rule has an `href`, otherwise a static
/// source over the inline definition.
fn model_for_rule(
    rule: &TransformationRule,
    id: &str,
    context: &EngineContext,
) -> Result<Rc<dyn DataSource>, ChainError> {
    let options = SourceOptions {
        name: rule.name.clone(),
        fingerprint_threshold: context.settings.fingerprint_threshold,
    };
    let model: Rc<dyn DataSource> = match &rule.href {
        Some(href) => RemoteSource::new(id, href.clone(), context.transport.clone(), options),
        None => StaticSource::with_options(
            id,
            rule.definition.clone().unwrap_or(Value::Null),
            options,
        ),
    };
    Ok(model)
}
