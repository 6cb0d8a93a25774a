// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Parsed chains: phases of steps, each with a model and a processor.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::engine::chain::{
    ChainDocument, Parameters, ParameterValue, TransformationRule, TransformerFactory,
};
use crate::engine::{Document, EngineContext};
use crate::errors::ChainError;
use crate::traits::{DataSource, Processor};

enum Transformer {
    /// Built from the step model once it is ready.
    Factory(TransformerFactory),
    /// Supplied directly.
    Fixed(Rc<dyn Processor>),
}

pub struct Step {
    pub name: String,
    pub rule: Option<TransformationRule>,
    pub model: Option<Rc<dyn DataSource>>,
    pub params: Parameters,
    transformer: Transformer,
    processor: RefCell<Option<Rc<dyn Processor>>>,
    output: RefCell<Option<Document>>,
    running: Cell<bool>,
    is_last_of_chain: Cell<bool>,
}

impl Step {
    fn from_rule(
        owner: &str,
        index: usize,
        rule: &TransformationRule,
        context: &EngineContext,
    ) -> Result<Self, ChainError> {
        let mapping = context.resolver.resolve(owner, rule)?;
        let name = rule
            .name
            .clone()
            .unwrap_or_else(|| format!("{}-{}", rule.rule, index));
        let model = (mapping.model_factory)(rule, &format!("{owner}#{name}"), context)?;

        let mut params = Parameters::new();
        for (key, value) in &rule.params {
            params.insert(key.clone(), ParameterValue::Value(value.clone()));
        }
        for (key, source_id) in &rule.param_sources {
            let source = context
                .registry
                .get(source_id)
                .ok_or_else(|| ChainError::MissingDependency {
                    owner: owner.to_string(),
                    what: format!("parameter source '{source_id}' of step '{name}'"),
                })?;
            params.insert(key.clone(), ParameterValue::Source(source));
        }

        Ok(Self::new(
            name,
            Some(rule.clone()),
            Some(model),
            params,
            Transformer::Factory(mapping.transformer_factory.clone()),
        ))
    }

    fn from_processor(processor: Rc<dyn Processor>) -> Self {
        let step = Self::new(
            processor.name().to_string(),
            None,
            None,
            Parameters::new(),
            Transformer::Fixed(processor.clone()),
        );
        *step.processor.borrow_mut() = Some(processor);
        step
    }

    fn new(
        name: String,
        rule: Option<TransformationRule>,
        model: Option<Rc<dyn DataSource>>,
        params: Parameters,
        transformer: Transformer,
    ) -> Self {
        Self {
            name,
            rule,
            model,
            params,
            transformer,
            processor: RefCell::new(None),
            output: RefCell::new(None),
            running: Cell::new(false),
            is_last_of_chain: Cell::new(false),
        }
    }

    /// Build the processor if it does not exist yet. The model must be ready.
    pub fn build_processor(&self) -> Result<Rc<dyn Processor>, ChainError> {
        if let Some(processor) = self.processor.borrow().clone() {
            return Ok(processor);
        }
        let processor = match &self.transformer {
            Transformer::Fixed(processor) => processor.clone(),
            Transformer::Factory(factory) => {
                let (Some(rule), Some(model)) = (&self.rule, &self.model) else {
                    return Err(ChainError::ProcessorBuild {
                        step: self.name.clone(),
                        reason: "step has no model".to_string(),
                    });
                };
                factory(rule, model)?
            }
        };
        *self.processor.borrow_mut() = Some(processor.clone());
        Ok(processor)
    }

    pub fn processor(&self) -> Option<Rc<dyn Processor>> {
        self.processor.borrow().clone()
    }

    pub fn output(&self) -> Option<Document> {
        self.output.borrow().clone()
    }

    pub(crate) fn set_output(&self, output: Option<Document>) {
        *self.output.borrow_mut() = output;
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.set(running);
    }

    pub fn is_last_of_chain(&self) -> bool {
        self.is_last_of_chain.get()
    }

    pub fn rule_kind(&self) -> &str {
        self.rule.as_ref().map(|rule| rule.rule.as_str()).unwrap_or("processor")
    }
}

pub struct Phase {
    pub name: String,
    pub steps: Vec<Step>,
}

pub struct Chain {
    pub phases: Vec<Phase>,
}

impl Chain {
    pub fn from_document(
        owner: &str,
        document: &ChainDocument,
        context: &EngineContext,
    ) -> Result<Self, ChainError> {
        let mut index = 0;
        let mut phases = Vec::with_capacity(document.phases.len());
        for phase in &document.phases {
            let mut steps = Vec::with_capacity(phase.steps.len());
            for rule in &phase.steps {
                steps.push(Step::from_rule(owner, index, rule, context)?);
                index += 1;
            }
            phases.push(Phase {
                name: phase.name.clone(),
                steps,
            });
        }
        Self::finish(owner, phases)
    }

    pub fn from_processor(owner: &str, processor: Rc<dyn Processor>) -> Result<Self, ChainError> {
        Self::finish(
            owner,
            vec![Phase {
                name: "main".to_string(),
                steps: vec![Step::from_processor(processor)],
            }],
        )
    }

    fn finish(owner: &str, phases: Vec<Phase>) -> Result<Self, ChainError> {
        let chain = Self { phases };
        let Some(last) = chain.steps().last() else {
            return Err(ChainError::MissingDependency {
                owner: owner.to_string(),
                what: "a chain with at least one step".to_string(),
            });
        };
        last.is_last_of_chain.set(true);
        Ok(chain)
    }

    /// Steps in document order across all phases.
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.phases.iter().flat_map(|phase| phase.steps.iter())
    }

    pub fn step_count(&self) -> usize {
        self.steps().count()
    }

    pub fn models(&self) -> Vec<Rc<dyn DataSource>> {
        self.steps().filter_map(|step| step.model.clone()).collect()
    }

    pub fn reset(&self) {
        for step in self.steps() {
            step.set_output(None);
            step.set_running(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::StubProcessor;
    use serde_json::json;

    #[test]
    fn exactly_the_last_step_is_marked() {
        let context = EngineContext::with_builtins();
        let document = ChainDocument::from_value(
            "c",
            &json!({"phases": [
                {"name": "one", "steps": [{"rule": "reverse_text"}, {"rule": "noop"}]},
                {"name": "two", "steps": [{"rule": "reverse_text", "name": "final"}]}
            ]}),
        )
        .unwrap();

        let chain = Chain::from_document("c", &document, &context).unwrap();
        let marked: Vec<&str> = chain
            .steps()
            .filter(|step| step.is_last_of_chain())
            .map(|step| step.name.as_str())
            .collect();
        assert_eq!(marked, vec!["final"]);
        assert_eq!(chain.models().len(), 3);
        assert_eq!(chain.steps().next().map(|s| s.name.as_str()), Some("reverse_text-0"));
    }

    #[test]
    fn empty_chains_and_unknown_sources_are_missing_dependencies() {
        let context = EngineContext::with_builtins();
        let empty = ChainDocument { phases: vec![] };
        assert!(matches!(
            Chain::from_document("c", &empty, &context),
            Err(ChainError::MissingDependency { .. })
        ));

        let document = ChainDocument::from_rules(vec![
            TransformationRule::new("noop").with_param_source("filters", "nowhere"),
        ]);
        assert!(matches!(
            Chain::from_document("c", &document, &context),
            Err(ChainError::MissingDependency { .. })
        ));
    }

    #[test]
    fn processor_chains_have_one_prebuilt_step() {
        let chain = Chain::from_processor("c", Rc::new(StubProcessor::named("only"))).unwrap();
        let step = chain.steps().next().unwrap();
        assert!(step.is_last_of_chain());
        assert!(step.model.is_none());
        assert_eq!(step.processor().map(|p| p.name()), Some("only"));
    }
}
