// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Chain orchestrator: runs a multi-phase chain over an input source.
//!
//! # Lifecycle
//!
//! ```text
//! Initialized -> Loading -> ChainLoaded -> WaitingForParameters -> Transforming -> Transformed
//!                   |            |                  |                   |
//!          ChainLoadingFailed    |            TransformFailed     TransformFailed
//!                  ChainStylesheetLoadingFailed
//! ```
//!
//! `execute()` only starts the run. Every later stage is entered from the
//! orchestrator's own status listener, so each stage can also be re-entered
//! directly: a forced `execute()` on a transformed orchestrator jumps back to
//! `WaitingForParameters`, and [`ChainOrchestrator::reload_stylesheets`]
//! jumps back to `ChainLoaded`.
//!
//! A failed run never touches the attachment sink.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::{Rc, Weak};
use std::time::Instant;

use serde_json::Value;
use tracing::Instrument;

use crate::engine::chain::{
    build_parameter_bag, Chain, ChainDefinition, ChainDocument, ParameterValue, Parameters,
};
use crate::engine::fan_in::{synchronized_status_transition, FanIn};
use crate::engine::{
    scheduler, DataSourceCore, Document, EngineContext, ExecutableState, SourceOptions, Status,
    StatusChange, StatusFilter,
};
use crate::errors::ChainError;
use crate::observability::messages::chain::{
    ChainLoadFailed, ChainPrepared, ChainTransformFailed, ChainTransformed, NestedChainStarted,
    StylesheetLoadFailed,
};
use crate::observability::messages::processor::{
    ProcessorExecutionCompleted, ProcessorExecutionStarted, ProcessorInstantiationFailed,
};
use crate::observability::messages::StructuredLog;
use crate::sources::StaticSource;
use crate::traits::{AttachMode, AttachmentSink, DataSource, Executable, StepOutput};

const FAILED: &[Status] = &[
    Status::ChainLoadingFailed,
    Status::ChainStylesheetLoadingFailed,
    Status::TransformFailed,
];

pub struct ChainOrchestrator {
    me: Weak<ChainOrchestrator>,
    core: DataSourceCore,
    context: EngineContext,
    definition: ChainDefinition,
    input: Option<Rc<dyn DataSource>>,
    parameters: Parameters,
    sink: Option<(Rc<dyn AttachmentSink>, AttachMode)>,
    updater_of: RefCell<Option<String>>,
    chain: RefCell<Option<Rc<Chain>>>,
    nested_runs: Cell<usize>,
}

/// Builder for [`ChainOrchestrator`].
///
/// # Example
/// ```rust
/// use chainwood::engine::chain::{ChainOrchestratorBuilder, ChainDefinition, TransformationRule};
/// use chainwood::engine::EngineContext;
/// use chainwood::sources::StaticSource;
/// use serde_json::json;
///
/// let context = EngineContext::with_builtins();
/// let input = StaticSource::new("greeting", json!({"text": "hello"}));
/// let orchestrator = ChainOrchestratorBuilder::new("shout", context)
///     .chain(ChainDefinition::Rules(vec![
///         TransformationRule::new("change_text_case").with_definition(json!({"case": "upper"})),
///     ]))
///     .input(input)
///     .build()
///     .unwrap();
/// assert_eq!(orchestrator.input_id(), Some("greeting"));
/// ```
pub struct ChainOrchestratorBuilder {
    id: String,
    options: SourceOptions,
    context: EngineContext,
    definition: Option<ChainDefinition>,
    input: Option<Rc<dyn DataSource>>,
    parameters: Parameters,
    sink: Option<(Rc<dyn AttachmentSink>, AttachMode)>,
}

impl ChainOrchestratorBuilder {
    pub fn new(id: impl Into<String>, context: EngineContext) -> Self {
        let options = SourceOptions {
            fingerprint_threshold: context.settings.fingerprint_threshold,
            ..SourceOptions::default()
        };
        Self {
            id: id.into(),
            options,
            context,
            definition: None,
            input: None,
            parameters: Parameters::new(),
            sink: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.options.name = Some(name.into());
        self
    }

    pub fn chain(mut self, definition: ChainDefinition) -> Self {
        self.definition = Some(definition);
        self
    }

    pub fn input(mut self, input: Rc<dyn DataSource>) -> Self {
        self.input = Some(input);
        self
    }

    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.parameters.insert(key, value);
        self
    }

    pub fn parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn sink(mut self, sink: Rc<dyn AttachmentSink>, mode: AttachMode) -> Self {
        self.sink = Some((sink, mode));
        self
    }

    pub fn build(self) -> Result<Rc<ChainOrchestrator>, ChainError> {
        let Some(definition) = self.definition else {
            return Err(ChainError::MissingDependency {
                owner: self.id,
                what: "a chain definition".to_string(),
            });
        };
        let Some(input) = self.input else {
            return Err(ChainError::MissingDependency {
                owner: self.id,
                what: "an input source".to_string(),
            });
        };
        for rule in definition.static_rules() {
            self.context.resolver.resolve(&self.id, rule)?;
        }

        let orchestrator = Rc::new_cyclic(|me| ChainOrchestrator {
            me: me.clone(),
            core: DataSourceCore::new(self.id, self.options, Status::Transformed, FAILED),
            context: self.context,
            definition,
            input: Some(input),
            parameters: self.parameters,
            sink: self.sink,
            updater_of: RefCell::new(None),
            chain: RefCell::new(None),
            nested_runs: Cell::new(0),
        });

        let weak = Rc::downgrade(&orchestrator);
        orchestrator.core.state().add_listener(
            StatusFilter::Any,
            false,
            Rc::new(move |change: &StatusChange| {
                if let Some(orchestrator) = weak.upgrade() {
                    orchestrator.on_status(change.new);
                }
            }),
        );
        Ok(orchestrator)
    }
}

impl ChainOrchestrator {
    pub fn input(&self) -> Option<&Rc<dyn DataSource>> {
        self.input.as_ref()
    }

    pub fn input_id(&self) -> Option<&str> {
        self.input.as_ref().map(|input| input.id())
    }

    pub fn definition(&self) -> &ChainDefinition {
        &self.definition
    }

    /// The parsed chain of the current cycle, once `ChainLoaded` completed.
    pub fn chain(&self) -> Option<Rc<Chain>> {
        self.chain.borrow().clone()
    }

    /// Mark this orchestrator as a model updater of `source_id`. Its parameter
    /// fan-in then skips that source, which is refreshing while we run.
    pub fn mark_as_updater_of(&self, source_id: &str) {
        *self.updater_of.borrow_mut() = Some(source_id.to_string());
    }

    pub fn updater_of(&self) -> Option<String> {
        self.updater_of.borrow().clone()
    }

    /// Drop processors and outputs and re-enter `ChainLoaded`.
    pub fn reload_stylesheets(&self) {
        self.chain.borrow_mut().take();
        self.set_status(Status::ChainLoaded);
    }

    fn me(&self) -> Option<Rc<ChainOrchestrator>> {
        self.me.upgrade()
    }

    fn is_updater_target(&self, source: &Rc<dyn DataSource>) -> bool {
        self.updater_of.borrow().as_deref() == Some(source.id())
    }

    fn on_status(&self, status: Status) {
        match status {
            Status::ChainLoaded => self.load_chain(),
            Status::WaitingForParameters => self.wait_for_parameters(),
            Status::Transforming => self.transform(),
            _ => {}
        }
    }

    fn start_loading(&self) {
        let Some(me) = self.me() else {
            return;
        };
        self.set_status(Status::Loading);

        for source in self.parameters.sources() {
            if source.status().is_idle() {
                source.execute(false);
            }
        }
        if let Some(input) = &self.input {
            if !self.is_updater_target(input) && input.status().is_idle() {
                input.execute(false);
            }
        }

        let dependencies = match &self.definition {
            ChainDefinition::Source(source) => vec![source.clone()],
            _ => Vec::new(),
        };
        let weak = self.me.clone();
        synchronized_status_transition(
            &me,
            Status::ChainLoaded,
            dependencies,
            Some(Box::new(move |failed: &Rc<dyn DataSource>| {
                let Some(orchestrator) = weak.upgrade() else {
                    return;
                };
                let error = ChainError::MissingDependency {
                    owner: orchestrator.id().to_string(),
                    what: format!("chain source '{}' ended in {}", failed.id(), failed.status()),
                };
                orchestrator.fail_loading(&error);
            })),
        );
    }

    fn fail_loading(&self, error: &ChainError) {
        ChainLoadFailed {
            chain_id: self.id(),
            error,
        }
        .log();
        self.set_status(Status::ChainLoadingFailed);
    }

    fn chain_document(&self) -> Result<ChainDocument, ChainError> {
        match &self.definition {
            ChainDefinition::Rules(rules) => Ok(ChainDocument::from_rules(rules.clone())),
            ChainDefinition::Document(document) => Ok(document.clone()),
            ChainDefinition::Source(source) => {
                let value = source
                    .data()
                    .map(|document| document.snapshot())
                    .unwrap_or(Value::Null);
                ChainDocument::from_value(self.id(), &value)
            }
            ChainDefinition::Processor(_) => Err(ChainError::InvalidDefinition {
                owner: self.id().to_string(),
                reason: "a processor chain has no document".to_string(),
            }),
        }
    }

    fn load_chain(&self) {
        if let ChainDefinition::Processor(processor) = &self.definition {
            match Chain::from_processor(self.id(), processor.clone()) {
                Ok(chain) => self.prepare_models(chain),
                Err(error) => self.fail_loading(&error),
            }
            return;
        }

        let document = match self.chain_document() {
            Ok(document) => document,
            Err(error) => {
                self.fail_loading(&error);
                return;
            }
        };

        let parameter_sources: BTreeSet<String> = document
            .rules()
            .flat_map(|rule| rule.param_sources.values().cloned())
            .collect();
        let weak = self.me.clone();
        self.context
            .registry
            .with_objects(parameter_sources, move || {
                let Some(orchestrator) = weak.upgrade() else {
                    return;
                };
                match Chain::from_document(orchestrator.id(), &document, &orchestrator.context) {
                    Ok(chain) => orchestrator.prepare_models(chain),
                    Err(error) => orchestrator.fail_loading(&error),
                }
            });
    }

    fn prepare_models(&self, chain: Chain) {
        let chain = Rc::new(chain);
        *self.chain.borrow_mut() = Some(chain.clone());

        let on_ready = {
            let weak = self.me.clone();
            let chain = chain.clone();
            Box::new(move || {
                if let Some(orchestrator) = weak.upgrade() {
                    orchestrator.build_processors(&chain);
                }
            })
        };
        let weak = self.me.clone();
        FanIn::start(
            chain.models(),
            on_ready,
            Box::new(move |failed: &Rc<dyn DataSource>| {
                if let Some(orchestrator) = weak.upgrade() {
                    let reason = format!("model '{}' ended in {}", failed.id(), failed.status());
                    StylesheetLoadFailed {
                        chain_id: orchestrator.id(),
                        step: failed.id(),
                        reason: &reason,
                    }
                    .log();
                    orchestrator.set_status(Status::ChainStylesheetLoadingFailed);
                }
            }),
        );
    }

    fn build_processors(&self, chain: &Rc<Chain>) {
        let current = self.chain.borrow().clone();
        if !current.is_some_and(|current| Rc::ptr_eq(&current, chain)) {
            // A reload replaced this chain while its models were loading.
            return;
        }

        for step in chain.steps() {
            if let Err(error) = step.build_processor() {
                let reason = error.to_string();
                ProcessorInstantiationFailed {
                    step: &step.name,
                    rule: step.rule_kind(),
                    reason: &reason,
                }
                .log();
                StylesheetLoadFailed {
                    chain_id: self.id(),
                    step: &step.name,
                    reason: &reason,
                }
                .log();
                self.set_status(Status::ChainStylesheetLoadingFailed);
                return;
            }
        }

        ChainPrepared {
            chain_id: self.id(),
            phase_count: chain.phases.len(),
            step_count: chain.step_count(),
        }
        .log();
        self.set_status(Status::WaitingForParameters);
    }

    fn wait_for_parameters(&self) {
        let Some(me) = self.me() else {
            return;
        };

        let mut dependencies = self.parameters.sources();
        if let Some(chain) = self.chain() {
            for step in chain.steps() {
                dependencies.extend(step.params.sources());
            }
        }
        if let Some(input) = &self.input {
            dependencies.push(input.clone());
        }
        dependencies.retain(|dependency| !self.is_updater_target(dependency));

        let weak = self.me.clone();
        synchronized_status_transition(
            &me,
            Status::Transforming,
            dependencies,
            Some(Box::new(move |failed: &Rc<dyn DataSource>| {
                if let Some(orchestrator) = weak.upgrade() {
                    let error = ChainError::MissingDependency {
                        owner: orchestrator.id().to_string(),
                        what: format!("'{}' ended in {}", failed.id(), failed.status()),
                    };
                    ChainTransformFailed {
                        chain_id: orchestrator.id(),
                        step: "parameters",
                        error: &error,
                    }
                    .log();
                    orchestrator.set_status(Status::TransformFailed);
                }
            })),
        );
    }

    fn transform(&self) {
        if let Some(me) = self.me() {
            scheduler::spawn(me.run_steps());
        }
    }

    async fn run_steps(self: Rc<Self>) {
        let started = Instant::now();
        let Some(chain) = self.chain() else {
            self.set_status(Status::TransformFailed);
            return;
        };
        chain.reset();

        let input = self
            .input
            .as_ref()
            .and_then(|input| input.data())
            .unwrap_or_else(|| Document::new(Value::Null));
        let mut current = input.clone();

        for step in chain.steps() {
            let Some(processor) = step.processor() else {
                let error = ChainError::ProcessorBuild {
                    step: step.name.clone(),
                    reason: "processor was not built".to_string(),
                };
                self.fail_transform(&step.name, &error);
                return;
            };

            let parameters = build_parameter_bag(&self.parameters, &step.params);
            let started_message = ProcessorExecutionStarted {
                processor: processor.name(),
                step: &step.name,
                parameter_count: parameters.len(),
            };
            started_message.log();
            let span = started_message.span("transform");

            let step_started = Instant::now();
            step.set_running(true);
            let result = processor
                .transform(current.clone(), &parameters)
                .instrument(span)
                .await;
            step.set_running(false);

            let output = match result {
                Ok(output) => output,
                Err(error) => {
                    self.fail_transform(&step.name, &ChainError::from(error));
                    return;
                }
            };
            ProcessorExecutionCompleted {
                processor: processor.name(),
                step: &step.name,
                outcome: output.kind(),
                duration: step_started.elapsed(),
            }
            .log();

            match output {
                StepOutput::Data(document) => {
                    step.set_output(Some(document.clone()));
                    current = document;
                }
                StepOutput::Empty => step.set_output(None),
                StepOutput::NestedChain(definition) => {
                    match self.run_nested(definition, &current).await {
                        Ok(document) => {
                            step.set_output(Some(document.clone()));
                            current = document;
                        }
                        Err(error) => {
                            self.fail_transform(&step.name, &error);
                            return;
                        }
                    }
                }
            }
        }

        let result = if Document::ptr_eq(&current, &input) {
            current.deep_copy()
        } else {
            current
        };
        self.core.replace_data(result.clone());
        if let Some((sink, mode)) = &self.sink {
            sink.attach(&result, mode);
        }

        ChainTransformed {
            chain_id: self.id(),
            step_count: chain.step_count(),
            duration: started.elapsed(),
        }
        .log();
        self.set_status(Status::Transformed);
    }

    async fn run_nested(
        &self,
        definition: ChainDefinition,
        input: &Document,
    ) -> Result<Document, ChainError> {
        let run = self.nested_runs.get() + 1;
        self.nested_runs.set(run);
        let child_id = format!("{}#nested-{}", self.id(), run);

        let child_input = StaticSource::new(format!("{child_id}-input"), input.clone());
        let child = ChainOrchestratorBuilder::new(child_id.clone(), self.context.clone())
            .chain(definition)
            .input(child_input)
            .parameters(self.parameters.clone())
            .build()?;

        NestedChainStarted {
            chain_id: self.id(),
            child_id: &child_id,
        }
        .log();

        let settled = child.state().when_settled();
        child.execute(false);
        match settled.await {
            Ok(_) => child.data().ok_or_else(|| ChainError::NestedChainFailed {
                owner: self.id().to_string(),
                status: child.status(),
            }),
            Err(status) => Err(ChainError::NestedChainFailed {
                owner: self.id().to_string(),
                status,
            }),
        }
    }

    fn fail_transform(&self, step: &str, error: &ChainError) {
        ChainTransformFailed {
            chain_id: self.id(),
            step,
            error,
        }
        .log();
        self.set_status(Status::TransformFailed);
    }
}

impl Executable for ChainOrchestrator {
    fn id(&self) -> &str {
        self.core.id()
    }

    fn state(&self) -> &ExecutableState {
        self.core.state()
    }

    fn execute_impl(&self, force: bool) {
        let status = self.status();
        if status.is_idle() {
            self.start_loading();
        } else if force
            && (status == Status::Transformed || status == Status::WaitingForUncommittedChanges)
        {
            self.set_status(Status::WaitingForParameters);
        }
    }

    fn set_status(&self, next: Status) {
        self.core.set_status(next);
    }
}

impl DataSource for ChainOrchestrator {
    fn core(&self) -> &DataSourceCore {
        &self.core
    }
}
