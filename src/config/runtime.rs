// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use tokio::sync::Notify;

use crate::config::{ChainConfig, EngineConfig, ParameterConfig, SourceConfig, SourceKind};
use crate::engine::chain::{ChainDefinition, ChainDocument, ChainOrchestrator, ChainOrchestratorBuilder};
use crate::engine::{Document, EngineContext, SourceOptions};
use crate::errors::{ChainError, EngineError, RuntimeError};
use crate::sources::{RemoteSource, StaticSource};
use crate::traits::{AttachMode, AttachmentSink, DataSource, Executable, UpdatableSource};

/// Builds the sources of a wiring into an [`EngineContext`].
///
/// Static and file sources are created and registered immediately. Chains and
/// updater attachments wait on the registry for the sources they reference,
/// so declaration order does not matter.
///
/// # Examples
///
/// ```
/// use chainwood::config::{EngineConfig, WiringBuilder};
/// use chainwood::engine::EngineContext;
///
/// let config: EngineConfig = serde_yaml::from_str(r#"
/// sources:
///   - { id: greeting, type: static, data: { text: hello } }
/// "#).unwrap();
///
/// let runtime = WiringBuilder::new(EngineContext::with_builtins())
///     .build(&config)
///     .unwrap();
/// assert!(runtime.context().registry.contains("greeting"));
/// ```
pub struct WiringBuilder {
    context: EngineContext,
    sink: Option<Rc<dyn AttachmentSink>>,
}

/// Shared bookkeeping for deferred wiring steps.
#[derive(Default)]
struct WiringState {
    pending: Cell<usize>,
    done: Notify,
    errors: RefCell<Vec<ChainError>>,
    orchestrators: RefCell<HashMap<String, Rc<ChainOrchestrator>>>,
}

impl WiringState {
    fn begin(&self) {
        self.pending.set(self.pending.get() + 1);
    }

    fn finish(&self) {
        let pending = self.pending.get().saturating_sub(1);
        self.pending.set(pending);
        if pending == 0 {
            self.done.notify_one();
        }
    }

    fn record(&self, error: ChainError) {
        self.errors.borrow_mut().push(error);
    }
}

impl WiringBuilder {
    pub fn new(context: EngineContext) -> Self {
        Self {
            context,
            sink: None,
        }
    }

    /// Sink for chains declared with `attach`.
    pub fn sink(mut self, sink: Rc<dyn AttachmentSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Create every declared source. Must run inside a `LocalSet`
    /// when the wiring has chains or updaters.
    pub fn build(self, config: &EngineConfig) -> Result<Runtime, EngineError> {
        let context = self.context.with_settings(config.engine.clone());
        let state = Rc::new(WiringState::default());
        let mut updatable: HashMap<String, Rc<dyn UpdatableSource>> = HashMap::new();

        for source in &config.sources {
            let options = SourceOptions {
                name: source.name.clone(),
                fingerprint_threshold: context.settings.fingerprint_threshold,
            };
            let (registered, built): (Rc<dyn DataSource>, Rc<dyn UpdatableSource>) =
                match source.kind {
                    SourceKind::Static => {
                        let built = StaticSource::with_options(
                            source.id.clone(),
                            source.data.clone().unwrap_or_default(),
                            options,
                        );
                        let registered: Rc<dyn DataSource> = built.clone();
                        let built: Rc<dyn UpdatableSource> = built;
                        (registered, built)
                    }
                    SourceKind::File => {
                        let built = RemoteSource::new(
                            source.id.clone(),
                            source.location.clone().unwrap_or_default(),
                            context.transport.clone(),
                            options,
                        );
                        let registered: Rc<dyn DataSource> = built.clone();
                        let built: Rc<dyn UpdatableSource> = built;
                        (registered, built)
                    }
                    SourceKind::Chain => continue,
                };
            for _ in &source.updaters {
                built.announce_updater();
            }
            context.registry.register(registered)?;
            updatable.insert(source.id.clone(), built);
        }

        for source in config.sources.iter().filter(|s| s.kind == SourceKind::Chain) {
            build_chain(&context, &state, source, self.sink.clone());
        }

        for source in &config.sources {
            if source.updaters.is_empty() {
                continue;
            }
            match updatable.get(&source.id) {
                Some(owner) => attach_updaters(&context, &state, owner.clone(), source),
                None => state.record(ChainError::InvalidDefinition {
                    owner: source.id.clone(),
                    reason: "only static and file sources accept model updaters".to_string(),
                }),
            }
        }

        Ok(Runtime { context, state })
    }
}

fn chain_definition(
    source: &SourceConfig,
    context: &EngineContext,
) -> Result<ChainDefinition, ChainError> {
    match &source.chain {
        Some(ChainConfig::Rules(rules)) => Ok(ChainDefinition::Rules(rules.clone())),
        Some(ChainConfig::Document(document)) => Ok(ChainDefinition::Document(document.clone())),
        Some(ChainConfig::Reference(id)) => context
            .registry
            .get(id)
            .map(ChainDefinition::Source)
            .ok_or_else(|| missing(&source.id, id)),
        None => Ok(ChainDefinition::Document(ChainDocument { phases: Vec::new() })),
    }
}

fn missing(owner: &str, id: &str) -> ChainError {
    ChainError::MissingDependency {
        owner: owner.to_string(),
        what: format!("source '{id}'"),
    }
}

fn build_orchestrator(
    context: &EngineContext,
    source: &SourceConfig,
    sink: Option<Rc<dyn AttachmentSink>>,
) -> Result<Rc<ChainOrchestrator>, ChainError> {
    let input_id = source.input.as_deref().unwrap_or_default();
    let input = context
        .registry
        .get(input_id)
        .ok_or_else(|| missing(&source.id, input_id))?;

    let mut builder = ChainOrchestratorBuilder::new(source.id.clone(), context.clone())
        .chain(chain_definition(source, context)?)
        .input(input);
    if let Some(name) = &source.name {
        builder = builder.name(name.clone());
    }
    for (key, parameter) in &source.parameters {
        builder = match parameter {
            ParameterConfig::Value(value) => builder.parameter(key.clone(), value.clone()),
            ParameterConfig::Source(reference) => {
                let bound = context
                    .registry
                    .get(&reference.source)
                    .ok_or_else(|| missing(&source.id, &reference.source))?;
                builder.parameter(key.clone(), bound)
            }
        };
    }
    if let (Some(attach), Some(sink)) = (&source.attach, sink) {
        let mode = if attach.regions.is_empty() {
            AttachMode::Replace
        } else {
            AttachMode::PatchRegions(attach.regions.clone())
        };
        builder = builder.sink(sink, mode);
    }
    builder.build()
}

fn build_chain(
    context: &EngineContext,
    state: &Rc<WiringState>,
    source: &SourceConfig,
    sink: Option<Rc<dyn AttachmentSink>>,
) {
    let references: Vec<String> = source.references().into_iter().map(str::to_string).collect();
    let context_for_chain = context.clone();
    let state_for_chain = state.clone();
    let source = source.clone();

    state.begin();
    context.registry.with_objects(references, move || {
        match build_orchestrator(&context_for_chain, &source, sink) {
            Ok(orchestrator) => {
                let registered: Rc<dyn DataSource> = orchestrator.clone();
                match context_for_chain.registry.register(registered) {
                    Ok(()) => {
                        state_for_chain
                            .orchestrators
                            .borrow_mut()
                            .insert(source.id.clone(), orchestrator);
                    }
                    Err(error) => state_for_chain.record(ChainError::InvalidDefinition {
                        owner: source.id.clone(),
                        reason: error.to_string(),
                    }),
                }
            }
            Err(error) => state_for_chain.record(error),
        }
        state_for_chain.finish();
    });
}

fn attach_updaters(
    context: &EngineContext,
    state: &Rc<WiringState>,
    owner: Rc<dyn UpdatableSource>,
    source: &SourceConfig,
) {
    let updaters: Vec<(String, bool)> = source
        .updaters
        .iter()
        .map(|updater| (updater.id().to_string(), updater.auto_update()))
        .collect();
    let ids: Vec<String> = updaters.iter().map(|(id, _)| id.clone()).collect();
    let state_for_updaters = state.clone();

    state.begin();
    context.registry.with_objects(ids, move || {
        for (id, auto_update) in updaters {
            let orchestrator = state_for_updaters.orchestrators.borrow().get(&id).cloned();
            let result = match orchestrator {
                Some(orchestrator) => owner.add_updater(orchestrator, auto_update),
                None => Err(ChainError::UpdaterInputMismatch {
                    owner: owner.id().to_string(),
                    updater: id,
                }),
            };
            if let Err(error) = result {
                state_for_updaters.record(error);
            }
        }
        state_for_updaters.finish();
    });
}

/// A built wiring, ready to evaluate sources by id.
pub struct Runtime {
    context: EngineContext,
    state: Rc<WiringState>,
}

impl Runtime {
    pub fn context(&self) -> &EngineContext {
        &self.context
    }

    /// Wait for deferred wiring steps to finish, then report the first error
    /// they recorded.
    pub async fn wired(&self) -> Result<(), EngineError> {
        while self.state.pending.get() > 0 {
            self.state.done.notified().await;
        }
        match self.state.errors.borrow().first() {
            Some(error) => Err(error.clone().into()),
            None => Ok(()),
        }
    }

    /// Execute `target` and return its data once it is ready.
    pub async fn evaluate(&self, target: &str) -> Result<Document, EngineError> {
        self.wired().await?;
        let source = self
            .context
            .registry
            .get(target)
            .ok_or_else(|| RuntimeError::UnknownTarget {
                id: target.to_string(),
            })?;

        let settled = source.state().when_settled();
        source.execute(false);
        match settled.await {
            Ok(_) => source.data().ok_or_else(|| {
                RuntimeError::NoData {
                    id: target.to_string(),
                }
                .into()
            }),
            Err(status) => Err(RuntimeError::Settled {
                id: target.to_string(),
                status,
            }
            .into()),
        }
    }
}
