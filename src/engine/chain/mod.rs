// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Chains of transformation steps and the orchestrator that runs them.

pub mod definition;
pub mod orchestrator;
pub mod parameters;
pub mod resolver;
pub mod step;

pub use definition::{ChainDefinition, ChainDocument, PhaseDocument, TransformationRule};
pub use orchestrator::{ChainOrchestrator, ChainOrchestratorBuilder};
pub use parameters::{build_parameter_bag, ParameterBag, ParameterValue, Parameters};
pub use resolver::{ModelFactory, RuleMapping, RuleMatcher, RuleResolver, TransformerFactory};
pub use step::{Chain, Phase, Step};
