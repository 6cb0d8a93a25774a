// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Wiring validation: checks a configuration before anything is built.
//!
//! # Validation Pipeline
//!
//! 1. **Uniqueness**: every source id appears once
//! 2. **Completeness**: each source type has its required fields
//! 3. **References**: inputs, chain sources, parameter sources and updaters
//!    name declared sources
//! 4. **Updaters**: only static and file sources own updaters, and each
//!    updater is a chain over its owner
//! 5. **Rules**: every inline rule kind resolves
//! 6. **Cycle detection**: DFS over "needs" edges
//!
//! Errors from stages 1 to 5 accumulate. Cycle detection only runs on a
//! graph without dangling references.
//!
//! ## Cycle Detection Algorithm
//! **Depth-First Search with a recursion stack**, O(V + E). A neighbour that
//! is still on the stack closes a cycle, and the path from it to the current
//! node is reported.
//!
//! Updater edges are not part of the graph: an updater takes its owner as
//! input while the owner waits for the updater, and the engine breaks that
//! loop by marking the updater.
//!
//! # Examples
//!
//! ```rust
//! use chainwood::config::{validate_wiring, EngineConfig};
//! use chainwood::engine::EngineContext;
//! use chainwood::errors::ValidationError;
//!
//! let config: EngineConfig = serde_yaml::from_str(r#"
//! sources:
//!   - id: a
//!     type: chain
//!     input: b
//!     chain: [{ rule: noop }]
//!   - id: b
//!     type: chain
//!     input: a
//!     chain: [{ rule: noop }]
//! "#).unwrap();
//!
//! let context = EngineContext::with_builtins();
//! match validate_wiring(&config, &context.resolver) {
//!     Err(errors) => assert!(matches!(errors[0], ValidationError::CyclicDependency { .. })),
//!     Ok(()) => panic!("cycle not detected"),
//! }
//! ```

use std::collections::{HashMap, HashSet};

use crate::config::{EngineConfig, SourceKind};
use crate::engine::chain::RuleResolver;
use crate::errors::ValidationError;
use crate::observability::messages::validation::{
    CyclicDependencyDetected, UnresolvedReference, ValidationCompleted, ValidationFailed,
    ValidationStarted,
};
use crate::observability::messages::StructuredLog;

/// Validate a wiring against the rule kinds `resolver` knows.
///
/// # Returns
///
/// * `Ok(())` - The wiring can be built
/// * `Err(Vec<ValidationError>)` - Every problem found
pub fn validate_wiring(
    config: &EngineConfig,
    resolver: &RuleResolver,
) -> Result<(), Vec<ValidationError>> {
    ValidationStarted {
        source_count: config.sources.len(),
    }
    .log();

    let mut errors = Vec::new();
    errors.extend(validate_unique_source_ids(config));
    errors.extend(validate_required_fields(config));
    let reference_errors = validate_references(config);
    let has_dangling_references = !reference_errors.is_empty();
    errors.extend(reference_errors);
    errors.extend(validate_updaters(config));
    errors.extend(validate_rules(config, resolver));

    if !has_dangling_references {
        if let Some(cycle) = find_cycle(config) {
            let path: Vec<&str> = cycle.iter().map(String::as_str).collect();
            CyclicDependencyDetected { cycle: &path }.log();
            errors.push(ValidationError::CyclicDependency { cycle });
        }
    }

    if errors.is_empty() {
        ValidationCompleted {
            source_count: config.sources.len(),
        }
        .log();
        Ok(())
    } else {
        ValidationFailed {
            error_count: errors.len(),
        }
        .log();
        Err(errors)
    }
}

fn validate_unique_source_ids(config: &EngineConfig) -> Vec<ValidationError> {
    let mut seen = HashSet::new();
    config
        .sources
        .iter()
        .filter(|source| !seen.insert(source.id.as_str()))
        .map(|source| ValidationError::DuplicateSourceId {
            source_id: source.id.clone(),
        })
        .collect()
}

fn validate_required_fields(config: &EngineConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for source in &config.sources {
        let mut require = |present: bool, field: &'static str| {
            if !present {
                errors.push(ValidationError::MissingField {
                    source_id: source.id.clone(),
                    field,
                });
            }
        };
        match source.kind {
            SourceKind::Static => {}
            SourceKind::File => require(source.location.is_some(), "location"),
            SourceKind::Chain => {
                require(source.input.is_some(), "input");
                require(source.chain.is_some(), "chain");
            }
        }
    }
    errors
}

fn validate_references(config: &EngineConfig) -> Vec<ValidationError> {
    let ids: HashSet<&str> = config.sources.iter().map(|s| s.id.as_str()).collect();
    let mut errors = Vec::new();

    for source in &config.sources {
        let references = source
            .references()
            .into_iter()
            .chain(source.step_references())
            .chain(source.updaters.iter().map(|updater| updater.id()));
        for reference in references {
            if !ids.contains(reference) {
                UnresolvedReference {
                    source_id: &source.id,
                    missing_reference: reference,
                }
                .log();
                errors.push(ValidationError::UnresolvedReference {
                    source_id: source.id.clone(),
                    missing_reference: reference.to_string(),
                });
            }
        }
    }
    errors
}

fn validate_updaters(config: &EngineConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for owner in &config.sources {
        if owner.updaters.is_empty() {
            continue;
        }
        if owner.kind == SourceKind::Chain {
            errors.push(ValidationError::UpdatersNotSupported {
                source_id: owner.id.clone(),
            });
            continue;
        }
        for updater in &owner.updaters {
            let Some(declared) = config.source(updater.id()) else {
                continue;
            };
            let is_chain_over_owner = declared.kind == SourceKind::Chain
                && declared.input.as_deref() == Some(owner.id.as_str());
            if !is_chain_over_owner {
                errors.push(ValidationError::UpdaterInputMismatch {
                    owner_id: owner.id.clone(),
                    updater_id: declared.id.clone(),
                });
            }
        }
    }
    errors
}

fn validate_rules(config: &EngineConfig, resolver: &RuleResolver) -> Vec<ValidationError> {
    config
        .sources
        .iter()
        .flat_map(|source| {
            source
                .inline_rules()
                .into_iter()
                .filter(|rule| !resolver.can_resolve(rule))
                .map(|rule| ValidationError::UnknownRule {
                    source_id: source.id.clone(),
                    rule: rule.rule.clone(),
                })
        })
        .collect()
}

/// First cycle over "needs" edges, as a closed path (`[a, b, a]`).
fn find_cycle(config: &EngineConfig) -> Option<Vec<String>> {
    let graph: HashMap<&str, Vec<&str>> = config
        .sources
        .iter()
        .map(|source| {
            let needs = source
                .references()
                .into_iter()
                .chain(source.step_references())
                .collect();
            (source.id.as_str(), needs)
        })
        .collect();

    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();
    let mut path = Vec::new();
    for source in &config.sources {
        if !visited.contains(source.id.as_str()) {
            if let Some(cycle) = dfs_cycle_detection(
                &source.id,
                &graph,
                &mut visited,
                &mut rec_stack,
                &mut path,
            ) {
                return Some(cycle);
            }
        }
    }
    None
}

fn dfs_cycle_detection<'a>(
    node: &'a str,
    graph: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    rec_stack: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
) -> Option<Vec<String>> {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node);

    for &neighbor in graph.get(node).into_iter().flatten() {
        if rec_stack.contains(neighbor) {
            let start = path.iter().position(|&n| n == neighbor).unwrap_or(0);
            let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
            cycle.push(neighbor.to_string());
            return Some(cycle);
        }
        if !visited.contains(neighbor) {
            if let Some(cycle) = dfs_cycle_detection(neighbor, graph, visited, rec_stack, path) {
                return Some(cycle);
            }
        }
    }

    rec_stack.remove(node);
    path.pop();
    None
}
