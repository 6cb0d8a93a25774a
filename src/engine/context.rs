// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::rc::Rc;

use serde::Deserialize;

use crate::backends::local::LocalProcessorFactory;
use crate::engine::chain::RuleResolver;
use crate::engine::ObjectRegistry;
use crate::sources::{FsTransport, Transport};
use crate::utils::DEFAULT_FINGERPRINT_THRESHOLD;

/// Engine-wide knobs, the `engine:` block of a wiring file.
///
/// # Example
/// ```yaml
/// engine:
///   fingerprint_threshold: 96
///   log_filter: info
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EngineSettings {
    #[serde(default = "default_fingerprint_threshold")]
    pub fingerprint_threshold: usize,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_fingerprint_threshold() -> usize {
    DEFAULT_FINGERPRINT_THRESHOLD
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            fingerprint_threshold: default_fingerprint_threshold(),
            log_filter: default_log_filter(),
        }
    }
}

/// Collaborators shared by everything built for one engine instance.
///
/// Cloning is cheap; every clone shares the same registry, resolver and
/// transport.
#[derive(Clone)]
pub struct EngineContext {
    pub registry: ObjectRegistry,
    pub resolver: Rc<RuleResolver>,
    pub transport: Rc<dyn Transport>,
    pub settings: EngineSettings,
}

impl EngineContext {
    pub fn new(
        registry: ObjectRegistry,
        resolver: RuleResolver,
        transport: Rc<dyn Transport>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            registry,
            resolver: Rc::new(resolver),
            transport,
            settings,
        }
    }

    /// Fresh registry, the built-in rule kinds and a filesystem transport
    /// rooted at the working directory.
    pub fn with_builtins() -> Self {
        let mut resolver = RuleResolver::new();
        LocalProcessorFactory::register_builtins(&mut resolver);
        Self::new(
            ObjectRegistry::new(),
            resolver,
            Rc::new(FsTransport::new(".")),
            EngineSettings::default(),
        )
    }

    pub fn with_transport(mut self, transport: Rc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }
}
