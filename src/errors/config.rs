// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::path::PathBuf;

/// Errors that can occur during wiring validation
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A circular reference was detected between declared sources
    CyclicDependency {
        /// The cycle path showing the circular reference
        cycle: Vec<String>,
    },
    /// A source references an id that is not declared
    UnresolvedReference {
        /// The source that holds the reference
        source_id: String,
        /// The id that couldn't be resolved
        missing_reference: String,
    },
    /// Two sources share the same id
    DuplicateSourceId {
        /// The duplicate source id
        source_id: String,
    },
    /// An updater is declared for a source it does not take as input
    UpdaterInputMismatch {
        /// The source listing the updater
        owner_id: String,
        /// The declared updater
        updater_id: String,
    },
    /// A field required by the source type is absent
    MissingField {
        /// The incomplete source
        source_id: String,
        /// The absent field
        field: &'static str,
    },
    /// Only static and file sources accept model updaters
    UpdatersNotSupported {
        /// The chain source listing updaters
        source_id: String,
    },
    /// A chain step names a rule kind no mapping resolves
    UnknownRule {
        /// The chain holding the step
        source_id: String,
        /// The unknown rule kind
        rule: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::CyclicDependency { cycle } => {
                write!(f, "Cyclic dependency detected: {}", cycle.join(" -> "))
            }
            ValidationError::UnresolvedReference {
                source_id,
                missing_reference,
            } => {
                write!(
                    f,
                    "Source '{}' references '{}' which does not exist",
                    source_id, missing_reference
                )
            }
            ValidationError::DuplicateSourceId { source_id } => {
                write!(f, "Duplicate source ID: '{}'", source_id)
            }
            ValidationError::UpdaterInputMismatch {
                owner_id,
                updater_id,
            } => {
                write!(
                    f,
                    "Updater '{}' of source '{}' must be a chain whose input is '{}'",
                    updater_id, owner_id, owner_id
                )
            }
            ValidationError::MissingField { source_id, field } => {
                write!(f, "Source '{}' is missing required field '{}'", source_id, field)
            }
            ValidationError::UpdatersNotSupported { source_id } => {
                write!(f, "Source '{}' is a chain and cannot have model updaters", source_id)
            }
            ValidationError::UnknownRule { source_id, rule } => {
                write!(
                    f,
                    "Chain '{}' uses rule '{}' which no rule mapping resolves",
                    source_id, rule
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors from loading a wiring configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in '{path}': {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid TOML in '{path}': {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid JSON in '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported configuration format for '{path}' (expected .yaml, .yml, .toml or .json)")]
    UnsupportedFormat { path: PathBuf },

    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
