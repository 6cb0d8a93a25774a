// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::config::validate_wiring;
use crate::engine::chain::{ChainDocument, RuleResolver, TransformationRule};
use crate::engine::EngineSettings;
use crate::errors::ConfigError;

/// A wiring file: engine settings plus the sources to build.
///
/// # Example
/// ```yaml
/// engine:
///   fingerprint_threshold: 96
/// sources:
///   - id: greeting
///     type: static
///     data: { text: hello }
///   - id: shout
///     type: chain
///     input: greeting
///     chain:
///       - rule: change_text_case
///         definition: { case: upper }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub engine: EngineSettings,
    pub sources: Vec<SourceConfig>,
}

impl EngineConfig {
    pub fn source(&self, id: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|source| source.id == id)
    }
}

/// One declared source.
///
/// # Fields
/// * `id` - Unique identifier, also the registry key
/// * `kind` - `static`, `file` or `chain`
/// * `data` - Initial document of a static source
/// * `location` - Transport location of a file source
/// * `input` - Source id a chain transforms
/// * `chain` - Chain of a chain source: a source id, a rule list or a phases document
/// * `parameters` - Global chain parameters; `{ source: id }` binds a source's data
/// * `updaters` - Chain sources run as model updaters of a static or file source
/// * `attach` - Attach chain results to the runtime sink
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub chain: Option<ChainConfig>,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterConfig>,
    #[serde(default)]
    pub updaters: Vec<UpdaterConfig>,
    #[serde(default)]
    pub attach: Option<AttachConfig>,
}

impl SourceConfig {
    /// Ids this source needs registered before it can be built.
    pub fn references(&self) -> Vec<&str> {
        let mut references = Vec::new();
        if let Some(input) = &self.input {
            references.push(input.as_str());
        }
        if let Some(ChainConfig::Reference(id)) = &self.chain {
            references.push(id.as_str());
        }
        for parameter in self.parameters.values() {
            if let ParameterConfig::Source(reference) = parameter {
                references.push(reference.source.as_str());
            }
        }
        references
    }

    /// Step parameter sources of an inline chain.
    pub fn step_references(&self) -> Vec<&str> {
        self.inline_rules()
            .into_iter()
            .flat_map(|rule| rule.param_sources.values().map(String::as_str))
            .collect()
    }

    pub fn inline_rules(&self) -> Vec<&TransformationRule> {
        match &self.chain {
            Some(ChainConfig::Rules(rules)) => rules.iter().collect(),
            Some(ChainConfig::Document(document)) => document.rules().collect(),
            Some(ChainConfig::Reference(_)) | None => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Static,
    File,
    Chain,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ChainConfig {
    /// Id of a source whose data is the chain document.
    Reference(String),
    Rules(Vec<TransformationRule>),
    Document(ChainDocument),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceReference {
    pub source: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ParameterConfig {
    Source(SourceReference),
    Value(Value),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UpdaterConfig {
    Id(String),
    Detailed {
        id: String,
        #[serde(default = "default_auto_update")]
        auto_update: bool,
    },
}

fn default_auto_update() -> bool {
    true
}

impl UpdaterConfig {
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) | Self::Detailed { id, .. } => id,
        }
    }

    pub fn auto_update(&self) -> bool {
        match self {
            Self::Id(_) => true,
            Self::Detailed { auto_update, .. } => *auto_update,
        }
    }
}

/// Attach a chain's result to the runtime sink, whole or by top-level regions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttachConfig {
    #[serde(default)]
    pub regions: Vec<String>,
}

/// Load a wiring file. The format follows the extension: `.yaml`/`.yml`,
/// `.toml` or `.json`.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("yaml" | "yml") => serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        }),
        Some("toml") => toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        }),
        Some("json") => serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        }),
        _ => Err(ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Load a wiring file and validate it against `resolver`.
pub fn load_and_validate_config<P: AsRef<Path>>(
    path: P,
    resolver: &RuleResolver,
) -> Result<EngineConfig, ConfigError> {
    let config = load_config(path)?;
    validate_wiring(&config, resolver).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineContext;
    use serde_json::json;

    #[test]
    fn parse_basic_config() {
        let yaml = r#"
sources:
  - id: greeting
    type: static
    data: { text: hello }
  - id: shout
    type: chain
    input: greeting
    chain:
      - rule: change_text_case
        definition: { case: upper }
    parameters:
      lang: en
      filters: { source: greeting }
      literal: { source: greeting, extra: 1 }
    updaters: [a, { id: b, auto_update: false }]
"#;

        let cfg: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.engine, EngineSettings::default());
        assert_eq!(cfg.sources.len(), 2);
        assert_eq!(cfg.sources[0].kind, SourceKind::Static);
        assert_eq!(cfg.sources[0].data, Some(json!({"text": "hello"})));

        let shout = &cfg.sources[1];
        assert!(matches!(shout.chain, Some(ChainConfig::Rules(ref rules)) if rules.len() == 1));
        assert!(matches!(shout.parameters["lang"], ParameterConfig::Value(ref v) if v == &json!("en")));
        assert!(matches!(shout.parameters["filters"], ParameterConfig::Source(_)));
        assert!(matches!(shout.parameters["literal"], ParameterConfig::Value(_)));
        assert_eq!(shout.references(), vec!["greeting", "greeting"]);

        let updaters: Vec<(&str, bool)> = shout
            .updaters
            .iter()
            .map(|u| (u.id(), u.auto_update()))
            .collect();
        assert_eq!(updaters, vec![("a", true), ("b", false)]);
    }

    #[test]
    fn chain_forms() {
        let yaml = r#"
sources:
  - id: by_reference
    type: chain
    input: x
    chain: stylesheet
  - id: phased
    type: chain
    input: x
    chain:
      phases:
        - name: first
          steps: [{ rule: noop }]
        - steps: [{ rule: reverse_text, param_sources: { p: y } }]
"#;
        let cfg: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(cfg.sources[0].chain, Some(ChainConfig::Reference(ref id)) if id == "stylesheet"));
        assert_eq!(cfg.sources[0].references(), vec!["x", "stylesheet"]);

        let Some(ChainConfig::Document(document)) = &cfg.sources[1].chain else {
            panic!("expected a phases document");
        };
        assert_eq!(document.phases[1].name, "main");
        assert_eq!(cfg.sources[1].step_references(), vec!["y"]);
    }

    #[test]
    fn loads_each_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = dir.path().join("wiring.yaml");
        std::fs::write(&yaml, "sources:\n  - id: a\n    type: static\n").unwrap();
        assert_eq!(load_config(&yaml).unwrap().sources[0].id, "a");

        let toml_path = dir.path().join("wiring.toml");
        std::fs::write(
            &toml_path,
            "[engine]\nfingerprint_threshold = 10\n\n[[sources]]\nid = \"b\"\ntype = \"file\"\nlocation = \"b.json\"\n",
        )
        .unwrap();
        let cfg = load_config(&toml_path).unwrap();
        assert_eq!(cfg.engine.fingerprint_threshold, 10);
        assert_eq!(cfg.sources[0].kind, SourceKind::File);

        let json_path = dir.path().join("wiring.json");
        std::fs::write(&json_path, r#"{"sources": [{"id": "c", "type": "static", "data": [1]}]}"#)
            .unwrap();
        assert_eq!(load_config(&json_path).unwrap().sources[0].data, Some(json!([1])));

        let ini = dir.path().join("wiring.ini");
        std::fs::write(&ini, "").unwrap();
        assert!(matches!(load_config(&ini), Err(ConfigError::UnsupportedFormat { .. })));
        assert!(matches!(
            load_config(dir.path().join("absent.yaml")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_load_and_validate_unresolved_reference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wiring.yaml");
        std::fs::write(
            &path,
            "sources:\n  - id: c\n    type: chain\n    input: nonexistent\n    chain: [{ rule: noop }]\n",
        )
        .unwrap();

        let context = EngineContext::with_builtins();
        let error = load_and_validate_config(&path, &context.resolver).unwrap_err();
        assert!(error
            .to_string()
            .contains("references 'nonexistent' which does not exist"));
    }
}
