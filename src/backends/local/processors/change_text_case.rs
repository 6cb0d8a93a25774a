// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{map_string_leaves, model_config};
use crate::engine::chain::ParameterBag;
use crate::engine::Document;
use crate::errors::ProcessorError;
use crate::traits::{Processor, StepOutput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseType {
    Upper,
    Lower,
    Proper,
    Title,
}

/// Model of a `change_text_case` step: `{ "case": "upper" }`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChangeTextCaseConfig {
    pub case: CaseType,
}

/// Re-cases every string leaf of the input.
///
/// A `case` parameter overrides the model's case for one run.
pub struct ChangeTextCaseProcessor {
    config: ChangeTextCaseConfig,
}

impl ChangeTextCaseProcessor {
    pub fn new(config: ChangeTextCaseConfig) -> Self {
        Self { config }
    }

    pub fn from_model(model: &Document) -> Result<Self, ProcessorError> {
        model_config("change_text_case", model).map(Self::new)
    }

    pub fn upper() -> Self {
        Self::new(ChangeTextCaseConfig {
            case: CaseType::Upper,
        })
    }

    pub fn lower() -> Self {
        Self::new(ChangeTextCaseConfig {
            case: CaseType::Lower,
        })
    }

    pub fn proper() -> Self {
        Self::new(ChangeTextCaseConfig {
            case: CaseType::Proper,
        })
    }

    pub fn title() -> Self {
        Self::new(ChangeTextCaseConfig {
            case: CaseType::Title,
        })
    }

    fn case_for(&self, parameters: &ParameterBag) -> Result<CaseType, ProcessorError> {
        match parameters.get("case") {
            None => Ok(self.config.case),
            Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                ProcessorError::InvalidInput {
                    processor: self.name().to_string(),
                    reason: format!("unknown case parameter: {e}"),
                }
            }),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
    }
}

fn is_minor_word(word: &str) -> bool {
    matches!(
        word,
        "a" | "an" | "the" | "and" | "or" | "but" | "in" | "on" | "at" | "to" | "for" | "of"
            | "with" | "by"
    )
}

pub fn change_case(text: &str, case: CaseType) -> String {
    match case {
        CaseType::Upper => text.to_uppercase(),
        CaseType::Lower => text.to_lowercase(),
        CaseType::Proper => text
            .split_whitespace()
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" "),
        // Like proper case, but minor words after the first stay lowercase.
        CaseType::Title => text
            .split_whitespace()
            .enumerate()
            .map(|(i, word)| {
                let lower = word.to_lowercase();
                if i > 0 && is_minor_word(&lower) {
                    lower
                } else {
                    capitalize(word)
                }
            })
            .collect::<Vec<_>>()
            .join(" "),
    }
}

#[async_trait(?Send)]
impl Processor for ChangeTextCaseProcessor {
    async fn transform(
        &self,
        input: Document,
        parameters: &ParameterBag,
    ) -> Result<StepOutput, ProcessorError> {
        let case = self.case_for(parameters)?;
        Ok(StepOutput::Data(map_string_leaves(&input, |text| {
            change_case(text, case)
        })))
    }

    fn name(&self) -> &'static str {
        "change_text_case"
    }
}
