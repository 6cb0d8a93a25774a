// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::cell::RefCell;
use std::io::Write;

use serde_json::{Map, Value};

use crate::engine::Document;
use crate::traits::{AttachMode, AttachmentSink};

/// Top-level regions of `value` named in `regions`. Non-objects yield an
/// empty object.
pub fn select_regions(value: &Value, regions: &[String]) -> Value {
    let mut selected = Map::new();
    if let Value::Object(map) = value {
        for region in regions {
            if let Some(part) = map.get(region) {
                selected.insert(region.clone(), part.clone());
            }
        }
    }
    Value::Object(selected)
}

fn rendered(document: &Document, mode: &AttachMode) -> Value {
    match mode {
        AttachMode::Replace => document.snapshot(),
        AttachMode::PatchRegions(regions) => select_regions(&document.borrow(), regions),
    }
}

/// Prints attached documents as pretty JSON.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl AttachmentSink for StdoutSink {
    fn attach(&self, document: &Document, mode: &AttachMode) {
        let value = rendered(document, mode);
        let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
        let mut stdout = std::io::stdout().lock();
        if let Err(error) = writeln!(stdout, "{text}") {
            tracing::warn!(error = %error, "could not write result to stdout");
        }
    }
}

/// Keeps every attachment for later inspection.
#[derive(Debug, Default)]
pub struct MemorySink {
    attached: RefCell<Vec<Value>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attachments(&self) -> Vec<Value> {
        self.attached.borrow().clone()
    }

    pub fn last(&self) -> Option<Value> {
        self.attached.borrow().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.attached.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.attached.borrow().is_empty()
    }
}

impl AttachmentSink for MemorySink {
    fn attach(&self, document: &Document, mode: &AttachMode) {
        self.attached.borrow_mut().push(rendered(document, mode));
    }
}
