// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::rc::Rc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use serde_json::Value;

use chainwood::backends::sinks::StdoutSink;
use chainwood::config::{load_and_validate_config, EngineConfig, SourceKind, WiringBuilder};
use chainwood::engine::EngineContext;
use chainwood::observability::init_tracing;
use chainwood::traits::{AttachMode, AttachmentSink};

/// Id of the static source whose data the optional command-line input replaces.
const INPUT_SOURCE_ID: &str = "input";

fn usage(program: &str) -> String {
    format!(
        "Usage: {program} <wiring.yaml|toml|json> <target-id> [input-json]\n\
         Example: {program} configs/text-pipeline.yaml shout '{{\"title\": \"hello\"}}'"
    )
}

/// Replace the data of the `input` static source with `raw`.
///
/// Input that is not valid JSON is taken as a plain string.
fn override_input(config: &mut EngineConfig, raw: &str) -> Result<()> {
    let Some(source) = config
        .sources
        .iter_mut()
        .find(|source| source.id == INPUT_SOURCE_ID)
    else {
        bail!("the wiring has no source with id '{INPUT_SOURCE_ID}' to take the input");
    };
    if source.kind != SourceKind::Static {
        bail!("source '{INPUT_SOURCE_ID}' must be a static source to take the input");
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    source.data = Some(value);
    Ok(())
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 || args.len() > 4 {
        eprintln!("{}", usage(&args[0]));
        std::process::exit(1);
    }
    let (wiring, target) = (&args[1], &args[2]);

    let context = EngineContext::with_builtins();
    let mut config = load_and_validate_config(wiring, &context.resolver)
        .with_context(|| format!("failed to load wiring '{wiring}'"))?;
    init_tracing(&config.engine.log_filter);

    if let Some(raw) = args.get(3) {
        override_input(&mut config, raw)?;
    }
    let attached = config
        .source(target)
        .is_some_and(|source| source.attach.is_some());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the runtime")?;
    let local = tokio::task::LocalSet::new();

    local.block_on(&runtime, async move {
        let started = Instant::now();
        let runtime = WiringBuilder::new(context)
            .sink(Rc::new(StdoutSink))
            .build(&config)?;

        let result = runtime
            .evaluate(target)
            .await
            .with_context(|| format!("evaluating '{target}' failed"))?;
        if !attached {
            StdoutSink.attach(&result, &AttachMode::Replace);
        }
        tracing::info!(
            target_id = %target,
            duration_ms = started.elapsed().as_millis() as u64,
            "evaluation complete"
        );
        Ok::<(), anyhow::Error>(())
    })
}
