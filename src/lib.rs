// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // built-in processors and sinks
pub mod config;     // wiring files, validation, runtime
pub mod engine;     // status machines, registry, chains
pub mod errors;     // error handling
pub mod observability;
pub mod sources;    // static and remote data sources
pub mod traits;     // unified abstractions
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support {
    use std::future::Future;
    use std::time::Duration;

    /// Run a test body on a `LocalSet` so `spawn_local` works.
    pub async fn run_local<F: Future>(future: F) -> F::Output {
        tokio::task::LocalSet::new().run_until(future).await
    }

    /// Yield enough times for every pending deferred continuation to run.
    pub async fn settle() {
        for _ in 0..100 {
            tokio::task::yield_now().await;
        }
    }

    /// Guard against hangs in tests that await a status.
    pub async fn within<F: Future>(future: F) -> F::Output {
        match tokio::time::timeout(Duration::from_secs(5), future).await {
            Ok(output) => output,
            Err(_) => panic!("timed out waiting for the engine"),
        }
    }
}
