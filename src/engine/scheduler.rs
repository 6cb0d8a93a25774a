// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Next-tick primitives.
//!
//! The engine is single threaded: everything runs on the current
//! [`tokio::task::LocalSet`]. Both helpers panic outside a `LocalSet`, the same
//! way `spawn_local` does.

use std::future::Future;

use tokio::task::JoinHandle;

/// Run `f` on a later scheduler turn, never inline.
pub fn defer<F>(f: F) -> JoinHandle<()>
where
    F: FnOnce() + 'static,
{
    tokio::task::spawn_local(async move { f() })
}

/// Drive an asynchronous continuation (processor calls, transports).
pub fn spawn<F>(future: F) -> JoinHandle<()>
where
    F: Future<Output = ()> + 'static,
{
    tokio::task::spawn_local(future)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::test_support::{run_local, settle};

    #[tokio::test]
    async fn deferred_work_never_runs_inline() {
        run_local(async {
            let ran = Rc::new(Cell::new(false));
            let flag = ran.clone();
            defer(move || flag.set(true));
            assert!(!ran.get());

            settle().await;
            assert!(ran.get());
        })
        .await;
    }
}
