// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::engine::Status;

/// Errors from evaluating a wired runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("no source with id '{id}' is wired")]
    UnknownTarget { id: String },

    #[error("source '{id}' settled in status {status}")]
    Settled { id: String, status: Status },

    #[error("source '{id}' is ready but holds no data")]
    NoData { id: String },
}
