// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors from loading or saving a remote document.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to access '{location}': {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{location}' does not contain valid JSON: {source}")]
    Json {
        location: String,
        #[source]
        source: serde_json::Error,
    },
}
