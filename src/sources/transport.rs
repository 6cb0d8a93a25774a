// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::TransportError;

/// Where a [`RemoteSource`](crate::sources::RemoteSource) reads and writes
/// its document.
#[async_trait(?Send)]
pub trait Transport {
    async fn load(&self, location: &str) -> Result<Value, TransportError>;

    async fn save(&self, location: &str, document: &Value) -> Result<(), TransportError>;
}

/// JSON files below a root directory. Absolute locations bypass the root.
#[derive(Debug, Clone)]
pub struct FsTransport {
    root: PathBuf,
}

impl FsTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, location: &str) -> PathBuf {
        let path = Path::new(location);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

#[async_trait(?Send)]
impl Transport for FsTransport {
    async fn load(&self, location: &str) -> Result<Value, TransportError> {
        let path = self.path_for(location);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| TransportError::Io {
                location: location.to_string(),
                source,
            })?;
        serde_json::from_str(&content).map_err(|source| TransportError::Json {
            location: location.to_string(),
            source,
        })
    }

    async fn save(&self, location: &str, document: &Value) -> Result<(), TransportError> {
        let path = self.path_for(location);
        let io_error = |source| TransportError::Io {
            location: location.to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        let content = serde_json::to_string_pretty(document).map_err(|source| {
            TransportError::Json {
                location: location.to_string(),
                source,
            }
        })?;
        tokio::fs::write(&path, content).await.map_err(io_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn saves_then_loads_below_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FsTransport::new(dir.path());

        transport
            .save("nested/doc.json", &json!({"a": [1, 2]}))
            .await
            .unwrap();
        assert!(dir.path().join("nested/doc.json").exists());
        assert_eq!(
            transport.load("nested/doc.json").await.unwrap(),
            json!({"a": [1, 2]})
        );
    }

    #[tokio::test]
    async fn missing_files_and_bad_json_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        let transport = FsTransport::new(dir.path());

        assert!(matches!(
            transport.load("absent.json").await,
            Err(TransportError::Io { .. })
        ));
        assert!(matches!(
            transport.load("broken.json").await,
            Err(TransportError::Json { .. })
        ));
    }
}
