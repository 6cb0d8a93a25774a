// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::rc::{Rc, Weak};

use crate::engine::model_updater::refresh_model_updaters;
use crate::engine::{
    scheduler, DataSourceCore, Document, ExecutableState, ModelUpdaters, SourceOptions, Status,
};
use crate::observability::messages::source::{TransportCompleted, TransportFailed};
use crate::observability::messages::StructuredLog;
use crate::sources::Transport;
use crate::traits::{DataSource, Executable, UpdatableSource};

const FAILED: &[Status] = &[Status::LoadFailed, Status::SaveFailed];

/// Data source backed by a [`Transport`] location.
///
/// ```text
/// Initialized -> Loading -> [Loaded] -> [RefreshingModelUpdaters*] -> Ready
/// Ready -> Saving -> Saved -> Ready
/// ```
///
/// `SaveFailed` is a failure status: a failed save ends the source's
/// lifecycle and later `save()` or `execute()` calls do nothing.
pub struct RemoteSource {
    me: Weak<RemoteSource>,
    core: DataSourceCore,
    location: String,
    transport: Rc<dyn Transport>,
    updaters: ModelUpdaters,
}

impl RemoteSource {
    pub fn new(
        id: impl Into<String>,
        location: impl Into<String>,
        transport: Rc<dyn Transport>,
        options: SourceOptions,
    ) -> Rc<Self> {
        let id = id.into();
        Rc::new_cyclic(|me| Self {
            me: me.clone(),
            core: DataSourceCore::new(id.clone(), options, Status::Ready, FAILED),
            location: location.into(),
            transport,
            updaters: ModelUpdaters::new(id),
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Write the current data back to the location. Only a ready source
    /// saves; returns whether a save was started.
    pub fn save(&self) -> bool {
        let Some(me) = self.me.upgrade() else {
            return false;
        };
        if self.status() != Status::Ready {
            return false;
        }
        let document = self
            .data()
            .map(|document| document.snapshot())
            .unwrap_or_default();

        self.set_status(Status::Saving);
        scheduler::spawn(async move {
            match me.transport.save(&me.location, &document).await {
                Ok(()) => {
                    TransportCompleted {
                        source_id: me.id(),
                        operation: "save",
                        location: &me.location,
                    }
                    .log();
                    me.set_status(Status::Saved);
                    me.set_status(Status::Ready);
                }
                Err(error) => {
                    TransportFailed {
                        source_id: me.id(),
                        operation: "save",
                        error: &error,
                    }
                    .log();
                    me.set_status(Status::SaveFailed);
                }
            }
        });
        true
    }

    async fn load(self: Rc<Self>) {
        match self.transport.load(&self.location).await {
            Ok(value) => {
                TransportCompleted {
                    source_id: self.id(),
                    operation: "load",
                    location: &self.location,
                }
                .log();
                self.core.replace_data(Document::new(value));
                refresh_model_updaters(&self, true);
            }
            Err(error) => {
                TransportFailed {
                    source_id: self.id(),
                    operation: "load",
                    error: &error,
                }
                .log();
                self.set_status(Status::LoadFailed);
            }
        }
    }
}

impl Executable for RemoteSource {
    fn id(&self) -> &str {
        self.core.id()
    }

    fn state(&self) -> &ExecutableState {
        self.core.state()
    }

    fn execute_impl(&self, force: bool) {
        let Some(me) = self.me.upgrade() else {
            return;
        };
        let status = self.status();
        if status.is_idle() {
            self.set_status(Status::Loading);
            scheduler::spawn(me.load());
        } else if force && status == Status::Ready {
            refresh_model_updaters(&me, true);
        }
    }

    fn set_status(&self, next: Status) {
        self.core.set_status(next);
    }
}

impl DataSource for RemoteSource {
    fn core(&self) -> &DataSourceCore {
        &self.core
    }

    fn fire(&self) {
        if self.status() == Status::Ready && self.updaters.has_auto_updaters() {
            if let Some(me) = self.me.upgrade() {
                self.core.clear_dirty();
                refresh_model_updaters(&me, false);
                return;
            }
        }
        self.core.fire();
    }
}

impl UpdatableSource for RemoteSource {
    fn updaters(&self) -> &ModelUpdaters {
        &self.updaters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TransportError;
    use crate::sources::FsTransport;
    use crate::test_support::{run_local, settle};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    /// Loads a fixed document and refuses every save.
    struct ReadOnlyTransport;

    #[async_trait(?Send)]
    impl Transport for ReadOnlyTransport {
        async fn load(&self, _location: &str) -> Result<Value, TransportError> {
            Ok(json!({"n": 1}))
        }

        async fn save(&self, location: &str, _document: &Value) -> Result<(), TransportError> {
            Err(TransportError::Io {
                location: location.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        }
    }

    #[tokio::test]
    async fn loads_through_the_transport() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("in.json"), r#"{"items": [1, 2, 3]}"#).unwrap();
        let transport: Rc<dyn Transport> = Rc::new(FsTransport::new(dir.path()));

        run_local(async move {
            let source = RemoteSource::new("remote", "in.json", transport, SourceOptions::default());
            let settled = source.state().when_settled();
            source.execute(false);
            assert_eq!(settled.await, Ok(Status::Ready));
            assert_eq!(
                source.data().map(|d| d.snapshot()),
                Some(json!({"items": [1, 2, 3]}))
            );
        })
        .await;
    }

    #[tokio::test]
    async fn missing_location_fails_the_load() {
        let dir = tempfile::tempdir().unwrap();
        let transport: Rc<dyn Transport> = Rc::new(FsTransport::new(dir.path()));

        run_local(async move {
            let source = RemoteSource::new("remote", "nope.json", transport, SourceOptions::default());
            let settled = source.state().when_settled();
            source.execute(false);
            assert_eq!(settled.await, Err(Status::LoadFailed));
            assert!(source.has_failed());
        })
        .await;
    }

    #[tokio::test]
    async fn save_writes_current_data_and_returns_to_ready() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("doc.json"), r#"{"n": 1}"#).unwrap();
        let transport: Rc<dyn Transport> = Rc::new(FsTransport::new(dir.path()));
        let path = dir.path().join("doc.json");

        run_local(async move {
            let source = RemoteSource::new("remote", "doc.json", transport, SourceOptions::default());
            let settled = source.state().when_settled();
            source.execute(false);
            settled.await.unwrap();

            source.write("/n", json!(2), true).unwrap();
            assert!(!source.is_dirty());
            assert!(source.save());
            assert_eq!(source.status(), Status::Saving);
            assert!(!source.save());

            for _ in 0..50 {
                if source.status() == Status::Ready {
                    break;
                }
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            }
            settle().await;
            assert_eq!(source.status(), Status::Ready);
            let written: serde_json::Value =
                serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
            assert_eq!(written, json!({"n": 2}));
        })
        .await;
    }

    #[tokio::test]
    async fn failed_save_ends_the_lifecycle() {
        run_local(async {
            let source = RemoteSource::new(
                "remote",
                "doc.json",
                Rc::new(ReadOnlyTransport),
                SourceOptions::default(),
            );
            let settled = source.state().when_settled();
            source.execute(false);
            assert_eq!(settled.await, Ok(Status::Ready));

            let saved = source.state().next_settled();
            assert!(source.save());
            assert_eq!(saved.await, Err(Status::SaveFailed));
            assert!(source.has_failed());

            assert!(!source.save());
            source.execute(true);
            settle().await;
            assert_eq!(source.status(), Status::SaveFailed);
        })
        .await;
    }
}
