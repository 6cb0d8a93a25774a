// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Lifecycle statuses shared by every executable in the engine.
//!
//! A status is a plain value compared by identity. Which status counts as
//! "ready" and which count as "failed" is decided by the kind of executable
//! that owns it, not by the status itself; the families below only group them
//! for logging and documentation.

use std::fmt;

/// Lifecycle stage of an executable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Status {
    /// Never initialised.
    #[default]
    Null,
    Initialized,
    Loading,
    /// Data is present but announced model updaters have not been added yet.
    Loaded,
    ChainLoaded,
    WaitingForParameters,
    Transforming,
    /// Ready status of chain orchestrators.
    Transformed,
    /// Ready status of plain data sources.
    Ready,
    Saving,
    Saved,
    RefreshingModelUpdaters,
    RefreshingModelUpdatersCausedByExecute,
    WaitingForUncommittedChanges,
    LoadFailed,
    ChainLoadingFailed,
    ChainStylesheetLoadingFailed,
    TransformFailed,
    SaveFailed,
}

/// Grouping of statuses by the role they play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFamily {
    Lifecycle,
    WritePath,
    Failure,
    ModelUpdater,
    WriteCoalescing,
}

impl Status {
    pub fn family(&self) -> StatusFamily {
        match self {
            Self::Null
            | Self::Initialized
            | Self::Loading
            | Self::Loaded
            | Self::ChainLoaded
            | Self::WaitingForParameters
            | Self::Transforming
            | Self::Transformed => StatusFamily::Lifecycle,
            Self::Ready | Self::Saving | Self::Saved => StatusFamily::WritePath,
            Self::LoadFailed
            | Self::ChainLoadingFailed
            | Self::ChainStylesheetLoadingFailed
            | Self::TransformFailed
            | Self::SaveFailed => StatusFamily::Failure,
            Self::RefreshingModelUpdaters | Self::RefreshingModelUpdatersCausedByExecute => {
                StatusFamily::ModelUpdater
            }
            Self::WaitingForUncommittedChanges => StatusFamily::WriteCoalescing,
        }
    }

    /// True for statuses from which `execute()` starts a fresh run.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Null | Self::Initialized)
    }

    /// Stable snake_case code used in logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Initialized => "initialized",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::ChainLoaded => "chain_loaded",
            Self::WaitingForParameters => "waiting_for_parameters",
            Self::Transforming => "transforming",
            Self::Transformed => "transformed",
            Self::Ready => "ready",
            Self::Saving => "saving",
            Self::Saved => "saved",
            Self::RefreshingModelUpdaters => "refreshing_model_updaters",
            Self::RefreshingModelUpdatersCausedByExecute => {
                "refreshing_model_updaters_caused_by_execute"
            }
            Self::WaitingForUncommittedChanges => "waiting_for_uncommitted_changes",
            Self::LoadFailed => "load_failed",
            Self::ChainLoadingFailed => "chain_loading_failed",
            Self::ChainStylesheetLoadingFailed => "chain_stylesheet_loading_failed",
            Self::TransformFailed => "transform_failed",
            Self::SaveFailed => "save_failed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A single recorded transition, handed to status listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub old: Status,
    pub new: Status,
}

/// Which transitions a status listener wants to hear about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    /// Every transition (a "global" listener).
    Any,
    /// Only transitions into this status.
    Only(Status),
    /// Transitions into the owner's ready status or any of its failure statuses.
    Settled,
}
