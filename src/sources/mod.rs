// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Concrete data sources and the transport they load through.

pub mod remote;
pub mod static_source;
pub mod transport;

pub use remote::RemoteSource;
pub use static_source::StaticSource;
pub use transport::{FsTransport, Transport};
