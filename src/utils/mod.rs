// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod fingerprint;

pub use fingerprint::{Fingerprint, DEFAULT_FINGERPRINT_THRESHOLD};
