// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::engine::Document;

/// Serialized sizes up to this many bytes are kept verbatim.
pub const DEFAULT_FINGERPRINT_THRESHOLD: usize = 96;

/// Cheap comparable summary of the sub-tree a tracked change listener watches.
///
/// Small sub-trees are kept as their serialized text, larger ones are reduced
/// to a 64-bit hash of it.
///
/// # Example
///
/// ```rust
/// use chainwood::engine::Document;
/// use chainwood::utils::Fingerprint;
/// use serde_json::json;
///
/// let doc = Document::new(json!({"filters": {"region": "emea"}}));
/// let before = Fingerprint::of(Some(&doc), "/filters", 96);
/// doc.set("/filters/region", json!("apac")).unwrap();
/// assert_ne!(before, Fingerprint::of(Some(&doc), "/filters", 96));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fingerprint {
    Verbatim(String),
    Hashed(u64),
    /// No document, or nothing at the pointer.
    Absent,
}

impl Fingerprint {
    pub fn of(document: Option<&Document>, pointer: &str, threshold: usize) -> Self {
        let Some(document) = document else {
            return Self::Absent;
        };
        let value = document.borrow();
        let Some(tracked) = value.pointer(pointer) else {
            return Self::Absent;
        };
        // serde_json keeps object keys sorted, so equal trees serialize equally.
        let text = tracked.to_string();
        if text.len() <= threshold {
            Self::Verbatim(text)
        } else {
            let mut hasher = DefaultHasher::new();
            text.hash(&mut hasher);
            Self::Hashed(hasher.finish())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn small_values_are_verbatim() {
        let doc = Document::new(json!({"a": {"b": 1}}));
        assert_eq!(
            Fingerprint::of(Some(&doc), "/a", DEFAULT_FINGERPRINT_THRESHOLD),
            Fingerprint::Verbatim(r#"{"b":1}"#.to_string())
        );
    }

    #[test]
    fn large_values_are_hashed_and_stable() {
        let rows: Vec<u32> = (0..100).collect();
        let doc = Document::new(json!({ "rows": rows }));
        let first = Fingerprint::of(Some(&doc), "/rows", DEFAULT_FINGERPRINT_THRESHOLD);
        let second = Fingerprint::of(Some(&doc), "/rows", DEFAULT_FINGERPRINT_THRESHOLD);
        assert!(matches!(first, Fingerprint::Hashed(_)));
        assert_eq!(first, second);

        doc.set("/rows/0", json!(42)).unwrap();
        assert_ne!(
            first,
            Fingerprint::of(Some(&doc), "/rows", DEFAULT_FINGERPRINT_THRESHOLD)
        );
    }

    #[test]
    fn missing_data_or_pointer_is_absent() {
        let doc = Document::new(json!({}));
        assert_eq!(Fingerprint::of(None, "/a", 96), Fingerprint::Absent);
        assert_eq!(Fingerprint::of(Some(&doc), "/a", 96), Fingerprint::Absent);
    }
}
