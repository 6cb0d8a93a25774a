// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Shared JSON documents flowing between sources and processors.
//!
//! A [`Document`] is a handle: cloning it shares the underlying tree, and
//! [`Document::ptr_eq`] tells whether two handles point at the same tree.
//! [`Document::deep_copy`] is the only way to get an independent tree.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::errors::DocumentError;

#[derive(Clone)]
pub struct Document(Rc<RefCell<Value>>);

impl Document {
    pub fn new(value: Value) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    /// Whether both handles share the same tree.
    pub fn ptr_eq(a: &Document, b: &Document) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    pub fn deep_copy(&self) -> Document {
        Document::new(self.0.borrow().clone())
    }

    pub fn borrow(&self) -> Ref<'_, Value> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Value> {
        self.0.borrow_mut()
    }

    /// Owned copy of the current tree.
    pub fn snapshot(&self) -> Value {
        self.0.borrow().clone()
    }

    /// Owned copy of the value at `pointer`, if present.
    pub fn get(&self, pointer: &str) -> Option<Value> {
        self.0.borrow().pointer(pointer).cloned()
    }

    /// Write `value` at `pointer`, creating intermediate objects as needed.
    ///
    /// The empty pointer replaces the whole tree; `-` appends to an array.
    pub fn set(&self, pointer: &str, value: Value) -> Result<(), DocumentError> {
        let tokens = parse_pointer(pointer)?;
        let mut root = self.0.borrow_mut();
        let Some((last, parents)) = tokens.split_last() else {
            *root = value;
            return Ok(());
        };

        let mut current: &mut Value = &mut root;
        for token in parents {
            if current.is_null() {
                *current = Value::Object(Map::new());
            }
            current = match current {
                Value::Object(map) => map
                    .entry(token.clone())
                    .or_insert_with(|| Value::Object(Map::new())),
                Value::Array(items) => {
                    let index = array_index(pointer, token, items.len())?;
                    &mut items[index]
                }
                _ => {
                    return Err(DocumentError::NotAContainer {
                        pointer: pointer.to_string(),
                    })
                }
            };
        }

        if current.is_null() {
            *current = Value::Object(Map::new());
        }
        match current {
            Value::Object(map) => {
                map.insert(last.clone(), value);
                Ok(())
            }
            Value::Array(items) if last == "-" => {
                items.push(value);
                Ok(())
            }
            Value::Array(items) => {
                let index = array_index(pointer, last, items.len())?;
                items[index] = value;
                Ok(())
            }
            _ => Err(DocumentError::NotAContainer {
                pointer: pointer.to_string(),
            }),
        }
    }

    /// Remove and return the value at `pointer`. Removing the root resets it to null.
    pub fn remove(&self, pointer: &str) -> Result<Option<Value>, DocumentError> {
        let tokens = parse_pointer(pointer)?;
        let mut root = self.0.borrow_mut();
        let Some((last, parents)) = tokens.split_last() else {
            return Ok(Some(std::mem::take(&mut *root)));
        };

        let mut current: &mut Value = &mut root;
        for token in parents {
            current = match current {
                Value::Object(map) => match map.get_mut(token) {
                    Some(next) => next,
                    None => return Ok(None),
                },
                Value::Array(items) => {
                    let Ok(index) = array_index(pointer, token, items.len()) else {
                        return Ok(None);
                    };
                    &mut items[index]
                }
                _ => return Ok(None),
            };
        }

        Ok(match current {
            Value::Object(map) => map.remove(last),
            Value::Array(items) => match array_index(pointer, last, items.len()) {
                Ok(index) => Some(items.remove(index)),
                Err(_) => None,
            },
            _ => None,
        })
    }
}

impl From<Value> for Document {
    fn from(value: Value) -> Self {
        Document::new(value)
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        Document::ptr_eq(self, other) || *self.0.borrow() == *other.0.borrow()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Document").field(&*self.0.borrow()).finish()
    }
}

fn parse_pointer(pointer: &str) -> Result<Vec<String>, DocumentError> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = pointer.strip_prefix('/') else {
        return Err(DocumentError::InvalidPointer {
            pointer: pointer.to_string(),
        });
    };
    Ok(rest
        .split('/')
        .map(|token| token.replace("~1", "/").replace("~0", "~"))
        .collect())
}

fn array_index(pointer: &str, token: &str, len: usize) -> Result<usize, DocumentError> {
    match token.parse::<usize>() {
        Ok(index) if index < len => Ok(index),
        _ => Err(DocumentError::InvalidIndex {
            pointer: pointer.to_string(),
            token: token.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clones_share_the_tree_and_deep_copies_do_not() {
        let doc = Document::new(json!({"a": 1}));
        let shared = doc.clone();
        let copy = doc.deep_copy();

        assert!(Document::ptr_eq(&doc, &shared));
        assert!(!Document::ptr_eq(&doc, &copy));
        assert_eq!(doc, copy);

        copy.set("/a", json!(2)).unwrap();
        assert_eq!(doc.get("/a"), Some(json!(1)));
    }

    #[test]
    fn set_creates_intermediate_objects() {
        let doc = Document::new(Value::Null);
        doc.set("/filters/region", json!("emea")).unwrap();
        assert_eq!(doc.snapshot(), json!({"filters": {"region": "emea"}}));
    }

    #[test]
    fn set_handles_arrays_and_escaped_tokens() {
        let doc = Document::new(json!({"rows": [1, 2], "a/b": {}}));
        doc.set("/rows/-", json!(3)).unwrap();
        doc.set("/rows/0", json!(10)).unwrap();
        doc.set("/a~1b/c", json!(true)).unwrap();

        assert_eq!(doc.get("/rows"), Some(json!([10, 2, 3])));
        assert_eq!(doc.get("/a~1b/c"), Some(json!(true)));
        assert!(matches!(
            doc.set("/rows/9", json!(0)),
            Err(DocumentError::InvalidIndex { .. })
        ));
    }

    #[test]
    fn set_rejects_scalars_and_bad_pointers() {
        let doc = Document::new(json!({"n": 5}));
        assert!(matches!(
            doc.set("/n/x", json!(1)),
            Err(DocumentError::NotAContainer { .. })
        ));
        assert!(matches!(
            doc.set("n", json!(1)),
            Err(DocumentError::InvalidPointer { .. })
        ));
    }

    #[test]
    fn remove_returns_the_removed_value() {
        let doc = Document::new(json!({"a": {"b": 1, "c": 2}, "list": ["x", "y"]}));
        assert_eq!(doc.remove("/a/b").unwrap(), Some(json!(1)));
        assert_eq!(doc.remove("/list/0").unwrap(), Some(json!("x")));
        assert_eq!(doc.remove("/missing/deep").unwrap(), None);
        assert_eq!(doc.snapshot(), json!({"a": {"c": 2}, "list": ["y"]}));
    }
}
