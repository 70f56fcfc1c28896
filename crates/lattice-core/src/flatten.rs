//! Depth-first preorder JSON flattener (§4.3).
//!
//! Produces a lazy sequence of leaf records: each primitive value in the
//! document tree becomes one [`FlattenedValue`] carrying its dot path, its
//! position within the nearest enclosing array (if any), its datatype, and
//! its lexical string form.

use serde_json::Value;

use crate::model::datatype::DataType;

/// One leaf observation from a document tree.
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedValue {
    pub path: String,
    pub position: Option<i64>,
    pub datatype: DataType,
    /// `None` encodes a JSON `null` leaf.
    pub value: Option<String>,
}

/// Synthetic root path used when the document's top level is not an object.
pub const ROOT_PATH: &str = "$";

enum Frame<'a> {
    /// Visit `value` with the given path prefix and enclosing-array position.
    Visit {
        value: &'a Value,
        path: String,
        position: Option<i64>,
    },
}

/// Lazily walks a JSON value, yielding [`FlattenedValue`] records in
/// depth-first, key-insertion preorder.
///
/// Implemented as an explicit work stack rather than a recursive function
/// collecting into a `Vec`, so traversal happens incrementally as the
/// caller pulls from the iterator.
pub struct Flattener<'a> {
    stack: Vec<Frame<'a>>,
}

impl<'a> Flattener<'a> {
    pub fn new(root: &'a Value) -> Self {
        let path = if root.is_object() {
            String::new()
        } else {
            ROOT_PATH.to_string()
        };
        Self {
            stack: vec![Frame::Visit {
                value: root,
                path,
                position: None,
            }],
        }
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn primitive_record(value: &Value, path: String, position: Option<i64>) -> FlattenedValue {
    match value {
        Value::String(s) => FlattenedValue {
            path,
            position,
            datatype: DataType::String,
            value: Some(s.clone()),
        },
        Value::Number(n) => {
            let datatype = DataType::of_number(n);
            FlattenedValue {
                path,
                position,
                datatype,
                value: Some(n.to_string()),
            }
        }
        Value::Bool(b) => FlattenedValue {
            path,
            position,
            datatype: DataType::Boolean,
            value: Some(if *b { "true".into() } else { "false".into() }),
        },
        Value::Null => FlattenedValue {
            path,
            position,
            datatype: DataType::Null,
            value: None,
        },
        Value::Object(_) | Value::Array(_) => unreachable!("containers handled separately"),
    }
}

impl<'a> Iterator for Flattener<'a> {
    type Item = FlattenedValue;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Frame::Visit {
                value,
                path,
                position,
            } = self.stack.pop()?;

            match value {
                Value::Object(map) => {
                    // Push children in reverse so they pop in original
                    // key-insertion order.
                    for (name, child) in map.iter().rev() {
                        self.stack.push(Frame::Visit {
                            value: child,
                            path: join_path(&path, name),
                            position,
                        });
                    }
                }
                Value::Array(items) => {
                    for (i, child) in items.iter().enumerate().rev() {
                        self.stack.push(Frame::Visit {
                            value: child,
                            path: path.clone(),
                            position: Some(i as i64),
                        });
                    }
                }
                primitive => return Some(primitive_record(primitive, path, position)),
            }
        }
    }
}

/// Flattens a document into an owned `Vec`, for callers that don't need
/// laziness.
pub fn flatten(root: &Value) -> Vec<FlattenedValue> {
    Flattener::new(root).collect()
}
