//! Schema extraction: walking a document to produce an ordered, deduplicated
//! element list plus its fingerprint (§4.4).

use std::collections::HashMap;

use serde_json::Value;

use crate::hash::schema_fingerprint;
use crate::model::datatype::DataType;

/// The pre-id form of a [`crate::model::schema::SchemaElement`].
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaElementDraft {
    pub position: i32,
    pub key: String,
    pub datatype: DataType,
    pub nullable: bool,
}

/// Result of extracting a schema from one document.
#[derive(Debug, Clone)]
pub struct SchemaExtraction {
    pub elements: Vec<SchemaElementDraft>,
    pub fingerprint: String,
}

/// Extracts the ordered element list and fingerprint for a document.
///
/// Leaf paths get their own element. Array-of-object containers additionally
/// get an `array<object>` element at the container path, for schema
/// fidelity, without implying their own index table (§4.4, §9).
pub fn extract(doc: &Value) -> SchemaExtraction {
    let root_path = if doc.is_object() {
        String::new()
    } else {
        crate::flatten::ROOT_PATH.to_string()
    };

    let mut order: Vec<String> = Vec::new();
    let mut datatypes: HashMap<String, DataType> = HashMap::new();
    let mut nullable: HashMap<String, bool> = HashMap::new();

    walk(doc, &root_path, &mut order, &mut datatypes, &mut nullable);

    let mut elements = Vec::with_capacity(order.len());
    for (position, key) in order.into_iter().enumerate() {
        let datatype = datatypes.remove(&key).expect("recorded during walk");
        let is_nullable = nullable.get(&key).copied().unwrap_or(false);
        elements.push(SchemaElementDraft {
            position: position as i32,
            key,
            datatype,
            nullable: is_nullable,
        });
    }

    let rendered: Vec<(String, String)> = elements
        .iter()
        .map(|e| (e.key.clone(), e.datatype.to_string()))
        .collect();
    let fingerprint =
        schema_fingerprint(rendered.iter().map(|(k, t)| (k.as_str(), t.as_str())));

    SchemaExtraction {
        elements,
        fingerprint,
    }
}

fn record(
    path: &str,
    datatype: DataType,
    is_null: bool,
    order: &mut Vec<String>,
    datatypes: &mut HashMap<String, DataType>,
    nullable: &mut HashMap<String, bool>,
) {
    if !datatypes.contains_key(path) {
        order.push(path.to_string());
        datatypes.insert(path.to_string(), datatype);
    }
    if is_null {
        nullable.insert(path.to_string(), true);
    } else {
        nullable.entry(path.to_string()).or_insert(false);
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn walk(
    value: &Value,
    path: &str,
    order: &mut Vec<String>,
    datatypes: &mut HashMap<String, DataType>,
    nullable: &mut HashMap<String, bool>,
) {
    match value {
        Value::Object(map) => {
            for (name, child) in map.iter() {
                walk(child, &join_path(path, name), order, datatypes, nullable);
            }
        }
        Value::Array(items) => {
            if items.iter().any(|v| v.is_object()) {
                record(
                    path,
                    DataType::Array(Box::new(DataType::Object)),
                    false,
                    order,
                    datatypes,
                    nullable,
                );
            }
            for child in items {
                walk(child, path, order, datatypes, nullable);
            }
        }
        Value::Null => record(path, DataType::Null, true, order, datatypes, nullable),
        other => {
            let datatype = DataType::of_value(other);
            record(path, datatype, false, order, datatypes, nullable);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_document_has_no_elements() {
        let ex = extract(&json!({}));
        assert!(ex.elements.is_empty());
    }

    #[test]
    fn simple_object_elements_in_insertion_order() {
        let ex = extract(&json!({"a": 1, "b": "x"}));
        assert_eq!(ex.elements.len(), 2);
        assert_eq!(ex.elements[0].key, "a");
        assert_eq!(ex.elements[0].datatype, DataType::Integer);
        assert_eq!(ex.elements[1].key, "b");
        assert_eq!(ex.elements[1].datatype, DataType::String);
    }

    #[test]
    fn preserves_key_insertion_order_over_alphabetical() {
        let ex = extract(&json!({"zebra": 1, "apple": 2}));
        let keys: Vec<&str> = ex.elements.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["zebra", "apple"]);
    }

    #[test]
    fn fingerprint_is_order_independent_across_documents() {
        let a = extract(&json!({"a": 1, "b": "x"}));
        let b = extract(&json!({"b": "y", "a": 2}));
        assert_eq!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn array_of_objects_gets_container_element_plus_leaves() {
        let ex = extract(&json!({"People": [{"Name": "A"}, {"Name": "B"}]}));
        let keys: Vec<&str> = ex.elements.iter().map(|e| e.key.as_str()).collect();
        assert!(keys.contains(&"People"));
        assert!(keys.contains(&"People.Name"));
        let container = ex.elements.iter().find(|e| e.key == "People").unwrap();
        assert_eq!(container.datatype, DataType::Array(Box::new(DataType::Object)));
    }

    #[test]
    fn nullable_true_if_any_occurrence_is_null() {
        let ex = extract(&json!({"items": [{"v": 1}, {"v": null}]}));
        let v = ex.elements.iter().find(|e| e.key == "items.v").unwrap();
        assert!(v.nullable);
    }

    #[test]
    fn root_scalar_uses_synthetic_path() {
        let ex = extract(&json!("hello"));
        assert_eq!(ex.elements.len(), 1);
        assert_eq!(ex.elements[0].key, "$");
    }
}
