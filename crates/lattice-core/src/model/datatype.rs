//! The closed datatype tag set used throughout the schema and index layers.
//!
//! A genuine tagged union rather than an erased "any" (§9: "Reflection /
//! dynamic typing" -- use exhaustive pattern matching, don't erase type
//! tags). `Array` recurses into its element type so `array<object>`,
//! `array<array<string>>`, etc. round-trip exactly as §3 describes.

use std::fmt;

/// One of the closed set of value shapes a JSON leaf (or array container)
/// can take.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    String,
    Integer,
    Number,
    Boolean,
    Null,
    Object,
    Array(Box<DataType>),
}

impl DataType {
    /// Classifies a JSON scalar. Numbers without a fractional part are
    /// `Integer`, otherwise `Number`, per §4.3.
    pub fn of_number(n: &serde_json::Number) -> Self {
        if n.is_i64() || n.is_u64() {
            DataType::Integer
        } else if let Some(f) = n.as_f64() {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                DataType::Integer
            } else {
                DataType::Number
            }
        } else {
            DataType::Number
        }
    }

    pub fn of_value(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => DataType::Null,
            serde_json::Value::Bool(_) => DataType::Boolean,
            serde_json::Value::Number(n) => Self::of_number(n),
            serde_json::Value::String(_) => DataType::String,
            serde_json::Value::Array(_) => DataType::Array(Box::new(DataType::Null)),
            serde_json::Value::Object(_) => DataType::Object,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::String => f.write_str("string"),
            DataType::Integer => f.write_str("integer"),
            DataType::Number => f.write_str("number"),
            DataType::Boolean => f.write_str("boolean"),
            DataType::Null => f.write_str("null"),
            DataType::Object => f.write_str("object"),
            DataType::Array(inner) => write!(f, "array<{inner}>"),
        }
    }
}

impl std::str::FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(DataType::String),
            "integer" => Ok(DataType::Integer),
            "number" => Ok(DataType::Number),
            "boolean" => Ok(DataType::Boolean),
            "null" => Ok(DataType::Null),
            "object" => Ok(DataType::Object),
            other => {
                if let Some(inner) = other.strip_prefix("array<").and_then(|r| r.strip_suffix('>'))
                {
                    Ok(DataType::Array(Box::new(inner.parse()?)))
                } else {
                    Err(format!("unknown datatype tag: {other:?}"))
                }
            }
        }
    }
}

impl serde::Serialize for DataType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for DataType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
