//! Schema validation under a collection's enforcement mode (§4.5).
//!
//! Every applicable rule is checked and every failure recorded; unlike a
//! single-struct invariant check, a document can fail several rules at
//! once and the caller needs to see all of them.

use std::collections::HashMap;

use serde_json::Value;

use crate::flatten::flatten;
use crate::model::collection::EnforcementMode;
use crate::model::constraint::FieldConstraint;
use crate::model::datatype::DataType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorCode {
    MissingRequiredField,
    UnexpectedField,
    NullNotAllowed,
    TypeMismatch,
    PatternMismatch,
    ValueTooSmall,
    ValueTooLarge,
    StringTooShort,
    StringTooLong,
    ArrayTooShort,
    ArrayTooLong,
    ValueNotAllowed,
    InvalidArrayElement,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldValidationError {
    pub field_path: String,
    pub code: ValidationErrorCode,
    pub message: String,
    pub actual: Option<String>,
    pub expected: Option<String>,
}

impl FieldValidationError {
    fn new(
        field_path: impl Into<String>,
        code: ValidationErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field_path: field_path.into(),
            code,
            message: message.into(),
            actual: None,
            expected: None,
        }
    }

    fn actual(mut self, v: impl Into<String>) -> Self {
        self.actual = Some(v.into());
        self
    }

    fn expected(mut self, v: impl Into<String>) -> Self {
        self.expected = Some(v.into());
        self
    }
}

/// Validates `doc` against `constraints` under `mode`, accumulating every
/// failing rule rather than stopping at the first one.
pub fn validate(
    doc: &Value,
    mode: EnforcementMode,
    constraints: &[FieldConstraint],
) -> Result<(), Vec<FieldValidationError>> {
    if mode == EnforcementMode::None {
        return Ok(());
    }

    let by_path: HashMap<&str, &FieldConstraint> =
        constraints.iter().map(|c| (c.field_path.as_str(), c)).collect();

    let leaves = flatten(doc);
    let mut by_leaf_path: HashMap<&str, Vec<&crate::flatten::FlattenedValue>> = HashMap::new();
    for leaf in &leaves {
        by_leaf_path.entry(leaf.path.as_str()).or_default().push(leaf);
    }

    let mut errors = Vec::new();

    // 1 & 2: presence and unexpected-field checks run over the union of
    // constrained paths and observed paths. Presence is checked against the
    // raw document, not `by_leaf_path` alone: `flatten()` emits no leaves for
    // an empty array or object, which would otherwise make a present-but-empty
    // container indistinguishable from an absent field.
    for constraint in constraints {
        let present = path_present(doc, &constraint.field_path);
        if constraint.required && !present {
            errors.push(
                FieldValidationError::new(
                    &constraint.field_path,
                    ValidationErrorCode::MissingRequiredField,
                    format!("required field `{}` is missing", constraint.field_path),
                )
                .expected("present"),
            );
        }
    }

    if mode == EnforcementMode::Strict {
        for path in by_leaf_path.keys() {
            if !by_path.contains_key(path) {
                errors.push(FieldValidationError::new(
                    *path,
                    ValidationErrorCode::UnexpectedField,
                    format!("field `{path}` is not declared in the collection's constraints"),
                ));
            }
        }
    }

    // Remaining rules apply per observed value, for constrained fields only.
    // Grouped by path (not per-leaf) because an array field's elements all
    // flatten to multiple leaves sharing one path, and rule 7's array
    // length check needs the whole group. A field with no leaves but that is
    // present in the raw document (an empty array or object) still runs
    // through `validate_field` with an empty group, so an empty array is
    // checked at length zero rather than skipped entirely.
    let empty_group: Vec<&crate::flatten::FlattenedValue> = Vec::new();
    for (&path, &constraint) in by_path.iter() {
        let group = match by_leaf_path.get(path) {
            Some(group) => group,
            None if path_present(doc, path) => &empty_group,
            None => continue,
        };
        validate_field(path, group, constraint, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Whether `path` resolves to at least one value in the raw document,
/// independent of `flatten()`'s leaf stream. An empty array or object is
/// present (it resolves to the container itself); only a genuinely absent
/// key, or a path walking through an empty array of objects, is not.
fn path_present(doc: &Value, path: &str) -> bool {
    if path.is_empty() || path == crate::flatten::ROOT_PATH {
        return true;
    }
    let mut current: Vec<&Value> = vec![doc];
    for segment in path.split('.') {
        let mut next = Vec::new();
        for v in &current {
            match v {
                Value::Object(map) => {
                    if let Some(child) = map.get(segment) {
                        next.push(child);
                    }
                }
                Value::Array(items) => {
                    for item in items {
                        if let Value::Object(map) = item {
                            if let Some(child) = map.get(segment) {
                                next.push(child);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        if next.is_empty() {
            return false;
        }
        current = next;
    }
    true
}

fn validate_field(
    path: &str,
    leaves: &[&crate::flatten::FlattenedValue],
    constraint: &FieldConstraint,
    errors: &mut Vec<FieldValidationError>,
) {
    if let DataType::Array(expected_elem) = &constraint.data_type {
        // 7: array length is the element count.
        let count = leaves.len() as i64;
        if let Some(min) = constraint.min_length {
            if count < min {
                errors.push(FieldValidationError::new(
                    path,
                    ValidationErrorCode::ArrayTooShort,
                    format!("field `{path}` has {count} elements, minimum is {min}"),
                ));
            }
        }
        if let Some(max) = constraint.max_length {
            if count > max {
                errors.push(FieldValidationError::new(
                    path,
                    ValidationErrorCode::ArrayTooLong,
                    format!("field `{path}` has {count} elements, maximum is {max}"),
                ));
            }
        }

        let container_elem: &DataType = expected_elem;
        let expected_elem = constraint.array_element_type.as_ref().unwrap_or(container_elem);
        for leaf in leaves {
            if leaf.value.is_none() {
                if !constraint.nullable {
                    errors.push(FieldValidationError::new(
                        path,
                        ValidationErrorCode::NullNotAllowed,
                        format!("field `{path}` may not contain a null element"),
                    ));
                }
                continue;
            }
            // 9: array element type.
            if &leaf.datatype != expected_elem {
                errors.push(
                    FieldValidationError::new(
                        path,
                        ValidationErrorCode::InvalidArrayElement,
                        format!(
                            "field `{path}` elements must be {expected_elem}, found {}",
                            leaf.datatype
                        ),
                    )
                    .actual(leaf.datatype.to_string())
                    .expected(expected_elem.to_string()),
                );
            }
        }
        return;
    }

    // Scalar field: exactly one leaf expected at this path.
    for leaf in leaves {
        validate_scalar_leaf(leaf, constraint, errors);
    }
}

fn validate_scalar_leaf(
    leaf: &crate::flatten::FlattenedValue,
    constraint: &FieldConstraint,
    errors: &mut Vec<FieldValidationError>,
) {
    // 3: null.
    if leaf.value.is_none() {
        if !constraint.nullable {
            errors.push(FieldValidationError::new(
                &leaf.path,
                ValidationErrorCode::NullNotAllowed,
                format!("field `{}` may not be null", leaf.path),
            ));
        }
        return;
    }
    let value = leaf.value.as_deref().unwrap();

    // 4: type, no coercion.
    if leaf.datatype != constraint.data_type {
        errors.push(
            FieldValidationError::new(
                &leaf.path,
                ValidationErrorCode::TypeMismatch,
                format!(
                    "field `{}` expected type {} but found {}",
                    leaf.path, constraint.data_type, leaf.datatype
                ),
            )
            .actual(leaf.datatype.to_string())
            .expected(constraint.data_type.to_string()),
        );
        return;
    }

    // 5: regex, strings only.
    if constraint.data_type == DataType::String {
        if let Some(pattern) = &constraint.regex_pattern {
            match regex::Regex::new(pattern) {
                Ok(re) if !re.is_match(value) => {
                    errors.push(
                        FieldValidationError::new(
                            &leaf.path,
                            ValidationErrorCode::PatternMismatch,
                            format!("field `{}` does not match pattern `{pattern}`", leaf.path),
                        )
                        .actual(value),
                    );
                }
                _ => {}
            }
        }
    }

    // 6: numeric bounds.
    if matches!(constraint.data_type, DataType::Integer | DataType::Number) {
        if let Ok(n) = value.parse::<f64>() {
            if let Some(min) = constraint.min_value {
                if n < min {
                    errors.push(
                        FieldValidationError::new(
                            &leaf.path,
                            ValidationErrorCode::ValueTooSmall,
                            format!("field `{}` value {n} is below minimum {min}", leaf.path),
                        )
                        .actual(value),
                    );
                }
            }
            if let Some(max) = constraint.max_value {
                if n > max {
                    errors.push(
                        FieldValidationError::new(
                            &leaf.path,
                            ValidationErrorCode::ValueTooLarge,
                            format!("field `{}` value {n} is above maximum {max}", leaf.path),
                        )
                        .actual(value),
                    );
                }
            }
        }
    }

    // 7: length, strings.
    if constraint.data_type == DataType::String {
        let len = value.chars().count() as i64;
        if let Some(min) = constraint.min_length {
            if len < min {
                errors.push(FieldValidationError::new(
                    &leaf.path,
                    ValidationErrorCode::StringTooShort,
                    format!("field `{}` has length {len}, minimum is {min}", leaf.path),
                ));
            }
        }
        if let Some(max) = constraint.max_length {
            if len > max {
                errors.push(FieldValidationError::new(
                    &leaf.path,
                    ValidationErrorCode::StringTooLong,
                    format!("field `{}` has length {len}, maximum is {max}", leaf.path),
                ));
            }
        }
    }

    // 8: allowed values.
    if let Some(allowed) = &constraint.allowed_values {
        if !allowed.iter().any(|a| a == value) {
            errors.push(
                FieldValidationError::new(
                    &leaf.path,
                    ValidationErrorCode::ValueNotAllowed,
                    format!("field `{}` value `{value}` is not an allowed value", leaf.path),
                )
                .actual(value),
            );
        }
    }
}
