//! # Payload Validation
//!
//! Request bodies arrive as loosely-typed JSON. The helpers here check individual fields
//! and report the first problem as a [`ValidationError`] naming the offending field. The
//! resource modules compose them into fully-validated payload structs, so controllers
//! never look at raw JSON after validation succeeds.
//!
//! ```rust
//! use kitchen::{ValidationError, validate};
//! use serde_json::json;
//!
//! let body = json!({"tags": ["quick", 3]});
//! let object = validate::require_object(&body).unwrap();
//! let err = validate::string_list("tags", &object["tags"]).unwrap_err();
//! assert_eq!(err, ValidationError::NotStringList { field: "tags".into() });
//! assert_eq!(err.field(), Some("tags"));
//! ```

use serde_json::{Map, Value};

/// A rejected field or payload.
///
/// The `Display` form is the message returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The request body is not a JSON object.
    #[error("Request body must be a JSON object.")]
    NotAnObject,
    /// A required string field is missing, not a string, or blank.
    #[error("Field '{field}' is required and must be a non-empty string.")]
    MissingRequired {
        /// The offending field.
        field: String,
    },
    /// An optional string field was supplied but is not a non-blank string.
    #[error("Field '{field}' must be a non-empty string if provided.")]
    EmptyIfProvided {
        /// The offending field.
        field: String,
    },
    /// A string field in a partial update is not a non-blank string.
    #[error("Field '{field}' must be a non-empty string.")]
    Empty {
        /// The offending field.
        field: String,
    },
    /// A field that must hold a list of strings holds something else.
    #[error("Field '{field}' must be a list of strings.")]
    NotStringList {
        /// The offending field.
        field: String,
    },
    /// A field that must hold a string (or null) holds something else.
    #[error("Field '{field}' must be a string.")]
    NotString {
        /// The offending field.
        field: String,
    },
    /// A partial update names a field outside the allow-list.
    #[error("Field '{field}' is not updatable.")]
    NotUpdatable {
        /// The offending field.
        field: String,
    },
    /// A string somewhere under the field holds a NUL character.
    #[error("Field '{field}' must not contain NUL characters.")]
    ContainsNul {
        /// The offending field.
        field: String,
    },
    /// A partial update supplied no fields at all.
    #[error("No valid fields provided to update.")]
    NoFields,
}

impl ValidationError {
    /// The field this error is about, if it concerns a single field.
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::NotAnObject | ValidationError::NoFields => None,
            ValidationError::MissingRequired { field }
            | ValidationError::EmptyIfProvided { field }
            | ValidationError::Empty { field }
            | ValidationError::NotStringList { field }
            | ValidationError::NotString { field }
            | ValidationError::NotUpdatable { field }
            | ValidationError::ContainsNul { field } => Some(field),
        }
    }
}

/// Returns the payload as an object or rejects it.
///
/// PostgreSQL `jsonb` cannot hold NUL, so any string containing one is rejected here for
/// every field.
pub fn require_object(payload: &Value) -> Result<&Map<String, Value>, ValidationError> {
    let object = payload.as_object().ok_or(ValidationError::NotAnObject)?;
    match object.iter().find(|(_, value)| contains_nul(value)) {
        Some((key, _)) => Err(ValidationError::ContainsNul { field: key.clone() }),
        None => Ok(object),
    }
}

fn contains_nul(value: &Value) -> bool {
    match value {
        Value::String(s) => s.contains('\0'),
        Value::Array(items) => items.iter().any(contains_nul),
        Value::Object(object) => object
            .iter()
            .any(|(key, value)| key.contains('\0') || contains_nul(value)),
        Value::Null | Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Rejects the whole payload if any key is outside `allowed`.
pub fn reject_unknown_fields(
    object: &Map<String, Value>,
    allowed: &[&str],
) -> Result<(), ValidationError> {
    match object.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(ValidationError::NotUpdatable { field: key.clone() }),
        None => Ok(()),
    }
}

/// Returns the trimmed string if `value` is a string with non-whitespace content.
pub fn non_blank(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Requires `value` to be an array whose every element is a string.
pub fn string_list(field: &str, value: &Value) -> Result<Vec<String>, ValidationError> {
    let not_list = || ValidationError::NotStringList {
        field: field.to_string(),
    };
    value
        .as_array()
        .ok_or_else(not_list)?
        .iter()
        .map(|item| item.as_str().map(str::to_string).ok_or_else(not_list))
        .collect()
}

/// Like [`string_list`], but an absent field yields an empty list.
pub fn optional_string_list(
    object: &Map<String, Value>,
    field: &str,
) -> Result<Vec<String>, ValidationError> {
    match object.get(field) {
        Some(value) => string_list(field, value),
        None => Ok(Vec::new()),
    }
}

/// Accepts a string or null; null becomes the empty string.
pub fn string_or_null(field: &str, value: &Value) -> Result<String, ValidationError> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        _ => Err(ValidationError::NotString {
            field: field.to_string(),
        }),
    }
}
