//! Type checks for student request bodies against the fixed record schema.
//!
//! Validation never coerces: `"20"` is not a number and `20` is not a string.

use serde_json::{Map, Value};

use super::model::{NewStudent, StudentPatch};

/// Which fields must be present for a body to be valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Every schema field must be present and correctly typed (create, replace).
    All,
    /// Only fields present in the body are checked (partial update).
    PresentOnly,
}

#[derive(Debug, Clone, Copy)]
enum FieldKind {
    Text,
    Number,
}

impl FieldKind {
    fn type_name(self) -> &'static str {
        match self {
            FieldKind::Text => "string",
            FieldKind::Number => "number",
        }
    }

    /// Required text fields must also be non-empty. Numbers are type-checked
    /// only, so `0` passes in both modes rather than counting as missing.
    fn accepts(self, value: &Value, requirement: Requirement) -> bool {
        match (self, value) {
            (FieldKind::Text, Value::String(s)) => {
                requirement == Requirement::PresentOnly || !s.is_empty()
            }
            (FieldKind::Number, Value::Number(_)) => true,
            _ => false,
        }
    }
}

/// Schema fields in reporting order.
const SCHEMA: [(&str, FieldKind); 5] = [
    ("name", FieldKind::Text),
    ("age", FieldKind::Number),
    ("course", FieldKind::Text),
    ("year_level", FieldKind::Number),
    ("status", FieldKind::Text),
];

/// Checks `body` against the student schema.
///
/// Returns one message per offending field, in schema order
/// (`name`, `age`, `course`, `year_level`, `status`). An empty vector means
/// the body is valid.
///
/// # Examples
///
/// ```
/// use roster::students::validate::{Requirement, validate};
/// use serde_json::json;
///
/// let body = json!({"name": "Ann", "age": "20"});
/// let errors = validate(body.as_object().unwrap(), Requirement::PresentOnly);
/// assert_eq!(errors, vec!["age must be a number"]);
/// ```
pub fn validate(body: &Map<String, Value>, requirement: Requirement) -> Vec<String> {
    SCHEMA
        .iter()
        .filter_map(|&(field, kind)| {
            let message = match (body.get(field), requirement) {
                (Some(value), _) if kind.accepts(value, requirement) => return None,
                (None, Requirement::PresentOnly) => return None,
                (_, Requirement::All) => {
                    format!("{field} is required and must be a {}", kind.type_name())
                }
                (Some(_), Requirement::PresentOnly) => {
                    format!("{field} must be a {}", kind.type_name())
                }
            };
            Some(message)
        })
        .collect()
}

/// Validates a create/replace body and extracts its fields.
///
/// # Errors
///
/// Returns the validation messages when any field is missing or mistyped.
pub fn new_student(body: Map<String, Value>) -> Result<NewStudent, Vec<String>> {
    extract(body, Requirement::All)
}

/// Validates a partial-update body and extracts the fields it carries.
///
/// # Errors
///
/// Returns the validation messages when any present field is mistyped.
pub fn student_patch(body: Map<String, Value>) -> Result<StudentPatch, Vec<String>> {
    extract(body, Requirement::PresentOnly)
}

fn extract<T>(body: Map<String, Value>, requirement: Requirement) -> Result<T, Vec<String>>
where
    T: serde::de::DeserializeOwned,
{
    let errors = validate(&body, requirement);
    if !errors.is_empty() {
        return Err(errors);
    }
    serde_json::from_value(Value::Object(body)).map_err(|e| vec![e.to_string()])
}
