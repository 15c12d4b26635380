//! Student record types.

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Identifier assigned to a record on creation. Never reused.
pub type StudentId = u64;

/// A stored student record.
///
/// Field order here is the field order on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub student_id: StudentId,
    pub name: String,
    pub age: Number,
    pub course: String,
    pub year_level: Number,
    pub status: String,
}

/// The five client-supplied fields of a record, all required.
///
/// Used for both creation and full replacement. Unknown body fields,
/// including any `student_id`, are ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewStudent {
    pub name: String,
    pub age: Number,
    pub course: String,
    pub year_level: Number,
    pub status: String,
}

/// A partial update; `None` leaves the stored field untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StudentPatch {
    pub name: Option<String>,
    pub age: Option<Number>,
    pub course: Option<String>,
    pub year_level: Option<Number>,
    pub status: Option<String>,
}

impl Student {
    pub fn new(student_id: StudentId, fields: NewStudent) -> Self {
        Self {
            student_id,
            name: fields.name,
            age: fields.age,
            course: fields.course,
            year_level: fields.year_level,
            status: fields.status,
        }
    }

    /// Overwrites every field except `student_id`.
    pub fn replace(&mut self, fields: NewStudent) {
        *self = Self::new(self.student_id, fields);
    }

    /// Shallow merge: each field present in `patch` overwrites the stored one.
    pub fn apply(&mut self, patch: StudentPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(age) = patch.age {
            self.age = age;
        }
        if let Some(course) = patch.course {
            self.course = course;
        }
        if let Some(year_level) = patch.year_level {
            self.year_level = year_level;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}
