//! Record storage behind an injectable trait.
//!
//! Handlers only see [`StudentStore`]; [`InMemoryStore`] is the one
//! implementation and holds everything in process memory.

use parking_lot::RwLock;

use super::model::{NewStudent, Student, StudentId, StudentPatch};

/// Storage operations the HTTP handlers need.
///
/// Every method is a single atomic step: implementations must not let a
/// concurrent caller observe a half-applied mutation.
pub trait StudentStore: Send + Sync + 'static {
    /// All records in insertion order.
    fn list(&self) -> Vec<Student>;

    fn get(&self, id: StudentId) -> Option<Student>;

    /// Assigns the next id and appends the record.
    fn insert(&self, fields: NewStudent) -> Student;

    /// Replaces every field of an existing record, keeping its id.
    fn replace(&self, id: StudentId, fields: NewStudent) -> Option<Student>;

    /// Merges the present fields of `patch` into an existing record.
    fn update(&self, id: StudentId, patch: StudentPatch) -> Option<Student>;

    /// Removes a record, returning it as it was just before removal.
    fn remove(&self, id: StudentId) -> Option<Student>;
}

#[derive(Debug)]
struct Records {
    students: Vec<Student>,
    next_id: StudentId,
}

impl Records {
    fn position(&self, id: StudentId) -> Option<usize> {
        self.students.iter().position(|s| s.student_id == id)
    }

    fn find_mut(&mut self, id: StudentId) -> Option<&mut Student> {
        self.students.iter_mut().find(|s| s.student_id == id)
    }
}

impl Default for Records {
    fn default() -> Self {
        Self {
            students: Vec::new(),
            next_id: 1,
        }
    }
}

/// Process-memory store; starts empty, ids start at 1 and are never reused.
///
/// # Examples
///
/// ```
/// use roster::students::{InMemoryStore, NewStudent, StudentStore};
///
/// let store = InMemoryStore::new();
/// let ann = store.insert(NewStudent {
///     name: "Ann".into(),
///     age: 20.into(),
///     course: "CS".into(),
///     year_level: 2.into(),
///     status: "active".into(),
/// });
/// assert_eq!(ann.student_id, 1);
/// assert_eq!(store.list(), vec![ann]);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Records>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StudentStore for InMemoryStore {
    fn list(&self) -> Vec<Student> {
        self.inner.read().students.clone()
    }

    fn get(&self, id: StudentId) -> Option<Student> {
        let records = self.inner.read();
        records.position(id).map(|i| records.students[i].clone())
    }

    fn insert(&self, fields: NewStudent) -> Student {
        let mut records = self.inner.write();
        let student = Student::new(records.next_id, fields);
        records.next_id += 1;
        records.students.push(student.clone());
        student
    }

    fn replace(&self, id: StudentId, fields: NewStudent) -> Option<Student> {
        let mut records = self.inner.write();
        let student = records.find_mut(id)?;
        student.replace(fields);
        Some(student.clone())
    }

    fn update(&self, id: StudentId, patch: StudentPatch) -> Option<Student> {
        let mut records = self.inner.write();
        let student = records.find_mut(id)?;
        student.apply(patch);
        Some(student.clone())
    }

    fn remove(&self, id: StudentId) -> Option<Student> {
        let mut records = self.inner.write();
        let index = records.position(id)?;
        Some(records.students.remove(index))
    }
}
