use crate::buckets;
use crate::model::{AttendanceStatus, Class, GradeEntry, RecordError, Records, Student};
use std::cmp::Ordering;
use uuid::Uuid;

/// Complete in-memory state. Mutations never edit a snapshot in place; each
/// returns a new snapshot that the caller swaps in once it succeeded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub classes: Vec<Class>,
    pub students: Vec<Student>,
    pub records: Records,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeSummary {
    pub attendance_marks: usize,
    pub grade_entries: usize,
}

/// A student joined with the resolved name of their class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub student_id: String,
    pub name: String,
    pub class_id: String,
    pub class_name: String,
}

fn required_name(raw: &str, what: &'static str) -> Result<String, RecordError> {
    let t = raw.trim();
    if t.is_empty() {
        return Err(RecordError::EmptyName(what));
    }
    Ok(t.to_string())
}

impl Snapshot {
    pub fn class(&self, class_id: &str) -> Option<&Class> {
        self.classes.iter().find(|c| c.id == class_id)
    }

    pub fn student(&self, student_id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == student_id)
    }

    /// Class name for a student's class reference; dangling or empty
    /// references resolve to `unassigned`.
    pub fn resolve_class_name<'a>(&'a self, class_id: &str, unassigned: &'a str) -> &'a str {
        if class_id.is_empty() {
            return unassigned;
        }
        self.class(class_id)
            .map(|c| c.name.as_str())
            .unwrap_or(unassigned)
    }

    /// Students sorted by class name, then by student name.
    pub fn roster(&self, class_filter: Option<&str>, unassigned: &str) -> Vec<RosterEntry> {
        let mut out: Vec<RosterEntry> = self
            .students
            .iter()
            .filter(|s| class_filter.map(|c| s.class_id == c).unwrap_or(true))
            .map(|s| RosterEntry {
                student_id: s.id.clone(),
                name: s.name.clone(),
                class_id: s.class_id.clone(),
                class_name: self.resolve_class_name(&s.class_id, unassigned).to_string(),
            })
            .collect();
        out.sort_by(|a, b| {
            name_order(&a.class_name, &b.class_name).then_with(|| name_order(&a.name, &b.name))
        });
        out
    }

    fn require_student(&self, student_id: &str) -> Result<&Student, RecordError> {
        self.student(student_id)
            .ok_or_else(|| RecordError::UnknownStudent(student_id.to_string()))
    }

    fn require_class_ref(&self, class_id: &str) -> Result<(), RecordError> {
        if class_id.is_empty() || self.class(class_id).is_some() {
            Ok(())
        } else {
            Err(RecordError::UnknownClass(class_id.to_string()))
        }
    }

    pub fn create_class(&self, name: &str) -> Result<(Snapshot, Class), RecordError> {
        let class = Class {
            id: Uuid::new_v4().to_string(),
            name: required_name(name, "class")?,
        };
        let mut next = self.clone();
        next.classes.push(class.clone());
        Ok((next, class))
    }

    pub fn rename_class(&self, class_id: &str, name: &str) -> Result<Snapshot, RecordError> {
        let name = required_name(name, "class")?;
        let mut next = self.clone();
        let class = next
            .classes
            .iter_mut()
            .find(|c| c.id == class_id)
            .ok_or_else(|| RecordError::UnknownClass(class_id.to_string()))?;
        class.name = name;
        Ok(next)
    }

    /// Removes the class and unassigns its students. Their attendance and
    /// grade records stay untouched. Returns the number of students unassigned.
    pub fn delete_class(&self, class_id: &str) -> Result<(Snapshot, usize), RecordError> {
        if self.class(class_id).is_none() {
            return Err(RecordError::UnknownClass(class_id.to_string()));
        }
        let mut next = self.clone();
        next.classes.retain(|c| c.id != class_id);
        let mut unassigned = 0usize;
        for s in next.students.iter_mut().filter(|s| s.class_id == class_id) {
            s.class_id.clear();
            unassigned += 1;
        }
        Ok((next, unassigned))
    }

    pub fn create_student(
        &self,
        name: &str,
        class_id: Option<&str>,
    ) -> Result<(Snapshot, Student), RecordError> {
        let class_id = class_id.map(str::trim).unwrap_or("").to_string();
        self.require_class_ref(&class_id)?;
        let student = Student {
            id: Uuid::new_v4().to_string(),
            name: required_name(name, "student")?,
            class_id,
        };
        let mut next = self.clone();
        next.students.push(student.clone());
        Ok((next, student))
    }

    /// A blank `name` keeps the current name; `class_id` of `Some("")`
    /// unassigns the student.
    pub fn update_student(
        &self,
        student_id: &str,
        name: Option<&str>,
        class_id: Option<&str>,
    ) -> Result<Snapshot, RecordError> {
        self.require_student(student_id)?;
        if let Some(c) = class_id {
            self.require_class_ref(c.trim())?;
        }
        let mut next = self.clone();
        if let Some(s) = next.students.iter_mut().find(|s| s.id == student_id) {
            if let Some(n) = name.map(str::trim).filter(|n| !n.is_empty()) {
                s.name = n.to_string();
            }
            if let Some(c) = class_id {
                s.class_id = c.trim().to_string();
            }
        }
        Ok(next)
    }

    /// Removes the student together with every attendance mark and grade entry
    /// keyed by their id.
    pub fn delete_student(&self, student_id: &str) -> Result<(Snapshot, PurgeSummary), RecordError> {
        self.require_student(student_id)?;
        let mut next = self.clone();
        next.students.retain(|s| s.id != student_id);

        let mut summary = PurgeSummary::default();
        for day in next.records.attendance.values_mut() {
            if day.remove(student_id).is_some() {
                summary.attendance_marks += 1;
            }
        }
        next.records.attendance.retain(|_, day| !day.is_empty());
        if let Some(entries) = next.records.grades.remove(student_id) {
            summary.grade_entries = entries.len();
        }
        debug_assert!(!next.records.references_student(student_id));
        Ok((next, summary))
    }

    pub fn record_attendance(
        &self,
        date: &str,
        student_id: &str,
        status: AttendanceStatus,
    ) -> Result<Snapshot, RecordError> {
        let date = buckets::parse_date(date)?.format("%Y-%m-%d").to_string();
        self.require_student(student_id)?;
        let mut next = self.clone();
        next.records
            .attendance
            .entry(date)
            .or_default()
            .insert(student_id.to_string(), status);
        Ok(next)
    }

    /// Removes the mark for one student on one date. Clearing a mark that does
    /// not exist is not an error.
    pub fn clear_attendance(&self, date: &str, student_id: &str) -> Result<Snapshot, RecordError> {
        let date = buckets::parse_date(date)?.format("%Y-%m-%d").to_string();
        let mut next = self.clone();
        if let Some(day) = next.records.attendance.get_mut(&date) {
            day.remove(student_id);
            if day.is_empty() {
                next.records.attendance.remove(&date);
            }
        }
        Ok(next)
    }

    pub fn record_grade(
        &self,
        date: &str,
        student_id: &str,
        score: f64,
    ) -> Result<(Snapshot, GradeEntry), RecordError> {
        if !score.is_finite() {
            return Err(RecordError::NonFiniteScore);
        }
        let date = buckets::parse_date(date)?.format("%Y-%m-%d").to_string();
        let student = self.require_student(student_id)?;
        let entry = GradeEntry {
            date,
            score,
            class_id: student.class_id.clone(),
        };
        let mut next = self.clone();
        next.records
            .grades
            .entry(student_id.to_string())
            .or_default()
            .push(entry.clone());
        Ok((next, entry))
    }
}

/// Case-insensitive order; exact order breaks ties so sorting stays deterministic.
fn name_order(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
