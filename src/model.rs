use crate::buckets::InvalidDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    /// Empty when the student is unassigned.
    #[serde(default)]
    pub class_id: String,
}

impl Student {
    pub fn assigned_class(&self) -> Option<&str> {
        if self.class_id.is_empty() {
            None
        } else {
            Some(&self.class_id)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceStatus {
    #[serde(rename = "H")]
    Present,
    #[serde(rename = "I")]
    Permitted,
    #[serde(rename = "S")]
    Sick,
    #[serde(rename = "A")]
    Absent,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 4] = [
        AttendanceStatus::Present,
        AttendanceStatus::Permitted,
        AttendanceStatus::Sick,
        AttendanceStatus::Absent,
    ];

    pub fn parse(code: &str) -> Result<Self, RecordError> {
        match code.trim() {
            "H" => Ok(Self::Present),
            "I" => Ok(Self::Permitted),
            "S" => Ok(Self::Sick),
            "A" => Ok(Self::Absent),
            other => Err(RecordError::InvalidStatus(other.to_string())),
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Present => "H",
            Self::Permitted => "I",
            Self::Sick => "S",
            Self::Absent => "A",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Present => "Hadir",
            Self::Permitted => "Izin",
            Self::Sick => "Sakit",
            Self::Absent => "Alpa",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeEntry {
    pub date: String,
    pub score: f64,
    /// Class the student belonged to when the grade was recorded.
    #[serde(default)]
    pub class_id: String,
}

/// Attendance by date then student id, and grade entries by student id in
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Records {
    #[serde(default)]
    pub attendance: BTreeMap<String, BTreeMap<String, AttendanceStatus>>,
    #[serde(default)]
    pub grades: BTreeMap<String, Vec<GradeEntry>>,
}

impl Records {
    pub fn status_on(&self, date: &str, student_id: &str) -> Option<AttendanceStatus> {
        self.attendance
            .get(date)
            .and_then(|day| day.get(student_id))
            .copied()
    }

    pub fn grades_for(&self, student_id: &str) -> &[GradeEntry] {
        self.grades
            .get(student_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn references_student(&self, student_id: &str) -> bool {
        self.grades.contains_key(student_id)
            || self
                .attendance
                .values()
                .any(|day| day.contains_key(student_id))
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("{0} name must not be empty")]
    EmptyName(&'static str),
    #[error("invalid attendance status {0:?} (expected one of H, I, S, A)")]
    InvalidStatus(String),
    #[error("score must be a finite number")]
    NonFiniteScore,
    #[error(transparent)]
    InvalidDate(#[from] InvalidDate),
    #[error("student not found: {0}")]
    UnknownStudent(String),
    #[error("class not found: {0}")]
    UnknownClass(String),
}

impl RecordError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownStudent(_) | Self::UnknownClass(_) => "not_found",
            _ => "bad_params",
        }
    }
}
