//! Records of the academic schema as they are stored.
//!
//! These are owned by the external schema layer; the reporting code only reads
//! them (and the in-memory store keeps them in a snapshot).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An instructor. Owns zero or more disciplines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: i32,
    pub fullname: String,
}

/// A course, taught by exactly one teacher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discipline {
    pub id: i32,
    pub name: String,
    pub teacher_id: i32,
}

/// A cohort of students sharing a roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: i32,
    pub fullname: String,
    pub group_id: i32,
}

/// One grade fact: a student graded in a discipline on a given day.
///
/// Several grades may exist for the same (student, discipline) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grade {
    pub id: i32,
    pub grade: i32,
    pub date_of: NaiveDate,
    pub student_id: i32,
    pub discipline_id: i32,
}
