//! Result rows, one type per report.
//!
//! Each struct matches the column aliases of its SQL statement, so the
//! PostgreSQL repository can decode it with `sqlx::FromRow` and the in-memory
//! store can build the very same value.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A student's average grade across every discipline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct StudentAverage {
    pub student: String,
    pub avg_grade: Decimal,
}

/// The best-performing student of a single discipline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DisciplineLeader {
    pub discipline: String,
    pub student: String,
    pub avg_grade: Decimal,
}

/// The average of one group within one discipline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct GroupAverage {
    pub discipline: String,
    pub group: String,
    pub avg_grade: Decimal,
}

/// The average over the whole grade table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct OverallAverage {
    pub avg_grade: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TeacherDiscipline {
    pub teacher: String,
    pub discipline: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct GroupMember {
    pub group: String,
    pub student: String,
}

/// A single grade of a group member in a discipline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct GroupGrade {
    pub student: String,
    pub group: String,
    pub discipline: String,
    pub grade: i32,
}

/// The average grade a teacher gives across all of their disciplines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TeacherAverage {
    pub teacher: String,
    pub avg_grade: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct StudentDiscipline {
    pub student: String,
    pub discipline: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct StudentTeacherDiscipline {
    pub student: String,
    pub teacher: String,
    pub discipline: String,
}

/// The average grade one teacher gives one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TeacherStudentAverage {
    pub teacher: String,
    pub student: String,
    pub avg_grade: Decimal,
}

/// A grade recorded on the most recent session of a group in a discipline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SessionGrade {
    pub discipline: String,
    pub student: String,
    pub group: String,
    pub date_of: NaiveDate,
    pub grade: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn averages_serialize_with_two_places() {
        let row = StudentAverage {
            student: "Anna Bondar".to_string(),
            avg_grade: crate::round_average(dec!(84)),
        };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"student":"Anna Bondar","avg_grade":"84.00"}"#);
    }

    #[test]
    fn session_dates_serialize_as_iso() {
        let row = SessionGrade {
            discipline: "Mathematics".to_string(),
            student: "Anna Bondar".to_string(),
            group: "A-101".to_string(),
            date_of: NaiveDate::from_ymd_opt(2023, 1, 15).unwrap(),
            grade: 85,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["date_of"], "2023-01-15");
    }
}
