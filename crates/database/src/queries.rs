use crate::error::DbError;
use async_trait::async_trait;
use core_types::{
    DisciplineLeader, GroupAverage, GroupGrade, GroupMember, OverallAverage, SessionGrade,
    StudentAverage, StudentDiscipline, StudentTeacherDiscipline, TeacherAverage,
    TeacherDiscipline, TeacherStudentAverage,
};

/// Number of rows returned by [`ReportQueries::top_students`].
pub const TOP_STUDENTS_LIMIT: i64 = 5;

/// The catalog of analytical reports over the academic records.
///
/// Every method is a single read-only query. Implementations hold no mutable
/// state, so one instance can serve concurrent callers. Reports that return a
/// list yield an empty list for an identifier that matches nothing; reports that
/// return a single row fail with [`DbError::NotFound`] instead.
///
/// Averages are rounded to two places, half away from zero
/// (see [`core_types::round_average`]).
#[async_trait]
pub trait ReportQueries: Send + Sync {
    /// The five students with the highest average across all disciplines.
    async fn top_students(&self) -> Result<Vec<StudentAverage>, DbError>;

    /// The student with the highest average in one discipline.
    async fn top_student_in_discipline(&self, discipline_id: i32) -> Result<DisciplineLeader, DbError>;

    /// Average per group within one discipline, best group first.
    /// Groups without grades in the discipline are absent.
    async fn group_averages_for_discipline(&self, discipline_id: i32) -> Result<Vec<GroupAverage>, DbError>;

    /// Average over every recorded grade.
    async fn overall_average(&self) -> Result<OverallAverage, DbError>;

    /// Disciplines taught by a teacher.
    async fn teacher_disciplines(&self, teacher_id: i32) -> Result<Vec<TeacherDiscipline>, DbError>;

    /// Students belonging to a group.
    async fn group_roster(&self, group_id: i32) -> Result<Vec<GroupMember>, DbError>;

    /// Distinct grades of a group's students in one discipline, highest first.
    async fn group_grades_in_discipline(&self, group_id: i32, discipline_id: i32) -> Result<Vec<GroupGrade>, DbError>;

    /// Average grade a teacher gives across all of their disciplines.
    async fn teacher_average(&self, teacher_id: i32) -> Result<TeacherAverage, DbError>;

    /// Disciplines a student has grades in, by name.
    async fn student_disciplines(&self, student_id: i32) -> Result<Vec<StudentDiscipline>, DbError>;

    /// Disciplines a given teacher teaches a given student, by name.
    async fn student_disciplines_by_teacher(
        &self,
        student_id: i32,
        teacher_id: i32,
    ) -> Result<Vec<StudentTeacherDiscipline>, DbError>;

    /// Average grade a teacher gives one student.
    async fn teacher_average_for_student(
        &self,
        teacher_id: i32,
        student_id: i32,
    ) -> Result<Vec<TeacherStudentAverage>, DbError>;

    /// Grades of a group in a discipline on the most recent date anything was
    /// recorded for that pair. Every grade sharing that date is returned.
    async fn last_session_grades(&self, discipline_id: i32, group_id: i32) -> Result<Vec<SessionGrade>, DbError>;
}

/// Rejects identifiers that can never name a row.
pub(crate) fn ensure_id(entity: &str, id: i32) -> Result<(), DbError> {
    if id <= 0 {
        return Err(DbError::InvalidParameter(format!(
            "{entity} id must be positive, got {id}"
        )));
    }
    Ok(())
}

/// Unwraps the only row of a result that must hold exactly one.
///
/// More than one row means the store broke an integrity invariant; that is
/// reported, never truncated.
pub(crate) fn expect_single<T>(mut rows: Vec<T>) -> Result<T, DbError> {
    match rows.len() {
        0 => Err(DbError::NotFound),
        1 => Ok(rows.remove(0)),
        found => {
            tracing::warn!(found, "Single-row report matched several rows.");
            Err(DbError::AmbiguousResult { expected: 1, found })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_ids_are_invalid() {
        assert!(ensure_id("teacher", 1).is_ok());
        assert!(matches!(ensure_id("teacher", 0), Err(DbError::InvalidParameter(_))));
        assert!(matches!(ensure_id("group", -3), Err(DbError::InvalidParameter(_))));
    }

    #[test]
    fn single_row_is_unwrapped() {
        assert_eq!(expect_single(vec![7]).unwrap(), 7);
    }

    #[test]
    fn zero_rows_is_not_found() {
        assert!(matches!(expect_single(Vec::<i32>::new()), Err(DbError::NotFound)));
    }

    #[test]
    fn several_rows_are_ambiguous() {
        let err = expect_single(vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, DbError::AmbiguousResult { expected: 1, found: 3 }));
    }
}
