use crate::DbError;
use crate::queries::{ReportQueries, TOP_STUDENTS_LIMIT, ensure_id, expect_single};
use async_trait::async_trait;
use core_types::{
    DisciplineLeader, GroupAverage, GroupGrade, GroupMember, OverallAverage, SessionGrade,
    StudentAverage, StudentDiscipline, StudentTeacherDiscipline, TeacherAverage,
    TeacherDiscipline, TeacherStudentAverage,
};
use rust_decimal::Decimal;
use sqlx::postgres::PgPool;

/// The `DbRepository` answers every report with one parameterised SQL
/// statement against PostgreSQL.
///
/// `AVG` over an integer column is `NUMERIC` in PostgreSQL and `ROUND(numeric, 2)`
/// rounds half away from zero, which is the rule the in-memory store applies too.
/// Ties are broken by id so repeated runs return identical orderings, and names
/// sort with `COLLATE "C"` (byte order) whatever the database's default collation.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportQueries for DbRepository {
    async fn top_students(&self) -> Result<Vec<StudentAverage>, DbError> {
        tracing::debug!(limit = TOP_STUDENTS_LIMIT, "Running top_students.");
        let rows = sqlx::query_as::<_, StudentAverage>(
            r#"
            SELECT
                s.fullname AS student,
                ROUND(AVG(g.grade)::numeric, 2) AS avg_grade
            FROM
                grades AS g
            JOIN
                students AS s ON s.id = g.student_id
            GROUP BY
                s.id, s.fullname
            ORDER BY
                avg_grade DESC, s.id ASC
            LIMIT $1
            "#,
        )
        .bind(TOP_STUDENTS_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn top_student_in_discipline(&self, discipline_id: i32) -> Result<DisciplineLeader, DbError> {
        ensure_id("discipline", discipline_id)?;
        tracing::debug!(discipline_id, "Running top_student_in_discipline.");
        let row = sqlx::query_as::<_, DisciplineLeader>(
            r#"
            SELECT
                d.name AS discipline,
                s.fullname AS student,
                ROUND(AVG(g.grade)::numeric, 2) AS avg_grade
            FROM
                grades AS g
            JOIN
                students AS s ON s.id = g.student_id
            JOIN
                disciplines AS d ON d.id = g.discipline_id
            WHERE
                d.id = $1
            GROUP BY
                s.id, s.fullname, d.name
            ORDER BY
                avg_grade DESC, s.id ASC
            LIMIT 1
            "#,
        )
        .bind(discipline_id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(DbError::NotFound)
    }

    async fn group_averages_for_discipline(&self, discipline_id: i32) -> Result<Vec<GroupAverage>, DbError> {
        ensure_id("discipline", discipline_id)?;
        tracing::debug!(discipline_id, "Running group_averages_for_discipline.");
        let rows = sqlx::query_as::<_, GroupAverage>(
            r#"
            SELECT
                d.name AS discipline,
                gr.name AS "group",
                ROUND(AVG(g.grade)::numeric, 2) AS avg_grade
            FROM
                grades AS g
            JOIN
                students AS s ON s.id = g.student_id
            JOIN
                disciplines AS d ON d.id = g.discipline_id
            JOIN
                groups AS gr ON gr.id = s.group_id
            WHERE
                d.id = $1
            GROUP BY
                d.id, d.name, gr.id, gr.name
            ORDER BY
                avg_grade DESC, gr.id ASC
            "#,
        )
        .bind(discipline_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn overall_average(&self) -> Result<OverallAverage, DbError> {
        tracing::debug!("Running overall_average.");
        // AVG over an empty table is a single NULL row.
        let (avg_grade,): (Option<Decimal>,) =
            sqlx::query_as("SELECT ROUND(AVG(grade)::numeric, 2) AS avg_grade FROM grades")
                .fetch_one(&self.pool)
                .await?;

        avg_grade
            .map(|avg_grade| OverallAverage { avg_grade })
            .ok_or(DbError::NotFound)
    }

    async fn teacher_disciplines(&self, teacher_id: i32) -> Result<Vec<TeacherDiscipline>, DbError> {
        ensure_id("teacher", teacher_id)?;
        tracing::debug!(teacher_id, "Running teacher_disciplines.");
        let rows = sqlx::query_as::<_, TeacherDiscipline>(
            r#"
            SELECT t.fullname AS teacher, d.name AS discipline
            FROM disciplines AS d
            JOIN teachers AS t ON t.id = d.teacher_id
            WHERE t.id = $1
            ORDER BY d.id ASC
            "#,
        )
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn group_roster(&self, group_id: i32) -> Result<Vec<GroupMember>, DbError> {
        ensure_id("group", group_id)?;
        tracing::debug!(group_id, "Running group_roster.");
        let rows = sqlx::query_as::<_, GroupMember>(
            r#"
            SELECT gr.name AS "group", s.fullname AS student
            FROM students AS s
            JOIN groups AS gr ON gr.id = s.group_id
            WHERE gr.id = $1
            ORDER BY s.id ASC
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn group_grades_in_discipline(&self, group_id: i32, discipline_id: i32) -> Result<Vec<GroupGrade>, DbError> {
        ensure_id("group", group_id)?;
        ensure_id("discipline", discipline_id)?;
        tracing::debug!(group_id, discipline_id, "Running group_grades_in_discipline.");
        let rows = sqlx::query_as::<_, GroupGrade>(
            r#"
            SELECT DISTINCT
                s.fullname COLLATE "C" AS student,
                gr.name AS "group",
                d.name AS discipline,
                g.grade
            FROM
                grades AS g
            JOIN
                students AS s ON s.id = g.student_id
            JOIN
                disciplines AS d ON d.id = g.discipline_id
            JOIN
                groups AS gr ON gr.id = s.group_id
            WHERE
                gr.id = $1 AND d.id = $2
            ORDER BY
                g.grade DESC, student ASC
            "#,
        )
        .bind(group_id)
        .bind(discipline_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn teacher_average(&self, teacher_id: i32) -> Result<TeacherAverage, DbError> {
        ensure_id("teacher", teacher_id)?;
        tracing::debug!(teacher_id, "Running teacher_average.");
        let rows = sqlx::query_as::<_, TeacherAverage>(
            r#"
            SELECT
                t.fullname AS teacher,
                ROUND(AVG(g.grade)::numeric, 2) AS avg_grade
            FROM
                grades AS g
            JOIN
                disciplines AS d ON d.id = g.discipline_id
            JOIN
                teachers AS t ON t.id = d.teacher_id
            WHERE
                t.id = $1
            GROUP BY
                t.id, t.fullname
            ORDER BY
                avg_grade DESC
            "#,
        )
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await?;

        expect_single(rows)
    }

    async fn student_disciplines(&self, student_id: i32) -> Result<Vec<StudentDiscipline>, DbError> {
        ensure_id("student", student_id)?;
        tracing::debug!(student_id, "Running student_disciplines.");
        let rows = sqlx::query_as::<_, StudentDiscipline>(
            r#"
            SELECT
                s.fullname AS student,
                d.name AS discipline
            FROM
                grades AS g
            JOIN
                students AS s ON s.id = g.student_id
            JOIN
                disciplines AS d ON d.id = g.discipline_id
            WHERE
                s.id = $1
            GROUP BY
                d.id, d.name, s.fullname
            ORDER BY
                d.name COLLATE "C" ASC, d.id ASC
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn student_disciplines_by_teacher(
        &self,
        student_id: i32,
        teacher_id: i32,
    ) -> Result<Vec<StudentTeacherDiscipline>, DbError> {
        ensure_id("student", student_id)?;
        ensure_id("teacher", teacher_id)?;
        tracing::debug!(student_id, teacher_id, "Running student_disciplines_by_teacher.");
        let rows = sqlx::query_as::<_, StudentTeacherDiscipline>(
            r#"
            SELECT
                s.fullname AS student,
                t.fullname AS teacher,
                d.name AS discipline
            FROM
                grades AS g
            JOIN
                students AS s ON s.id = g.student_id
            JOIN
                disciplines AS d ON d.id = g.discipline_id
            JOIN
                teachers AS t ON t.id = d.teacher_id
            WHERE
                s.id = $1 AND t.id = $2
            GROUP BY
                d.id, d.name, s.fullname, t.fullname
            ORDER BY
                d.name COLLATE "C" ASC, d.id ASC
            "#,
        )
        .bind(student_id)
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn teacher_average_for_student(
        &self,
        teacher_id: i32,
        student_id: i32,
    ) -> Result<Vec<TeacherStudentAverage>, DbError> {
        ensure_id("teacher", teacher_id)?;
        ensure_id("student", student_id)?;
        tracing::debug!(teacher_id, student_id, "Running teacher_average_for_student.");
        let rows = sqlx::query_as::<_, TeacherStudentAverage>(
            r#"
            SELECT
                t.fullname AS teacher,
                s.fullname AS student,
                ROUND(AVG(g.grade)::numeric, 2) AS avg_grade
            FROM
                grades AS g
            JOIN
                students AS s ON s.id = g.student_id
            JOIN
                disciplines AS d ON d.id = g.discipline_id
            JOIN
                teachers AS t ON t.id = d.teacher_id
            WHERE
                t.id = $1 AND s.id = $2
            GROUP BY
                t.id, t.fullname, s.id, s.fullname
            ORDER BY
                avg_grade DESC, t.id ASC, s.id ASC
            "#,
        )
        .bind(teacher_id)
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn last_session_grades(&self, discipline_id: i32, group_id: i32) -> Result<Vec<SessionGrade>, DbError> {
        ensure_id("discipline", discipline_id)?;
        ensure_id("group", group_id)?;
        tracing::debug!(discipline_id, group_id, "Running last_session_grades.");
        // The subquery applies the same discipline + group filter as the outer query.
        let rows = sqlx::query_as::<_, SessionGrade>(
            r#"
            SELECT
                d.name AS discipline,
                s.fullname AS student,
                gr.name AS "group",
                g.date_of,
                g.grade
            FROM
                grades AS g
            JOIN
                students AS s ON s.id = g.student_id
            JOIN
                disciplines AS d ON d.id = g.discipline_id
            JOIN
                groups AS gr ON gr.id = s.group_id
            WHERE
                d.id = $1
                AND gr.id = $2
                AND g.date_of = (
                    SELECT MAX(g2.date_of)
                    FROM grades AS g2
                    JOIN students AS s2 ON s2.id = g2.student_id
                    WHERE g2.discipline_id = $1 AND s2.group_id = $2
                )
            ORDER BY
                g.date_of DESC, s.fullname COLLATE "C" ASC, g.grade DESC
            "#,
        )
        .bind(discipline_id)
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
