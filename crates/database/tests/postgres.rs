//! Runs every report against a real PostgreSQL instance and checks that the
//! SQL repository agrees with the in-memory one on the same data.
//!
//! Requires `DATABASE_URL`; run with `cargo test -p database -- --ignored`.
//! Fixtures are seeded one after another into a `gradebook_it` schema, which is
//! dropped and recreated for each of them.

use database::{DbError, DbRepository, MemoryRepository, ReportQueries, Snapshot};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::str::FromStr;

const SCHEMA: &str = include_str!("fixtures/schema.sql");
const ACADEMY: &str = include_str!("fixtures/academy.json");
const BOUNDARIES: &str = include_str!("fixtures/boundaries.json");

async fn seeded_pool(snapshot: &Snapshot) -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");
    let options = PgConnectOptions::from_str(&url)
        .unwrap()
        .options([("search_path", "gradebook_it")]);
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();

    sqlx::raw_sql(SCHEMA).execute(&pool).await.unwrap();

    let mut tx = pool.begin().await.unwrap();
    for t in &snapshot.teachers {
        sqlx::query("INSERT INTO teachers (id, fullname) VALUES ($1, $2)")
            .bind(t.id)
            .bind(&t.fullname)
            .execute(&mut *tx)
            .await
            .unwrap();
    }
    for g in &snapshot.groups {
        sqlx::query("INSERT INTO groups (id, name) VALUES ($1, $2)")
            .bind(g.id)
            .bind(&g.name)
            .execute(&mut *tx)
            .await
            .unwrap();
    }
    for d in &snapshot.disciplines {
        sqlx::query("INSERT INTO disciplines (id, name, teacher_id) VALUES ($1, $2, $3)")
            .bind(d.id)
            .bind(&d.name)
            .bind(d.teacher_id)
            .execute(&mut *tx)
            .await
            .unwrap();
    }
    for s in &snapshot.students {
        sqlx::query("INSERT INTO students (id, fullname, group_id) VALUES ($1, $2, $3)")
            .bind(s.id)
            .bind(&s.fullname)
            .bind(s.group_id)
            .execute(&mut *tx)
            .await
            .unwrap();
    }
    for g in &snapshot.grades {
        sqlx::query(
            "INSERT INTO grades (id, grade, date_of, student_id, discipline_id) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(g.id)
        .bind(g.grade)
        .bind(g.date_of)
        .bind(g.student_id)
        .bind(g.discipline_id)
        .execute(&mut *tx)
        .await
        .unwrap();
    }
    tx.commit().await.unwrap();

    pool
}

/// Compares every report on every id of the snapshot (plus one unknown id).
async fn assert_parity(snapshot: &Snapshot) -> DbRepository {
    let memory = MemoryRepository::new(snapshot.clone()).unwrap();
    let db = DbRepository::new(seeded_pool(snapshot).await);

    let max_id = |ids: Vec<i32>| ids.into_iter().max().unwrap_or(0) + 1;
    let teachers = 1..=max_id(snapshot.teachers.iter().map(|t| t.id).collect());
    let disciplines = 1..=max_id(snapshot.disciplines.iter().map(|d| d.id).collect());
    let groups = 1..=max_id(snapshot.groups.iter().map(|g| g.id).collect());
    let students = 1..=max_id(snapshot.students.iter().map(|s| s.id).collect());

    assert_eq!(db.top_students().await.unwrap(), memory.top_students().await.unwrap());
    assert_eq!(db.overall_average().await.unwrap(), memory.overall_average().await.unwrap());
    assert_eq!(
        db.overall_average().await.unwrap().avg_grade.to_string(),
        memory.overall_average().await.unwrap().avg_grade.to_string()
    );

    for discipline in disciplines.clone() {
        assert_eq!(
            db.group_averages_for_discipline(discipline).await.unwrap(),
            memory.group_averages_for_discipline(discipline).await.unwrap()
        );
        match (
            db.top_student_in_discipline(discipline).await,
            memory.top_student_in_discipline(discipline).await,
        ) {
            (Ok(a), Ok(b)) => assert_eq!(a, b),
            (Err(DbError::NotFound), Err(DbError::NotFound)) => {}
            other => panic!("top_student_in_discipline({discipline}) disagrees: {other:?}"),
        }
        for group in groups.clone() {
            assert_eq!(
                db.group_grades_in_discipline(group, discipline).await.unwrap(),
                memory.group_grades_in_discipline(group, discipline).await.unwrap()
            );
            assert_eq!(
                db.last_session_grades(discipline, group).await.unwrap(),
                memory.last_session_grades(discipline, group).await.unwrap()
            );
        }
    }

    for teacher in teachers {
        assert_eq!(
            db.teacher_disciplines(teacher).await.unwrap(),
            memory.teacher_disciplines(teacher).await.unwrap()
        );
        match (db.teacher_average(teacher).await, memory.teacher_average(teacher).await) {
            (Ok(a), Ok(b)) => assert_eq!(a, b),
            (Err(DbError::NotFound), Err(DbError::NotFound)) => {}
            other => panic!("teacher_average({teacher}) disagrees: {other:?}"),
        }
        for student in students.clone() {
            assert_eq!(
                db.student_disciplines_by_teacher(student, teacher).await.unwrap(),
                memory.student_disciplines_by_teacher(student, teacher).await.unwrap()
            );
            assert_eq!(
                db.teacher_average_for_student(teacher, student).await.unwrap(),
                memory.teacher_average_for_student(teacher, student).await.unwrap()
            );
        }
    }

    for group in groups {
        assert_eq!(db.group_roster(group).await.unwrap(), memory.group_roster(group).await.unwrap());
    }
    for student in students {
        assert_eq!(
            db.student_disciplines(student).await.unwrap(),
            memory.student_disciplines(student).await.unwrap()
        );
    }

    db
}

#[tokio::test]
#[ignore = "needs a PostgreSQL instance in DATABASE_URL"]
async fn postgres_matches_memory_store() {
    assert_parity(&Snapshot::from_json(ACADEMY).unwrap()).await;

    // Mixed-case names tied on grade and date, seven graded students and a
    // 75.125 mean: byte-order collation, the LIMIT and the rounding midpoint.
    let db = assert_parity(&Snapshot::from_json(BOUNDARIES).unwrap()).await;

    let session: Vec<String> = db
        .last_session_grades(1, 1)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.student)
        .collect();
    assert_eq!(session, vec!["Bohdan", "anna"]);

    let courses: Vec<String> = db
        .student_disciplines(1)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.discipline)
        .collect();
    assert_eq!(courses, vec!["Geometry", "algebra"]);

    assert_eq!(db.top_students().await.unwrap().len(), 5);
    assert_eq!(db.top_student_in_discipline(3).await.unwrap().avg_grade.to_string(), "75.13");
}
