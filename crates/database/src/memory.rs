//! A `ReportQueries` implementation over an in-process data snapshot.
//!
//! The snapshot is validated once when the repository is built and flattened
//! into grade facts (each grade joined with its student, group, discipline and
//! teacher), so every report is a filter, group and sort over that one list.
//! Ordering and rounding follow the PostgreSQL repository exactly; names are
//! compared byte by byte, which the SQL side pins with `COLLATE "C"`.

use crate::DbError;
use crate::queries::{ReportQueries, TOP_STUDENTS_LIMIT, ensure_id, expect_single};
use async_trait::async_trait;
use chrono::NaiveDate;
use core_types::{
    Discipline, DisciplineLeader, Grade, Group, GroupAverage, GroupGrade, GroupMember,
    OverallAverage, SessionGrade, Student, StudentAverage, StudentDiscipline,
    StudentTeacherDiscipline, Teacher, TeacherAverage, TeacherDiscipline, TeacherStudentAverage,
    rounded_average,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

/// A complete copy of the five relations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub teachers: Vec<Teacher>,
    pub disciplines: Vec<Discipline>,
    pub groups: Vec<Group>,
    pub students: Vec<Student>,
    pub grades: Vec<Grade>,
}

impl Snapshot {
    pub fn from_json(json: &str) -> Result<Self, DbError> {
        serde_json::from_str(json).map_err(|e| DbError::Snapshot(e.to_string()))
    }

    /// Reads a snapshot from a JSON file.
    pub fn load(path: &Path) -> Result<Self, DbError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| DbError::Snapshot(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }
}

/// One grade joined with everything it references.
#[derive(Debug, Clone)]
struct GradeFact {
    grade: i32,
    date_of: NaiveDate,
    student_id: i32,
    student: String,
    group_id: i32,
    group: String,
    discipline_id: i32,
    discipline: String,
    teacher_id: i32,
    teacher: String,
}

#[derive(Debug)]
struct Inner {
    snapshot: Snapshot,
    facts: Vec<GradeFact>,
}

/// Serves the report catalog from memory. Clones share the same snapshot.
#[derive(Debug, Clone)]
pub struct MemoryRepository {
    inner: Arc<Inner>,
}

/// Indexes a relation by id, rejecting duplicates.
fn index_by_id<'a, T>(
    relation: &str,
    rows: &'a [T],
    id: impl Fn(&T) -> i32,
) -> Result<HashMap<i32, &'a T>, DbError> {
    let mut index = HashMap::with_capacity(rows.len());
    for row in rows {
        let key = id(row);
        if index.insert(key, row).is_some() {
            return Err(DbError::Snapshot(format!("duplicate {relation} id {key}")));
        }
    }
    Ok(index)
}

fn dangling(from: &str, from_id: i32, to: &str, to_id: i32) -> DbError {
    DbError::Snapshot(format!("{from} {from_id} references missing {to} {to_id}"))
}

impl MemoryRepository {
    /// Builds a repository, checking every foreign key of the snapshot.
    pub fn new(snapshot: Snapshot) -> Result<Self, DbError> {
        let teachers = index_by_id("teacher", &snapshot.teachers, |t| t.id)?;
        let disciplines = index_by_id("discipline", &snapshot.disciplines, |d| d.id)?;
        let groups = index_by_id("group", &snapshot.groups, |g| g.id)?;
        let students = index_by_id("student", &snapshot.students, |s| s.id)?;
        index_by_id("grade", &snapshot.grades, |g| g.id)?;

        for discipline in &snapshot.disciplines {
            if !teachers.contains_key(&discipline.teacher_id) {
                return Err(dangling("discipline", discipline.id, "teacher", discipline.teacher_id));
            }
        }
        for student in &snapshot.students {
            if !groups.contains_key(&student.group_id) {
                return Err(dangling("student", student.id, "group", student.group_id));
            }
        }

        let mut facts = Vec::with_capacity(snapshot.grades.len());
        for grade in &snapshot.grades {
            let student = students
                .get(&grade.student_id)
                .ok_or_else(|| dangling("grade", grade.id, "student", grade.student_id))?;
            let discipline = disciplines
                .get(&grade.discipline_id)
                .ok_or_else(|| dangling("grade", grade.id, "discipline", grade.discipline_id))?;
            let group = groups
                .get(&student.group_id)
                .ok_or_else(|| dangling("student", student.id, "group", student.group_id))?;
            let teacher = teachers
                .get(&discipline.teacher_id)
                .ok_or_else(|| dangling("discipline", discipline.id, "teacher", discipline.teacher_id))?;

            facts.push(GradeFact {
                grade: grade.grade,
                date_of: grade.date_of,
                student_id: student.id,
                student: student.fullname.clone(),
                group_id: group.id,
                group: group.name.clone(),
                discipline_id: discipline.id,
                discipline: discipline.name.clone(),
                teacher_id: teacher.id,
                teacher: teacher.fullname.clone(),
            });
        }

        tracing::debug!(grades = facts.len(), "Loaded in-memory snapshot.");
        Ok(Self {
            inner: Arc::new(Inner { snapshot, facts }),
        })
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.inner.snapshot
    }

    fn facts(&self) -> impl Iterator<Item = &GradeFact> {
        self.inner.facts.iter()
    }
}

/// Groups facts by `key`, computes each group's rounded average and sorts the
/// groups by average, highest first. Equal averages keep ascending key order.
fn ranked_averages<'a, K, I>(facts: I, key: impl Fn(&GradeFact) -> K) -> Vec<(&'a GradeFact, Decimal)>
where
    K: Ord,
    I: Iterator<Item = &'a GradeFact>,
{
    let mut groups: BTreeMap<K, Vec<&'a GradeFact>> = BTreeMap::new();
    for fact in facts {
        groups.entry(key(fact)).or_default().push(fact);
    }

    let mut ranked: Vec<(&'a GradeFact, Decimal)> = groups
        .into_values()
        .filter_map(|members| {
            let avg = rounded_average(members.iter().map(|f| f.grade))?;
            Some((members[0], avg))
        })
        .collect();

    // Stable sort keeps the key order from the BTreeMap for ties.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

#[async_trait]
impl ReportQueries for MemoryRepository {
    async fn top_students(&self) -> Result<Vec<StudentAverage>, DbError> {
        let rows = ranked_averages(self.facts(), |f| f.student_id)
            .into_iter()
            .take(TOP_STUDENTS_LIMIT as usize)
            .map(|(fact, avg_grade)| StudentAverage {
                student: fact.student.clone(),
                avg_grade,
            })
            .collect();
        Ok(rows)
    }

    async fn top_student_in_discipline(&self, discipline_id: i32) -> Result<DisciplineLeader, DbError> {
        ensure_id("discipline", discipline_id)?;
        ranked_averages(
            self.facts().filter(|f| f.discipline_id == discipline_id),
            |f| f.student_id,
        )
        .into_iter()
        .next()
        .map(|(fact, avg_grade)| DisciplineLeader {
            discipline: fact.discipline.clone(),
            student: fact.student.clone(),
            avg_grade,
        })
        .ok_or(DbError::NotFound)
    }

    async fn group_averages_for_discipline(&self, discipline_id: i32) -> Result<Vec<GroupAverage>, DbError> {
        ensure_id("discipline", discipline_id)?;
        let rows = ranked_averages(
            self.facts().filter(|f| f.discipline_id == discipline_id),
            |f| f.group_id,
        )
        .into_iter()
        .map(|(fact, avg_grade)| GroupAverage {
            discipline: fact.discipline.clone(),
            group: fact.group.clone(),
            avg_grade,
        })
        .collect();
        Ok(rows)
    }

    async fn overall_average(&self) -> Result<OverallAverage, DbError> {
        rounded_average(self.facts().map(|f| f.grade))
            .map(|avg_grade| OverallAverage { avg_grade })
            .ok_or(DbError::NotFound)
    }

    async fn teacher_disciplines(&self, teacher_id: i32) -> Result<Vec<TeacherDiscipline>, DbError> {
        ensure_id("teacher", teacher_id)?;
        let snapshot = self.snapshot();
        let Some(teacher) = snapshot.teachers.iter().find(|t| t.id == teacher_id) else {
            return Ok(Vec::new());
        };

        let mut taught: Vec<&Discipline> = snapshot
            .disciplines
            .iter()
            .filter(|d| d.teacher_id == teacher_id)
            .collect();
        taught.sort_by_key(|d| d.id);

        Ok(taught
            .into_iter()
            .map(|d| TeacherDiscipline {
                teacher: teacher.fullname.clone(),
                discipline: d.name.clone(),
            })
            .collect())
    }

    async fn group_roster(&self, group_id: i32) -> Result<Vec<GroupMember>, DbError> {
        ensure_id("group", group_id)?;
        let snapshot = self.snapshot();
        let Some(group) = snapshot.groups.iter().find(|g| g.id == group_id) else {
            return Ok(Vec::new());
        };

        let mut members: Vec<&Student> = snapshot
            .students
            .iter()
            .filter(|s| s.group_id == group_id)
            .collect();
        members.sort_by_key(|s| s.id);

        Ok(members
            .into_iter()
            .map(|s| GroupMember {
                group: group.name.clone(),
                student: s.fullname.clone(),
            })
            .collect())
    }

    async fn group_grades_in_discipline(&self, group_id: i32, discipline_id: i32) -> Result<Vec<GroupGrade>, DbError> {
        ensure_id("group", group_id)?;
        ensure_id("discipline", discipline_id)?;
        let distinct: BTreeSet<(i32, &str, &str, &str)> = self
            .facts()
            .filter(|f| f.group_id == group_id && f.discipline_id == discipline_id)
            .map(|f| (f.grade, f.student.as_str(), f.group.as_str(), f.discipline.as_str()))
            .collect();

        let mut rows: Vec<GroupGrade> = distinct
            .into_iter()
            .map(|(grade, student, group, discipline)| GroupGrade {
                student: student.to_string(),
                group: group.to_string(),
                discipline: discipline.to_string(),
                grade,
            })
            .collect();
        rows.sort_by(|a, b| b.grade.cmp(&a.grade).then_with(|| a.student.cmp(&b.student)));
        Ok(rows)
    }

    async fn teacher_average(&self, teacher_id: i32) -> Result<TeacherAverage, DbError> {
        ensure_id("teacher", teacher_id)?;
        let rows = ranked_averages(
            self.facts().filter(|f| f.teacher_id == teacher_id),
            |f| f.teacher_id,
        )
        .into_iter()
        .map(|(fact, avg_grade)| TeacherAverage {
            teacher: fact.teacher.clone(),
            avg_grade,
        })
        .collect();
        expect_single(rows)
    }

    async fn student_disciplines(&self, student_id: i32) -> Result<Vec<StudentDiscipline>, DbError> {
        ensure_id("student", student_id)?;
        let distinct: BTreeMap<(&str, i32), &GradeFact> = self
            .facts()
            .filter(|f| f.student_id == student_id)
            .map(|f| ((f.discipline.as_str(), f.discipline_id), f))
            .collect();

        Ok(distinct
            .into_values()
            .map(|f| StudentDiscipline {
                student: f.student.clone(),
                discipline: f.discipline.clone(),
            })
            .collect())
    }

    async fn student_disciplines_by_teacher(
        &self,
        student_id: i32,
        teacher_id: i32,
    ) -> Result<Vec<StudentTeacherDiscipline>, DbError> {
        ensure_id("student", student_id)?;
        ensure_id("teacher", teacher_id)?;
        let distinct: BTreeMap<(&str, i32), &GradeFact> = self
            .facts()
            .filter(|f| f.student_id == student_id && f.teacher_id == teacher_id)
            .map(|f| ((f.discipline.as_str(), f.discipline_id), f))
            .collect();

        Ok(distinct
            .into_values()
            .map(|f| StudentTeacherDiscipline {
                student: f.student.clone(),
                teacher: f.teacher.clone(),
                discipline: f.discipline.clone(),
            })
            .collect())
    }

    async fn teacher_average_for_student(
        &self,
        teacher_id: i32,
        student_id: i32,
    ) -> Result<Vec<TeacherStudentAverage>, DbError> {
        ensure_id("teacher", teacher_id)?;
        ensure_id("student", student_id)?;
        let rows = ranked_averages(
            self.facts()
                .filter(|f| f.teacher_id == teacher_id && f.student_id == student_id),
            |f| (f.teacher_id, f.student_id),
        )
        .into_iter()
        .map(|(fact, avg_grade)| TeacherStudentAverage {
            teacher: fact.teacher.clone(),
            student: fact.student.clone(),
            avg_grade,
        })
        .collect();
        Ok(rows)
    }

    async fn last_session_grades(&self, discipline_id: i32, group_id: i32) -> Result<Vec<SessionGrade>, DbError> {
        ensure_id("discipline", discipline_id)?;
        ensure_id("group", group_id)?;
        let matching = || {
            self.facts()
                .filter(move |f| f.discipline_id == discipline_id && f.group_id == group_id)
        };

        let Some(last_session) = matching().map(|f| f.date_of).max() else {
            return Ok(Vec::new());
        };

        let mut rows: Vec<SessionGrade> = matching()
            .filter(|f| f.date_of == last_session)
            .map(|f| SessionGrade {
                discipline: f.discipline.clone(),
                student: f.student.clone(),
                group: f.group.clone(),
                date_of: f.date_of,
                grade: f.grade,
            })
            .collect();
        rows.sort_by(|a, b| a.student.cmp(&b.student).then_with(|| b.grade.cmp(&a.grade)));
        Ok(rows)
    }
}
