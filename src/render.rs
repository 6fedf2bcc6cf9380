//! Turns report rows into stdout text.

use comfy_table::Table;
use comfy_table::presets::UTF8_FULL;
use configuration::OutputFormat;
use core_types::{
    DisciplineLeader, GroupAverage, GroupGrade, GroupMember, OverallAverage, SessionGrade,
    StudentAverage, StudentDiscipline, StudentTeacherDiscipline, TeacherAverage,
    TeacherDiscipline, TeacherStudentAverage,
};
use serde::Serialize;

/// A report row that knows its column headers and cell text.
pub trait TableRow {
    fn headers() -> &'static [&'static str];
    fn cells(&self) -> Vec<String>;
}

fn table<'a, T: TableRow + 'a>(rows: impl IntoIterator<Item = &'a T>) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(T::headers().to_vec());
    for row in rows {
        table.add_row(row.cells());
    }
    table.to_string()
}

/// Renders a list report.
pub fn render_rows<T: TableRow + Serialize>(rows: &[T], format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Table => table(rows),
        OutputFormat::Json => serde_json::to_string_pretty(rows)?,
    })
}

/// Renders a single-row report; JSON output is an object rather than an array.
pub fn render_one<T: TableRow + Serialize>(row: &T, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Table => table([row]),
        OutputFormat::Json => serde_json::to_string_pretty(row)?,
    })
}

impl TableRow for StudentAverage {
    fn headers() -> &'static [&'static str] {
        &["Student", "Average"]
    }
    fn cells(&self) -> Vec<String> {
        vec![self.student.clone(), self.avg_grade.to_string()]
    }
}

impl TableRow for DisciplineLeader {
    fn headers() -> &'static [&'static str] {
        &["Discipline", "Student", "Average"]
    }
    fn cells(&self) -> Vec<String> {
        vec![self.discipline.clone(), self.student.clone(), self.avg_grade.to_string()]
    }
}

impl TableRow for GroupAverage {
    fn headers() -> &'static [&'static str] {
        &["Discipline", "Group", "Average"]
    }
    fn cells(&self) -> Vec<String> {
        vec![self.discipline.clone(), self.group.clone(), self.avg_grade.to_string()]
    }
}

impl TableRow for OverallAverage {
    fn headers() -> &'static [&'static str] {
        &["Average"]
    }
    fn cells(&self) -> Vec<String> {
        vec![self.avg_grade.to_string()]
    }
}

impl TableRow for TeacherDiscipline {
    fn headers() -> &'static [&'static str] {
        &["Teacher", "Discipline"]
    }
    fn cells(&self) -> Vec<String> {
        vec![self.teacher.clone(), self.discipline.clone()]
    }
}

impl TableRow for GroupMember {
    fn headers() -> &'static [&'static str] {
        &["Group", "Student"]
    }
    fn cells(&self) -> Vec<String> {
        vec![self.group.clone(), self.student.clone()]
    }
}

impl TableRow for GroupGrade {
    fn headers() -> &'static [&'static str] {
        &["Student", "Group", "Discipline", "Grade"]
    }
    fn cells(&self) -> Vec<String> {
        vec![
            self.student.clone(),
            self.group.clone(),
            self.discipline.clone(),
            self.grade.to_string(),
        ]
    }
}

impl TableRow for TeacherAverage {
    fn headers() -> &'static [&'static str] {
        &["Teacher", "Average"]
    }
    fn cells(&self) -> Vec<String> {
        vec![self.teacher.clone(), self.avg_grade.to_string()]
    }
}

impl TableRow for StudentDiscipline {
    fn headers() -> &'static [&'static str] {
        &["Student", "Discipline"]
    }
    fn cells(&self) -> Vec<String> {
        vec![self.student.clone(), self.discipline.clone()]
    }
}

impl TableRow for StudentTeacherDiscipline {
    fn headers() -> &'static [&'static str] {
        &["Student", "Teacher", "Discipline"]
    }
    fn cells(&self) -> Vec<String> {
        vec![self.student.clone(), self.teacher.clone(), self.discipline.clone()]
    }
}

impl TableRow for TeacherStudentAverage {
    fn headers() -> &'static [&'static str] {
        &["Teacher", "Student", "Average"]
    }
    fn cells(&self) -> Vec<String> {
        vec![self.teacher.clone(), self.student.clone(), self.avg_grade.to_string()]
    }
}

impl TableRow for SessionGrade {
    fn headers() -> &'static [&'static str] {
        &["Discipline", "Student", "Group", "Date", "Grade"]
    }
    fn cells(&self) -> Vec<String> {
        vec![
            self.discipline.clone(),
            self.student.clone(),
            self.group.clone(),
            self.date_of.to_string(),
            self.grade.to_string(),
        ]
    }
}
