pub mod average;
pub mod entities;
pub mod rows;

// Re-export the core types to provide a clean public API.
pub use average::{AVERAGE_SCALE, round_average, rounded_average};
pub use entities::{Discipline, Grade, Group, Student, Teacher};
pub use rows::{
    DisciplineLeader, GroupAverage, GroupGrade, GroupMember, OverallAverage, SessionGrade,
    StudentAverage, StudentDiscipline, StudentTeacherDiscipline, TeacherAverage,
    TeacherDiscipline, TeacherStudentAverage,
};
