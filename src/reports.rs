//! Report computations over the cached entity lists: the overview block,
//! the roster CSV export, and the plain-text summary.

use serde::Serialize;

use crate::model::{Course, Grade, GradeLevel, Student, StudentStatus};
use crate::settings::GradeScale;

#[derive(Debug, Clone, Default, Serialize)]
pub struct GradeDistribution {
    #[serde(rename = "A")]
    pub a: usize,
    #[serde(rename = "B")]
    pub b: usize,
    #[serde(rename = "C")]
    pub c: usize,
    #[serde(rename = "D")]
    pub d: usize,
    #[serde(rename = "F")]
    pub f: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LevelCount {
    pub level: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_students: usize,
    pub active_students: usize,
    pub total_courses: usize,
    pub total_grades: usize,
    /// Mean over all students, two decimals.
    pub average_gpa: f64,
    pub grade_distribution: GradeDistribution,
    pub enrollment_by_grade: Vec<LevelCount>,
}

pub fn overview(
    students: &[Student],
    courses: &[Course],
    grades: &[Grade],
    scale: &GradeScale,
) -> Overview {
    let average_gpa = if students.is_empty() {
        0.0
    } else {
        let sum: f64 = students.iter().map(|s| s.gpa).sum();
        round2(sum / students.len() as f64)
    };

    let mut distribution = GradeDistribution::default();
    for grade in grades {
        match scale.letter(grade.score) {
            'A' => distribution.a += 1,
            'B' => distribution.b += 1,
            'C' => distribution.c += 1,
            'D' => distribution.d += 1,
            _ => distribution.f += 1,
        }
    }

    let enrollment_by_grade = GradeLevel::ALL
        .iter()
        .map(|level| LevelCount {
            level: level.as_str(),
            count: students
                .iter()
                .filter(|s| s.grade_level == Some(*level))
                .count(),
        })
        .collect();

    Overview {
        total_students: students.len(),
        active_students: students
            .iter()
            .filter(|s| s.status == StudentStatus::Active)
            .count(),
        total_courses: courses.len(),
        total_grades: grades.len(),
        average_gpa,
        grade_distribution: distribution,
        enrollment_by_grade,
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Roster export, one row per student in list order.
pub fn students_csv(students: &[Student]) -> String {
    let mut out = String::from("First Name,Last Name,Email,Phone,Grade Level,GPA,Status\n");
    for s in students {
        out.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            s.first_name,
            s.last_name,
            s.email,
            s.phone,
            s.grade_level.map_or("", GradeLevel::as_str),
            s.gpa,
            s.status.as_str(),
        ));
    }
    out
}

pub fn summary_text(overview: &Overview, school_name: &str, generated_at: &str) -> String {
    let mut out = format!(
        "{school_name} - Report Summary\n\
         Generated: {generated_at}\n\
         \n\
         Total Students: {}\n\
         Active Students: {}\n\
         Total Courses: {}\n\
         Total Grades: {}\n\
         Average GPA: {:.2}\n\
         \n\
         Grade Distribution:\n\
         A: {}\nB: {}\nC: {}\nD: {}\nF: {}\n\
         \n\
         Enrollment by Grade:\n",
        overview.total_students,
        overview.active_students,
        overview.total_courses,
        overview.total_grades,
        overview.average_gpa,
        overview.grade_distribution.a,
        overview.grade_distribution.b,
        overview.grade_distribution.c,
        overview.grade_distribution.d,
        overview.grade_distribution.f,
    );
    for entry in &overview.enrollment_by_grade {
        out.push_str(&format!("{}: {}\n", entry.level, entry.count));
    }
    out
}
