//! Bidirectional translation between platform records (backend column
//! names) and view models.
//!
//! Forward maps are total: any JSON shape maps to a view model using the
//! documented defaults. Reverse maps emit only the editable field subset;
//! server-owned columns (`Id`, `gpa_c`, the `student_id_c` display code)
//! never appear in a mutation payload.

use serde_json::{json, Map, Value};

use crate::model::{
    ActivityDraft, ActivityStatus, Assignment, AssignmentDraft, Course, CourseDraft,
    CurriculumActivity, FileDraft, Grade, GradeDraft, GradeLevel, GradeStatus, StoredFile, Student,
    StudentDraft, StudentStatus,
};
use crate::platform::{relation_id, Record};

pub const STUDENT_FIELDS: &[&str] = &[
    "first_name_c",
    "last_name_c",
    "student_id_c",
    "email_c",
    "phone_c",
    "enrollment_date_c",
    "status_c",
    "grade_level_c",
    "gpa_c",
];

pub const COURSE_FIELDS: &[&str] = &[
    "name_c",
    "code_c",
    "semester_c",
    "credits_c",
    "enrolled_students_c",
    "version_c",
];

pub const ASSIGNMENT_FIELDS: &[&str] = &[
    "title_c",
    "description_c",
    "due_date_c",
    "max_points_c",
    "type_c",
    "course_id_c",
];

pub const GRADE_FIELDS: &[&str] = &[
    "score_c",
    "submission_date_c",
    "status_c",
    "feedback_c",
    "student_id_c",
    "assignment_id_c",
];

pub const ACTIVITY_FIELDS: &[&str] = &[
    "title_c",
    "description_c",
    "type_c",
    "subject_c",
    "grade_level_c",
    "duration_c",
    "start_date_c",
    "end_date_c",
    "status_c",
    "instructor_c",
    "participants_c",
    "materials_c",
    "objectives_c",
];

pub const FILE_FIELDS: &[&str] = &[
    "Name",
    "Tags",
    "file_name_c",
    "file_type_c",
    "file_size_c",
    "upload_date_c",
    "openai_description_c",
    "entity_type_c",
    "entity_id_c",
];

fn text(rec: &Record, key: &str) -> String {
    match rec.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn opt_text(rec: &Record, key: &str) -> Option<String> {
    match rec.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn num(rec: &Record, key: &str, default: f64) -> f64 {
    match rec.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
        _ => default,
    }
}

fn int(rec: &Record, key: &str, default: i64) -> i64 {
    match rec.get(key) {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(default),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
        _ => default,
    }
}

fn rel(rec: &Record, key: &str) -> i64 {
    rec.get(key).and_then(relation_id).unwrap_or(0)
}

fn opt_rel(rec: &Record, key: &str) -> Option<i64> {
    rec.get(key).and_then(relation_id)
}

pub fn record_id(rec: &Record) -> i64 {
    int(rec, "Id", 0)
}

/// `enrolled_students_c` is a comma-joined id string on the backend; a
/// tolerant read also accepts an id array.
pub fn parse_enrolled(value: Option<&Value>) -> Vec<i64> {
    let mut out: Vec<i64> = Vec::new();
    match value {
        Some(Value::String(s)) => {
            for part in s.split(',') {
                if let Ok(id) = part.trim().parse::<i64>() {
                    if !out.contains(&id) {
                        out.push(id);
                    }
                }
            }
        }
        Some(Value::Array(items)) => {
            for item in items {
                if let Some(id) = relation_id(item) {
                    if !out.contains(&id) {
                        out.push(id);
                    }
                }
            }
        }
        _ => {}
    }
    out
}

pub fn join_enrolled(ids: &[i64]) -> String {
    ids.iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

pub fn student_from_record(rec: &Record) -> Student {
    Student {
        id: record_id(rec),
        first_name: text(rec, "first_name_c"),
        last_name: text(rec, "last_name_c"),
        student_id: text(rec, "student_id_c"),
        email: text(rec, "email_c"),
        phone: text(rec, "phone_c"),
        enrollment_date: text(rec, "enrollment_date_c"),
        status: StudentStatus::parse(&text(rec, "status_c")).unwrap_or_default(),
        grade_level: GradeLevel::parse(&text(rec, "grade_level_c")),
        gpa: num(rec, "gpa_c", 0.0),
    }
}

pub fn student_to_record(draft: &StudentDraft) -> Value {
    let mut rec = Map::new();
    rec.insert("first_name_c".into(), json!(draft.first_name));
    rec.insert("last_name_c".into(), json!(draft.last_name));
    rec.insert("email_c".into(), json!(draft.email));
    rec.insert("phone_c".into(), json!(draft.phone));
    if let Some(status) = draft.status {
        rec.insert("status_c".into(), json!(status.as_str()));
    }
    if let Some(level) = draft.grade_level {
        rec.insert("grade_level_c".into(), json!(level.as_str()));
    }
    if let Some(date) = &draft.enrollment_date {
        rec.insert("enrollment_date_c".into(), json!(date));
    }
    Value::Object(rec)
}

pub fn course_from_record(rec: &Record) -> Course {
    Course {
        id: record_id(rec),
        name: text(rec, "name_c"),
        code: text(rec, "code_c"),
        semester: text(rec, "semester_c"),
        credits: int(rec, "credits_c", 0),
        enrolled_students: parse_enrolled(rec.get("enrolled_students_c")),
        version: int(rec, "version_c", 0),
    }
}

pub fn course_to_record(draft: &CourseDraft) -> Value {
    let mut rec = Map::new();
    rec.insert("name_c".into(), json!(draft.name));
    rec.insert("code_c".into(), json!(draft.code));
    rec.insert("semester_c".into(), json!(draft.semester));
    rec.insert("credits_c".into(), json!(draft.credits));
    if let Some(ids) = &draft.enrolled_students {
        rec.insert("enrolled_students_c".into(), json!(join_enrolled(ids)));
    }
    if let Some(version) = draft.version {
        rec.insert("version_c".into(), json!(version));
    }
    Value::Object(rec)
}

pub fn assignment_from_record(rec: &Record) -> Assignment {
    Assignment {
        id: record_id(rec),
        title: text(rec, "title_c"),
        description: text(rec, "description_c"),
        due_date: text(rec, "due_date_c"),
        // 100 is the documented default, not the generic zero.
        max_points: num(rec, "max_points_c", 100.0),
        kind: text(rec, "type_c"),
        course_id: rel(rec, "course_id_c"),
    }
}

pub fn assignment_to_record(draft: &AssignmentDraft) -> Value {
    json!({
        "title_c": draft.title,
        "description_c": draft.description,
        "due_date_c": draft.due_date,
        "max_points_c": draft.max_points.unwrap_or(100.0),
        "type_c": draft.kind,
        "course_id_c": draft.course_id,
    })
}

pub fn grade_from_record(rec: &Record) -> Grade {
    Grade {
        id: record_id(rec),
        score: num(rec, "score_c", 0.0),
        submission_date: text(rec, "submission_date_c"),
        status: GradeStatus::parse(&text(rec, "status_c")).unwrap_or_default(),
        feedback: opt_text(rec, "feedback_c"),
        student_id: rel(rec, "student_id_c"),
        assignment_id: rel(rec, "assignment_id_c"),
    }
}

pub fn grade_to_record(draft: &GradeDraft) -> Value {
    let mut rec = Map::new();
    rec.insert("score_c".into(), json!(draft.score));
    if let Some(date) = &draft.submission_date {
        rec.insert("submission_date_c".into(), json!(date));
    }
    if let Some(status) = draft.status {
        rec.insert("status_c".into(), json!(status.as_str()));
    }
    if let Some(feedback) = &draft.feedback {
        rec.insert("feedback_c".into(), json!(feedback));
    }
    rec.insert("student_id_c".into(), json!(draft.student_id));
    rec.insert("assignment_id_c".into(), json!(draft.assignment_id));
    Value::Object(rec)
}

pub fn activity_from_record(rec: &Record) -> CurriculumActivity {
    CurriculumActivity {
        id: record_id(rec),
        title: text(rec, "title_c"),
        description: text(rec, "description_c"),
        kind: text(rec, "type_c"),
        subject: text(rec, "subject_c"),
        grade_level: GradeLevel::parse(&text(rec, "grade_level_c")),
        duration: int(rec, "duration_c", 0),
        start_date: text(rec, "start_date_c"),
        end_date: text(rec, "end_date_c"),
        status: ActivityStatus::parse(&text(rec, "status_c")).unwrap_or_default(),
        instructor: text(rec, "instructor_c"),
        participants: int(rec, "participants_c", 0),
        materials: text(rec, "materials_c"),
        objectives: text(rec, "objectives_c"),
        attached_files: Vec::new(),
    }
}

pub fn activity_to_record(draft: &ActivityDraft) -> Value {
    let mut rec = Map::new();
    rec.insert("title_c".into(), json!(draft.title));
    rec.insert("description_c".into(), json!(draft.description));
    rec.insert("type_c".into(), json!(draft.kind));
    rec.insert("subject_c".into(), json!(draft.subject));
    if let Some(level) = draft.grade_level {
        rec.insert("grade_level_c".into(), json!(level.as_str()));
    }
    rec.insert("duration_c".into(), json!(draft.duration));
    rec.insert("start_date_c".into(), json!(draft.start_date));
    rec.insert("end_date_c".into(), json!(draft.end_date));
    if let Some(status) = draft.status {
        rec.insert("status_c".into(), json!(status.as_str()));
    }
    rec.insert("instructor_c".into(), json!(draft.instructor));
    rec.insert("participants_c".into(), json!(draft.participants));
    rec.insert("materials_c".into(), json!(draft.materials));
    rec.insert("objectives_c".into(), json!(draft.objectives));
    Value::Object(rec)
}

pub fn file_from_record(rec: &Record) -> StoredFile {
    StoredFile {
        id: record_id(rec),
        name: text(rec, "Name"),
        tags: text(rec, "Tags"),
        file_name: text(rec, "file_name_c"),
        file_type: text(rec, "file_type_c"),
        file_size: int(rec, "file_size_c", 0),
        upload_date: text(rec, "upload_date_c"),
        openai_description: opt_text(rec, "openai_description_c"),
        entity_type: opt_text(rec, "entity_type_c"),
        entity_id: opt_rel(rec, "entity_id_c"),
    }
}

/// Reverse map for metadata edits: upload date and caption are immutable
/// through this path.
pub fn file_update_record(draft: &FileDraft) -> Value {
    json!({
        "Name": draft.name,
        "Tags": draft.tags.clone().unwrap_or_default(),
        "file_name_c": draft.file_name,
        "file_type_c": draft.file_type,
        "file_size_c": draft.file_size,
        "entity_type_c": draft.entity_type.clone().unwrap_or_default(),
        "entity_id_c": draft.entity_id.map_or(Value::Null, |id| json!(id)),
    })
}

/// Reverse map for uploads. The caption is whatever the outbox has
/// produced so far (empty at create time), never caller-supplied.
pub fn file_to_record(draft: &FileDraft, upload_date: &str, description: &str) -> Value {
    json!({
        "Name": draft.name,
        "Tags": draft.tags.clone().unwrap_or_default(),
        "file_name_c": draft.file_name,
        "file_type_c": draft.file_type,
        "file_size_c": draft.file_size,
        "upload_date_c": upload_date,
        "openai_description_c": description,
        "entity_type_c": draft.entity_type.clone().unwrap_or_default(),
        "entity_id_c": draft.entity_id.map_or(Value::Null, |id| json!(id)),
    })
}
