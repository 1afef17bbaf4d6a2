//! View models the UI layer consumes, plus the per-entity draft types
//! (the editable field subsets accepted by create/update).
//!
//! Records cross the wire keyed by backend column names (`first_name_c`);
//! everything in this module speaks the camelCase view vocabulary. The
//! translation lives in `map`.

use serde::{Deserialize, Serialize};

pub trait HasId {
    fn id(&self) -> i64;
}

macro_rules! impl_has_id {
    ($($ty:ty),* $(,)?) => {
        $(impl HasId for $ty {
            fn id(&self) -> i64 {
                self.id
            }
        })*
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    #[default]
    Active,
    Inactive,
    Pending,
    Graduated,
}

impl StudentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Pending => "pending",
            Self::Graduated => "graduated",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "pending" => Some(Self::Pending),
            "graduated" => Some(Self::Graduated),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeStatus {
    #[default]
    Pending,
    Submitted,
    Graded,
    Overdue,
}

impl GradeStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Submitted => "submitted",
            Self::Graded => "graded",
            Self::Overdue => "overdue",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "submitted" => Some(Self::Submitted),
            "graded" => Some(Self::Graded),
            "overdue" => Some(Self::Overdue),
            _ => None,
        }
    }
}

/// Curriculum activity lifecycle. The UI displays these capitalized, so
/// that is the wire form too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActivityStatus {
    #[default]
    Planning,
    Active,
    Completed,
    Cancelled,
}

impl ActivityStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planning => "Planning",
            Self::Active => "Active",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Planning" => Some(Self::Planning),
            "Active" => Some(Self::Active),
            "Completed" => Some(Self::Completed),
            "Cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradeLevel {
    #[serde(rename = "9th Grade")]
    Ninth,
    #[serde(rename = "10th Grade")]
    Tenth,
    #[serde(rename = "11th Grade")]
    Eleventh,
    #[serde(rename = "12th Grade")]
    Twelfth,
}

impl GradeLevel {
    pub const ALL: [Self; 4] = [Self::Ninth, Self::Tenth, Self::Eleventh, Self::Twelfth];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ninth => "9th Grade",
            Self::Tenth => "10th Grade",
            Self::Eleventh => "11th Grade",
            Self::Twelfth => "12th Grade",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "9th Grade" => Some(Self::Ninth),
            "10th Grade" => Some(Self::Tenth),
            "11th Grade" => Some(Self::Eleventh),
            "12th Grade" => Some(Self::Twelfth),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(rename = "Id")]
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    /// Display code (`STU012`), server-assigned. Distinct from `Id`.
    pub student_id: String,
    pub email: String,
    pub phone: String,
    pub enrollment_date: String,
    pub status: StudentStatus,
    pub grade_level: Option<GradeLevel>,
    /// Server-owned; never part of a mutation payload.
    pub gpa: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(rename = "Id")]
    pub id: i64,
    pub name: String,
    pub code: String,
    pub semester: String,
    pub credits: i64,
    /// Membership set; backend stores it comma-joined, order irrelevant.
    pub enrolled_students: Vec<i64>,
    /// Optimistic-concurrency token; stale updates are rejected.
    pub version: i64,
}

impl Course {
    pub fn is_enrolled(&self, student_id: i64) -> bool {
        self.enrolled_students.contains(&student_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    #[serde(rename = "Id")]
    pub id: i64,
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub max_points: f64,
    #[serde(rename = "type")]
    pub kind: String,
    pub course_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    #[serde(rename = "Id")]
    pub id: i64,
    pub score: f64,
    pub submission_date: String,
    pub status: GradeStatus,
    pub feedback: Option<String>,
    pub student_id: i64,
    pub assignment_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumActivity {
    #[serde(rename = "Id")]
    pub id: i64,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub subject: String,
    pub grade_level: Option<GradeLevel>,
    /// Minutes.
    pub duration: i64,
    pub start_date: String,
    pub end_date: String,
    pub status: ActivityStatus,
    pub instructor: String,
    pub participants: i64,
    pub materials: String,
    pub objectives: String,
    /// Back-referenced `files_c` rows; populated on single-record reads.
    #[serde(default)]
    pub attached_files: Vec<StoredFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    #[serde(rename = "Id")]
    pub id: i64,
    pub name: String,
    pub tags: String,
    pub file_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub upload_date: String,
    pub openai_description: Option<String>,
    /// Polymorphic back-reference to the attaching entity.
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
}

impl_has_id!(Student, Course, Assignment, Grade, CurriculumActivity, StoredFile);

/// Form payloads arrive with numbers-as-strings; accept both shapes.
pub mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn f64_from_value<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_f64().ok_or_else(|| serde::de::Error::custom("bad number")),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| serde::de::Error::custom(format!("not a number: {s:?}"))),
            Value::Null => Ok(0.0),
            other => Err(serde::de::Error::custom(format!("not a number: {other}"))),
        }
    }

    pub fn i64_from_value<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_i64().ok_or_else(|| serde::de::Error::custom("bad integer")),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| serde::de::Error::custom(format!("not an integer: {s:?}"))),
            Value::Null => Ok(0),
            other => Err(serde::de::Error::custom(format!("not an integer: {other}"))),
        }
    }

    pub fn opt_f64_from_value<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            Value::Number(n) => Ok(n.as_f64()),
            Value::String(s) => Ok(s.trim().parse().ok()),
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDraft {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub status: Option<StudentStatus>,
    #[serde(default)]
    pub grade_level: Option<GradeLevel>,
    /// Filled with the call time when absent on create.
    #[serde(default)]
    pub enrollment_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub semester: String,
    #[serde(default, deserialize_with = "lenient::i64_from_value")]
    pub credits: i64,
    /// Only meaningful on update; membership is managed via enroll/remove.
    #[serde(default)]
    pub enrolled_students: Option<Vec<i64>>,
    /// Concurrency token observed by the caller; absent means "read the
    /// current one first".
    #[serde(default)]
    pub version: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub due_date: String,
    #[serde(default, deserialize_with = "lenient::opt_f64_from_value")]
    pub max_points: Option<f64>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient::i64_from_value")]
    pub course_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeDraft {
    #[serde(default, deserialize_with = "lenient::f64_from_value")]
    pub score: f64,
    #[serde(default)]
    pub submission_date: Option<String>,
    #[serde(default)]
    pub status: Option<GradeStatus>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default, deserialize_with = "lenient::i64_from_value")]
    pub student_id: i64,
    #[serde(default, deserialize_with = "lenient::i64_from_value")]
    pub assignment_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub grade_level: Option<GradeLevel>,
    #[serde(default, deserialize_with = "lenient::i64_from_value")]
    pub duration: i64,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub status: Option<ActivityStatus>,
    #[serde(default)]
    pub instructor: String,
    #[serde(default, deserialize_with = "lenient::i64_from_value")]
    pub participants: i64,
    #[serde(default)]
    pub materials: String,
    #[serde(default)]
    pub objectives: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDraft {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Tags", default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub file_type: String,
    #[serde(default, deserialize_with = "lenient::i64_from_value")]
    pub file_size: i64,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub entity_id: Option<i64>,
    /// Base64 payload handed to the captioning function for images; never
    /// persisted as a record column.
    #[serde(default)]
    pub image_data: Option<String>,
}

/// Activity search filters; `all` (or empty) skips a dimension, matching
/// the original filter dropdowns.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityFilters {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl ActivityFilters {
    pub fn wants(field: &Option<String>) -> Option<&str> {
        match field.as_deref() {
            None | Some("") | Some("all") => None,
            Some(v) => Some(v),
        }
    }
}
