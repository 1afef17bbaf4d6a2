//! Record-platform boundary: the wire contract every entity module talks
//! through, plus the seams (`RecordService`, `FunctionClient`) that let the
//! daemon wire a workspace-local store and tests substitute fakes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A raw platform record: JSON object keyed by backend column names.
pub type Record = serde_json::Map<String, Value>;

/// Backend table names. These are a fixed contract; do not rename.
pub mod tables {
    pub const STUDENTS: &str = "student_c";
    pub const COURSES: &str = "course_c";
    pub const ASSIGNMENTS: &str = "assignment_c";
    pub const GRADES: &str = "grade_c";
    pub const ACTIVITIES: &str = "curriculum_activity_c";
    pub const FILES: &str = "files_c";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    EqualTo,
    NotEqualTo,
    Contains,
    StartsWith,
    GreaterThan,
    GreaterThanOrEqualTo,
    LessThan,
    LessThanOrEqualTo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "FieldName")]
    pub field_name: String,
    #[serde(rename = "Operator")]
    pub operator: Operator,
    #[serde(rename = "Values")]
    pub values: Vec<Value>,
}

impl Condition {
    pub fn new(field_name: &str, operator: Operator, value: Value) -> Self {
        Self {
            field_name: field_name.to_string(),
            operator,
            values: vec![value],
        }
    }

    pub fn equal_to(field_name: &str, value: Value) -> Self {
        Self::new(field_name, Operator::EqualTo, value)
    }

    pub fn contains(field_name: &str, text: &str) -> Self {
        Self::new(field_name, Operator::Contains, Value::String(text.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupOperator {
    And,
    Or,
}

/// Conditions joined by `operator`; groups are AND-ed with the rest of the
/// query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionGroup {
    pub operator: GroupOperator,
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortType {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBy {
    #[serde(rename = "fieldName")]
    pub field_name: String,
    #[serde(rename = "sorttype")]
    pub sort: SortType,
}

impl OrderBy {
    pub fn desc(field_name: &str) -> Self {
        Self {
            field_name: field_name.to_string(),
            sort: SortType::Desc,
        }
    }

    pub fn asc(field_name: &str) -> Self {
        Self {
            field_name: field_name.to_string(),
            sort: SortType::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingInfo {
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryParams {
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(rename = "where", default)]
    pub conditions: Vec<Condition>,
    #[serde(rename = "whereGroups", default)]
    pub where_groups: Vec<ConditionGroup>,
    #[serde(rename = "orderBy", default)]
    pub order_by: Vec<OrderBy>,
    #[serde(rename = "pagingInfo", default)]
    pub paging: Option<PagingInfo>,
}

impl QueryParams {
    pub fn with_fields(field_names: &[&str]) -> Self {
        Self {
            fields: field_names.iter().map(|f| (*f).to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn and_where(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn or_group(mut self, conditions: Vec<Condition>) -> Self {
        self.where_groups.push(ConditionGroup {
            operator: GroupOperator::Or,
            conditions,
        });
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn page(mut self, limit: u32, offset: u32) -> Self {
        self.paging = Some(PagingInfo { limit, offset });
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Vec<Record>,
    #[serde(default)]
    pub total: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    #[serde(rename = "fieldLabel")]
    pub field_label: String,
    #[serde(rename = "messageText")]
    pub message_text: String,
}

/// One entry of a batch mutation response. Callers always send exactly one
/// record, but the per-record shape is still the contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Vec<FieldError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResponse {
    pub success: bool,
    #[serde(default)]
    pub results: Vec<RecordResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    #[serde(default)]
    pub results: Vec<DeleteResult>,
}

/// The record half of the vendor boundary. `Err` is transport-level
/// failure; a platform-level rejection travels as `success: false` inside
/// the response envelope.
pub trait RecordService {
    fn fetch_records(&self, table: &str, query: &QueryParams) -> anyhow::Result<FetchResponse>;

    fn get_record_by_id(
        &self,
        table: &str,
        id: i64,
        fields: &[String],
    ) -> anyhow::Result<Option<Record>>;

    fn create_records(&self, table: &str, records: Vec<Value>) -> anyhow::Result<BatchResponse>;

    fn update_records(&self, table: &str, records: Vec<Value>) -> anyhow::Result<BatchResponse>;

    fn delete_records(&self, table: &str, ids: &[i64]) -> anyhow::Result<DeleteResponse>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Serverless function invocation boundary (welcome email, image
/// captioning). Callers treat every outcome as best-effort.
pub trait FunctionClient {
    fn invoke(&self, name: &str, body: &Value) -> anyhow::Result<FunctionResponse>;
}

/// Wired when no function runtime is available. Invocations fail and the
/// outbox downgrades them to warnings, matching the hosted app's behavior
/// when its function endpoint rejects a call.
pub struct DisabledFunctionClient;

impl FunctionClient for DisabledFunctionClient {
    fn invoke(&self, name: &str, _body: &Value) -> anyhow::Result<FunctionResponse> {
        Err(anyhow::anyhow!("function runtime not configured: {name}"))
    }
}

/// A relation-typed field value. Fetches resolve lookups into an object
/// carrying `Id`; mutation echoes hand back the bare integer. Both shapes
/// must normalize to the same foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Unresolved(i64),
    Resolved { id: i64 },
}

impl Relation {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Relation::Unresolved),
            // Form payloads carry ids as strings.
            Value::String(s) => s.trim().parse().ok().map(Relation::Unresolved),
            Value::Object(map) => map
                .get("Id")
                .and_then(Value::as_i64)
                .map(|id| Relation::Resolved { id }),
            _ => None,
        }
    }

    pub const fn id(self) -> i64 {
        match self {
            Relation::Unresolved(id) | Relation::Resolved { id } => id,
        }
    }
}

/// The single normalization point for relation-shaped JSON.
pub fn relation_id(value: &Value) -> Option<i64> {
    Relation::from_value(value).map(Relation::id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn relation_accepts_bare_integer_and_resolved_object() {
        assert_eq!(relation_id(&json!(7)), Some(7));
        assert_eq!(relation_id(&json!({"Id": 7, "Name": "Algebra I"})), Some(7));
        assert_eq!(relation_id(&json!("7")), Some(7));
        assert_eq!(relation_id(&json!(null)), None);
        assert_eq!(relation_id(&json!({"name": "no id"})), None);
    }

    #[test]
    fn query_params_serialize_with_sdk_field_names() {
        let query = QueryParams::with_fields(&["status_c"])
            .and_where(Condition::equal_to("status_c", json!("active")))
            .order_by(OrderBy::desc("enrollment_date_c"))
            .page(50, 0);
        let wire = serde_json::to_value(&query).expect("serialize query");
        assert_eq!(wire["where"][0]["FieldName"], "status_c");
        assert_eq!(wire["where"][0]["Operator"], "EqualTo");
        assert_eq!(wire["orderBy"][0]["sorttype"], "DESC");
        assert_eq!(wire["pagingInfo"]["limit"], 50);
    }
}
