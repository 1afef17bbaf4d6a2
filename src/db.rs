//! Workspace-local implementation of the record-platform contract over
//! SQLite, plus the local-only `settings` and `outbox` tables.
//!
//! Table and column names match the hosted platform exactly; the schema is
//! described once in `TABLES` and drives both bootstrap and server-side
//! validation (picklists, ranges, lookup coercion, the course version
//! guard).

use std::path::Path;

use anyhow::{anyhow, Context};
use chrono::{SecondsFormat, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::outbox::{OutboxEvent, OutboxStore, QueuedEvent};
use crate::platform::{
    BatchResponse, Condition, DeleteResponse, DeleteResult, FetchResponse, FieldError,
    GroupOperator, Operator, QueryParams, Record, RecordResult, RecordService, SortType,
};

pub const DB_FILE: &str = "roster.sqlite3";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColKind {
    Text,
    Integer,
    Real,
}

struct ColumnSpec {
    name: &'static str,
    kind: ColKind,
    picklist: Option<&'static [&'static str]>,
    range: Option<(f64, f64)>,
    /// Lookup columns accept `{"Id": n}` on write and are returned in
    /// resolved object form from fetch/get.
    lookup: bool,
}

const fn col(name: &'static str, kind: ColKind) -> ColumnSpec {
    ColumnSpec {
        name,
        kind,
        picklist: None,
        range: None,
        lookup: false,
    }
}

const fn pick(name: &'static str, values: &'static [&'static str]) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColKind::Text,
        picklist: Some(values),
        range: None,
        lookup: false,
    }
}

const fn lookup(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColKind::Integer,
        picklist: None,
        range: None,
        lookup: true,
    }
}

const fn ranged(name: &'static str, lo: f64, hi: f64) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColKind::Real,
        picklist: None,
        range: Some((lo, hi)),
        lookup: false,
    }
}

struct TableSpec {
    name: &'static str,
    columns: &'static [ColumnSpec],
    /// Updates must present a current `version_c`; stale tokens fail.
    versioned: bool,
}

const STUDENT_STATUSES: &[&str] = &["", "active", "inactive", "pending", "graduated"];
const GRADE_STATUSES: &[&str] = &["", "pending", "submitted", "graded", "overdue"];
const ACTIVITY_STATUSES: &[&str] = &["", "Planning", "Active", "Completed", "Cancelled"];
const GRADE_LEVELS: &[&str] = &["", "9th Grade", "10th Grade", "11th Grade", "12th Grade"];

const TABLES: &[TableSpec] = &[
    TableSpec {
        name: "student_c",
        columns: &[
            col("first_name_c", ColKind::Text),
            col("last_name_c", ColKind::Text),
            col("student_id_c", ColKind::Text),
            col("email_c", ColKind::Text),
            col("phone_c", ColKind::Text),
            col("enrollment_date_c", ColKind::Text),
            pick("status_c", STUDENT_STATUSES),
            pick("grade_level_c", GRADE_LEVELS),
            ranged("gpa_c", 0.0, 4.0),
        ],
        versioned: false,
    },
    TableSpec {
        name: "course_c",
        columns: &[
            col("name_c", ColKind::Text),
            col("code_c", ColKind::Text),
            col("semester_c", ColKind::Text),
            col("credits_c", ColKind::Integer),
            col("enrolled_students_c", ColKind::Text),
            col("version_c", ColKind::Integer),
        ],
        versioned: true,
    },
    TableSpec {
        name: "assignment_c",
        columns: &[
            col("title_c", ColKind::Text),
            col("description_c", ColKind::Text),
            col("due_date_c", ColKind::Text),
            col("max_points_c", ColKind::Real),
            col("type_c", ColKind::Text),
            lookup("course_id_c"),
        ],
        versioned: false,
    },
    TableSpec {
        name: "grade_c",
        columns: &[
            ranged("score_c", 0.0, 100.0),
            col("submission_date_c", ColKind::Text),
            pick("status_c", GRADE_STATUSES),
            col("feedback_c", ColKind::Text),
            lookup("student_id_c"),
            lookup("assignment_id_c"),
        ],
        versioned: false,
    },
    TableSpec {
        name: "curriculum_activity_c",
        columns: &[
            col("title_c", ColKind::Text),
            col("description_c", ColKind::Text),
            col("type_c", ColKind::Text),
            col("subject_c", ColKind::Text),
            pick("grade_level_c", GRADE_LEVELS),
            col("duration_c", ColKind::Integer),
            col("start_date_c", ColKind::Text),
            col("end_date_c", ColKind::Text),
            pick("status_c", ACTIVITY_STATUSES),
            col("instructor_c", ColKind::Text),
            col("participants_c", ColKind::Integer),
            col("materials_c", ColKind::Text),
            col("objectives_c", ColKind::Text),
        ],
        versioned: false,
    },
    TableSpec {
        name: "files_c",
        columns: &[
            col("Name", ColKind::Text),
            col("Tags", ColKind::Text),
            col("file_name_c", ColKind::Text),
            col("file_type_c", ColKind::Text),
            col("file_size_c", ColKind::Integer),
            col("upload_date_c", ColKind::Text),
            col("openai_description_c", ColKind::Text),
            col("entity_type_c", ColKind::Text),
            lookup("entity_id_c"),
        ],
        versioned: false,
    },
];

fn table_spec(name: &str) -> anyhow::Result<&'static TableSpec> {
    TABLES
        .iter()
        .find(|t| t.name == name)
        .ok_or_else(|| anyhow!("unknown table: {name}"))
}

fn column_spec<'a>(table: &'a TableSpec, name: &str) -> Option<&'a ColumnSpec> {
    table.columns.iter().find(|c| c.name == name)
}

pub struct SqliteRecordService {
    conn: Connection,
}

impl SqliteRecordService {
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(workspace)
            .with_context(|| format!("failed to create workspace {}", workspace.display()))?;
        let conn = Connection::open(workspace.join(DB_FILE))
            .with_context(|| format!("failed to open database in {}", workspace.display()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.execute("PRAGMA foreign_keys = ON", [])?;

        for table in TABLES {
            let cols = table
                .columns
                .iter()
                .map(|c| {
                    let sql_type = match c.kind {
                        ColKind::Text => "TEXT",
                        ColKind::Integer => "INTEGER",
                        ColKind::Real => "REAL",
                    };
                    format!("{} {}", c.name, sql_type)
                })
                .collect::<Vec<_>>()
                .join(", ");
            conn.execute(
                &format!(
                    "CREATE TABLE IF NOT EXISTS {}(Id INTEGER PRIMARY KEY AUTOINCREMENT, {})",
                    table.name, cols
                ),
                [],
            )?;
        }

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_assignment_course ON assignment_c(course_id_c)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_grade_student ON grade_c(student_id_c)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_grade_assignment ON grade_c(assignment_id_c)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_files_entity ON files_c(entity_type_c, entity_id_c)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS settings(
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS outbox(
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                payload TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                attempts INTEGER NOT NULL DEFAULT 0,
                last_error TEXT,
                created_at TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_outbox_status ON outbox(status)",
            [],
        )?;

        Ok(Self { conn })
    }

    pub fn settings_get_json(&self, key: &str) -> anyhow::Result<Option<Value>> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT value FROM settings WHERE key = ?", [key], |r| {
                r.get(0)
            })
            .optional()?;
        match raw {
            Some(text) => Ok(Some(
                serde_json::from_str(&text)
                    .with_context(|| format!("settings entry {key} is not valid JSON"))?,
            )),
            None => Ok(None),
        }
    }

    pub fn settings_set_json(&self, key: &str, value: &Value) -> anyhow::Result<()> {
        self.conn.execute(
            "INSERT INTO settings(key, value) VALUES(?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            (key, serde_json::to_string(value)?),
        )?;
        Ok(())
    }

    /// Validate and coerce one incoming record against the table spec.
    /// Returns column/value pairs ready for binding, or per-field errors.
    fn coerce_record(
        table: &TableSpec,
        record: &Map<String, Value>,
    ) -> Result<Vec<(&'static str, SqlValue)>, Vec<FieldError>> {
        let mut out = Vec::new();
        let mut errors = Vec::new();

        for (key, value) in record {
            if key == "Id" {
                continue;
            }
            let Some(spec) = column_spec(table, key) else {
                errors.push(FieldError {
                    field_label: key.clone(),
                    message_text: format!("unknown field for table {}", table.name),
                });
                continue;
            };

            let coerced = match (spec.kind, value) {
                (_, Value::Null) => Some(SqlValue::Null),
                (ColKind::Text, Value::String(s)) => Some(SqlValue::Text(s.clone())),
                (ColKind::Integer, v) => {
                    if spec.lookup {
                        crate::platform::relation_id(v).map(SqlValue::Integer)
                    } else {
                        match v {
                            Value::Number(n) => n.as_i64().map(SqlValue::Integer),
                            Value::String(s) => s.trim().parse().ok().map(SqlValue::Integer),
                            _ => None,
                        }
                    }
                }
                (ColKind::Real, Value::Number(n)) => n.as_f64().map(SqlValue::Real),
                (ColKind::Real, Value::String(s)) => s.trim().parse().ok().map(SqlValue::Real),
                _ => None,
            };

            let Some(coerced) = coerced else {
                errors.push(FieldError {
                    field_label: spec.name.into(),
                    message_text: format!("invalid value for {}", spec.name),
                });
                continue;
            };

            if let (Some(allowed), SqlValue::Text(s)) = (spec.picklist, &coerced) {
                if !allowed.contains(&s.as_str()) {
                    errors.push(FieldError {
                        field_label: spec.name.into(),
                        message_text: format!(
                            "{} must be one of {}",
                            spec.name,
                            allowed.join(", ")
                        ),
                    });
                    continue;
                }
            }
            if let Some((lo, hi)) = spec.range {
                let n = match coerced {
                    SqlValue::Real(f) => Some(f),
                    SqlValue::Integer(i) => Some(i as f64),
                    _ => None,
                };
                if let Some(n) = n {
                    if n < lo || n > hi {
                        errors.push(FieldError {
                            field_label: spec.name.into(),
                            message_text: format!("{} must be between {lo} and {hi}", spec.name),
                        });
                        continue;
                    }
                }
            }

            out.push((spec.name, coerced));
        }

        if errors.is_empty() {
            Ok(out)
        } else {
            Err(errors)
        }
    }

    /// Read a stored row back in raw form: bare integers, no lookup
    /// expansion. This is the shape mutation echoes use.
    fn read_raw(&self, table: &TableSpec, id: i64) -> anyhow::Result<Option<Record>> {
        let names: Vec<&str> = table.columns.iter().map(|c| c.name).collect();
        let sql = format!(
            "SELECT Id, {} FROM {} WHERE Id = ?",
            names.join(", "),
            table.name
        );
        let row = self
            .conn
            .query_row(&sql, [id], |row| {
                let mut rec = Map::new();
                rec.insert("Id".into(), json!(row.get::<_, i64>(0)?));
                for (i, name) in names.iter().enumerate() {
                    rec.insert(
                        (*name).to_string(),
                        sql_to_json(row.get::<_, SqlValue>(i + 1)?),
                    );
                }
                Ok(rec)
            })
            .optional()?;
        Ok(row)
    }

    fn expand_lookups(table: &TableSpec, mut rec: Record) -> Record {
        for spec in table.columns.iter().filter(|c| c.lookup) {
            if let Some(Value::Number(n)) = rec.get(spec.name) {
                if let Some(id) = n.as_i64() {
                    rec.insert(spec.name.to_string(), json!({ "Id": id }));
                }
            }
        }
        rec
    }

    fn where_clause(
        table: &TableSpec,
        query: &QueryParams,
    ) -> anyhow::Result<(String, Vec<SqlValue>)> {
        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<SqlValue> = Vec::new();

        for cond in &query.conditions {
            clauses.push(condition_sql(table, cond, &mut params)?);
        }
        for group in &query.where_groups {
            if group.conditions.is_empty() {
                continue;
            }
            let joined = group
                .conditions
                .iter()
                .map(|cond| condition_sql(table, cond, &mut params))
                .collect::<anyhow::Result<Vec<_>>>()?
                .join(match group.operator {
                    GroupOperator::And => " AND ",
                    GroupOperator::Or => " OR ",
                });
            clauses.push(format!("({joined})"));
        }

        if clauses.is_empty() {
            Ok((String::new(), params))
        } else {
            Ok((format!(" WHERE {}", clauses.join(" AND ")), params))
        }
    }
}

fn sql_to_json(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) => json!(i),
        SqlValue::Real(f) => json!(f),
        SqlValue::Text(s) => json!(s),
        SqlValue::Blob(_) => Value::Null,
    }
}

fn condition_sql(
    table: &TableSpec,
    cond: &Condition,
    params: &mut Vec<SqlValue>,
) -> anyhow::Result<String> {
    let spec = column_spec(table, &cond.field_name)
        .ok_or_else(|| anyhow!("unknown field in where clause: {}", cond.field_name))?;
    let value = cond
        .values
        .first()
        .ok_or_else(|| anyhow!("empty Values for {}", cond.field_name))?;

    let bound = match spec.kind {
        ColKind::Integer => SqlValue::Integer(
            crate::platform::relation_id(value)
                .ok_or_else(|| anyhow!("non-integer value for {}", cond.field_name))?,
        ),
        ColKind::Real => SqlValue::Real(
            value
                .as_f64()
                .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
                .ok_or_else(|| anyhow!("non-numeric value for {}", cond.field_name))?,
        ),
        ColKind::Text => SqlValue::Text(match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }),
    };

    let sql = match cond.operator {
        Operator::EqualTo => format!("{} = ?", spec.name),
        Operator::NotEqualTo => format!("{} <> ?", spec.name),
        Operator::Contains | Operator::StartsWith => format!("{} LIKE ?", spec.name),
        Operator::GreaterThan => format!("{} > ?", spec.name),
        Operator::GreaterThanOrEqualTo => format!("{} >= ?", spec.name),
        Operator::LessThan => format!("{} < ?", spec.name),
        Operator::LessThanOrEqualTo => format!("{} <= ?", spec.name),
    };

    let bound = match (cond.operator, bound) {
        (Operator::Contains, SqlValue::Text(s)) => SqlValue::Text(format!("%{s}%")),
        (Operator::StartsWith, SqlValue::Text(s)) => SqlValue::Text(format!("{s}%")),
        (_, other) => other,
    };

    params.push(bound);
    Ok(sql)
}

impl RecordService for SqliteRecordService {
    fn fetch_records(&self, table: &str, query: &QueryParams) -> anyhow::Result<FetchResponse> {
        let table = table_spec(table)?;

        let (where_sql, params) = match Self::where_clause(table, query) {
            Ok(v) => v,
            // Malformed query: a platform-level rejection, not transport.
            Err(e) => {
                return Ok(FetchResponse {
                    success: false,
                    message: Some(e.to_string()),
                    ..FetchResponse::default()
                })
            }
        };

        let mut names: Vec<&str> = Vec::new();
        if query.fields.is_empty() {
            names.extend(table.columns.iter().map(|c| c.name));
        } else {
            for f in &query.fields {
                if f == "Id" {
                    continue;
                }
                match column_spec(table, f) {
                    Some(spec) => names.push(spec.name),
                    None => {
                        return Ok(FetchResponse {
                            success: false,
                            message: Some(format!("unknown field: {f}")),
                            ..FetchResponse::default()
                        })
                    }
                }
            }
            if names.is_empty() {
                names.extend(table.columns.iter().map(|c| c.name));
            }
        }

        let total: u64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}{}", table.name, where_sql),
            params_from_iter(params.iter()),
            |r| r.get::<_, i64>(0),
        )? as u64;

        let mut order_sql = String::new();
        for (i, order) in query.order_by.iter().enumerate() {
            let Some(spec) = column_spec(table, &order.field_name) else {
                return Ok(FetchResponse {
                    success: false,
                    message: Some(format!("unknown orderBy field: {}", order.field_name)),
                    ..FetchResponse::default()
                });
            };
            order_sql.push_str(if i == 0 { " ORDER BY " } else { ", " });
            order_sql.push_str(spec.name);
            order_sql.push_str(match order.sort {
                SortType::Asc => " ASC",
                SortType::Desc => " DESC",
            });
        }

        let mut page_sql = String::new();
        if let Some(paging) = query.paging {
            page_sql = format!(" LIMIT {} OFFSET {}", paging.limit, paging.offset);
        }

        let sql = format!(
            "SELECT Id, {} FROM {}{}{}{}",
            names.join(", "),
            table.name,
            where_sql,
            order_sql,
            page_sql
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                let mut rec = Map::new();
                rec.insert("Id".into(), json!(row.get::<_, i64>(0)?));
                for (i, name) in names.iter().enumerate() {
                    rec.insert(
                        (*name).to_string(),
                        sql_to_json(row.get::<_, SqlValue>(i + 1)?),
                    );
                }
                Ok(rec)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FetchResponse {
            success: true,
            data: rows
                .into_iter()
                .map(|rec| Self::expand_lookups(table, rec))
                .collect(),
            total,
            message: None,
        })
    }

    fn get_record_by_id(
        &self,
        table: &str,
        id: i64,
        _fields: &[String],
    ) -> anyhow::Result<Option<Record>> {
        let table = table_spec(table)?;
        Ok(self
            .read_raw(table, id)?
            .map(|rec| Self::expand_lookups(table, rec)))
    }

    fn create_records(&self, table: &str, records: Vec<Value>) -> anyhow::Result<BatchResponse> {
        let table = table_spec(table)?;
        let mut results = Vec::with_capacity(records.len());

        for record in records {
            let Some(fields) = record.as_object() else {
                results.push(RecordResult {
                    success: false,
                    message: Some("record must be an object".into()),
                    ..RecordResult::default()
                });
                continue;
            };

            let mut pairs = match Self::coerce_record(table, fields) {
                Ok(pairs) => pairs,
                Err(errors) => {
                    results.push(RecordResult {
                        success: false,
                        errors,
                        message: Some("record validation failed".into()),
                        ..RecordResult::default()
                    });
                    continue;
                }
            };

            // Server-owned defaults.
            let has = |pairs: &[(&str, SqlValue)], name: &str| {
                pairs.iter().any(|(n, v)| *n == name && *v != SqlValue::Null)
            };
            match table.name {
                "student_c" => {
                    if !has(&pairs, "gpa_c") {
                        pairs.retain(|(n, _)| *n != "gpa_c");
                        pairs.push(("gpa_c", SqlValue::Real(0.0)));
                    }
                }
                "course_c" => {
                    pairs.retain(|(n, _)| *n != "version_c");
                    pairs.push(("version_c", SqlValue::Integer(1)));
                    if !has(&pairs, "enrolled_students_c") {
                        pairs.retain(|(n, _)| *n != "enrolled_students_c");
                        pairs.push(("enrolled_students_c", SqlValue::Text(String::new())));
                    }
                }
                _ => {}
            }

            let names: Vec<&str> = pairs.iter().map(|(n, _)| *n).collect();
            let placeholders = vec!["?"; pairs.len()].join(", ");
            let sql = format!(
                "INSERT INTO {}({}) VALUES({})",
                table.name,
                names.join(", "),
                placeholders
            );
            let values: Vec<SqlValue> = pairs.into_iter().map(|(_, v)| v).collect();
            self.conn.execute(&sql, params_from_iter(values.iter()))?;
            let id = self.conn.last_insert_rowid();

            if table.name == "student_c" && !names.contains(&"student_id_c") {
                self.conn.execute(
                    "UPDATE student_c SET student_id_c = ? WHERE Id = ?",
                    (format!("STU{id:03}"), id),
                )?;
            }

            let stored = self
                .read_raw(table, id)?
                .ok_or_else(|| anyhow!("row vanished after insert"))?;
            results.push(RecordResult {
                success: true,
                data: Some(Value::Object(stored)),
                ..RecordResult::default()
            });
        }

        Ok(BatchResponse {
            success: true,
            results,
            message: None,
        })
    }

    fn update_records(&self, table: &str, records: Vec<Value>) -> anyhow::Result<BatchResponse> {
        let table = table_spec(table)?;
        let mut results = Vec::with_capacity(records.len());

        for record in records {
            let Some(fields) = record.as_object() else {
                results.push(RecordResult {
                    success: false,
                    message: Some("record must be an object".into()),
                    ..RecordResult::default()
                });
                continue;
            };
            let Some(id) = fields.get("Id").and_then(crate::platform::relation_id) else {
                results.push(RecordResult {
                    success: false,
                    message: Some("record is missing Id".into()),
                    ..RecordResult::default()
                });
                continue;
            };

            let current: Option<i64> = self
                .conn
                .query_row(
                    &format!("SELECT Id FROM {} WHERE Id = ?", table.name),
                    [id],
                    |r| r.get(0),
                )
                .optional()?;
            if current.is_none() {
                results.push(RecordResult {
                    success: false,
                    message: Some(format!("record {id} not found")),
                    ..RecordResult::default()
                });
                continue;
            }

            let mut pairs = match Self::coerce_record(table, fields) {
                Ok(pairs) => pairs,
                Err(errors) => {
                    results.push(RecordResult {
                        success: false,
                        errors,
                        message: Some("record validation failed".into()),
                        ..RecordResult::default()
                    });
                    continue;
                }
            };

            if table.versioned {
                let presented = pairs.iter().find_map(|(n, v)| match (n, v) {
                    (&"version_c", SqlValue::Integer(v)) => Some(*v),
                    _ => None,
                });
                let stored: i64 = self.conn.query_row(
                    &format!("SELECT version_c FROM {} WHERE Id = ?", table.name),
                    [id],
                    |r| r.get(0),
                )?;
                match presented {
                    None => {
                        results.push(RecordResult {
                            success: false,
                            errors: vec![FieldError {
                                field_label: "version_c".into(),
                                message_text: "missing version token".into(),
                            }],
                            message: Some("record validation failed".into()),
                            ..RecordResult::default()
                        });
                        continue;
                    }
                    Some(v) if v != stored => {
                        results.push(RecordResult {
                            success: false,
                            errors: vec![FieldError {
                                field_label: "version_c".into(),
                                message_text: format!(
                                    "stale version token: presented {v}, current {stored}"
                                ),
                            }],
                            message: Some("record validation failed".into()),
                            ..RecordResult::default()
                        });
                        continue;
                    }
                    Some(_) => {
                        for (n, v) in &mut pairs {
                            if *n == "version_c" {
                                *v = SqlValue::Integer(stored + 1);
                            }
                        }
                    }
                }
            }

            if !pairs.is_empty() {
                let assigns = pairs
                    .iter()
                    .map(|(n, _)| format!("{n} = ?"))
                    .collect::<Vec<_>>()
                    .join(", ");
                let sql = format!("UPDATE {} SET {} WHERE Id = ?", table.name, assigns);
                let mut values: Vec<SqlValue> = pairs.into_iter().map(|(_, v)| v).collect();
                values.push(SqlValue::Integer(id));
                self.conn.execute(&sql, params_from_iter(values.iter()))?;
            }

            let stored = self
                .read_raw(table, id)?
                .ok_or_else(|| anyhow!("row vanished after update"))?;
            results.push(RecordResult {
                success: true,
                data: Some(Value::Object(stored)),
                ..RecordResult::default()
            });
        }

        Ok(BatchResponse {
            success: true,
            results,
            message: None,
        })
    }

    fn delete_records(&self, table: &str, ids: &[i64]) -> anyhow::Result<DeleteResponse> {
        let table = table_spec(table)?;
        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            let changed = self
                .conn
                .execute(&format!("DELETE FROM {} WHERE Id = ?", table.name), [id])?;
            results.push(if changed == 0 {
                DeleteResult {
                    success: false,
                    message: Some(format!("record {id} not found")),
                }
            } else {
                DeleteResult {
                    success: true,
                    message: None,
                }
            });
        }
        Ok(DeleteResponse {
            success: true,
            results,
        })
    }
}

impl OutboxStore for SqliteRecordService {
    fn enqueue(&self, event: &OutboxEvent) -> anyhow::Result<String> {
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO outbox(id, kind, payload, status, attempts, created_at)
             VALUES(?, ?, ?, 'pending', 0, ?)",
            (
                &id,
                event.kind(),
                serde_json::to_string(event)?,
                Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
        )?;
        Ok(id)
    }

    fn pending(&self, limit: usize) -> anyhow::Result<Vec<QueuedEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, payload, attempts FROM outbox
             WHERE status = 'pending' ORDER BY created_at LIMIT ?",
        )?;
        let rows = stmt
            .query_map([limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut out = Vec::with_capacity(rows.len());
        for (id, payload, attempts) in rows {
            let event: OutboxEvent = serde_json::from_str(&payload)
                .with_context(|| format!("outbox entry {id} has a corrupt payload"))?;
            out.push(QueuedEvent { id, event, attempts });
        }
        Ok(out)
    }

    fn mark_sent(&self, id: &str) -> anyhow::Result<()> {
        self.conn
            .execute("UPDATE outbox SET status = 'sent' WHERE id = ?", [id])?;
        Ok(())
    }

    fn mark_failed(&self, id: &str, error: &str, dead: bool) -> anyhow::Result<()> {
        self.conn.execute(
            "UPDATE outbox
             SET attempts = attempts + 1,
                 last_error = ?,
                 status = CASE WHEN ? THEN 'dead' ELSE 'pending' END
             WHERE id = ?",
            (error, dead, id),
        )?;
        Ok(())
    }
}
