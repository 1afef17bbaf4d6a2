//! Best-effort side effects, decoupled from the primary write path.
//!
//! A successful entity mutation enqueues an event; a processor drains the
//! queue after the request completes. Delivery failures retry up to a
//! bounded attempt count and then downgrade to a warning notice. Nothing
//! here can fail or roll back the write that produced the event.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::notify::Notifier;
use crate::platform::{FunctionClient, RecordService};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutboxEvent {
    WelcomeEmail {
        student_id: i64,
        email: String,
        first_name: String,
    },
    DescribeImage {
        file_id: i64,
        mime_type: String,
        image_data: String,
    },
}

impl OutboxEvent {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::WelcomeEmail { .. } => "welcome_email",
            Self::DescribeImage { .. } => "describe_image",
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueuedEvent {
    pub id: String,
    pub event: OutboxEvent,
    pub attempts: i64,
}

pub trait OutboxStore {
    fn enqueue(&self, event: &OutboxEvent) -> anyhow::Result<String>;
    fn pending(&self, limit: usize) -> anyhow::Result<Vec<QueuedEvent>>;
    fn mark_sent(&self, id: &str) -> anyhow::Result<()>;
    /// Increment the attempt count; `dead` retires the event for good.
    fn mark_failed(&self, id: &str, error: &str, dead: bool) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemStatus {
    Pending,
    Sent,
    Dead,
}

struct MemEntry {
    id: String,
    event: OutboxEvent,
    attempts: i64,
    status: MemStatus,
}

/// In-memory store for tests and embedders without a workspace database.
#[derive(Default)]
pub struct MemoryOutbox {
    entries: RefCell<Vec<MemEntry>>,
}

impl MemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dead_count(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.status == MemStatus::Dead)
            .count()
    }
}

impl OutboxStore for MemoryOutbox {
    fn enqueue(&self, event: &OutboxEvent) -> anyhow::Result<String> {
        let id = Uuid::new_v4().to_string();
        self.entries.borrow_mut().push(MemEntry {
            id: id.clone(),
            event: event.clone(),
            attempts: 0,
            status: MemStatus::Pending,
        });
        Ok(id)
    }

    fn pending(&self, limit: usize) -> anyhow::Result<Vec<QueuedEvent>> {
        Ok(self
            .entries
            .borrow()
            .iter()
            .filter(|e| e.status == MemStatus::Pending)
            .take(limit)
            .map(|e| QueuedEvent {
                id: e.id.clone(),
                event: e.event.clone(),
                attempts: e.attempts,
            })
            .collect())
    }

    fn mark_sent(&self, id: &str) -> anyhow::Result<()> {
        if let Some(e) = self.entries.borrow_mut().iter_mut().find(|e| e.id == id) {
            e.status = MemStatus::Sent;
        }
        Ok(())
    }

    fn mark_failed(&self, id: &str, _error: &str, dead: bool) -> anyhow::Result<()> {
        if let Some(e) = self.entries.borrow_mut().iter_mut().find(|e| e.id == id) {
            e.attempts += 1;
            if dead {
                e.status = MemStatus::Dead;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct OutboxConfig {
    pub welcome_email_fn: String,
    pub analyze_image_fn: String,
    pub max_attempts: i64,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            welcome_email_fn: "send-welcome-email".into(),
            analyze_image_fn: "analyze-image-with-openai".into(),
            max_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct OutboxSummary {
    pub sent: usize,
    pub retried: usize,
    pub dead: usize,
}

pub struct Outbox {
    store: Rc<dyn OutboxStore>,
    functions: Rc<dyn FunctionClient>,
    records: Rc<dyn RecordService>,
    notifier: Rc<dyn Notifier>,
    config: OutboxConfig,
}

impl Outbox {
    pub fn new(
        store: Rc<dyn OutboxStore>,
        functions: Rc<dyn FunctionClient>,
        records: Rc<dyn RecordService>,
        notifier: Rc<dyn Notifier>,
        config: OutboxConfig,
    ) -> Self {
        Self {
            store,
            functions,
            records,
            notifier,
            config,
        }
    }

    /// Enqueue after the primary write has committed. Never fails the
    /// caller; a queue failure is itself downgraded to a warning.
    pub fn submit(&self, event: OutboxEvent) {
        if let Err(e) = self.store.enqueue(&event) {
            tracing::warn!(kind = event.kind(), error = %e, "failed to enqueue outbox event");
            self.notifier
                .warning("A follow-up action could not be scheduled");
        }
    }

    pub fn process_pending(&self) -> anyhow::Result<OutboxSummary> {
        let mut summary = OutboxSummary::default();
        for queued in self.store.pending(16)? {
            match self.deliver(&queued.event) {
                Ok(()) => {
                    self.store.mark_sent(&queued.id)?;
                    summary.sent += 1;
                }
                Err(e) => {
                    let dead = queued.attempts + 1 >= self.config.max_attempts;
                    tracing::warn!(
                        kind = queued.event.kind(),
                        attempts = queued.attempts + 1,
                        dead,
                        error = %e,
                        "outbox delivery failed"
                    );
                    self.store.mark_failed(&queued.id, &e.to_string(), dead)?;
                    if dead {
                        self.notifier.warning(match queued.event {
                            OutboxEvent::WelcomeEmail { .. } => "Welcome email could not be sent",
                            OutboxEvent::DescribeImage { .. } => {
                                "Image description could not be generated"
                            }
                        });
                        summary.dead += 1;
                    } else {
                        summary.retried += 1;
                    }
                }
            }
        }
        Ok(summary)
    }

    fn deliver(&self, event: &OutboxEvent) -> anyhow::Result<()> {
        match event {
            OutboxEvent::WelcomeEmail {
                student_id,
                email,
                first_name,
            } => {
                let body = json!({
                    "to": email,
                    "firstName": first_name,
                    "studentId": student_id,
                });
                let resp = self.functions.invoke(&self.config.welcome_email_fn, &body)?;
                if !resp.success {
                    anyhow::bail!(
                        "welcome email rejected: {}",
                        resp.message.unwrap_or_default()
                    );
                }
                Ok(())
            }
            OutboxEvent::DescribeImage {
                file_id,
                mime_type,
                image_data,
            } => {
                let body = json!({
                    "imageData": image_data,
                    "mimeType": mime_type,
                });
                let resp = self.functions.invoke(&self.config.analyze_image_fn, &body)?;
                if !resp.success {
                    anyhow::bail!("captioning rejected: {}", resp.message.unwrap_or_default());
                }
                let description = resp
                    .data
                    .as_ref()
                    .and_then(|d| d.get("description"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();

                let batch = self.records.update_records(
                    "files_c",
                    vec![json!({ "Id": file_id, "openai_description_c": description })],
                )?;
                let ok = batch.results.first().map(|r| r.success).unwrap_or(false);
                if !ok {
                    anyhow::bail!("failed to store caption for file {file_id}");
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteRecordService;
    use crate::notify::NoticeBuffer;
    use crate::platform::{FunctionResponse, RecordService as _};

    /// Scripted function client: pops the next canned outcome per call.
    struct ScriptedFunctions {
        outcomes: RefCell<Vec<anyhow::Result<FunctionResponse>>>,
        calls: RefCell<Vec<String>>,
    }

    impl ScriptedFunctions {
        fn new(outcomes: Vec<anyhow::Result<FunctionResponse>>) -> Self {
            Self {
                outcomes: RefCell::new(outcomes),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl FunctionClient for ScriptedFunctions {
        fn invoke(&self, name: &str, _body: &Value) -> anyhow::Result<FunctionResponse> {
            self.calls.borrow_mut().push(name.to_string());
            let mut outcomes = self.outcomes.borrow_mut();
            if outcomes.is_empty() {
                anyhow::bail!("no scripted outcome left");
            }
            outcomes.remove(0)
        }
    }

    fn harness(
        outcomes: Vec<anyhow::Result<FunctionResponse>>,
    ) -> (Outbox, Rc<MemoryOutbox>, Rc<NoticeBuffer>, Rc<SqliteRecordService>) {
        let store = Rc::new(MemoryOutbox::new());
        let notifier = Rc::new(NoticeBuffer::new());
        let records = Rc::new(SqliteRecordService::open_in_memory().expect("db"));
        let functions = Rc::new(ScriptedFunctions::new(outcomes));
        let outbox = Outbox::new(
            store.clone(),
            functions,
            records.clone(),
            notifier.clone(),
            OutboxConfig {
                max_attempts: 2,
                ..OutboxConfig::default()
            },
        );
        (outbox, store, notifier, records)
    }

    #[test]
    fn exhausted_welcome_email_becomes_a_warning() {
        let (outbox, store, notifier, _records) = harness(vec![
            Err(anyhow::anyhow!("endpoint unreachable")),
            Err(anyhow::anyhow!("endpoint unreachable")),
        ]);
        outbox.submit(OutboxEvent::WelcomeEmail {
            student_id: 1,
            email: "a@x.com".into(),
            first_name: "Ana".into(),
        });

        let first = outbox.process_pending().expect("process");
        assert_eq!(first.retried, 1);
        assert!(notifier.is_empty(), "no warning before attempts exhaust");

        let second = outbox.process_pending().expect("process");
        assert_eq!(second.dead, 1);
        assert_eq!(store.dead_count(), 1);
        let notices = notifier.drain();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].message.contains("Welcome email"));
    }

    #[test]
    fn caption_success_writes_description_back() {
        let (outbox, _store, _notifier, records) = harness(vec![Ok(FunctionResponse {
            success: true,
            data: Some(json!({ "description": "A hand-drawn seating chart" })),
            message: None,
        })]);

        let created = records
            .create_records(
                "files_c",
                vec![json!({ "Name": "chart.png", "file_type_c": "image/png" })],
            )
            .expect("create");
        let file_id = created.results[0]
            .data
            .as_ref()
            .and_then(|d| d.get("Id"))
            .and_then(Value::as_i64)
            .expect("file id");

        outbox.submit(OutboxEvent::DescribeImage {
            file_id,
            mime_type: "image/png".into(),
            image_data: "aGVsbG8=".into(),
        });
        let summary = outbox.process_pending().expect("process");
        assert_eq!(summary.sent, 1);

        let stored = records
            .get_record_by_id("files_c", file_id, &[])
            .expect("get")
            .expect("present");
        assert_eq!(stored["openai_description_c"], "A hand-drawn seating chart");
    }
}
