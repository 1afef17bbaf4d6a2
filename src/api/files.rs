use std::rc::Rc;

use serde_json::json;

use crate::map::{self, FILE_FIELDS};
use crate::model::{FileDraft, StoredFile};
use crate::outbox::OutboxEvent;
use crate::platform::{tables, Condition, OrderBy, QueryParams};

use super::{
    fetch_mapped, first_success, now_iso, report_api_error, transport_err, ApiContext, ApiError,
    CrudApi,
};

const PAGE_SIZE: u32 = 50;

pub struct FilesApi {
    ctx: Rc<ApiContext>,
}

impl FilesApi {
    pub fn new(ctx: Rc<ApiContext>) -> Self {
        Self { ctx }
    }

    fn query(&self) -> QueryParams {
        QueryParams::with_fields(FILE_FIELDS)
            .order_by(OrderBy::desc("upload_date_c"))
            .page(PAGE_SIZE, 0)
    }

    /// Files attached to one entity via the polymorphic back-reference.
    pub fn get_by_entity(
        &self,
        entity_type: &str,
        entity_id: i64,
    ) -> Result<Vec<StoredFile>, ApiError> {
        let query = self
            .query()
            .and_where(Condition::equal_to("entity_type_c", json!(entity_type)))
            .and_where(Condition::equal_to("entity_id_c", json!(entity_id)));
        fetch_mapped(
            &self.ctx,
            tables::FILES,
            &query,
            "files",
            map::file_from_record,
        )
    }

    /// Create the file record first; image captioning is a follow-up
    /// outbox event and cannot fail the upload.
    pub fn upload(&self, draft: &FileDraft) -> Result<StoredFile, ApiError> {
        let payload = map::file_to_record(draft, &now_iso(), "");
        let batch = self
            .ctx
            .records
            .create_records(tables::FILES, vec![payload])
            .map_err(|e| transport_err(&self.ctx, "upload file", e))?;
        let rec = first_success(batch).map_err(|e| {
            report_api_error(&self.ctx, "upload file", &e);
            e
        })?;
        let file = map::file_from_record(&rec);

        if draft.file_type.starts_with("image/") {
            if let Some(image_data) = &draft.image_data {
                self.ctx.outbox.submit(OutboxEvent::DescribeImage {
                    file_id: file.id,
                    mime_type: draft.file_type.clone(),
                    image_data: image_data.clone(),
                });
            }
        }
        Ok(file)
    }
}

impl CrudApi for FilesApi {
    type Item = StoredFile;
    type Draft = FileDraft;

    fn list(&self) -> Result<Vec<StoredFile>, ApiError> {
        fetch_mapped(
            &self.ctx,
            tables::FILES,
            &self.query(),
            "files",
            map::file_from_record,
        )
    }

    fn get(&self, id: i64) -> Result<Option<StoredFile>, ApiError> {
        match self.ctx.records.get_record_by_id(tables::FILES, id, &[]) {
            Err(e) => Err(transport_err(&self.ctx, "fetch file", e)),
            Ok(rec) => Ok(rec.map(|r| map::file_from_record(&r))),
        }
    }

    fn create(&self, draft: &FileDraft) -> Result<StoredFile, ApiError> {
        self.upload(draft)
    }

    fn update(&self, id: i64, draft: &FileDraft) -> Result<StoredFile, ApiError> {
        let mut payload = map::file_update_record(draft);
        payload["Id"] = json!(id);
        let batch = self
            .ctx
            .records
            .update_records(tables::FILES, vec![payload])
            .map_err(|e| transport_err(&self.ctx, "update file", e))?;
        let rec = first_success(batch).map_err(|e| {
            report_api_error(&self.ctx, "update file", &e);
            e
        })?;
        Ok(map::file_from_record(&rec))
    }

    fn delete(&self, id: i64) -> Result<bool, ApiError> {
        let resp = self
            .ctx
            .records
            .delete_records(tables::FILES, &[id])
            .map_err(|e| transport_err(&self.ctx, "delete file", e))?;
        if !resp.success {
            self.ctx.notifier.error("Failed to delete file");
            return Err(ApiError::Transport("delete rejected".into()));
        }
        let ok = resp.results.first().map(|r| r.success).unwrap_or(false);
        if !ok {
            if let Some(message) = resp.results.first().and_then(|r| r.message.as_deref()) {
                self.ctx.notifier.error(message);
            }
        }
        Ok(ok)
    }
}
