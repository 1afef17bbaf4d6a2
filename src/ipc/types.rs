use std::path::PathBuf;
use std::rc::Rc;

use serde::Deserialize;

use crate::api::{
    ActivitiesApi, ApiContext, AssignmentsApi, CoursesApi, FilesApi, GradesApi, StudentsApi,
};
use crate::config::Config;
use crate::db::SqliteRecordService;
use crate::notify::NoticeBuffer;
use crate::outbox::{Outbox, OutboxStore};
use crate::platform::{DisabledFunctionClient, FunctionClient, RecordService};
use crate::settings;
use crate::store::ResourceStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Everything a mounted workspace owns: the local platform, the shared
/// context, and one cached store per entity.
pub struct Workspace {
    pub path: PathBuf,
    pub db: Rc<SqliteRecordService>,
    pub notices: Rc<NoticeBuffer>,
    pub ctx: Rc<ApiContext>,
    pub outbox: Rc<Outbox>,
    pub students: ResourceStore<StudentsApi>,
    pub courses: ResourceStore<CoursesApi>,
    pub assignments: ResourceStore<AssignmentsApi>,
    pub grades: ResourceStore<GradesApi>,
    pub activities: ResourceStore<ActivitiesApi>,
    pub files: ResourceStore<FilesApi>,
}

impl Workspace {
    pub fn open(path: PathBuf, config: &Config) -> anyhow::Result<Self> {
        let db = Rc::new(SqliteRecordService::open(&path)?);
        let notices = Rc::new(NoticeBuffer::new());

        let records: Rc<dyn RecordService> = db.clone();
        let outbox_store: Rc<dyn OutboxStore> = db.clone();
        let functions: Rc<dyn FunctionClient> = Rc::new(DisabledFunctionClient);
        let outbox = Rc::new(Outbox::new(
            outbox_store,
            functions,
            records.clone(),
            notices.clone(),
            config.outbox.clone(),
        ));
        let ctx = Rc::new(ApiContext::new(records, notices.clone(), outbox.clone()));

        let app_settings = settings::load_settings(&db)?;
        ctx.set_welcome_email_enabled(app_settings.email_notifications);

        Ok(Self {
            path,
            db,
            notices,
            students: ResourceStore::new(StudentsApi::new(ctx.clone()), "student", "students"),
            courses: ResourceStore::new(CoursesApi::new(ctx.clone()), "course", "courses"),
            assignments: ResourceStore::new(
                AssignmentsApi::new(ctx.clone()),
                "assignment",
                "assignments",
            ),
            grades: ResourceStore::new(GradesApi::new(ctx.clone()), "grade", "grades"),
            activities: ResourceStore::new(
                ActivitiesApi::new(ctx.clone()),
                "curriculum activity",
                "curriculum activities",
            ),
            files: ResourceStore::new(FilesApi::new(ctx.clone()), "file", "files"),
            outbox,
            ctx,
        })
    }
}

pub struct AppState {
    pub config: Config,
    pub workspace: Option<Workspace>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            workspace: None,
        }
    }
}
