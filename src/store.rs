//! Cached resource stores: the session-local state a page binds to.
//!
//! Each store owns one in-memory list for as long as its page lives. The
//! load path drives the `Idle → Loading → {Ready, Errored}` machine;
//! mutations patch the cache optimistically on success and never touch the
//! load state, so a list render and a form submit stay independent.

use serde::Serialize;

use crate::api::{ApiError, CrudApi};
use crate::model::HasId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    Errored,
}

impl LoadState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Errored => "errored",
        }
    }
}

pub struct ResourceStore<A: CrudApi> {
    api: A,
    /// Message vocabulary: "student" / "students".
    singular: &'static str,
    plural: &'static str,
    items: Vec<A::Item>,
    state: LoadState,
    error: Option<String>,
}

impl<A: CrudApi> ResourceStore<A> {
    pub fn new(api: A, singular: &'static str, plural: &'static str) -> Self {
        Self {
            api,
            singular,
            plural,
            items: Vec::new(),
            state: LoadState::Idle,
            error: None,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn items(&self) -> &[A::Item] {
        &self.items
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Mount semantics: the first touch loads once; later touches reuse
    /// the cache, whatever state it settled in.
    pub fn ensure_loaded(&mut self) {
        if self.state == LoadState::Idle {
            let _ = self.load();
        }
    }

    pub fn load(&mut self) -> Result<(), ApiError> {
        self.load_with(A::list)
    }

    /// Reload through a custom fetch (search, filters); same state machine
    /// as a plain load.
    pub fn load_with<F>(&mut self, fetch: F) -> Result<(), ApiError>
    where
        F: FnOnce(&A) -> Result<Vec<A::Item>, ApiError>,
    {
        self.state = LoadState::Loading;
        self.error = None;
        match fetch(&self.api) {
            Ok(items) => {
                self.items = items;
                self.state = LoadState::Ready;
                Ok(())
            }
            Err(e) => {
                self.items.clear();
                self.error = Some(format!("Failed to load {}", self.plural));
                self.state = LoadState::Errored;
                Err(e)
            }
        }
    }

    /// Appends at the tail, no resort; the new row shows up last exactly
    /// like it did in the original list views.
    pub fn create(&mut self, draft: &A::Draft) -> Result<A::Item, ApiError> {
        match self.api.create(draft) {
            Ok(item) => {
                self.items.push(item.clone());
                Ok(item)
            }
            Err(e) => {
                self.error = Some(format!("Failed to create {}", self.singular));
                Err(e)
            }
        }
    }

    /// Replaces the matching row in place, preserving its position.
    pub fn update(&mut self, id: i64, draft: &A::Draft) -> Result<A::Item, ApiError> {
        match self.api.update(id, draft) {
            Ok(item) => {
                self.replace(item.clone());
                Ok(item)
            }
            Err(e) => {
                self.error = Some(format!("Failed to update {}", self.singular));
                Err(e)
            }
        }
    }

    pub fn delete(&mut self, id: i64) -> Result<bool, ApiError> {
        match self.api.delete(id) {
            Ok(true) => {
                self.items.retain(|item| item.id() != id);
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(e) => {
                self.error = Some(format!("Failed to delete {}", self.singular));
                Err(e)
            }
        }
    }

    /// Merge an externally produced row (enroll/remove results) into the
    /// cache.
    pub fn replace(&mut self, item: A::Item) {
        if let Some(slot) = self.items.iter_mut().find(|i| i.id() == item.id()) {
            *slot = item;
        }
    }
}
