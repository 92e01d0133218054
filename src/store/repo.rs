// src/store/repo.rs
//! Typed access to the collections the pipeline touches.

use serde_json::{json, Value};
use tracing::warn;

use super::{from_document, to_document, Document, DocumentStore};
use crate::aggregate::Aggregates;
use crate::error::StoreError;
use crate::model::{Post, RunStatus, Source, POSTS, RUN_STATUS_ID, SOURCES, SYSTEM};

/// Explicit handle over a store; constructed once and passed by reference.
#[derive(Clone, Copy)]
pub struct Repository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> Repository<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Documents that do not decode as a [`Source`] are logged and left out;
    /// one hand-edited campus must not stop the run.
    pub async fn active_sources(&self) -> Result<Vec<Source>, StoreError> {
        let rows = self
            .store
            .query_by_field(SOURCES, "isActive", &Value::Bool(true))
            .await?;
        let mut sources = Vec::with_capacity(rows.len());
        for (id, doc) in rows {
            match from_document::<Source>(doc) {
                Ok(mut s) => {
                    s.id = id;
                    sources.push(s);
                }
                Err(e) => warn!(source_id = %id, error = %e, "skipping unreadable source document"),
            }
        }
        Ok(sources)
    }

    pub async fn source(&self, id: &str) -> Result<Option<Source>, StoreError> {
        match self.store.get_by_id(SOURCES, id).await? {
            Some(doc) => {
                let mut s: Source = from_document(doc)?;
                s.id = id.to_string();
                Ok(Some(s))
            }
            None => Ok(None),
        }
    }

    /// Used by fixtures and admin tooling; the pipeline never creates sources.
    pub async fn put_source(&self, source: &Source) -> Result<(), StoreError> {
        self.store
            .upsert(SOURCES, &source.id, to_document(source)?)
            .await
    }

    pub async fn find_post(&self, id: &str) -> Result<Option<Post>, StoreError> {
        match self.store.get_by_id(POSTS, id).await? {
            Some(doc) => {
                let mut p: Post = from_document(doc)?;
                p.id = id.to_string();
                Ok(Some(p))
            }
            None => Ok(None),
        }
    }

    pub async fn create_post(&self, post: &Post) -> Result<(), StoreError> {
        self.store.upsert(POSTS, &post.id, to_document(post)?).await
    }

    pub async fn posts_for_source(&self, source_id: &str) -> Result<Vec<Post>, StoreError> {
        let rows = self
            .store
            .query_by_field(POSTS, "campusId", &Value::String(source_id.to_string()))
            .await?;
        rows.into_iter()
            .map(|(id, doc)| {
                let mut p: Post = from_document(doc)?;
                p.id = id;
                Ok(p)
            })
            .collect()
    }

    /// Overwrites the three derived fields; an absent `lastPostDate` is
    /// written as null so stale values do not survive a recompute.
    pub async fn update_source_aggregates(
        &self,
        source_id: &str,
        agg: &Aggregates,
    ) -> Result<(), StoreError> {
        let mut fields = Document::new();
        fields.insert("totalPosts".into(), json!(agg.total_posts));
        fields.insert("validPosts".into(), json!(agg.valid_posts));
        fields.insert(
            "lastPostDate".into(),
            agg.last_post_date
                .map(serde_json::to_value)
                .transpose()?
                .unwrap_or(Value::Null),
        );
        self.store.update_fields(SOURCES, source_id, fields).await
    }

    pub async fn write_run_status(&self, status: &RunStatus) -> Result<(), StoreError> {
        self.store
            .upsert(SYSTEM, RUN_STATUS_ID, to_document(status)?)
            .await
    }

    pub async fn run_status(&self) -> Result<Option<RunStatus>, StoreError> {
        self.store
            .get_by_id(SYSTEM, RUN_STATUS_ID)
            .await?
            .map(from_document)
            .transpose()
    }
}
