// src/store/file.rs
//! Directory-backed store: one pretty-printed JSON object per collection
//! (`<dir>/<collection>.json`, keyed by document id). Writes go through a
//! temp file and a rename so a crash never leaves a half-written collection.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::{fs, sync::Mutex};

use super::{matches_field, merge_fields, Document, DocumentStore};
use crate::error::StoreError;

type Collection = BTreeMap<String, Document>;

#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    fn path_for(&self, collection: &str) -> Result<PathBuf, StoreError> {
        let valid = !collection.is_empty()
            && collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::Backend(format!(
                "invalid collection name {collection:?}"
            )));
        }
        Ok(self.dir.join(format!("{collection}.json")))
    }

    async fn read_collection(&self, collection: &str) -> Result<Collection, StoreError> {
        let path = self.path_for(collection)?;
        match fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Collection::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Collection::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_collection(&self, collection: &str, data: &Collection) -> Result<(), StoreError> {
        let path = self.path_for(collection)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(data)?).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn get_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let mut data = self.read_collection(collection).await?;
        Ok(data.remove(id))
    }

    async fn upsert(&self, collection: &str, id: &str, fields: Document) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut data = self.read_collection(collection).await?;
        data.insert(id.to_string(), fields);
        self.write_collection(collection, &data).await
    }

    async fn query_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<(String, Document)>, StoreError> {
        let data = self.read_collection(collection).await?;
        Ok(data
            .into_iter()
            .filter(|(_, doc)| matches_field(doc, field, value))
            .collect())
    }

    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut data = self.read_collection(collection).await?;
        let doc = data.get_mut(id).ok_or_else(|| StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        })?;
        merge_fields(doc, fields);
        self.write_collection(collection, &data).await
    }
}
