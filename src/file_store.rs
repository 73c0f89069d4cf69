use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::repository::DocumentKind;

/// One JSON document per record kind, holding a single named array.
///
/// Every write reads the whole document, edits it in memory and replaces the
/// file. Writers are not coordinated: two concurrent writes both start from
/// the same snapshot and the later rename wins.
pub struct JsonFileStore<K: DocumentKind> {
    path: PathBuf,
    _kind: PhantomData<K>,
}

impl<K: DocumentKind> Clone for JsonFileStore<K> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: DocumentKind> JsonFileStore<K> {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(K::FILE_NAME),
            _kind: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the whole document, creating an empty one on first access.
    pub async fn list(&self) -> StoreResult<Vec<K::Record>> {
        self.ensure_document().await?;
        self.read_document().await
    }

    /// Puts a record at the front of the document (newest first). Identifiers
    /// are unique within a document.
    pub async fn prepend(&self, record: K::Record) -> StoreResult<K::Record> {
        let mut records = self.list().await?;
        if records
            .iter()
            .any(|existing| K::id(existing) == K::id(&record))
        {
            return Err(StoreError::Conflict(K::LABEL));
        }
        records.insert(0, record.clone());
        self.write_document(&records).await?;
        Ok(record)
    }

    /// Replaces the record that carries the same identifier.
    pub async fn replace(&self, record: K::Record) -> StoreResult<K::Record> {
        let mut records = self.list().await?;
        let index = records
            .iter()
            .position(|existing| K::id(existing) == K::id(&record))
            .ok_or(StoreError::NotFound(K::LABEL))?;
        records[index] = record.clone();
        self.write_document(&records).await?;
        Ok(record)
    }

    /// Removes the record with the given identifier; the document is left
    /// untouched when nothing matches.
    pub async fn remove(&self, id: &str) -> StoreResult<()> {
        let records = self.list().await?;
        let initial_len = records.len();
        let remaining: Vec<K::Record> = records
            .into_iter()
            .filter(|record| K::id(record) != id)
            .collect();

        if remaining.len() == initial_len {
            return Err(StoreError::NotFound(K::LABEL));
        }

        self.write_document(&remaining).await
    }

    async fn ensure_document(&self) -> StoreResult<()> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        if !tokio::fs::try_exists(&self.path).await? {
            tracing::info!(path = %self.path.display(), "creating empty {} document", K::COLLECTION);
            self.write_document(&[]).await?;
        }
        Ok(())
    }

    async fn read_document(&self) -> StoreResult<Vec<K::Record>> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        let mut document: Map<String, Value> = serde_json::from_str(&contents)?;
        let records = document.remove(K::COLLECTION).ok_or_else(|| {
            StoreError::Schema(format!(
                "{} is missing the '{}' array",
                self.path.display(),
                K::COLLECTION
            ))
        })?;
        Ok(serde_json::from_value(records)?)
    }

    async fn write_document(&self, records: &[K::Record]) -> StoreResult<()> {
        let mut document = Map::new();
        document.insert(K::COLLECTION.to_string(), serde_json::to_value(records)?);
        let contents = serde_json::to_string_pretty(&Value::Object(document))?;

        let file_name = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(K::FILE_NAME);
        let temp_path = self
            .path
            .with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

        tokio::fs::write(&temp_path, contents).await?;
        if let Err(err) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(err.into());
        }
        Ok(())
    }
}
