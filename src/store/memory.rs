//! In-process profile store, used when no remote store is configured.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::model::ProfileRecord;
use super::traits::ProfileStore;
use crate::error::StoreError;

/// Profiles kept in a map keyed by `id`.
#[derive(Default)]
pub struct MemoryStore {
    rows: RwLock<HashMap<String, ProfileRecord>>,
    unique_phone: bool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also reject two different ids sharing a phone number.
    pub fn with_unique_phone(mut self) -> Self {
        self.unique_phone = true;
        self
    }

    /// Number of write calls received, successful or not.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    fn check_phone(
        &self,
        rows: &HashMap<String, ProfileRecord>,
        record: &ProfileRecord,
    ) -> Result<(), StoreError> {
        if !self.unique_phone {
            return Ok(());
        }
        let taken = rows
            .values()
            .any(|r| r.id != record.id && r.phone_number == record.phone_number);
        if taken {
            return Err(StoreError::Conflict {
                constraint: Some("profiles_phone_number_key".into()),
                message: format!("phone number {} already exists", record.phone_number),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn upsert(&self, record: &ProfileRecord) -> Result<ProfileRecord, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.write().await;
        self.check_phone(&rows, record)?;

        let stored = match rows.get_mut(&record.id) {
            Some(existing) => {
                existing.merge_from(record);
                existing.clone()
            }
            None => {
                rows.insert(record.id.clone(), record.clone());
                record.clone()
            }
        };
        debug!(id = %record.id, "Profile upserted");
        Ok(stored)
    }

    async fn insert(&self, record: &ProfileRecord) -> Result<ProfileRecord, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.write().await;
        if rows.contains_key(&record.id) {
            return Err(StoreError::Conflict {
                constraint: Some("profiles_pkey".into()),
                message: format!("id {} already exists", record.id),
            });
        }
        self.check_phone(&rows, record)?;
        rows.insert(record.id.clone(), record.clone());
        debug!(id = %record.id, "Profile inserted");
        Ok(record.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<ProfileRecord>, StoreError> {
        Ok(self.rows.read().await.get(id).cloned())
    }
}
