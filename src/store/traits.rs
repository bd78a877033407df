//! `ProfileStore`, the single async interface to the `profiles` table.

use async_trait::async_trait;

use super::model::ProfileRecord;
use crate::error::StoreError;

/// Backend-agnostic access to the `profiles` collection, keyed by `id`.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Insert the record, or update the row with the same `id`.
    /// Returns the row as stored.
    async fn upsert(&self, record: &ProfileRecord) -> Result<ProfileRecord, StoreError>;

    /// Insert a new row. A duplicate `id` is a [`StoreError::Conflict`].
    async fn insert(&self, record: &ProfileRecord) -> Result<ProfileRecord, StoreError>;

    /// Look up a row by `id`.
    async fn get(&self, id: &str) -> Result<Option<ProfileRecord>, StoreError>;
}
