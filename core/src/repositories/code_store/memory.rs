//! In-process implementation of CodeStore

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::verification_record::{Purpose, VerificationRecord};
use crate::errors::DomainResult;

use super::r#trait::CodeStore;

type StoreKey = (String, Purpose);

/// Code store backed by a map behind an async read-write lock
///
/// Records disappear only through `delete`, an overwriting `put`, or
/// `purge_expired`; pair it with the code sweeper in long-running processes.
#[derive(Clone, Default)]
pub struct InMemoryCodeStore {
    records: Arc<RwLock<HashMap<StoreKey, VerificationRecord>>>,
}

impl InMemoryCodeStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held, including expired and consumed ones
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn key(subject: &str, purpose: Purpose) -> StoreKey {
        (subject.to_string(), purpose)
    }
}

#[async_trait]
impl CodeStore for InMemoryCodeStore {
    async fn put(&self, subject: &str, purpose: Purpose, record: VerificationRecord) -> DomainResult<()> {
        self.records
            .write()
            .await
            .insert(Self::key(subject, purpose), record);
        Ok(())
    }

    async fn get(&self, subject: &str, purpose: Purpose) -> DomainResult<Option<VerificationRecord>> {
        Ok(self
            .records
            .read()
            .await
            .get(&Self::key(subject, purpose))
            .cloned())
    }

    async fn delete(&self, subject: &str, purpose: Purpose) -> DomainResult<()> {
        self.records
            .write()
            .await
            .remove(&Self::key(subject, purpose));
        Ok(())
    }

    async fn mark_consumed(&self, subject: &str, purpose: Purpose, record_id: Uuid) -> DomainResult<bool> {
        // Check and flip under one write guard
        let mut records = self.records.write().await;
        match records.get_mut(&Self::key(subject, purpose)) {
            Some(record) if record.id == record_id => Ok(record.consume()),
            _ => Ok(false),
        }
    }

    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> DomainResult<usize> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| record.expires_at >= cutoff);
        Ok(before - records.len())
    }
}
