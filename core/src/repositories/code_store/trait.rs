//! Code store trait defining the interface for outstanding verification codes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::verification_record::{Purpose, VerificationRecord};
use crate::errors::DomainResult;

/// Keyed storage for verification records, one slot per (subject, purpose)
///
/// Subjects are passed already normalized; stores compare them verbatim.
/// Every method fails with `DomainError::Storage` when the backend is unavailable.
#[async_trait]
pub trait CodeStore: Send + Sync {
    /// Store `record`, replacing whatever the key held before
    async fn put(&self, subject: &str, purpose: Purpose, record: VerificationRecord) -> DomainResult<()>;

    /// Current record for the key, regardless of expiry or consumption
    ///
    /// # Returns
    /// * `Ok(Some(record))` - A record was issued and not yet evicted
    /// * `Ok(None)` - Never issued, cancelled or evicted
    async fn get(&self, subject: &str, purpose: Purpose) -> DomainResult<Option<VerificationRecord>>;

    /// Remove the record; absent keys are not an error
    async fn delete(&self, subject: &str, purpose: Purpose) -> DomainResult<()>;

    /// Atomically flag the record `record_id` as consumed
    ///
    /// The transition happens only if the key still holds `record_id` and that
    /// record is unconsumed. Concurrent callers racing on the same record see
    /// exactly one `Ok(true)`.
    ///
    /// # Returns
    /// * `Ok(true)` - This call consumed the record
    /// * `Ok(false)` - Already consumed, superseded by a re-issue, or gone
    async fn mark_consumed(&self, subject: &str, purpose: Purpose, record_id: Uuid) -> DomainResult<bool>;

    /// Evict records that expired before `cutoff`
    ///
    /// Backends with native expiry may return `Ok(0)` without doing anything.
    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> DomainResult<usize>;
}
