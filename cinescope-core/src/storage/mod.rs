pub mod memory;
#[cfg(feature = "database")]
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::{
    error::Result,
    freshness::{CachedDetail, DetailKey, DetailProjection},
};

pub use memory::InMemoryDetailCacheRepository;
#[cfg(feature = "database")]
pub use postgres::PostgresDetailCacheRepository;

/// Key-unique persistence for refreshed detail payloads.
#[async_trait]
pub trait DetailCacheRepository: Send + Sync {
    async fn find(&self, key: &DetailKey) -> Result<Option<CachedDetail>>;

    /// Insert or overwrite the single record for `key`, stamping it with
    /// `now`. Returns the stored record.
    async fn upsert(
        &self,
        key: &DetailKey,
        projection: &DetailProjection,
        raw: &Value,
        now: DateTime<Utc>,
    ) -> Result<CachedDetail>;

    /// Remove records last refreshed before `older_than`. Returns the number
    /// of records removed.
    async fn purge_stale(&self, older_than: DateTime<Utc>) -> Result<u64>;

    /// Short label for health output and logs.
    fn backend(&self) -> &'static str;
}
