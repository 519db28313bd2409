use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;

use super::DetailCacheRepository;
use crate::{
    error::Result,
    freshness::{CachedDetail, DetailKey, DetailProjection},
};

/// Process-local detail store, used when no database is configured.
#[derive(Debug, Default)]
pub struct InMemoryDetailCacheRepository {
    entries: DashMap<DetailKey, CachedDetail>,
}

impl InMemoryDetailCacheRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl DetailCacheRepository for InMemoryDetailCacheRepository {
    async fn find(&self, key: &DetailKey) -> Result<Option<CachedDetail>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn upsert(
        &self,
        key: &DetailKey,
        projection: &DetailProjection,
        raw: &Value,
        now: DateTime<Utc>,
    ) -> Result<CachedDetail> {
        let record = CachedDetail {
            key: *key,
            projection: projection.clone(),
            raw: raw.clone(),
            last_updated: now,
        };
        self.entries.insert(*key, record.clone());
        Ok(record)
    }

    async fn purge_stale(&self, older_than: DateTime<Utc>) -> Result<u64> {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.last_updated >= older_than);
        Ok(before.saturating_sub(self.entries.len()) as u64)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
