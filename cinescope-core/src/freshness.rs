use std::{any::type_name_of_val, fmt, future::Future, sync::Arc};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    error::Result,
    storage::DetailCacheRepository,
    types::{Genre, MediaKind},
};

/// How long, in hours, a stored detail payload is served without going
/// upstream.
pub const FRESHNESS_WINDOW_HOURS: i64 = 24;

/// Identifies one cached detail record. Movies and shows live in separate
/// key spaces because their upstream ids overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DetailKey {
    pub kind: MediaKind,
    pub tmdb_id: i64,
}

impl DetailKey {
    pub fn new(kind: MediaKind, tmdb_id: i64) -> Self {
        Self { kind, tmdb_id }
    }

    pub fn movie(tmdb_id: i64) -> Self {
        Self::new(MediaKind::Movie, tmdb_id)
    }

    pub fn tv(tmdb_id: i64) -> Self {
        Self::new(MediaKind::Tv, tmdb_id)
    }
}

impl fmt::Display for DetailKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.tmdb_id)
    }
}

/// Queryable fields lifted out of a raw detail payload before it is stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailProjection {
    pub title: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i64>,
    pub popularity: Option<f64>,
    pub genres: Vec<Genre>,
    /// Movies only.
    pub runtime: Option<i32>,
    /// Shows only.
    pub number_of_seasons: Option<i32>,
    /// Shows only.
    pub number_of_episodes: Option<i32>,
}

impl DetailProjection {
    pub fn from_raw(kind: MediaKind, raw: &Value) -> Self {
        let text = |field: &str| raw.get(field).and_then(Value::as_str).map(str::to_owned);
        let small_int = |field: &str| {
            raw.get(field)
                .and_then(Value::as_i64)
                .and_then(|value| i32::try_from(value).ok())
        };

        let genres = raw
            .get("genres")
            .and_then(Value::as_array)
            .map(|genres| {
                genres
                    .iter()
                    .filter_map(|genre| serde_json::from_value::<Genre>(genre.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();

        let (title, runtime, number_of_seasons, number_of_episodes) = match kind {
            MediaKind::Movie => (text("title"), small_int("runtime"), None, None),
            MediaKind::Tv => (
                text("name"),
                None,
                small_int("number_of_seasons"),
                small_int("number_of_episodes"),
            ),
        };

        Self {
            title,
            overview: text("overview"),
            poster_path: text("poster_path"),
            backdrop_path: text("backdrop_path"),
            release_date: raw
                .get(kind.date_field())
                .and_then(Value::as_str)
                .and_then(parse_date),
            vote_average: raw.get("vote_average").and_then(Value::as_f64),
            vote_count: raw.get("vote_count").and_then(Value::as_i64),
            popularity: raw.get("popularity").and_then(Value::as_f64),
            genres,
            runtime,
            number_of_seasons,
            number_of_episodes,
        }
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
}

/// A stored detail record: the projection, the untouched upstream payload,
/// and when it was last refreshed.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedDetail {
    pub key: DetailKey,
    pub projection: DetailProjection,
    pub raw: Value,
    pub last_updated: DateTime<Utc>,
}

impl CachedDetail {
    pub fn is_fresh_at(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now - self.last_updated < window
    }
}

/// Serves detail payloads from storage while they are younger than the
/// freshness window, refreshing from upstream otherwise.
///
/// Concurrent misses for one key are not coalesced; each caller refreshes and
/// the last upsert wins.
pub struct FreshnessCache<R>
where
    R: DetailCacheRepository + ?Sized,
{
    repository: Arc<R>,
    window: Duration,
}

impl<R> fmt::Debug for FreshnessCache<R>
where
    R: DetailCacheRepository + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FreshnessCache")
            .field("repository", &type_name_of_val(self.repository.as_ref()))
            .field("window", &self.window)
            .finish()
    }
}

impl<R> FreshnessCache<R>
where
    R: DetailCacheRepository + ?Sized,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            window: Duration::hours(FRESHNESS_WINDOW_HOURS),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub async fn get_or_refresh<F, Fut>(&self, key: DetailKey, refresh: F) -> Result<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        self.get_or_refresh_at(key, Utc::now(), refresh).await
    }

    /// Return the stored raw payload for `key` if it was refreshed less than
    /// one window before `now`; otherwise call `refresh`, store its result,
    /// and return it. A failed refresh leaves the stored entry untouched.
    pub async fn get_or_refresh_at<F, Fut>(
        &self,
        key: DetailKey,
        now: DateTime<Utc>,
        refresh: F,
    ) -> Result<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        if let Some(entry) = self.repository.find(&key).await? {
            if entry.is_fresh_at(now, self.window) {
                debug!(%key, last_updated = %entry.last_updated, "detail cache HIT");
                return Ok(entry.raw);
            }
            debug!(%key, last_updated = %entry.last_updated, "detail cache STALE");
        } else {
            debug!(%key, "detail cache MISS");
        }

        let raw = refresh().await?;
        let projection = DetailProjection::from_raw(key.kind, &raw);
        let stored = self.repository.upsert(&key, &projection, &raw, now).await?;
        info!(%key, last_updated = %stored.last_updated, "stored refreshed detail");

        Ok(raw)
    }

    /// Remove entries last refreshed before `older_than`.
    pub async fn purge_stale(&self, older_than: DateTime<Utc>) -> Result<u64> {
        let removed = self.repository.purge_stale(older_than).await?;
        if removed > 0 {
            info!(removed, %older_than, "purged stale detail cache entries");
        }
        Ok(removed)
    }
}
