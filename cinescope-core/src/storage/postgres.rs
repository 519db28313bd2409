use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::{PgPool, types::Json};

use super::DetailCacheRepository;
use crate::{
    error::{CatalogError, Result},
    freshness::{CachedDetail, DetailKey, DetailProjection},
    types::Genre,
};

const DETAIL_COLUMNS: &str = r#"
    title,
    overview,
    poster_path,
    backdrop_path,
    release_date,
    vote_average,
    vote_count,
    popularity,
    genres,
    runtime,
    number_of_seasons,
    number_of_episodes,
    raw,
    last_updated
"#;

#[derive(Debug, sqlx::FromRow)]
struct MediaDetailRow {
    title: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    release_date: Option<NaiveDate>,
    vote_average: Option<f64>,
    vote_count: Option<i64>,
    popularity: Option<f64>,
    genres: Json<Vec<Genre>>,
    runtime: Option<i32>,
    number_of_seasons: Option<i32>,
    number_of_episodes: Option<i32>,
    raw: Value,
    last_updated: DateTime<Utc>,
}

impl MediaDetailRow {
    fn into_cached(self, key: DetailKey) -> CachedDetail {
        CachedDetail {
            key,
            projection: DetailProjection {
                title: self.title,
                overview: self.overview,
                poster_path: self.poster_path,
                backdrop_path: self.backdrop_path,
                release_date: self.release_date,
                vote_average: self.vote_average,
                vote_count: self.vote_count,
                popularity: self.popularity,
                genres: self.genres.0,
                runtime: self.runtime,
                number_of_seasons: self.number_of_seasons,
                number_of_episodes: self.number_of_episodes,
            },
            raw: self.raw,
            last_updated: self.last_updated,
        }
    }
}

/// Detail cache stored in the `media_details` table, one row per
/// `(media_kind, tmdb_id)`.
#[derive(Debug, Clone)]
pub struct PostgresDetailCacheRepository {
    pool: PgPool,
}

impl PostgresDetailCacheRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DetailCacheRepository for PostgresDetailCacheRepository {
    async fn find(&self, key: &DetailKey) -> Result<Option<CachedDetail>> {
        let sql = format!(
            "SELECT {DETAIL_COLUMNS} FROM media_details WHERE media_kind = $1 AND tmdb_id = $2"
        );

        let row = sqlx::query_as::<_, MediaDetailRow>(&sql)
            .bind(key.kind.as_str())
            .bind(key.tmdb_id)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| CatalogError::Storage(format!("Failed to load cached detail {key}: {e}")))?;

        Ok(row.map(|row| row.into_cached(*key)))
    }

    async fn upsert(
        &self,
        key: &DetailKey,
        projection: &DetailProjection,
        raw: &Value,
        now: DateTime<Utc>,
    ) -> Result<CachedDetail> {
        let sql = format!(
            r#"
            INSERT INTO media_details (
                media_kind,
                tmdb_id,
                title,
                overview,
                poster_path,
                backdrop_path,
                release_date,
                vote_average,
                vote_count,
                popularity,
                genres,
                runtime,
                number_of_seasons,
                number_of_episodes,
                raw,
                last_updated
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            ON CONFLICT (media_kind, tmdb_id) DO UPDATE SET
                title = EXCLUDED.title,
                overview = EXCLUDED.overview,
                poster_path = EXCLUDED.poster_path,
                backdrop_path = EXCLUDED.backdrop_path,
                release_date = EXCLUDED.release_date,
                vote_average = EXCLUDED.vote_average,
                vote_count = EXCLUDED.vote_count,
                popularity = EXCLUDED.popularity,
                genres = EXCLUDED.genres,
                runtime = EXCLUDED.runtime,
                number_of_seasons = EXCLUDED.number_of_seasons,
                number_of_episodes = EXCLUDED.number_of_episodes,
                raw = EXCLUDED.raw,
                last_updated = EXCLUDED.last_updated
            RETURNING {DETAIL_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, MediaDetailRow>(&sql)
            .bind(key.kind.as_str())
            .bind(key.tmdb_id)
            .bind(projection.title.as_deref())
            .bind(projection.overview.as_deref())
            .bind(projection.poster_path.as_deref())
            .bind(projection.backdrop_path.as_deref())
            .bind(projection.release_date)
            .bind(projection.vote_average)
            .bind(projection.vote_count)
            .bind(projection.popularity)
            .bind(Json(&projection.genres))
            .bind(projection.runtime)
            .bind(projection.number_of_seasons)
            .bind(projection.number_of_episodes)
            .bind(Json(raw))
            .bind(now)
            .fetch_one(self.pool())
            .await
            .map_err(|e| CatalogError::Storage(format!("Failed to store cached detail {key}: {e}")))?;

        Ok(row.into_cached(*key))
    }

    async fn purge_stale(&self, older_than: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM media_details WHERE last_updated < $1")
            .bind(older_than)
            .execute(self.pool())
            .await
            .map_err(|e| CatalogError::Storage(format!("Failed to purge cached details: {e}")))?;

        Ok(result.rows_affected())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
