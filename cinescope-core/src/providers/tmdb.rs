use std::{fmt, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, error};
use url::Url;

use super::{
    ProviderError,
    ports::{DetailSource, ListingResource, ListingSource, NativeParams},
};
use crate::types::{Genre, ListingPage, MediaKind};

pub const TMDB_V3_BASE: &str = "https://api.themoviedb.org/3";

const DETAIL_APPEND: &str = "videos,credits";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct TmdbSettings {
    pub api_key: String,
    pub base_url: Url,
    pub language: Option<String>,
    pub timeout: Duration,
}

impl fmt::Debug for TmdbSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TmdbSettings")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url.as_str())
            .field("language", &self.language)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl TmdbSettings {
    pub fn new(api_key: impl Into<String>, base_url: Url) -> Self {
        Self {
            api_key: api_key.into(),
            base_url,
            language: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language.filter(|lang| !lang.trim().is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
struct TmdbQuery<'a> {
    api_key: &'a str,
    page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    year: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_air_date_year: Option<&'a str>,
    #[serde(flatten)]
    native: &'a NativeParams,
}

#[derive(Debug, Clone, Serialize)]
struct TmdbDetailQuery<'a> {
    api_key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    append_to_response: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct GenreListResponse {
    #[serde(default)]
    genres: Vec<Genre>,
}

/// HTTP client for the TMDB v3 API. Constructed once and injected wherever
/// a listing or detail capability is needed.
pub struct TmdbApiProvider {
    http: reqwest::Client,
    settings: TmdbSettings,
}

impl fmt::Debug for TmdbApiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TmdbApiProvider")
            .field("settings", &self.settings)
            .finish()
    }
}

impl TmdbApiProvider {
    pub fn new(settings: TmdbSettings) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self { http, settings })
    }

    pub fn settings(&self) -> &TmdbSettings {
        &self.settings
    }

    fn endpoint(&self, path: &str) -> Result<Url, ProviderError> {
        let base = self.settings.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/{path}"))
            .map_err(|err| ProviderError::ApiError(format!("invalid TMDB url for {path}: {err}")))
    }

    async fn get_tmdb_json<Q, T>(&self, path: &str, query: &Q) -> Result<T, ProviderError>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        debug!(path, "TMDB request");
        let response = self.http.get(url).query(query).send().await?;

        let status = response.status();
        if status.is_success() {
            let body = response.bytes().await?;
            return serde_json::from_slice::<T>(&body).map_err(|err| {
                error!(path, error = %err, "failed to decode TMDB response");
                ProviderError::ParseError(err.to_string())
            });
        }

        #[derive(Debug, Deserialize)]
        struct TmdbErrorBody {
            #[serde(default)]
            status_message: Option<String>,
        }

        let message = response
            .json::<TmdbErrorBody>()
            .await
            .ok()
            .and_then(|body| body.status_message)
            .unwrap_or_else(|| format!("TMDB request failed with status {}", status));

        match status.as_u16() {
            401 => Err(ProviderError::InvalidApiKey),
            404 => Err(ProviderError::NotFound),
            429 => Err(ProviderError::RateLimited),
            _ => Err(ProviderError::ApiError(message)),
        }
    }
}

#[async_trait]
impl ListingSource for TmdbApiProvider {
    async fn fetch_page(
        &self,
        resource: &ListingResource,
        page: u32,
        params: &NativeParams,
    ) -> Result<ListingPage, ProviderError> {
        let (path, search_query) = match resource {
            ListingResource::Listing { kind, endpoint } => (
                format!("{}/{}", kind.path_segment(), endpoint.path_segment()),
                None,
            ),
            ListingResource::Search { kind, query } => {
                (format!("search/{}", kind.path_segment()), Some(query.as_str()))
            }
        };

        let year = params.year.as_deref();
        let (movie_year, tv_year) = match resource.kind() {
            MediaKind::Movie => (year, None),
            MediaKind::Tv => (None, year),
        };

        let query = TmdbQuery {
            api_key: &self.settings.api_key,
            page: page.max(1),
            query: search_query,
            language: self.settings.language.as_deref(),
            year: movie_year,
            first_air_date_year: tv_year,
            native: params,
        };

        self.get_tmdb_json(&path, &query).await
    }
}

#[async_trait]
impl DetailSource for TmdbApiProvider {
    async fn fetch_detail(&self, kind: MediaKind, id: i64) -> Result<Value, ProviderError> {
        let query = TmdbDetailQuery {
            api_key: &self.settings.api_key,
            append_to_response: Some(DETAIL_APPEND),
            language: self.settings.language.as_deref(),
        };

        self.get_tmdb_json(&format!("{}/{id}", kind.path_segment()), &query)
            .await
    }

    async fn fetch_season(&self, show_id: i64, season_number: u32) -> Result<Value, ProviderError> {
        let query = TmdbDetailQuery {
            api_key: &self.settings.api_key,
            append_to_response: None,
            language: self.settings.language.as_deref(),
        };

        self.get_tmdb_json(&format!("tv/{show_id}/season/{season_number}"), &query)
            .await
    }

    async fn fetch_genres(&self, kind: MediaKind) -> Result<Vec<Genre>, ProviderError> {
        let query = TmdbDetailQuery {
            api_key: &self.settings.api_key,
            append_to_response: None,
            language: self.settings.language.as_deref(),
        };

        let response: GenreListResponse = self
            .get_tmdb_json(&format!("genre/{}/list", kind.path_segment()), &query)
            .await?;
        Ok(response.genres)
    }
}
