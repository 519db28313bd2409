//! HTTP request handlers organized by resource

pub mod genres;
pub mod movies;
pub mod search;
pub mod system;
pub mod tv;

use axum::{
    Json,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use cinescope_core::{FilterSpec, MediaKind, providers::NativeParams, types::parse_page};
use serde::{Deserialize, Serialize};

use crate::infra::errors::{AppError, AppResult};

/// Success envelope shared by every `/api` route.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

/// Query string accepted by listing and search routes. Every field is kept
/// as raw text so malformed values can be handled leniently or reported
/// with a readable message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingQuery {
    pub page: Option<String>,
    pub with_genres: Option<String>,
    pub primary_release_year: Option<String>,
    pub year: Option<String>,
    pub first_air_date_year: Option<String>,
    pub sort_by: Option<String>,
    pub include_adult: Option<String>,
    pub query: Option<String>,
}

impl<S> FromRequestParts<S> for ListingQuery
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<Self>::from_request_parts(parts, state).await?;
        Ok(query)
    }
}

impl ListingQuery {
    pub fn page(&self) -> u32 {
        parse_page(self.page.as_deref())
    }

    /// Genre and year filter for `kind`. Movies read `primary_release_year`
    /// and fall back to `year`; tv reads `first_air_date_year`.
    pub fn filter(&self, kind: MediaKind) -> AppResult<FilterSpec> {
        let year = match kind {
            MediaKind::Movie => non_blank(&self.primary_release_year).or(non_blank(&self.year)),
            MediaKind::Tv => non_blank(&self.first_air_date_year),
        };

        Ok(FilterSpec::parse(self.with_genres.as_deref(), year)?)
    }

    /// Parameters forwarded upstream as sent. A movie client's
    /// `primary_release_year` keeps its name so search filters on the
    /// primary release date rather than any release.
    pub fn native(&self, kind: MediaKind) -> NativeParams {
        let primary_release_year = match kind {
            MediaKind::Movie => non_blank(&self.primary_release_year).map(str::to_string),
            MediaKind::Tv => None,
        };

        NativeParams {
            sort_by: non_blank(&self.sort_by).map(str::to_string),
            include_adult: non_blank(&self.include_adult).map(str::to_string),
            primary_release_year,
            year: None,
        }
    }

    pub fn search_text(&self) -> &str {
        self.query.as_deref().unwrap_or_default()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Parse a path id as a positive integer.
pub(crate) fn parse_id(raw: &str, what: &str) -> AppResult<i64> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::bad_request(format!(
            "{what} must be a positive integer, got '{raw}'"
        ))),
    }
}
