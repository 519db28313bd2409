use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::ProviderError;
use crate::types::{Genre, ListingEndpoint, ListingPage, MediaKind};

/// What a single native page fetch targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingResource {
    Listing {
        kind: MediaKind,
        endpoint: ListingEndpoint,
    },
    Search {
        kind: MediaKind,
        query: String,
    },
}

impl ListingResource {
    pub fn listing(kind: MediaKind, endpoint: ListingEndpoint) -> Self {
        Self::Listing { kind, endpoint }
    }

    pub fn search(kind: MediaKind, query: impl Into<String>) -> Self {
        Self::Search {
            kind,
            query: query.into(),
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            Self::Listing { kind, .. } | Self::Search { kind, .. } => *kind,
        }
    }
}

/// Query parameters forwarded to the provider untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NativeParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_adult: Option<String>,
    /// Movie search filter on the primary release date, sent under its own
    /// name. Takes precedence over `year` for movies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_release_year: Option<String>,
    /// Release (movies) or first-air (tv) year. Only search endpoints honour
    /// it; the provider picks the upstream parameter name per kind.
    #[serde(skip)]
    pub year: Option<String>,
}

/// Paged listing capability. Pages are 1-indexed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch_page(
        &self,
        resource: &ListingResource,
        page: u32,
        params: &NativeParams,
    ) -> Result<ListingPage, ProviderError>;
}

/// Detail-fetch capability. Payloads are returned exactly as the provider
/// sent them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DetailSource: Send + Sync {
    async fn fetch_detail(&self, kind: MediaKind, id: i64) -> Result<Value, ProviderError>;

    async fn fetch_season(&self, show_id: i64, season_number: u32) -> Result<Value, ProviderError>;

    async fn fetch_genres(&self, kind: MediaKind) -> Result<Vec<Genre>, ProviderError>;
}
