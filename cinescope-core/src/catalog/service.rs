use std::{any::type_name_of_val, fmt, sync::Arc};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::{
    aggregator::{ScanPolicy, fetch_filtered_page},
    error::{CatalogError, Result},
    freshness::{DetailKey, FreshnessCache},
    providers::{DetailSource, ListingResource, ListingSource, NativeParams},
    storage::DetailCacheRepository,
    types::{FilterSpec, Genre, ListingEndpoint, ListingPage, MAX_PAGE, MediaKind, clamp_page},
};

/// Movie and TV browsing operations over injected provider capabilities.
pub struct CatalogService {
    listings: Arc<dyn ListingSource>,
    details: Arc<dyn DetailSource>,
    cache: FreshnessCache<dyn DetailCacheRepository>,
}

impl fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogService")
            .field("listings", &type_name_of_val(self.listings.as_ref()))
            .field("details", &type_name_of_val(self.details.as_ref()))
            .field("cache", &self.cache)
            .finish()
    }
}

impl CatalogService {
    pub fn new(
        listings: Arc<dyn ListingSource>,
        details: Arc<dyn DetailSource>,
        repository: Arc<dyn DetailCacheRepository>,
    ) -> Self {
        Self {
            listings,
            details,
            cache: FreshnessCache::new(repository),
        }
    }

    pub fn cache(&self) -> &FreshnessCache<dyn DetailCacheRepository> {
        &self.cache
    }

    /// Label of the storage backing the detail cache.
    pub fn cache_backend(&self) -> &'static str {
        self.cache.repository().backend()
    }

    pub async fn list(
        &self,
        kind: MediaKind,
        endpoint: ListingEndpoint,
        page: u32,
        filter: &FilterSpec,
        params: &NativeParams,
    ) -> Result<ListingPage> {
        match (kind, endpoint) {
            (MediaKind::Tv, ListingEndpoint::Upcoming) => {
                return Err(CatalogError::Validation(
                    "upcoming listings are only available for movies".into(),
                ));
            }
            (MediaKind::Movie, ListingEndpoint::OnTheAir) => {
                return Err(CatalogError::Validation(
                    "on-the-air listings are only available for tv".into(),
                ));
            }
            _ => {}
        }

        let resource = ListingResource::listing(kind, endpoint);
        let policy = ScanPolicy::for_listing(kind, endpoint);
        debug!(%kind, %endpoint, page, ?filter, "listing request");

        let listings = self.listings.as_ref();
        let resource = &resource;
        let page = fetch_filtered_page(
            move |native_page| listings.fetch_page(resource, native_page, params),
            i64::from(page),
            filter,
            policy,
        )
        .await?;

        Ok(page)
    }

    pub async fn list_popular(
        &self,
        kind: MediaKind,
        page: u32,
        filter: &FilterSpec,
        params: &NativeParams,
    ) -> Result<ListingPage> {
        self.list(kind, ListingEndpoint::Popular, page, filter, params)
            .await
    }

    pub async fn list_top_rated(
        &self,
        kind: MediaKind,
        page: u32,
        filter: &FilterSpec,
        params: &NativeParams,
    ) -> Result<ListingPage> {
        self.list(kind, ListingEndpoint::TopRated, page, filter, params)
            .await
    }

    pub async fn list_upcoming(
        &self,
        page: u32,
        filter: &FilterSpec,
        params: &NativeParams,
    ) -> Result<ListingPage> {
        self.list(MediaKind::Movie, ListingEndpoint::Upcoming, page, filter, params)
            .await
    }

    pub async fn list_on_the_air(
        &self,
        page: u32,
        filter: &FilterSpec,
        params: &NativeParams,
    ) -> Result<ListingPage> {
        self.list(MediaKind::Tv, ListingEndpoint::OnTheAir, page, filter, params)
            .await
    }

    /// Search one native page. The year is sent upstream; a genre filter is
    /// applied to that page only and `total_results` then reports the
    /// filtered count.
    pub async fn search(
        &self,
        kind: MediaKind,
        query: &str,
        page: u32,
        filter: &FilterSpec,
        params: &NativeParams,
    ) -> Result<ListingPage> {
        let query = query.trim();
        if query.is_empty() {
            return Err(CatalogError::Validation("Search query is required".into()));
        }

        let mut native = params.clone();
        if let Some(year) = &filter.year
            && native.primary_release_year.is_none()
        {
            native.year = Some(year.to_string());
        }

        let page = clamp_page(i64::from(page));
        let resource = ListingResource::search(kind, query);
        let mut response = self.listings.fetch_page(&resource, page, &native).await?;

        if let Some(genre_id) = filter.genre_id {
            let genre_only = FilterSpec::new(Some(genre_id), None);
            response.results.retain(|item| genre_only.matches_value(item));
            response.total_results = response.results.len() as u64;
        }
        response.total_pages = response.total_pages.min(MAX_PAGE);

        Ok(response)
    }

    /// Raw detail payload for a movie or show, served from the freshness
    /// cache when possible.
    pub async fn get_detail(&self, kind: MediaKind, id: i64) -> Result<Value> {
        if id <= 0 {
            return Err(CatalogError::Validation(format!(
                "{kind} id must be a positive integer"
            )));
        }

        let details = self.details.as_ref();
        self.cache
            .get_or_refresh(DetailKey::new(kind, id), || async move {
                details
                    .fetch_detail(kind, id)
                    .await
                    .map_err(|err| CatalogError::from_provider(err, format!("{kind} {id}")))
            })
            .await
    }

    pub async fn get_season(&self, show_id: i64, season_number: u32) -> Result<Value> {
        if show_id <= 0 {
            return Err(CatalogError::Validation(
                "tv id must be a positive integer".into(),
            ));
        }

        self.details
            .fetch_season(show_id, season_number)
            .await
            .map_err(|err| {
                CatalogError::from_provider(err, format!("season {season_number} of tv {show_id}"))
            })
    }

    pub async fn genres(&self, kind: MediaKind) -> Result<Vec<Genre>> {
        Ok(self.details.fetch_genres(kind).await?)
    }

    pub async fn purge_stale(&self, older_than: DateTime<Utc>) -> Result<u64> {
        self.cache.purge_stale(older_than).await
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use serde_json::json;

    use super::*;
    use crate::{
        providers::{
            ProviderError,
            ports::{MockDetailSource, MockListingSource},
        },
        storage::InMemoryDetailCacheRepository,
    };

    fn service(listings: MockListingSource, details: MockDetailSource) -> CatalogService {
        CatalogService::new(
            Arc::new(listings),
            Arc::new(details),
            Arc::new(InMemoryDetailCacheRepository::new()),
        )
    }

    fn native_page(page: u32, total_pages: u32, items: Vec<Value>) -> ListingPage {
        let total_results = u64::from(total_pages) * 20;
        ListingPage {
            results: items,
            page,
            total_pages,
            total_results,
        }
    }

    fn genre_page(page: u32, total_pages: u32) -> ListingPage {
        let first = i64::from(page - 1) * 20 + 1;
        let items = (first..first + 20)
            .map(|id| {
                let genre = if id % 4 == 0 { 28 } else { 18 };
                json!({"id": id, "genre_ids": [genre], "release_date": "2021-01-01"})
            })
            .collect();
        native_page(page, total_pages, items)
    }

    #[tokio::test]
    async fn unfiltered_listing_passes_native_params_through() {
        let mut listings = MockListingSource::new();
        listings
            .expect_fetch_page()
            .withf(|resource, page, params| {
                *resource == ListingResource::listing(MediaKind::Movie, ListingEndpoint::Popular)
                    && *page == 3
                    && params.sort_by.as_deref() == Some("vote_average.desc")
            })
            .times(1)
            .returning(|_, page, _| Ok(native_page(page, 900, vec![json!({"id": 1})])));

        let params = NativeParams {
            sort_by: Some("vote_average.desc".into()),
            ..NativeParams::default()
        };
        let page = service(listings, MockDetailSource::new())
            .list_popular(MediaKind::Movie, 3, &FilterSpec::default(), &params)
            .await
            .unwrap();

        assert_eq!(page.page, 3);
        assert_eq!(page.total_pages, 500);
        assert_eq!(page.total_results, 18_000);
    }

    #[tokio::test]
    async fn filtered_tv_listing_scans_at_most_five_pages() {
        let mut listings = MockListingSource::new();
        listings
            .expect_fetch_page()
            .times(5)
            .returning(|_, page, _| Ok(genre_page(page, 50)));

        let page = service(listings, MockDetailSource::new())
            .list_on_the_air(1, &FilterSpec::new(Some(28), None), &NativeParams::default())
            .await
            .unwrap();

        assert_eq!(page.total_results, 25);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.results.len(), 20);
    }

    #[tokio::test]
    async fn filtered_movie_popular_scans_up_to_twenty_five_pages() {
        let mut listings = MockListingSource::new();
        listings
            .expect_fetch_page()
            .times(25)
            .returning(|_, page, _| Ok(genre_page(page, 200)));

        let page = service(listings, MockDetailSource::new())
            .list_popular(
                MediaKind::Movie,
                7,
                &FilterSpec::new(Some(28), None),
                &NativeParams::default(),
            )
            .await
            .unwrap();

        assert_eq!(page.total_results, 125);
        assert_eq!(page.total_pages, 7);
        assert_eq!(page.results.len(), 5);
    }

    #[tokio::test]
    async fn mismatched_endpoints_are_rejected() {
        let svc = service(MockListingSource::new(), MockDetailSource::new());
        let filter = FilterSpec::default();
        let params = NativeParams::default();

        assert!(matches!(
            svc.list(MediaKind::Tv, ListingEndpoint::Upcoming, 1, &filter, &params)
                .await,
            Err(CatalogError::Validation(_))
        ));
        assert!(matches!(
            svc.list(MediaKind::Movie, ListingEndpoint::OnTheAir, 1, &filter, &params)
                .await,
            Err(CatalogError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn listing_failure_surfaces_as_upstream_error() {
        let mut listings = MockListingSource::new();
        listings
            .expect_fetch_page()
            .returning(|_, _, _| Err(ProviderError::RateLimited));

        let result = service(listings, MockDetailSource::new())
            .list_top_rated(
                MediaKind::Tv,
                1,
                &FilterSpec::new(Some(18), None),
                &NativeParams::default(),
            )
            .await;

        assert!(matches!(
            result,
            Err(CatalogError::Upstream(ProviderError::RateLimited))
        ));
    }

    #[tokio::test]
    async fn search_filters_genre_on_a_single_page() {
        let mut listings = MockListingSource::new();
        listings
            .expect_fetch_page()
            .withf(|resource, page, params| {
                *resource == ListingResource::search(MediaKind::Movie, "matrix")
                    && *page == 2
                    && params.year.as_deref() == Some("1999")
            })
            .times(1)
            .returning(|_, page, _| {
                Ok(native_page(
                    page,
                    3,
                    vec![
                        json!({"id": 603, "genre_ids": [28, 878]}),
                        json!({"id": 604, "genre_ids": [18]}),
                    ],
                ))
            });

        let page = service(listings, MockDetailSource::new())
            .search(
                MediaKind::Movie,
                "  matrix ",
                2,
                &FilterSpec::parse(Some("28"), Some("1999")).unwrap(),
                &NativeParams::default(),
            )
            .await
            .unwrap();

        assert_eq!(page.results.len(), 1);
        assert_eq!(page.total_results, 1);
        assert_eq!(page.total_pages, 3);
    }

    #[tokio::test]
    async fn movie_search_sends_primary_release_year_instead_of_year() {
        let mut listings = MockListingSource::new();
        listings
            .expect_fetch_page()
            .withf(|_, _, params| {
                params.primary_release_year.as_deref() == Some("1999") && params.year.is_none()
            })
            .times(1)
            .returning(|_, page, _| Ok(native_page(page, 1, vec![json!({"id": 603})])));

        let params = NativeParams {
            primary_release_year: Some("1999".into()),
            ..NativeParams::default()
        };
        let page = service(listings, MockDetailSource::new())
            .search(
                MediaKind::Movie,
                "matrix",
                1,
                &FilterSpec::parse(None, Some("1999")).unwrap(),
                &params,
            )
            .await
            .unwrap();

        assert_eq!(page.results.len(), 1);
    }

    #[tokio::test]
    async fn search_without_genre_keeps_upstream_totals() {
        let mut listings = MockListingSource::new();
        listings
            .expect_fetch_page()
            .times(1)
            .returning(|_, page, _| Ok(native_page(page, 4, vec![json!({"id": 1399})])));

        let page = service(listings, MockDetailSource::new())
            .search(
                MediaKind::Tv,
                "thrones",
                1,
                &FilterSpec::default(),
                &NativeParams::default(),
            )
            .await
            .unwrap();

        assert_eq!(page.total_results, 80);
    }

    #[tokio::test]
    async fn blank_search_query_is_a_validation_error() {
        let result = service(MockListingSource::new(), MockDetailSource::new())
            .search(
                MediaKind::Movie,
                "   ",
                1,
                &FilterSpec::default(),
                &NativeParams::default(),
            )
            .await;

        assert!(matches!(result, Err(CatalogError::Validation(_))));
    }

    #[tokio::test]
    async fn detail_is_fetched_once_then_served_from_cache() {
        let mut details = MockDetailSource::new();
        details
            .expect_fetch_detail()
            .with(eq(MediaKind::Movie), eq(42))
            .times(1)
            .returning(|_, id| Ok(json!({"id": id, "title": "Answer"})));

        let svc = service(MockListingSource::new(), details);
        let first = svc.get_detail(MediaKind::Movie, 42).await.unwrap();
        let second = svc.get_detail(MediaKind::Movie, 42).await.unwrap();

        assert_eq!(first, json!({"id": 42, "title": "Answer"}));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn missing_detail_maps_to_not_found() {
        let mut details = MockDetailSource::new();
        details
            .expect_fetch_detail()
            .returning(|_, _| Err(ProviderError::NotFound));

        let result = service(MockListingSource::new(), details)
            .get_detail(MediaKind::Tv, 999_999)
            .await;

        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }

    #[tokio::test]
    async fn non_positive_ids_are_rejected() {
        let svc = service(MockListingSource::new(), MockDetailSource::new());
        assert!(matches!(
            svc.get_detail(MediaKind::Movie, 0).await,
            Err(CatalogError::Validation(_))
        ));
        assert!(matches!(
            svc.get_season(-1, 1).await,
            Err(CatalogError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn seasons_are_not_cached() {
        let mut details = MockDetailSource::new();
        details
            .expect_fetch_season()
            .with(eq(1399), eq(1))
            .times(2)
            .returning(|_, n| Ok(json!({"season_number": n})));

        let svc = service(MockListingSource::new(), details);
        svc.get_season(1399, 1).await.unwrap();
        let season = svc.get_season(1399, 1).await.unwrap();
        assert_eq!(season["season_number"], 1);
    }

    #[tokio::test]
    async fn genres_pass_through() {
        let mut details = MockDetailSource::new();
        details
            .expect_fetch_genres()
            .with(eq(MediaKind::Tv))
            .returning(|_| {
                Ok(vec![Genre {
                    id: 10759,
                    name: "Action & Adventure".into(),
                }])
            });

        let genres = service(MockListingSource::new(), details)
            .genres(MediaKind::Tv)
            .await
            .unwrap();
        assert_eq!(genres[0].id, 10759);
    }
}
