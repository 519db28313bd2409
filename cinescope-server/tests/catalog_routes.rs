use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use cinescope_core::{
    CatalogService, Genre, ListingPage, MediaKind, ProviderError,
    providers::{DetailSource, ListingResource, ListingSource, NativeParams},
    storage::InMemoryDetailCacheRepository,
};
use cinescope_server::{
    AppState, create_app,
    infra::config::{
        CacheConfig, Config, ConfigMetadata, CorsConfig, DatabaseConfig, ServerConfig, TmdbConfig,
    },
};
use serde_json::{Value, json};

/// Listing source serving a fixed catalogue, twenty items per page.
#[derive(Default)]
struct FakeListings {
    items: Vec<Value>,
    calls: Mutex<Vec<(ListingResource, u32, NativeParams)>>,
}

impl FakeListings {
    fn with_items(items: Vec<Value>) -> Self {
        Self {
            items,
            calls: Mutex::default(),
        }
    }

    fn calls(&self) -> Vec<(ListingResource, u32, NativeParams)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ListingSource for FakeListings {
    async fn fetch_page(
        &self,
        resource: &ListingResource,
        page: u32,
        params: &NativeParams,
    ) -> Result<ListingPage, ProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push((resource.clone(), page, params.clone()));

        if let ListingResource::Search { query, .. } = resource
            && query == "ratelimit"
        {
            return Err(ProviderError::RateLimited);
        }

        let total_pages = self.items.len().div_ceil(20).max(1) as u32;
        let start = (page as usize - 1) * 20;
        let results = self.items.iter().skip(start).take(20).cloned().collect();

        Ok(ListingPage {
            results,
            page,
            total_pages,
            total_results: self.items.len() as u64,
        })
    }
}

#[derive(Default)]
struct FakeDetails {
    detail_calls: AtomicUsize,
}

#[async_trait]
impl DetailSource for FakeDetails {
    async fn fetch_detail(&self, kind: MediaKind, id: i64) -> Result<Value, ProviderError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        match id {
            404 => Err(ProviderError::NotFound),
            500 => Err(ProviderError::ApiError("upstream exploded".into())),
            _ => Ok(json!({
                "id": id,
                "title": format!("{kind} {id}"),
                "release_date": "1999-03-31",
                "genres": [{"id": 28, "name": "Action"}],
                "credits": {"cast": []},
                "videos": {"results": []}
            })),
        }
    }

    async fn fetch_season(&self, show_id: i64, season_number: u32) -> Result<Value, ProviderError> {
        Ok(json!({
            "show_id": show_id,
            "season_number": season_number,
            "episodes": [{"episode_number": 1}]
        }))
    }

    async fn fetch_genres(&self, kind: MediaKind) -> Result<Vec<Genre>, ProviderError> {
        Ok(match kind {
            MediaKind::Movie => vec![Genre {
                id: 28,
                name: "Action".into(),
            }],
            MediaKind::Tv => vec![Genre {
                id: 10759,
                name: "Action & Adventure".into(),
            }],
        })
    }
}

fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
        },
        database: DatabaseConfig {
            url: None,
            max_connections: 1,
        },
        tmdb: TmdbConfig {
            api_key: "test-key".into(),
            base_url: "http://tmdb.invalid/3".parse().unwrap(),
            language: None,
            timeout: Duration::from_secs(1),
        },
        cors: CorsConfig {
            allowed_origins: vec!["http://localhost:5173".into()],
            allowed_methods: vec!["GET".into(), "OPTIONS".into()],
            allowed_headers: vec!["Content-Type".into()],
            allow_credentials: true,
        },
        cache: CacheConfig {
            retention: None,
            sweep_interval: Duration::from_secs(3600),
        },
        dev_mode: false,
        metadata: ConfigMetadata::default(),
    }
}

struct Harness {
    server: TestServer,
    listings: Arc<FakeListings>,
    details: Arc<FakeDetails>,
}

fn harness(items: Vec<Value>) -> Harness {
    let listings = Arc::new(FakeListings::with_items(items));
    let details = Arc::new(FakeDetails::default());
    let catalog = CatalogService::new(
        listings.clone(),
        details.clone(),
        Arc::new(InMemoryDetailCacheRepository::new()),
    );
    let state = AppState::new(Arc::new(catalog), Arc::new(test_config()));
    let server = TestServer::new(create_app(state)).expect("test server");

    Harness {
        server,
        listings,
        details,
    }
}

fn movie(id: i64, genres: &[i64], date: &str) -> Value {
    json!({ "id": id, "title": format!("movie {id}"), "genre_ids": genres, "release_date": date })
}

fn show(id: i64, genres: &[i64], date: &str) -> Value {
    json!({ "id": id, "name": format!("show {id}"), "genre_ids": genres, "first_air_date": date })
}

#[tokio::test]
async fn root_and_health_report_status() {
    let h = harness(Vec::new());

    let root = h.server.get("/").await;
    root.assert_status_ok();
    assert_eq!(root.json::<Value>()["message"], "Welcome to CINESCOPE API");

    let health: Value = h.server.get("/health").await.json();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["checks"]["cache"]["backend"], "memory");

    let ping: Value = h.server.get("/ping").await.json();
    assert_eq!(ping["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn unfiltered_popular_passes_native_page_through() {
    let items = (1..=45).map(|id| movie(id, &[18], "2001-01-01")).collect();
    let h = harness(items);

    let response = h.server.get("/api/movies/popular").add_query_param("page", 2).await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["page"], 2);
    assert_eq!(body["data"]["results"].as_array().unwrap().len(), 20);
    assert_eq!(body["data"]["results"][0]["id"], 21);
    assert_eq!(h.listings.calls().len(), 1);
}

#[tokio::test]
async fn genre_filter_scans_and_repaginates() {
    // 60 native items, every other one is Action (28).
    let items = (1..=60)
        .map(|id| {
            let genre = if id % 2 == 0 { 28 } else { 18 };
            movie(id, &[genre], "2010-05-05")
        })
        .collect();
    let h = harness(items);

    let body: Value = h
        .server
        .get("/api/movies/popular")
        .add_query_param("with_genres", 28)
        .add_query_param("page", 2)
        .await
        .json();

    let data = &body["data"];
    assert_eq!(data["total_results"], 30);
    assert_eq!(data["total_pages"], 2);
    assert_eq!(data["page"], 2);
    let ids: Vec<i64> = data["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, (42_i64..=60).step_by(2).collect::<Vec<_>>());
    assert_eq!(h.listings.calls().len(), 3);
}

#[tokio::test]
async fn movie_year_falls_back_to_year_param() {
    let items = vec![
        movie(1, &[28], "1999-03-31"),
        movie(2, &[28], "2003-05-15"),
        movie(3, &[18], "1999-10-15"),
    ];
    let h = harness(items);

    let body: Value = h
        .server
        .get("/api/movies/top-rated")
        .add_query_param("year", "1999")
        .await
        .json();

    assert_eq!(body["data"]["total_results"], 2);
    assert_eq!(body["data"]["results"][1]["id"], 3);
}

#[tokio::test]
async fn tv_filters_on_first_air_date_year() {
    let items = vec![
        show(1, &[18], "2011-04-17"),
        show(2, &[18], "2008-01-20"),
        show(3, &[35], "2011-09-01"),
    ];
    let h = harness(items);

    let body: Value = h
        .server
        .get("/api/tv/on-the-air")
        .add_query_param("first_air_date_year", "2011")
        .add_query_param("with_genres", "18")
        .await
        .json();

    assert_eq!(body["data"]["total_results"], 1);
    assert_eq!(body["data"]["results"][0]["name"], "show 1");
}

#[tokio::test]
async fn malformed_year_is_a_bad_request() {
    let h = harness(Vec::new());

    let response = h
        .server
        .get("/api/tv/popular")
        .add_query_param("first_air_date_year", "20x1")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert!(h.listings.calls().is_empty());
}

#[tokio::test]
async fn search_requires_a_query() {
    let h = harness(Vec::new());

    let response = h.server.get("/api/search/movies").add_query_param("query", "  ").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["message"], "Search query is required");
}

#[tokio::test]
async fn search_filters_genre_on_one_page_and_sends_year_upstream() {
    let items = vec![movie(1, &[28], "1999-03-31"), movie(2, &[18], "1999-06-01")];
    let h = harness(items);

    let body: Value = h
        .server
        .get("/api/movies/search")
        .add_query_param("query", "matrix")
        .add_query_param("with_genres", 28)
        .add_query_param("primary_release_year", 1999)
        .add_query_param("sort_by", "popularity.desc")
        .await
        .json();

    assert_eq!(body["data"]["total_results"], 1);
    assert_eq!(body["data"]["results"][0]["id"], 1);

    let calls = h.listings.calls();
    assert_eq!(calls.len(), 1);
    let (resource, page, params) = &calls[0];
    assert_eq!(*resource, ListingResource::search(MediaKind::Movie, "matrix"));
    assert_eq!(*page, 1);
    assert_eq!(params.primary_release_year.as_deref(), Some("1999"));
    assert!(params.year.is_none());
    assert_eq!(params.sort_by.as_deref(), Some("popularity.desc"));
}

#[tokio::test]
async fn movie_search_sends_year_param_as_year() {
    let h = harness(vec![movie(1, &[28], "1999-03-31")]);

    h.server
        .get("/api/search/movies")
        .add_query_param("query", "matrix")
        .add_query_param("year", 1999)
        .await
        .assert_status_ok();

    let calls = h.listings.calls();
    assert_eq!(calls.len(), 1);
    let (_, _, params) = &calls[0];
    assert_eq!(params.year.as_deref(), Some("1999"));
    assert!(params.primary_release_year.is_none());
}

#[tokio::test]
async fn malformed_query_string_uses_json_error_envelope() {
    let h = harness(Vec::new());

    let response = h
        .server
        .get("/api/movies/popular")
        .add_query_param("page", 1)
        .add_query_param("page", 2)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    let message = body["message"].as_str().unwrap_or_default();
    assert!(message.contains("page"), "unexpected message: {message}");
    assert!(h.listings.calls().is_empty());
}

#[tokio::test]
async fn upstream_rate_limit_maps_to_429() {
    let h = harness(Vec::new());

    h.server
        .get("/api/search/tv")
        .add_query_param("query", "ratelimit")
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn detail_is_served_from_cache_on_second_request() {
    let h = harness(Vec::new());

    let first: Value = h.server.get("/api/movies/603").await.json();
    let second: Value = h.server.get("/api/movies/603").await.json();

    assert_eq!(first["data"]["title"], "movie 603");
    assert_eq!(first, second);
    assert_eq!(h.details.detail_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn movie_and_tv_details_are_cached_separately() {
    let h = harness(Vec::new());

    h.server.get("/api/movies/7").await.assert_status_ok();
    let tv: Value = h.server.get("/api/tv/7").await.json();

    assert_eq!(tv["data"]["title"], "tv 7");
    assert_eq!(h.details.detail_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn detail_errors_map_to_statuses() {
    let h = harness(Vec::new());

    h.server
        .get("/api/movies/abc")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    h.server
        .get("/api/tv/0")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    h.server
        .get("/api/movies/404")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    h.server
        .get("/api/tv/500")
        .await
        .assert_status(StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn failed_detail_refresh_is_not_cached() {
    let h = harness(Vec::new());

    h.server.get("/api/movies/404").await;
    h.server.get("/api/movies/404").await;

    assert_eq!(h.details.detail_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn season_and_genres_pass_through() {
    let h = harness(Vec::new());

    let season: Value = h.server.get("/api/tv/1399/season/3").await.json();
    assert_eq!(season["data"]["season_number"], 3);

    h.server
        .get("/api/tv/1399/season/first")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let movie_genres: Value = h.server.get("/api/genres/movie").await.json();
    assert_eq!(movie_genres["data"][0]["name"], "Action");

    let aliased: Value = h.server.get("/api/movies/genres").await.json();
    assert_eq!(aliased, movie_genres);

    let tv_genres: Value = h.server.get("/api/genres/tv").await.json();
    assert_eq!(tv_genres["data"][0]["id"], 10759);
}
