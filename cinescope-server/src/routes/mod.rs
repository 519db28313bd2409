use axum::{Router, routing::get};

use crate::{
    handlers::{genres, movies, search, tv},
    infra::app_state::AppState,
};

/// Create the `/api` router
pub fn create_api_router() -> Router<AppState> {
    Router::new().nest("/api", api_routes())
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(movie_routes())
        .merge(tv_routes())
        .merge(search_routes())
        .merge(genre_routes())
}

fn movie_routes() -> Router<AppState> {
    Router::new()
        .route("/movies/popular", get(movies::popular_movies_handler))
        .route("/movies/top-rated", get(movies::top_rated_movies_handler))
        .route("/movies/upcoming", get(movies::upcoming_movies_handler))
        .route("/movies/search", get(search::search_movies_handler))
        .route("/movies/genres", get(genres::movie_genres_handler))
        .route("/movies/{id}", get(movies::movie_detail_handler))
}

fn tv_routes() -> Router<AppState> {
    Router::new()
        .route("/tv/popular", get(tv::popular_tv_handler))
        .route("/tv/top-rated", get(tv::top_rated_tv_handler))
        .route("/tv/on-the-air", get(tv::on_the_air_tv_handler))
        .route("/tv/{id}", get(tv::tv_detail_handler))
        .route(
            "/tv/{id}/season/{season_number}",
            get(tv::tv_season_handler),
        )
}

fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/search/movies", get(search::search_movies_handler))
        .route("/search/tv", get(search::search_tv_handler))
}

fn genre_routes() -> Router<AppState> {
    Router::new()
        .route("/genres/movie", get(genres::movie_genres_handler))
        .route("/genres/tv", get(genres::tv_genres_handler))
}
