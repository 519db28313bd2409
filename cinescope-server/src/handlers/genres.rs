use axum::{Json, extract::State};
use cinescope_core::{Genre, MediaKind};

use super::ApiResponse;
use crate::infra::{app_state::AppState, errors::AppResult};

pub async fn movie_genres_handler(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Genre>>>> {
    let genres = state.catalog().genres(MediaKind::Movie).await?;
    Ok(ApiResponse::ok(genres))
}

pub async fn tv_genres_handler(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Genre>>>> {
    let genres = state.catalog().genres(MediaKind::Tv).await?;
    Ok(ApiResponse::ok(genres))
}
