use axum::{
    Json,
    extract::{Path, State},
};
use cinescope_core::{ListingPage, MediaKind};
use serde_json::Value;

use super::{ApiResponse, ListingQuery, parse_id};
use crate::infra::{app_state::AppState, errors::AppResult};

pub async fn popular_movies_handler(
    State(state): State<AppState>,
    query: ListingQuery,
) -> AppResult<Json<ApiResponse<ListingPage>>> {
    let filter = query.filter(MediaKind::Movie)?;
    let page = state
        .catalog()
        .list_popular(
            MediaKind::Movie,
            query.page(),
            &filter,
            &query.native(MediaKind::Movie),
        )
        .await?;
    Ok(ApiResponse::ok(page))
}

pub async fn top_rated_movies_handler(
    State(state): State<AppState>,
    query: ListingQuery,
) -> AppResult<Json<ApiResponse<ListingPage>>> {
    let filter = query.filter(MediaKind::Movie)?;
    let page = state
        .catalog()
        .list_top_rated(
            MediaKind::Movie,
            query.page(),
            &filter,
            &query.native(MediaKind::Movie),
        )
        .await?;
    Ok(ApiResponse::ok(page))
}

pub async fn upcoming_movies_handler(
    State(state): State<AppState>,
    query: ListingQuery,
) -> AppResult<Json<ApiResponse<ListingPage>>> {
    let filter = query.filter(MediaKind::Movie)?;
    let page = state
        .catalog()
        .list_upcoming(query.page(), &filter, &query.native(MediaKind::Movie))
        .await?;
    Ok(ApiResponse::ok(page))
}

/// Full movie detail including videos and credits.
pub async fn movie_detail_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Value>>> {
    let id = parse_id(&id, "movie id")?;
    let detail = state.catalog().get_detail(MediaKind::Movie, id).await?;
    Ok(ApiResponse::ok(detail))
}
