use axum::{
    Json,
    extract::{Path, State},
};
use cinescope_core::{ListingPage, MediaKind};
use serde_json::Value;

use super::{ApiResponse, ListingQuery, parse_id};
use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};

pub async fn popular_tv_handler(
    State(state): State<AppState>,
    query: ListingQuery,
) -> AppResult<Json<ApiResponse<ListingPage>>> {
    let filter = query.filter(MediaKind::Tv)?;
    let page = state
        .catalog()
        .list_popular(
            MediaKind::Tv,
            query.page(),
            &filter,
            &query.native(MediaKind::Tv),
        )
        .await?;
    Ok(ApiResponse::ok(page))
}

pub async fn top_rated_tv_handler(
    State(state): State<AppState>,
    query: ListingQuery,
) -> AppResult<Json<ApiResponse<ListingPage>>> {
    let filter = query.filter(MediaKind::Tv)?;
    let page = state
        .catalog()
        .list_top_rated(
            MediaKind::Tv,
            query.page(),
            &filter,
            &query.native(MediaKind::Tv),
        )
        .await?;
    Ok(ApiResponse::ok(page))
}

pub async fn on_the_air_tv_handler(
    State(state): State<AppState>,
    query: ListingQuery,
) -> AppResult<Json<ApiResponse<ListingPage>>> {
    let filter = query.filter(MediaKind::Tv)?;
    let page = state
        .catalog()
        .list_on_the_air(query.page(), &filter, &query.native(MediaKind::Tv))
        .await?;
    Ok(ApiResponse::ok(page))
}

pub async fn tv_detail_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Value>>> {
    let id = parse_id(&id, "tv id")?;
    let detail = state.catalog().get_detail(MediaKind::Tv, id).await?;
    Ok(ApiResponse::ok(detail))
}

pub async fn tv_season_handler(
    State(state): State<AppState>,
    Path((id, season_number)): Path<(String, String)>,
) -> AppResult<Json<ApiResponse<Value>>> {
    let id = parse_id(&id, "tv id")?;
    let season_number = season_number.trim().parse::<u32>().map_err(|_| {
        AppError::bad_request(format!(
            "season number must be a non-negative integer, got '{season_number}'"
        ))
    })?;

    let season = state.catalog().get_season(id, season_number).await?;
    Ok(ApiResponse::ok(season))
}
