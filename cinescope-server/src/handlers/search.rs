use axum::{Json, extract::State};
use cinescope_core::{ListingPage, MediaKind};

use super::{ApiResponse, ListingQuery};
use crate::infra::{app_state::AppState, errors::AppResult};

pub(crate) async fn search_kind(
    state: &AppState,
    kind: MediaKind,
    query: &ListingQuery,
) -> AppResult<Json<ApiResponse<ListingPage>>> {
    let filter = query.filter(kind)?;
    let page = state
        .catalog()
        .search(
            kind,
            query.search_text(),
            query.page(),
            &filter,
            &query.native(kind),
        )
        .await?;
    Ok(ApiResponse::ok(page))
}

pub async fn search_movies_handler(
    State(state): State<AppState>,
    query: ListingQuery,
) -> AppResult<Json<ApiResponse<ListingPage>>> {
    search_kind(&state, MediaKind::Movie, &query).await
}

pub async fn search_tv_handler(
    State(state): State<AppState>,
    query: ListingQuery,
) -> AppResult<Json<ApiResponse<ListingPage>>> {
    search_kind(&state, MediaKind::Tv, &query).await
}
