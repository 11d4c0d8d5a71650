//! Manual per-user actions: rate, comment and recommendations.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use watchtrack_core::{
    CommentRequest, MediaItem, Rating, Recommendation, RecommendationFilter, RemoteSyncError,
    TrackedUser,
};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RateQuery {
    pub rating: i64,
}

/// Map a remote client error to a response.
pub fn remote_error(e: RemoteSyncError) -> (StatusCode, String) {
    let status = match e {
        RemoteSyncError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        RemoteSyncError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_GATEWAY,
    };
    (status, e.to_string())
}

fn tracked_user(state: &AppState, user_id: Uuid) -> Result<Arc<TrackedUser>, (StatusCode, String)> {
    state.users.find_user(user_id).ok_or((
        StatusCode::NOT_FOUND,
        format!("user {user_id} is not linked to a Trakt account"),
    ))
}

async fn catalog_item(state: &AppState, item_id: Uuid) -> Result<Arc<MediaItem>, (StatusCode, String)> {
    state
        .catalog
        .get(item_id)
        .await
        .ok_or((StatusCode::NOT_FOUND, format!("item {item_id} not found")))
}

/// POST /trakt/users/{user_id}/items/{item_id}/rate?rating=N
pub async fn rate_item(
    State(state): State<Arc<AppState>>,
    Path((user_id, item_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<RateQuery>,
) -> Result<StatusCode, (StatusCode, String)> {
    let rating = Rating::new(query.rating).map_err(remote_error)?;
    let user = tracked_user(&state, user_id)?;
    let item = catalog_item(&state, item_id).await?;

    state
        .remote
        .send_rating(&item, rating, &user)
        .await
        .map_err(remote_error)?;

    tracing::info!(
        account = %user.account,
        item = %item.name,
        rating = rating.value(),
        "rating sent"
    );
    Ok(StatusCode::NO_CONTENT)
}

/// POST /trakt/users/{user_id}/items/{item_id}/comment?comment=..&spoiler=&review=
pub async fn comment_item(
    State(state): State<Arc<AppState>>,
    Path((user_id, item_id)): Path<(Uuid, Uuid)>,
    Query(comment): Query<CommentRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    comment.validate().map_err(remote_error)?;
    let user = tracked_user(&state, user_id)?;
    let item = catalog_item(&state, item_id).await?;

    state
        .remote
        .send_comment(&item, &comment, &user)
        .await
        .map_err(remote_error)?;

    tracing::info!(account = %user.account, item = %item.name, "comment posted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /trakt/users/{user_id}/recommended-movies
pub async fn recommended_movies(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Query(filter): Query<RecommendationFilter>,
) -> Result<Json<Vec<Recommendation>>, (StatusCode, String)> {
    let user = tracked_user(&state, user_id)?;
    let movies = state
        .remote
        .recommended_movies(&user, &filter)
        .await
        .map_err(remote_error)?;
    Ok(Json(movies))
}

/// POST /trakt/users/{user_id}/recommended-shows
pub async fn recommended_shows(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Query(filter): Query<RecommendationFilter>,
) -> Result<Json<Vec<Recommendation>>, (StatusCode, String)> {
    let user = tracked_user(&state, user_id)?;
    let shows = state
        .remote
        .recommended_shows(&user, &filter)
        .await
        .map_err(remote_error)?;
    Ok(Json(shows))
}
