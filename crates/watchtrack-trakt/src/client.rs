//! HTTP client for the Trakt API v2.
//!
//! Every request carries the application client id and the tracked user's
//! bearer token. Errors are mapped onto [`RemoteSyncError`]; nothing is
//! retried here.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;
use watchtrack_core::{
    ActionKind, CommentRequest, MediaItem, PlaybackStatus, Rating, Recommendation,
    RecommendationFilter, RemoteSyncClient, RemoteSyncError, TrackedUser,
};

use crate::config::TraktConfig;
use crate::payload::{CommentBody, MediaTarget, ScrobbleBody, SyncItems};

const API_VERSION: &str = "2";

const USER_AGENT: &str = concat!("watchtrack/", env!("CARGO_PKG_VERSION"));

pub struct TraktClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
}

impl std::fmt::Debug for TraktClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraktClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl TraktClient {
    pub fn new(config: &TraktConfig) -> Result<Self, RemoteSyncError> {
        if config.client_id.is_empty() {
            return Err(RemoteSyncError::InvalidRequest(
                "TRAKT_CLIENT_ID is not set".into(),
            ));
        }
        let base = Url::parse(&config.api_url).map_err(|e| {
            RemoteSyncError::InvalidRequest(format!("invalid api url {}: {e}", config.api_url))
        })?;
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| RemoteSyncError::Transport(format!("HTTP client error: {e}")))?;

        Ok(Self {
            http,
            base_url: base.as_str().trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        user: &TrackedUser,
    ) -> Result<RequestBuilder, RemoteSyncError> {
        if user.access_token.is_empty() {
            return Err(RemoteSyncError::Unauthorized(user.account.clone()));
        }
        Ok(self
            .http
            .request(method, format!("{}{path}", self.base_url))
            .header("trakt-api-version", API_VERSION)
            .header("trakt-api-key", &self.client_id)
            .bearer_auth(&user.access_token))
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        user: &TrackedUser,
        body: &T,
    ) -> Result<Response, RemoteSyncError> {
        let resp = self
            .request(Method::POST, path, user)?
            .json(body)
            .send()
            .await
            .map_err(|e| RemoteSyncError::Transport(e.to_string()))?;
        check_status(resp, user).await
    }

    async fn recommendations(
        &self,
        kind: &str,
        user: &TrackedUser,
        filter: &RecommendationFilter,
    ) -> Result<Vec<Recommendation>, RemoteSyncError> {
        let mut query: Vec<(&str, String)> = vec![
            ("ignore_collected", filter.ignore_collected.to_string()),
            ("ignore_watchlisted", filter.ignore_watchlisted.to_string()),
        ];
        if let Some(limit) = filter.limit {
            query.push(("limit", limit.to_string()));
        }

        let resp = self
            .request(Method::GET, &format!("/recommendations/{kind}"), user)?
            .query(&query)
            .send()
            .await
            .map_err(|e| RemoteSyncError::Transport(e.to_string()))?;
        let body = check_status(resp, user)
            .await?
            .text()
            .await
            .map_err(|e| RemoteSyncError::Transport(e.to_string()))?;
        Ok(serde_json::from_str(&body)?)
    }
}

async fn check_status(resp: Response, user: &TrackedUser) -> Result<Response, RemoteSyncError> {
    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        warn!(account = %user.account, status = %status, "Trakt rejected credentials");
        return Err(RemoteSyncError::Unauthorized(user.account.clone()));
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(RemoteSyncError::Rejected {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp)
}

#[async_trait]
impl RemoteSyncClient for TraktClient {
    async fn send_library_batch(
        &self,
        items: &[Arc<MediaItem>],
        user: &TrackedUser,
        action: ActionKind,
    ) -> Result<(), RemoteSyncError> {
        let body = SyncItems::build(items, None);
        if body.is_empty() {
            debug!(account = %user.account, "nothing to send in library batch");
            return Ok(());
        }
        let path = match action {
            ActionKind::Add | ActionKind::Update => "/sync/collection",
            ActionKind::Remove => "/sync/collection/remove",
        };
        self.post_json(path, user, &body).await?;
        debug!(account = %user.account, path, count = items.len(), "collection synced");
        Ok(())
    }

    async fn send_status_update(
        &self,
        item: &MediaItem,
        status: PlaybackStatus,
        progress: f32,
        user: &TrackedUser,
    ) -> Result<(), RemoteSyncError> {
        let body = ScrobbleBody {
            target: MediaTarget::for_item(item)?,
            progress,
        };
        let path = match status {
            PlaybackStatus::Watching => "/scrobble/start",
            PlaybackStatus::Scrobble => "/scrobble/stop",
        };
        self.post_json(path, user, &body).await?;
        Ok(())
    }

    async fn send_rating(
        &self,
        item: &MediaItem,
        rating: Rating,
        user: &TrackedUser,
    ) -> Result<(), RemoteSyncError> {
        let item = Arc::new(item.clone());
        let (path, body) = if rating.is_unrate() {
            ("/sync/ratings/remove", SyncItems::build(&[item], None))
        } else {
            ("/sync/ratings", SyncItems::build(&[item], Some(rating.value())))
        };
        if body.is_empty() {
            return Err(RemoteSyncError::InvalidRequest(
                "only movies and episodes can be rated".into(),
            ));
        }
        self.post_json(path, user, &body).await?;
        Ok(())
    }

    async fn send_comment(
        &self,
        item: &MediaItem,
        comment: &CommentRequest,
        user: &TrackedUser,
    ) -> Result<(), RemoteSyncError> {
        comment.validate()?;
        let body = CommentBody {
            target: MediaTarget::for_item(item)?,
            comment: &comment.comment,
            spoiler: comment.spoiler,
        };
        self.post_json("/comments", user, &body).await?;
        Ok(())
    }

    async fn recommended_movies(
        &self,
        user: &TrackedUser,
        filter: &RecommendationFilter,
    ) -> Result<Vec<Recommendation>, RemoteSyncError> {
        self.recommendations("movies", user, filter).await
    }

    async fn recommended_shows(
        &self,
        user: &TrackedUser,
        filter: &RecommendationFilter,
    ) -> Result<Vec<Recommendation>, RemoteSyncError> {
        self.recommendations("shows", user, filter).await
    }
}
