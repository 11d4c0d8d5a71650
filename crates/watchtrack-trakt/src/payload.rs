//! Trakt API v2 request bodies.
//!
//! Library batches and ratings share the `/sync` body shape: movies by
//! title/year/ids, episodes nested under their show by season and number.
//! Episodes without a season or episode number fall back to a flat
//! `episodes` list keyed by their own ids.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;
use watchtrack_core::{MediaItem, MediaKind, ProviderIds, RemoteSyncError};

// ─── /sync bodies ───────────────────────────────────────────────────────

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct SyncItems {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub movies: Vec<MovieEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub shows: Vec<ShowEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub episodes: Vec<EpisodeEntry>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct MovieEntry {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub ids: ProviderIds,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct ShowEntry {
    #[serde(skip)]
    series_id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub ids: ProviderIds,
    pub seasons: Vec<SeasonEntry>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct SeasonEntry {
    pub number: u32,
    pub episodes: Vec<EpisodeNumber>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct EpisodeNumber {
    pub number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct EpisodeEntry {
    pub ids: ProviderIds,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

impl SyncItems {
    /// Build a `/sync` body. Shows keep the order in which their first
    /// episode appears; items that are neither movies nor episodes are
    /// skipped.
    pub fn build(items: &[Arc<MediaItem>], rating: Option<u8>) -> Self {
        let mut body = SyncItems::default();
        for item in items {
            match &item.kind {
                MediaKind::Movie => body.movies.push(MovieEntry {
                    title: item.name.clone(),
                    year: item.year,
                    ids: item.ids.clone(),
                    rating,
                }),
                MediaKind::Episode(info) => match (info.season, info.number) {
                    (Some(season), Some(number)) => {
                        let show = match body
                            .shows
                            .iter()
                            .position(|s| s.series_id == info.series_id)
                        {
                            Some(i) => &mut body.shows[i],
                            None => {
                                body.shows.push(ShowEntry {
                                    series_id: info.series_id,
                                    title: info.series_name.clone(),
                                    year: info.series_year,
                                    ids: info.series_ids.clone(),
                                    seasons: Vec::new(),
                                });
                                let last = body.shows.len() - 1;
                                &mut body.shows[last]
                            }
                        };
                        let season_entry = match show.seasons.iter().position(|s| s.number == season)
                        {
                            Some(i) => &mut show.seasons[i],
                            None => {
                                show.seasons.push(SeasonEntry {
                                    number: season,
                                    episodes: Vec::new(),
                                });
                                let last = show.seasons.len() - 1;
                                &mut show.seasons[last]
                            }
                        };
                        season_entry.episodes.push(EpisodeNumber { number, rating });
                    }
                    _ => body.episodes.push(EpisodeEntry {
                        ids: item.ids.clone(),
                        rating,
                    }),
                },
                MediaKind::Other => {}
            }
        }
        body
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty() && self.shows.is_empty() && self.episodes.is_empty()
    }
}

// ─── Single-item bodies ─────────────────────────────────────────────────

#[derive(Debug, PartialEq, Serialize)]
pub struct MediaRef {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub ids: ProviderIds,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct EpisodeRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    #[serde(skip_serializing_if = "ProviderIds::is_empty")]
    pub ids: ProviderIds,
}

/// The movie, or show plus episode, a scrobble or comment refers to.
#[derive(Debug, PartialEq, Serialize)]
pub struct MediaTarget {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movie: Option<MediaRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show: Option<MediaRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<EpisodeRef>,
}

impl MediaTarget {
    pub fn for_item(item: &MediaItem) -> Result<Self, RemoteSyncError> {
        match &item.kind {
            MediaKind::Movie => Ok(Self {
                movie: Some(MediaRef {
                    title: item.name.clone(),
                    year: item.year,
                    ids: item.ids.clone(),
                }),
                show: None,
                episode: None,
            }),
            MediaKind::Episode(info) => Ok(Self {
                movie: None,
                show: Some(MediaRef {
                    title: info.series_name.clone(),
                    year: info.series_year,
                    ids: info.series_ids.clone(),
                }),
                episode: Some(EpisodeRef {
                    season: info.season,
                    number: info.number,
                    ids: item.ids.clone(),
                }),
            }),
            MediaKind::Other => Err(RemoteSyncError::InvalidRequest(format!(
                "{} is neither a movie nor an episode",
                item.name
            ))),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ScrobbleBody {
    #[serde(flatten)]
    pub target: MediaTarget,
    pub progress: f32,
}

#[derive(Debug, Serialize)]
pub struct CommentBody<'a> {
    #[serde(flatten)]
    pub target: MediaTarget,
    pub comment: &'a str,
    pub spoiler: bool,
}
