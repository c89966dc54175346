//! Catalog Boundary
//!
//! Track search and lookup against the external music catalog. The session
//! core only needs enough of a track to build a [`Song`]; fetching and
//! shaping catalog data belongs to whoever implements [`Catalog`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::state::{PlayerId, Song, SongId};

/// Catalog lookup failures.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog has no such track.
    #[error("track {0} not found")]
    NotFound(SongId),

    /// Catalog could not be reached or answered badly.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSummary {
    /// Track id.
    pub id: SongId,
    /// Track title.
    pub title: String,
    /// Artist credit.
    pub artist: String,
}

/// Full track metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    /// Track id.
    pub id: SongId,
    /// Track title.
    pub title: String,
    /// Artist credit.
    pub artist: String,
    /// Cover art URL.
    pub cover: String,
    /// Album genres.
    pub genres: Vec<String>,
    /// Audio preview URL.
    pub preview_url: String,
}

impl TrackMetadata {
    /// Turn into a song submitted by `submitter`.
    pub fn into_song(self, submitter: PlayerId) -> Song {
        Song {
            id: self.id,
            name: self.title,
            artist: self.artist,
            genres: self.genres,
            cover: self.cover,
            preview_url: self.preview_url,
            submitter,
        }
    }
}

/// External music catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Free-text search. Only called with a non-blank query.
    async fn search_tracks(&self, query: &str) -> Result<Vec<TrackSummary>, CatalogError>;

    /// Full metadata for one track.
    async fn track(&self, id: SongId) -> Result<TrackMetadata, CatalogError>;
}

/// Search the catalog, skipping the round trip for a blank query.
pub async fn search<C: Catalog + ?Sized>(
    catalog: &C,
    query: &str,
) -> Result<Vec<TrackSummary>, CatalogError> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }
    catalog.search_tracks(query).await
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory catalog for tests.
    #[derive(Default)]
    pub(crate) struct FakeCatalog {
        pub tracks: Vec<TrackMetadata>,
        pub searches: AtomicUsize,
    }

    pub(crate) fn track(id: u64, genres: &[&str]) -> TrackMetadata {
        TrackMetadata {
            id: SongId::new(id),
            title: format!("Track {}", id),
            artist: "Artist".to_string(),
            cover: "https://example.test/cover.jpg".to_string(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            preview_url: "https://example.test/preview.mp3".to_string(),
        }
    }

    #[async_trait]
    impl Catalog for FakeCatalog {
        async fn search_tracks(&self, query: &str) -> Result<Vec<TrackSummary>, CatalogError> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .tracks
                .iter()
                .filter(|t| t.title.to_lowercase().contains(&query.to_lowercase()))
                .map(|t| TrackSummary {
                    id: t.id,
                    title: t.title.clone(),
                    artist: t.artist.clone(),
                })
                .collect())
        }

        async fn track(&self, id: SongId) -> Result<TrackMetadata, CatalogError> {
            self.tracks
                .iter()
                .find(|t| t.id == id)
                .cloned()
                .ok_or(CatalogError::NotFound(id))
        }
    }

    #[tokio::test]
    async fn test_blank_query_skips_catalog() {
        let catalog = FakeCatalog {
            tracks: vec![track(1, &["pop"])],
            ..Default::default()
        };
        assert!(search(&catalog, "   ").await.unwrap().is_empty());
        assert_eq!(catalog.searches.load(Ordering::SeqCst), 0);

        let hits = search(&catalog, "track").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(catalog.searches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_into_song_sets_submitter() {
        let song = track(5, &["rock"]).into_song(PlayerId::new(2));
        assert_eq!(song.id, SongId::new(5));
        assert_eq!(song.submitter, PlayerId::new(2));
        assert_eq!(song.name, "Track 5");
    }
}
