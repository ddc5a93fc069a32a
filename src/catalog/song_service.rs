use super::artist_service::{required_text, SearchTerm};
use super::pagination::{PageMeta, Paginated};
use super::slug::unique_slug;
use crate::catalog_store::normalize::normalize_for_search;
use crate::catalog_store::{
    plan_reconciliation, ArtistCredit, CatalogStore, CreditsUpdate, DesiredAssociation, NewSong,
    Page, Reaction, ReconcileError, Song, SongCounter, SongFilter, SongUpdate, SongWithArtists,
};
use crate::error::{ServiceError, ServiceResult};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

const SLUG_FALLBACK: &str = "song";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSongRequest {
    pub title: String,
    pub description: Option<String>,
    pub lyric: Option<String>,
    pub image_url: Option<String>,
    pub release_at: Option<i64>,
    pub artist_id: Option<i64>,
    #[serde(default)]
    pub artists: Vec<DesiredAssociation>,
}

/// `artists` absent leaves the credits alone, an empty list removes them all.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSongRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub lyric: Option<String>,
    pub image_url: Option<String>,
    pub release_at: Option<i64>,
    pub artist_id: Option<i64>,
    pub artists: Option<Vec<DesiredAssociation>>,
}

/// A credit list the store rejected keeps its own status.
fn update_error(err: anyhow::Error) -> ServiceError {
    match err.downcast::<ReconcileError>() {
        Ok(err) => err.into(),
        Err(err) => err.into(),
    }
}

#[derive(Clone)]
pub struct SongService {
    store: Arc<dyn CatalogStore>,
}

impl SongService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub fn list(
        &self,
        title: Option<&str>,
        artist: Option<&str>,
        artist_id: Option<i64>,
        page: Option<Page>,
    ) -> ServiceResult<Paginated<Song>> {
        let (title, artist) = (SearchTerm::parse(title), SearchTerm::parse(artist));
        if title == SearchTerm::Unmatchable || artist == SearchTerm::Unmatchable {
            return Ok(Paginated::empty(page));
        }
        let filter = SongFilter {
            title: title.into_filter(),
            artist: artist.into_filter(),
            artist_id,
        };
        let (items, total_count) = self.store.list_songs(&filter, page)?;
        Ok(Paginated {
            items,
            meta: PageMeta::new(page, total_count),
        })
    }

    pub fn get(&self, id: i64) -> ServiceResult<SongWithArtists> {
        let song = self
            .store
            .get_song(id)?
            .ok_or_else(|| ServiceError::not_found("Song"))?;
        self.with_artists(song)
    }

    pub fn get_by_slug(&self, slug: &str) -> ServiceResult<SongWithArtists> {
        let song = self
            .store
            .get_song_by_slug(slug)?
            .ok_or_else(|| ServiceError::not_found("Song"))?;
        self.with_artists(song)
    }

    pub fn create(
        &self,
        request: CreateSongRequest,
        user_id: i64,
    ) -> ServiceResult<SongWithArtists> {
        let title = required_text(&request.title, "title")?;
        self.ensure_artists_exist(request.artist_id, &request.artists)?;

        // A new song has no credits yet, so any keyed entry is rejected.
        let plan = plan_reconciliation(0, &request.artists, &[])?;
        let credits: Vec<ArtistCredit> = plan
            .to_insert
            .iter()
            .map(|c| ArtistCredit {
                artist_id: c.artist_id,
                role: c.role,
            })
            .collect();

        let slug = unique_slug(&title, SLUG_FALLBACK, |s| {
            self.store.song_slug_taken(s, None)
        })?;
        let song = self.store.insert_song(
            &NewSong {
                normalized_title: normalize_for_search(&title),
                title,
                slug,
                description: request.description,
                lyric: request.lyric,
                image_url: request.image_url,
                release_at: request.release_at,
                artist_id: request.artist_id,
            },
            &credits,
            Some(user_id),
        )?;
        info!(
            "User {} created song {} with {} credits",
            user_id,
            song.id,
            credits.len()
        );
        self.with_artists(song)
    }

    /// Updates scalar fields and, when `artists` is given, reconciles the
    /// song's credits against it. Both happen in one store transaction.
    pub fn update(
        &self,
        id: i64,
        request: UpdateSongRequest,
        user_id: i64,
    ) -> ServiceResult<SongWithArtists> {
        if self.store.get_song(id)?.is_none() {
            return Err(ServiceError::not_found("Song"));
        }
        self.ensure_artists_exist(
            request.artist_id,
            request.artists.as_deref().unwrap_or_default(),
        )?;

        let credits = match request.artists {
            Some(desired) => {
                debug!("Song {}: reconciling {} credits", id, desired.len());
                CreditsUpdate::Reconcile(desired)
            }
            None => CreditsUpdate::Keep,
        };

        let mut update = SongUpdate {
            description: request.description,
            lyric: request.lyric,
            image_url: request.image_url,
            release_at: request.release_at,
            artist_id: request.artist_id,
            ..Default::default()
        };
        if let Some(title) = request.title {
            let title = required_text(&title, "title")?;
            update.slug = Some(unique_slug(&title, SLUG_FALLBACK, |s| {
                self.store.song_slug_taken(s, Some(id))
            })?);
            update.normalized_title = Some(normalize_for_search(&title));
            update.title = Some(title);
        }

        let song = self
            .store
            .update_song(id, &update, &credits, Some(user_id))
            .map_err(update_error)?
            .ok_or_else(|| ServiceError::not_found("Song"))?;
        self.with_artists(song)
    }

    /// Deletes the song's credits, then the song.
    pub fn delete(&self, id: i64) -> ServiceResult<()> {
        if !self.store.delete_song(id)? {
            return Err(ServiceError::not_found("Song"));
        }
        info!("Deleted song {}", id);
        Ok(())
    }

    pub fn delete_many(&self, ids: &[i64]) -> ServiceResult<usize> {
        let deleted = self.store.delete_songs(ids)?;
        info!("Deleted {} of {} songs", deleted, ids.len());
        Ok(deleted)
    }

    pub fn record_view(&self, id: i64) -> ServiceResult<Song> {
        self.store
            .increment_song_counter(id, SongCounter::View)?
            .ok_or_else(|| ServiceError::not_found("Song"))
    }

    pub fn react(&self, id: i64, reaction: Reaction) -> ServiceResult<Song> {
        self.store
            .increment_song_counter(id, SongCounter::Reaction(reaction))?
            .ok_or_else(|| ServiceError::not_found("Song"))
    }

    fn with_artists(&self, song: Song) -> ServiceResult<SongWithArtists> {
        let artists = self.store.get_song_artists(song.id)?;
        Ok(SongWithArtists { song, artists })
    }

    fn ensure_artists_exist(
        &self,
        primary: Option<i64>,
        credits: &[DesiredAssociation],
    ) -> ServiceResult<()> {
        let ids: BTreeSet<i64> = primary
            .into_iter()
            .chain(credits.iter().map(|c| c.artist_id))
            .collect();
        for artist_id in ids {
            if self.store.get_artist(artist_id)?.is_none() {
                return Err(ServiceError::NotFound(format!(
                    "Artist {} not found",
                    artist_id
                )));
            }
        }
        Ok(())
    }
}
