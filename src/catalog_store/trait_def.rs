//! CatalogStore trait definition.

use super::models::{
    Artist, ArtistCredit, ArtistUpdate, CreditsUpdate, NewArtist, NewSong, Page, Song,
    SongArtist, SongCounter, SongFilter, SongUpdate,
};
use anyhow::Result;

/// Storage for artists, songs and their credits.
///
/// Methods that touch more than one table run in a single transaction.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait CatalogStore: Send + Sync {
    // =========================================================================
    // Artists
    // =========================================================================

    fn insert_artist(&self, artist: &NewArtist, created_by: Option<i64>) -> Result<Artist>;

    fn get_artist(&self, id: i64) -> Result<Option<Artist>>;

    fn get_artist_by_slug(&self, slug: &str) -> Result<Option<Artist>>;

    /// Returns true if another artist than `except_id` already uses `slug`.
    fn artist_slug_taken(&self, slug: &str, except_id: Option<i64>) -> Result<bool>;

    /// Artists whose normalized name contains `name_query`, ordered by id,
    /// with the total number of matches.
    fn list_artists(&self, name_query: Option<String>, page: Option<Page>)
        -> Result<(Vec<Artist>, u64)>;

    /// Returns Ok(None) if the artist does not exist.
    fn update_artist(
        &self,
        id: i64,
        update: &ArtistUpdate,
        updated_by: Option<i64>,
    ) -> Result<Option<Artist>>;

    /// Deletes the artist after detaching it: songs having it as primary
    /// artist lose that reference, then its credits are removed.
    /// Returns false if the artist does not exist.
    fn delete_artist(&self, id: i64) -> Result<bool>;

    /// Same as `delete_artist` for every id, in one transaction.
    /// Returns the number of artists deleted, unknown ids are skipped.
    fn delete_artists(&self, ids: &[i64]) -> Result<usize>;

    // =========================================================================
    // Songs
    // =========================================================================

    /// Inserts the song and its credits.
    fn insert_song(
        &self,
        song: &NewSong,
        credits: &[ArtistCredit],
        created_by: Option<i64>,
    ) -> Result<Song>;

    fn get_song(&self, id: i64) -> Result<Option<Song>>;

    fn get_song_by_slug(&self, slug: &str) -> Result<Option<Song>>;

    /// Returns true if another song than `except_id` already uses `slug`.
    fn song_slug_taken(&self, slug: &str, except_id: Option<i64>) -> Result<bool>;

    fn list_songs(&self, filter: &SongFilter, page: Option<Page>) -> Result<(Vec<Song>, u64)>;

    /// Applies the scalar fields of `update` and, for `CreditsUpdate::Reconcile`,
    /// reconciles the stored credits against the desired list: inserts, then
    /// deletes, then updates. The credits are read, planned and written in the
    /// same transaction as the song. Empty plan sets issue no statement.
    ///
    /// Returns Ok(None) if the song does not exist. A desired list rejected by
    /// the reconciler fails with a [`ReconcileError`](super::ReconcileError)
    /// and writes nothing.
    fn update_song(
        &self,
        id: i64,
        update: &SongUpdate,
        credits: &CreditsUpdate,
        updated_by: Option<i64>,
    ) -> Result<Option<Song>>;

    /// Deletes the song's credits, then the song.
    /// Returns false if the song does not exist.
    fn delete_song(&self, id: i64) -> Result<bool>;

    /// Same as `delete_song` for every id, in one transaction.
    fn delete_songs(&self, ids: &[i64]) -> Result<usize>;

    /// Adds one to a counter. Returns Ok(None) if the song does not exist.
    fn increment_song_counter(&self, id: i64, counter: SongCounter) -> Result<Option<Song>>;

    // =========================================================================
    // Credits
    // =========================================================================

    /// Credits of a song, ordered by id.
    fn get_song_artists(&self, song_id: i64) -> Result<Vec<SongArtist>>;

    fn get_song_artist(&self, id: i64) -> Result<Option<SongArtist>>;

    /// Credits referencing the artist, ordered by id.
    fn get_artist_songs(&self, artist_id: i64) -> Result<Vec<SongArtist>>;
}
